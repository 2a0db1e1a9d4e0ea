use eframe::egui::{Color32, FontId, Pos2, Rect, Vec2, vec2};

use bubblepack::chart::settings::FontStyle;

const FALLBACK: Color32 = Color32::from_rgb(204, 204, 204);

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` and `rgb()`/`rgba()` colors. Anything
/// else paints grey.
pub(super) fn parse_color(raw: &str) -> Color32 {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix('#') {
        return parse_hex(hex).unwrap_or(FALLBACK);
    }
    parse_functional(raw).unwrap_or(FALLBACK)
}

fn parse_hex(hex: &str) -> Option<Color32> {
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();

    match hex.len() {
        3 => {
            let short = |index: usize| channel(index..index + 1).map(|value| value * 17);
            Some(Color32::from_rgb(short(0)?, short(1)?, short(2)?))
        }
        6 => Some(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        8 => Some(Color32::from_rgba_unmultiplied(
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            channel(6..8)?,
        )),
        _ => None,
    }
}

fn parse_functional(raw: &str) -> Option<Color32> {
    let lower = raw.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;

    let parts = inner
        .split(',')
        .map(|part| part.trim().parse::<f32>().ok())
        .collect::<Option<Vec<_>>>()?;
    let (rgb, alpha) = match parts.as_slice() {
        [r, g, b] => ([*r, *g, *b], 1.0),
        [r, g, b, a] => ([*r, *g, *b], *a),
        _ => return None,
    };

    let byte = |value: f32| value.clamp(0.0, 255.0).round() as u8;
    Some(Color32::from_rgba_unmultiplied(
        byte(rgb[0]),
        byte(rgb[1]),
        byte(rgb[2]),
        byte(alpha.clamp(0.0, 1.0) * 255.0),
    ))
}

/// Scales the color's alpha by `opacity`.
pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let alpha = (a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    Color32::from_rgba_unmultiplied(r, g, b, alpha)
}

pub(super) fn font_id(font: &FontStyle, size: f32) -> FontId {
    if font.family.to_ascii_lowercase().contains("mono") {
        FontId::monospace(size)
    } else {
        FontId::proportional(size)
    }
}

/// Offset of a chart point from the middle of the canvas.
pub(super) fn chart_to_world(rect: Rect, point: [f32; 2]) -> Vec2 {
    vec2(point[0] - rect.width() / 2.0, point[1] - rect.height() / 2.0)
}

pub(super) fn world_to_chart(rect: Rect, world: Vec2) -> [f32; 2] {
    [world.x + rect.width() / 2.0, world.y + rect.height() / 2.0]
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}
