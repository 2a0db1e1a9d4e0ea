use eframe::egui::{self, Align2, Color32, Painter, Pos2, Rect, Sense, Stroke, Ui, vec2};

use bubblepack::chart::render::{
    CircleShape, GroupImage, HoverStyle, LegendEntry, SHADOW_COLOR, TextLabel,
};

use super::super::render_utils::{
    chart_to_world, font_id, parse_color, with_opacity, world_to_screen,
};
use super::super::ViewModel;

/// Chart-space to screen-space mapping for one paint pass.
#[derive(Clone, Copy)]
struct Transform {
    rect: Rect,
    pan: egui::Vec2,
    zoom: f32,
}

impl Transform {
    fn point(self, point: [f32; 2]) -> Pos2 {
        world_to_screen(self.rect, self.pan, self.zoom, chart_to_world(self.rect, point))
    }

    fn length(self, length: f32) -> f32 {
        length * self.zoom
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_chart(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        if (rect.size() - self.last_size).length() > 0.5 {
            self.last_size = rect.size();
            self.dirty = true;
        }
        if self.dirty {
            self.rerender();
        }

        let painter = ui.painter_at(rect);
        let background = self
            .frame
            .as_ref()
            .map_or(self.settings.background_color.as_str(), |frame| frame.background.as_str());
        painter.rect_filled(rect, 0.0, parse_color(background));

        if let Some(status) = self.status {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                status.message(),
                egui::FontId::proportional(16.0),
                Color32::from_gray(110),
            );
            return;
        }

        self.handle_chart_zoom(ui, rect, &response);
        self.handle_chart_pan(&response);

        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered = self.hovered_leaf(rect, pointer);
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let clicked = if response.clicked_by(egui::PointerButton::Primary) {
            hovered
        } else {
            None
        };

        let Some(frame) = self.frame.as_ref() else {
            return;
        };
        let transform = Transform {
            rect,
            pan: self.pan,
            zoom: self.zoom,
        };

        for (index, circle) in frame.circles.iter().enumerate() {
            let hover = frame.hover.filter(|_| hovered == Some(index));
            paint_circle(&painter, transform, circle, hover);
        }
        for label in frame.labels.iter().chain(&frame.group_labels) {
            paint_label(&painter, transform, label, &frame.background);
        }
        for image in &frame.group_images {
            paint_group_badge(&painter, transform, image);
        }
        for entry in &frame.legend {
            paint_legend_entry(&painter, rect, entry);
        }

        let tooltip = hovered.and_then(|index| frame.tooltip(index));

        if let Some(index) = clicked {
            self.apply_chart_click(index);
        }

        if let Some(tooltip) = tooltip {
            response.on_hover_ui_at_pointer(|ui| {
                ui.strong(tooltip.title.as_str());
                for line in &tooltip.lines {
                    ui.label(line.as_str());
                }
            });
        }
    }
}

fn paint_circle(
    painter: &Painter,
    transform: Transform,
    circle: &CircleShape,
    hover: Option<HoverStyle>,
) {
    let center = transform.point(circle.center);
    let scale = hover.map_or(1.0, |hover| hover.scale);
    let radius = transform.length(circle.radius * scale);

    if let Some(shadow) = circle.shadow {
        let offset = vec2(
            transform.length(shadow.offset[0]),
            transform.length(shadow.offset[1]),
        );
        let shadow_color = parse_color(SHADOW_COLOR);
        let spread = transform.length(shadow.blur) * 0.25;
        painter.circle_filled(
            center + offset,
            radius + spread,
            with_opacity(shadow_color, 0.5),
        );
        painter.circle_filled(center + offset, radius, shadow_color);
    }

    if let Some(fill) = circle.fill.as_deref() {
        let opacity = hover.map_or(circle.fill_opacity, |hover| hover.fill_opacity);
        painter.circle_filled(center, radius, with_opacity(parse_color(fill), opacity));
    }

    if let Some(stroke) = circle.stroke.as_deref() {
        let width = hover.map_or(circle.stroke_width, |hover| hover.stroke_width);
        if width > 0.0 {
            painter.circle_stroke(
                center,
                radius,
                Stroke::new(
                    width,
                    with_opacity(parse_color(stroke), circle.stroke_opacity),
                ),
            );
        }
    }
}

fn paint_label(painter: &Painter, transform: Transform, label: &TextLabel, background: &str) {
    if label.opacity <= 0.0 {
        return;
    }

    let position = transform.point(label.position);
    let font = font_id(&label.font, transform.length(label.size));

    if label.outline {
        let halo = with_opacity(parse_color(background), label.opacity);
        for offset in [vec2(-1.0, 0.0), vec2(1.0, 0.0), vec2(0.0, -1.0), vec2(0.0, 1.0)] {
            painter.text(
                position + offset,
                Align2::CENTER_BOTTOM,
                &label.text,
                font.clone(),
                halo,
            );
        }
    }

    painter.text(
        position,
        Align2::CENTER_BOTTOM,
        &label.text,
        font,
        with_opacity(parse_color(&label.color), label.opacity),
    );
}

/// Group images are shown as a badge carrying the group's initial.
fn paint_group_badge(painter: &Painter, transform: Transform, image: &GroupImage) {
    let center = transform.point(image.badge_center);
    let radius = transform.length(image.badge_radius);
    let stroke = with_opacity(parse_color(&image.badge_stroke), image.opacity);

    painter.circle_filled(center, radius, with_opacity(Color32::WHITE, image.opacity));
    painter.circle_stroke(center, radius, Stroke::new(2.0, stroke));

    let initial = image
        .group
        .chars()
        .next()
        .map(|initial| initial.to_uppercase().to_string())
        .unwrap_or_default();
    painter.text(
        center,
        Align2::CENTER_CENTER,
        initial,
        egui::FontId::proportional(transform.length(image.size * 0.5)),
        stroke,
    );
}

/// Legend entries stay fixed while the chart is zoomed or panned.
fn paint_legend_entry(painter: &Painter, rect: Rect, entry: &LegendEntry) {
    let at = |point: [f32; 2]| rect.min + vec2(point[0], point[1]);

    painter.circle_filled(
        at(entry.swatch_center),
        entry.swatch_radius,
        with_opacity(parse_color(&entry.color), entry.opacity),
    );
    painter.text(
        at(entry.text_position),
        Align2::LEFT_BOTTOM,
        &entry.label,
        egui::FontId::proportional(entry.text_size),
        parse_color(&entry.text_color),
    );
}
