//! Chart configuration.
//!
//! Settings arrive as a loosely typed camelCase JSON object. Each field is read
//! leniently: a value of the wrong type falls back to the default instead of
//! rejecting the whole object.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use super::palette::Palette;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Auto,
    Master,
    Single,
    Custom,
}

impl ColorMode {
    pub const ALL: [ColorMode; 4] = [Self::Auto, Self::Master, Self::Single, Self::Custom];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Master => "master",
            Self::Single => "single",
            Self::Custom => "custom",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LegendPosition {
    #[default]
    Right,
    Left,
    Top,
    Bottom,
}

impl LegendPosition {
    pub const ALL: [LegendPosition; 4] = [Self::Right, Self::Left, Self::Top, Self::Bottom];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|position| position.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Left => "left",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FontStyle {
    pub family: String,
    pub weight: String,
    pub italic: bool,
}

impl FontStyle {
    fn new(family: &str, weight: &str) -> Self {
        Self {
            family: family.to_owned(),
            weight: weight.to_owned(),
            italic: false,
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self.weight.as_str(), "bold" | "bolder" | "700" | "800" | "900")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartSettings {
    pub max_bubbles: usize,
    pub packing_density: f32,
    pub min_bubble_size: f32,
    pub max_bubble_size: f32,

    pub bubble_opacity: f32,
    pub stroke_width: f32,
    pub border_color: String,
    pub border_opacity: f32,
    pub enable_hover_effect: bool,
    pub hover_opacity: f32,
    pub enable_shadow: bool,
    pub shadow_blur: f32,
    pub shadow_offset_x: f32,
    pub shadow_offset_y: f32,
    pub background_color: String,

    pub color_mode: ColorMode,
    pub single_color: String,
    pub color_palette: Palette,
    pub custom_colors: HashMap<String, String>,

    pub show_labels: bool,
    pub label_color: String,
    pub label_size: f32,
    pub label_font: FontStyle,
    pub min_size_for_label: f32,

    pub show_values: bool,
    pub value_color: String,
    pub value_font: FontStyle,
    pub min_size_for_value: f32,

    pub show_group_bubbles: bool,
    pub group_bubble_opacity: f32,
    pub group_border_opacity: f32,
    pub show_group_labels: bool,
    pub group_label_size: f32,
    pub group_label_font: FontStyle,
    pub group_label_opacity: f32,
    pub group_label_outline: bool,
    pub min_group_size_for_label: f32,
    pub show_group_images: bool,
    pub group_image_size: f32,
    pub group_image_mapping: HashMap<String, String>,

    pub show_legend: bool,
    pub legend_position: LegendPosition,
    pub legend_text_color: String,

    pub show_tooltip: bool,
    pub enable_zoom: bool,
    pub enable_debug: bool,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            max_bubbles: 50,
            packing_density: 3.0,
            min_bubble_size: 20.0,
            max_bubble_size: 120.0,
            bubble_opacity: 0.7,
            stroke_width: 2.0,
            border_color: "#CCCCCC".to_owned(),
            border_opacity: 1.0,
            enable_hover_effect: true,
            hover_opacity: 1.0,
            enable_shadow: false,
            shadow_blur: 10.0,
            shadow_offset_x: 3.0,
            shadow_offset_y: 3.0,
            background_color: "#FFFFFF".to_owned(),
            color_mode: ColorMode::Auto,
            single_color: "#1f77b4".to_owned(),
            color_palette: Palette::Q10,
            custom_colors: HashMap::new(),
            show_labels: true,
            label_color: "#333333".to_owned(),
            label_size: 12.0,
            label_font: FontStyle::new("sans-serif", "bold"),
            min_size_for_label: 20.0,
            show_values: true,
            value_color: "#666666".to_owned(),
            value_font: FontStyle::new("sans-serif", "normal"),
            min_size_for_value: 30.0,
            show_group_bubbles: true,
            group_bubble_opacity: 0.1,
            group_border_opacity: 0.3,
            show_group_labels: true,
            group_label_size: 16.0,
            group_label_font: FontStyle::new("sans-serif", "normal"),
            group_label_opacity: 1.0,
            group_label_outline: false,
            min_group_size_for_label: 50.0,
            show_group_images: false,
            group_image_size: 24.0,
            group_image_mapping: HashMap::new(),
            show_legend: false,
            legend_position: LegendPosition::Right,
            legend_text_color: "#333333".to_owned(),
            show_tooltip: true,
            enable_zoom: true,
            enable_debug: false,
        }
    }
}

impl ChartSettings {
    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        let raw: RawSettings = serde_json::from_str(raw)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawSettings) -> Self {
        let defaults = Self::default();
        let positive = |value: Option<f64>, fallback: f32| {
            value
                .filter(|value| value.is_finite() && *value > 0.0)
                .map_or(fallback, |value| value as f32)
        };
        let non_negative = |value: Option<f64>, fallback: f32| {
            value
                .filter(|value| value.is_finite() && *value >= 0.0)
                .map_or(fallback, |value| value as f32)
        };
        let color = |value: Option<ColorSetting>, fallback: &str| {
            value
                .and_then(ColorSetting::into_color)
                .unwrap_or_else(|| fallback.to_owned())
        };
        let font = |family: Option<String>,
                    weight: Option<String>,
                    style: Option<String>,
                    fallback: &FontStyle| FontStyle {
            family: family
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| fallback.family.clone()),
            weight: weight
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| fallback.weight.clone()),
            italic: style.as_deref() == Some("italic"),
        };

        let settings = Self {
            max_bubbles: raw
                .max_bubbles
                .filter(|value| value.is_finite() && *value >= 1.0)
                .map_or(defaults.max_bubbles, |value| value as usize),
            packing_density: non_negative(raw.packing_density, defaults.packing_density),
            min_bubble_size: positive(raw.min_bubble_size, defaults.min_bubble_size),
            max_bubble_size: positive(raw.max_bubble_size, defaults.max_bubble_size),
            bubble_opacity: non_negative(raw.bubble_opacity, defaults.bubble_opacity),
            stroke_width: non_negative(raw.stroke_width, defaults.stroke_width),
            border_color: color(raw.border_color, &defaults.border_color),
            border_opacity: non_negative(raw.border_opacity, defaults.border_opacity),
            enable_hover_effect: raw.enable_hover_effect.unwrap_or(defaults.enable_hover_effect),
            hover_opacity: non_negative(raw.hover_opacity, defaults.hover_opacity),
            enable_shadow: raw.enable_shadow.unwrap_or(defaults.enable_shadow),
            shadow_blur: positive(raw.shadow_blur, defaults.shadow_blur),
            shadow_offset_x: positive(raw.shadow_offset_x, defaults.shadow_offset_x),
            shadow_offset_y: positive(raw.shadow_offset_y, defaults.shadow_offset_y),
            background_color: color(raw.background_color, &defaults.background_color),
            color_mode: raw
                .color_mode
                .as_deref()
                .and_then(ColorMode::from_name)
                .unwrap_or(defaults.color_mode),
            single_color: color(raw.single_color, &defaults.single_color),
            color_palette: raw
                .color_palette
                .as_deref()
                .and_then(Palette::from_name)
                .unwrap_or(defaults.color_palette),
            custom_colors: raw
                .custom_colors
                .as_deref()
                .map(parse_string_map)
                .unwrap_or_default(),
            show_labels: raw.show_labels.unwrap_or(defaults.show_labels),
            label_color: color(raw.label_color, &defaults.label_color),
            label_size: positive(raw.label_size, defaults.label_size),
            label_font: font(
                raw.label_font_family,
                raw.label_font_weight,
                raw.label_font_style,
                &defaults.label_font,
            ),
            min_size_for_label: positive(raw.min_size_for_label, defaults.min_size_for_label),
            show_values: raw.show_values.unwrap_or(defaults.show_values),
            value_color: color(raw.value_color, &defaults.value_color),
            value_font: font(
                raw.value_font_family,
                raw.value_font_weight,
                raw.value_font_style,
                &defaults.value_font,
            ),
            min_size_for_value: positive(raw.min_size_for_value, defaults.min_size_for_value),
            show_group_bubbles: raw.show_group_bubbles.unwrap_or(defaults.show_group_bubbles),
            group_bubble_opacity: non_negative(
                raw.group_bubble_opacity,
                defaults.group_bubble_opacity,
            ),
            group_border_opacity: non_negative(
                raw.group_border_opacity,
                defaults.group_border_opacity,
            ),
            show_group_labels: raw.show_group_labels.unwrap_or(defaults.show_group_labels),
            group_label_size: positive(raw.group_label_size, defaults.group_label_size),
            group_label_font: font(
                raw.group_label_font_family,
                raw.group_label_font_weight,
                raw.group_label_font_style,
                &defaults.group_label_font,
            ),
            group_label_opacity: non_negative(
                raw.group_label_opacity,
                defaults.group_label_opacity,
            ),
            group_label_outline: raw.group_label_outline.unwrap_or(defaults.group_label_outline),
            min_group_size_for_label: positive(
                raw.min_group_size_for_label,
                defaults.min_group_size_for_label,
            ),
            show_group_images: raw.show_group_images.unwrap_or(defaults.show_group_images),
            group_image_size: positive(raw.group_image_size, defaults.group_image_size),
            group_image_mapping: raw
                .group_image_mapping
                .as_deref()
                .map(parse_string_map)
                .unwrap_or_default(),
            show_legend: raw.show_legend.unwrap_or(defaults.show_legend),
            legend_position: raw
                .legend_position
                .as_deref()
                .and_then(LegendPosition::from_name)
                .unwrap_or(defaults.legend_position),
            legend_text_color: color(raw.legend_text_color, &defaults.legend_text_color),
            show_tooltip: raw.show_tooltip.unwrap_or(defaults.show_tooltip),
            enable_zoom: raw.enable_zoom.unwrap_or(defaults.enable_zoom),
            enable_debug: raw.enable_debug.unwrap_or(defaults.enable_debug),
        };

        settings.normalize()
    }

    /// Clamps every opacity into [0, 1] and orders the radius range.
    pub fn normalize(mut self) -> Self {
        for opacity in [
            &mut self.bubble_opacity,
            &mut self.border_opacity,
            &mut self.hover_opacity,
            &mut self.group_bubble_opacity,
            &mut self.group_border_opacity,
            &mut self.group_label_opacity,
        ] {
            *opacity = opacity.clamp(0.0, 1.0);
        }

        if self.min_bubble_size > self.max_bubble_size {
            std::mem::swap(&mut self.min_bubble_size, &mut self.max_bubble_size);
        }
        self.max_bubbles = self.max_bubbles.max(1);
        self
    }
}

/// Parses a JSON object of strings; anything malformed becomes an empty map.
pub fn parse_string_map(raw: &str) -> HashMap<String, String> {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(raw) else {
        return HashMap::new();
    };

    object
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key, text)),
            _ => None,
        })
        .collect()
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum ColorSetting {
    Plain(String),
    Picker { color: Option<String> },
}

impl ColorSetting {
    fn into_color(self) -> Option<String> {
        match self {
            Self::Plain(color) => Some(color),
            Self::Picker { color } => color,
        }
        .filter(|color| !color.is_empty())
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawSettings {
    #[serde(deserialize_with = "lenient")]
    max_bubbles: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    packing_density: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    min_bubble_size: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    max_bubble_size: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    bubble_opacity: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    stroke_width: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    border_color: Option<ColorSetting>,
    #[serde(deserialize_with = "lenient")]
    border_opacity: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    enable_hover_effect: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    hover_opacity: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    enable_shadow: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    shadow_blur: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    shadow_offset_x: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    shadow_offset_y: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    background_color: Option<ColorSetting>,
    #[serde(deserialize_with = "lenient")]
    color_mode: Option<String>,
    #[serde(deserialize_with = "lenient")]
    single_color: Option<ColorSetting>,
    #[serde(deserialize_with = "lenient")]
    color_palette: Option<String>,
    #[serde(deserialize_with = "lenient")]
    custom_colors: Option<String>,
    #[serde(deserialize_with = "lenient")]
    show_labels: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    label_color: Option<ColorSetting>,
    #[serde(deserialize_with = "lenient")]
    label_size: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    label_font_family: Option<String>,
    #[serde(deserialize_with = "lenient")]
    label_font_weight: Option<String>,
    #[serde(deserialize_with = "lenient")]
    label_font_style: Option<String>,
    #[serde(deserialize_with = "lenient")]
    min_size_for_label: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    show_values: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    value_color: Option<ColorSetting>,
    #[serde(deserialize_with = "lenient")]
    value_font_family: Option<String>,
    #[serde(deserialize_with = "lenient")]
    value_font_weight: Option<String>,
    #[serde(deserialize_with = "lenient")]
    value_font_style: Option<String>,
    #[serde(deserialize_with = "lenient")]
    min_size_for_value: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    show_group_bubbles: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    group_bubble_opacity: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    group_border_opacity: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    show_group_labels: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    group_label_size: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    group_label_font_family: Option<String>,
    #[serde(deserialize_with = "lenient")]
    group_label_font_weight: Option<String>,
    #[serde(deserialize_with = "lenient")]
    group_label_font_style: Option<String>,
    #[serde(deserialize_with = "lenient")]
    group_label_opacity: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    group_label_outline: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    min_group_size_for_label: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    show_group_images: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    group_image_size: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    group_image_mapping: Option<String>,
    #[serde(deserialize_with = "lenient")]
    show_legend: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    legend_position: Option<String>,
    #[serde(deserialize_with = "lenient")]
    legend_text_color: Option<ColorSetting>,
    #[serde(deserialize_with = "lenient")]
    show_tooltip: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    enable_zoom: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    enable_debug: Option<bool>,
}
