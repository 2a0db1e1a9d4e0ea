//! Per-group color resolution.

use std::collections::HashMap;

use super::hierarchy::Group;
use super::palette::{FALLBACK_COLORS, Palette};
use super::settings::{ChartSettings, ColorMode};

mod cache;
mod extract;
mod fetch;
mod source;

pub use cache::ColorCache;
pub use extract::{
    ColorMap, PayloadShape, color_map_payload, extract_color_value, layout_colors,
    merge_row_colors,
};
pub use fetch::{FetchOutcome, FetchRequest, fetch_colors, spawn_fetch, spawn_fingerprint_check};
pub use source::{ColorSource, FileColorSource, SourceError};

/// Color for groups a custom mapping leaves out.
pub const UNMAPPED_COLOR: &str = "#cccccc";

enum Strategy<'a> {
    Single(&'a str),
    Custom(&'a HashMap<String, String>),
    Auto(Palette),
    Master {
        cached: &'a ColorMap,
        embedded: HashMap<&'a str, &'a str>,
    },
}

/// Resolves a group name to a color for one render pass.
pub struct ColorResolver<'a> {
    strategy: Strategy<'a>,
    positions: HashMap<&'a str, usize>,
}

impl<'a> ColorResolver<'a> {
    /// `groups` fixes the first-seen order used by positional strategies.
    pub fn new(settings: &'a ChartSettings, groups: &'a [Group], cached: &'a ColorMap) -> Self {
        let positions = groups
            .iter()
            .enumerate()
            .map(|(index, group)| (group.name.as_str(), index))
            .collect();

        let strategy = match settings.color_mode {
            ColorMode::Single => Strategy::Single(&settings.single_color),
            ColorMode::Custom => Strategy::Custom(&settings.custom_colors),
            ColorMode::Auto => Strategy::Auto(settings.color_palette),
            ColorMode::Master => Strategy::Master {
                cached,
                embedded: groups
                    .iter()
                    .filter_map(|group| {
                        group
                            .color
                            .as_deref()
                            .map(|color| (group.name.as_str(), color))
                    })
                    .collect(),
            },
        };

        Self {
            strategy,
            positions,
        }
    }

    /// Unknown groups take the first palette slot.
    fn position(&self, group: &str) -> usize {
        self.positions.get(group).copied().unwrap_or(0)
    }

    pub fn resolve(&self, group: &str) -> &'a str {
        match &self.strategy {
            Strategy::Single(color) => *color,
            Strategy::Custom(mapping) => (*mapping)
                .get(group)
                .map(String::as_str)
                .unwrap_or(UNMAPPED_COLOR),
            Strategy::Auto(palette) => palette.color(self.position(group)),
            Strategy::Master { cached, embedded } => {
                if let Some(color) = (*cached).get(group) {
                    return color;
                }
                if let Some(color) = embedded.get(group) {
                    return *color;
                }
                FALLBACK_COLORS[self.position(group) % FALLBACK_COLORS.len()]
            }
        }
    }
}
