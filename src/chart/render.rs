//! Turns a hierarchy into positioned draw commands.
//!
//! Coordinates are in viewport pixels with the origin at the top-left corner;
//! text positions are baselines. Colors stay as the CSS strings the settings and
//! color sources use, the host converts them when painting.

use crate::util::truncate_label;

use super::color::{ColorMap, ColorResolver};
use super::hierarchy::{Hierarchy, Item};
use super::pack::{NodeKind, pack};
use super::selection::{Emphasis, SelectionView};
use super::settings::{ChartSettings, FontStyle, LegendPosition};

const EDGE_MARGIN: f32 = 20.0;
const SIDE_LEGEND_MARGIN: f32 = 150.0;
const STACKED_LEGEND_MARGIN: f32 = 100.0;

const LABEL_SCALE: f32 = 0.4;
const VALUE_SCALE: f32 = 0.3;
const VALUE_SIZE_RATIO: f32 = 0.8;
const GROUP_LABEL_SCALE: f32 = 0.1;
const GROUP_LABEL_MIN_SIZE: f32 = 12.0;
const GROUP_LABEL_GAP: f32 = 10.0;
const GROUP_STROKE_WIDTH: f32 = 2.0;
const GROUP_IMAGE_GAP: f32 = 5.0;

const LEGEND_SWATCH_RADIUS: f32 = 6.0;
const LEGEND_ROW_HEIGHT: f32 = 20.0;
const LEGEND_COLUMN_WIDTH: f32 = 100.0;
const LEGEND_COLUMNS: usize = 5;
const LEGEND_TEXT_SIZE: f32 = 12.0;

pub const HOVER_SCALE: f32 = 1.08;
pub const SHADOW_COLOR: &str = "rgba(0,0,0,0.3)";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn for_legend(show_legend: bool, position: LegendPosition) -> Self {
        let widened = |side: LegendPosition, size: f32| {
            if show_legend && position == side {
                size
            } else {
                EDGE_MARGIN
            }
        };

        Self {
            top: widened(LegendPosition::Top, STACKED_LEGEND_MARGIN),
            right: widened(LegendPosition::Right, SIDE_LEGEND_MARGIN),
            bottom: widened(LegendPosition::Bottom, STACKED_LEGEND_MARGIN),
            left: widened(LegendPosition::Left, SIDE_LEGEND_MARGIN),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemRef {
    pub name: String,
    pub group: String,
    pub formatted_value: String,
    pub elem: Option<i64>,
}

impl From<&Item> for ItemRef {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            group: item.group.clone(),
            formatted_value: item.formatted_value.clone(),
            elem: item.elem,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    pub blur: f32,
    pub offset: [f32; 2],
}

#[derive(Clone, Debug, PartialEq)]
pub struct CircleShape {
    pub kind: NodeKind,
    pub center: [f32; 2],
    pub radius: f32,
    pub fill: Option<String>,
    pub fill_opacity: f32,
    pub stroke: Option<String>,
    pub stroke_width: f32,
    pub stroke_opacity: f32,
    pub shadow: Option<Shadow>,
    /// Present on leaves only.
    pub item: Option<ItemRef>,
}

impl CircleShape {
    pub fn contains(&self, point: [f32; 2]) -> bool {
        let dx = point[0] - self.center[0];
        let dy = point[1] - self.center[1];
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub position: [f32; 2],
    pub color: String,
    pub size: f32,
    pub font: FontStyle,
    pub opacity: f32,
    pub outline: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupImage {
    pub group: String,
    pub source: String,
    /// Top-left corner of the image.
    pub origin: [f32; 2],
    pub size: f32,
    pub badge_center: [f32; 2],
    pub badge_radius: f32,
    pub badge_stroke: String,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
    pub opacity: f32,
    pub swatch_center: [f32; 2],
    pub swatch_radius: f32,
    pub text_position: [f32; 2],
    pub text_color: String,
    pub text_size: f32,
}

/// Styling applied to the leaf under the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoverStyle {
    pub scale: f32,
    pub stroke_width: f32,
    pub fill_opacity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderFrame {
    pub viewport: Viewport,
    pub background: String,
    pub center: [f32; 2],
    pub diameter: f32,
    /// Paint order: root, then each group followed by its items.
    pub circles: Vec<CircleShape>,
    pub labels: Vec<TextLabel>,
    pub group_labels: Vec<TextLabel>,
    pub group_images: Vec<GroupImage>,
    pub legend: Vec<LegendEntry>,
    pub hover: Option<HoverStyle>,
    pub show_tooltip: bool,
}

impl RenderFrame {
    pub fn compose(
        hierarchy: &Hierarchy,
        settings: &ChartSettings,
        cached_colors: &ColorMap,
        selection: SelectionView<'_>,
        viewport: Viewport,
    ) -> Self {
        let margins = Margins::for_legend(settings.show_legend, settings.legend_position);
        let chart_width = viewport.width - margins.left - margins.right;
        let chart_height = viewport.height - margins.top - margins.bottom;
        let diameter = chart_width.min(chart_height).max(0.0);
        let center = [
            margins.left + chart_width / 2.0,
            margins.top + chart_height / 2.0,
        ];

        let layout = pack(hierarchy, diameter, settings.packing_density);
        let resolver = ColorResolver::new(settings, &hierarchy.groups, cached_colors);

        let mut frame = Self {
            viewport,
            background: settings.background_color.clone(),
            center,
            diameter,
            circles: Vec::with_capacity(layout.nodes.len()),
            labels: Vec::new(),
            group_labels: Vec::new(),
            group_images: Vec::new(),
            legend: Vec::new(),
            hover: (settings.enable_hover_effect && selection.tracker.is_empty()).then_some(
                HoverStyle {
                    scale: HOVER_SCALE,
                    stroke_width: settings.stroke_width + 2.0,
                    fill_opacity: settings.hover_opacity,
                },
            ),
            show_tooltip: settings.show_tooltip,
        };

        for node in &layout.nodes {
            let position = [center[0] + node.x, center[1] + node.y];
            match node.kind {
                NodeKind::Root => frame.circles.push(CircleShape {
                    kind: node.kind,
                    center: position,
                    radius: node.r,
                    fill: None,
                    fill_opacity: 0.0,
                    stroke: None,
                    stroke_width: 0.0,
                    stroke_opacity: 0.0,
                    shadow: None,
                    item: None,
                }),
                NodeKind::Group { group } => {
                    let Some(group) = hierarchy.groups.get(group) else {
                        continue;
                    };
                    let color = resolver.resolve(&group.name);
                    let shown = settings.show_group_bubbles;
                    frame.circles.push(CircleShape {
                        kind: node.kind,
                        center: position,
                        radius: node.r,
                        fill: shown.then(|| color.to_owned()),
                        fill_opacity: if shown { settings.group_bubble_opacity } else { 0.0 },
                        stroke: shown.then(|| color.to_owned()),
                        stroke_width: if shown { GROUP_STROKE_WIDTH } else { 0.0 },
                        stroke_opacity: if shown { settings.group_border_opacity } else { 0.0 },
                        shadow: None,
                        item: None,
                    });

                    if settings.show_labels
                        && shown
                        && settings.show_group_labels
                        && node.r > settings.min_group_size_for_label
                    {
                        frame.push_group_decorations(settings, &group.name, color, position, node.r);
                    }
                }
                NodeKind::Item { group, item } => {
                    let Some(item) = hierarchy.groups.get(group).and_then(|group| group.items.get(item))
                    else {
                        continue;
                    };
                    let emphasis = selection.emphasis(item);
                    let opacities = emphasis.opacities(settings.bubble_opacity, settings.border_opacity);
                    frame.circles.push(CircleShape {
                        kind: node.kind,
                        center: position,
                        radius: node.r,
                        fill: Some(resolver.resolve(&item.group).to_owned()),
                        fill_opacity: opacities.fill,
                        stroke: Some(settings.border_color.clone()),
                        stroke_width: settings.stroke_width,
                        stroke_opacity: opacities.stroke,
                        shadow: settings.enable_shadow.then_some(Shadow {
                            blur: settings.shadow_blur,
                            offset: [settings.shadow_offset_x, settings.shadow_offset_y],
                        }),
                        item: Some(ItemRef::from(item)),
                    });
                    frame.push_item_labels(settings, item, emphasis, position, node.r);
                }
            }
        }

        if settings.show_legend && !hierarchy.groups.is_empty() {
            frame.legend = legend_entries(settings, &hierarchy.group_names(), &resolver, viewport, margins);
        }

        frame
    }

    fn push_item_labels(
        &mut self,
        settings: &ChartSettings,
        item: &Item,
        emphasis: Emphasis,
        position: [f32; 2],
        radius: f32,
    ) {
        if !settings.show_labels || radius <= settings.min_size_for_label {
            return;
        }
        let opacity = emphasis
            .opacities(settings.bubble_opacity, settings.border_opacity)
            .label;

        let size = settings.label_size.min(radius * LABEL_SCALE);
        let shift = if settings.show_values { -0.3 } else { 0.3 };
        self.labels.push(TextLabel {
            text: truncate_label(&item.name, radius),
            position: [position[0], position[1] + shift * size],
            color: settings.label_color.clone(),
            size,
            font: settings.label_font.clone(),
            opacity,
            outline: false,
        });

        if settings.show_values && radius > settings.min_size_for_value {
            let size = (settings.label_size * VALUE_SIZE_RATIO).min(radius * VALUE_SCALE);
            self.labels.push(TextLabel {
                text: item.formatted_value.clone(),
                position: [position[0], position[1] + 1.2 * size],
                color: settings.value_color.clone(),
                size,
                font: settings.value_font.clone(),
                opacity,
                outline: false,
            });
        }
    }

    fn push_group_decorations(
        &mut self,
        settings: &ChartSettings,
        name: &str,
        color: &str,
        position: [f32; 2],
        radius: f32,
    ) {
        if settings.show_group_images
            && let Some(source) = settings.group_image_mapping.get(name)
        {
            let size = settings.group_image_size;
            let top = position[1] - radius - size - GROUP_IMAGE_GAP;
            self.group_images.push(GroupImage {
                group: name.to_owned(),
                source: source.clone(),
                origin: [position[0] - size / 2.0, top],
                size,
                badge_center: [position[0], top + size / 2.0],
                badge_radius: size / 2.0 + 2.0,
                badge_stroke: color.to_owned(),
                opacity: settings.group_label_opacity,
            });
        }

        let size = settings
            .group_label_size
            .min(GROUP_LABEL_MIN_SIZE.max(radius * GROUP_LABEL_SCALE));
        self.group_labels.push(TextLabel {
            text: name.to_owned(),
            position: [position[0], position[1] + radius + GROUP_LABEL_GAP],
            color: color.to_owned(),
            size,
            font: settings.group_label_font.clone(),
            opacity: settings.group_label_opacity,
            outline: settings.group_label_outline,
        });
    }

    /// Index of the topmost leaf circle containing `point`. Groups and the root
    /// never match.
    pub fn hit_test(&self, point: [f32; 2]) -> Option<usize> {
        self.circles
            .iter()
            .enumerate()
            .rev()
            .find(|(_, circle)| circle.item.is_some() && circle.contains(point))
            .map(|(index, _)| index)
    }

    pub fn item(&self, index: usize) -> Option<&ItemRef> {
        self.circles.get(index)?.item.as_ref()
    }

    pub fn tooltip(&self, index: usize) -> Option<Tooltip> {
        if !self.show_tooltip {
            return None;
        }
        let item = self.item(index)?;
        Some(Tooltip {
            title: item.name.clone(),
            lines: vec![
                format!("Group: {}", item.group),
                format!("Value: {}", item.formatted_value),
            ],
        })
    }

    pub fn leaves(&self) -> impl Iterator<Item = &CircleShape> {
        self.circles.iter().filter(|circle| circle.item.is_some())
    }

    pub fn group_circles(&self) -> impl Iterator<Item = &CircleShape> {
        self.circles
            .iter()
            .filter(|circle| matches!(circle.kind, NodeKind::Group { .. }))
    }
}

fn legend_entries(
    settings: &ChartSettings,
    groups: &[&str],
    resolver: &ColorResolver<'_>,
    viewport: Viewport,
    margins: Margins,
) -> Vec<LegendEntry> {
    let half_height = groups.len() as f32 * LEGEND_ROW_HEIGHT / 2.0;
    let origin = match settings.legend_position {
        LegendPosition::Top => [viewport.width / 2.0 - 50.0, EDGE_MARGIN],
        LegendPosition::Bottom => [
            viewport.width / 2.0 - 50.0,
            viewport.height - margins.bottom + EDGE_MARGIN,
        ],
        LegendPosition::Left => [EDGE_MARGIN, viewport.height / 2.0 - half_height],
        LegendPosition::Right => [
            viewport.width - margins.right + EDGE_MARGIN,
            viewport.height / 2.0 - half_height,
        ],
    };

    groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let offset = if settings.legend_position.is_horizontal() {
                [
                    (index % LEGEND_COLUMNS) as f32 * LEGEND_COLUMN_WIDTH,
                    (index / LEGEND_COLUMNS) as f32 * LEGEND_ROW_HEIGHT,
                ]
            } else {
                [0.0, index as f32 * LEGEND_ROW_HEIGHT]
            };
            let swatch_center = [origin[0] + offset[0], origin[1] + offset[1]];
            LegendEntry {
                label: (*group).to_owned(),
                color: resolver.resolve(group).to_owned(),
                opacity: settings.bubble_opacity,
                swatch_center,
                swatch_radius: LEGEND_SWATCH_RADIUS,
                text_position: [swatch_center[0] + 15.0, swatch_center[1] + 4.0],
                text_color: settings.legend_text_color.clone(),
                text_size: LEGEND_TEXT_SIZE,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::chart::data::Cell;
    use crate::chart::hierarchy::HierarchyBuilder;
    use crate::chart::selection::SelectionTracker;

    fn row(item: &str, group: &str, value: f64, state: &str) -> Vec<Cell> {
        vec![
            Cell {
                text: Some(item.to_owned()),
                elem: Some(value as i64),
                state: Some(state.to_owned()),
                ..Cell::default()
            },
            Cell {
                text: Some(group.to_owned()),
                ..Cell::default()
            },
            Cell {
                text: Some(format!("{value}")),
                num: Some(value),
                ..Cell::default()
            },
        ]
    }

    fn hierarchy(rows: &[Vec<Cell>]) -> Hierarchy {
        HierarchyBuilder::new(2, 2, 50, (20.0, 120.0)).build(rows).unwrap()
    }

    fn sample() -> Hierarchy {
        hierarchy(&[
            row("Alpha", "G1", 100.0, "O"),
            row("Beta", "G1", 300.0, "O"),
            row("Gamma", "G2", 50.0, "O"),
        ])
    }

    fn compose(hierarchy: &Hierarchy, settings: &ChartSettings, tracker: &SelectionTracker) -> RenderFrame {
        RenderFrame::compose(
            hierarchy,
            settings,
            &ColorMap::new(),
            SelectionView {
                tracker,
                confirmed_active: false,
            },
            Viewport::new(800.0, 600.0),
        )
    }

    #[test]
    fn margins_follow_the_legend_side() {
        assert_eq!(
            Margins::for_legend(false, LegendPosition::Right),
            Margins { top: 20.0, right: 20.0, bottom: 20.0, left: 20.0 }
        );
        assert_eq!(Margins::for_legend(true, LegendPosition::Right).right, 150.0);
        assert_eq!(Margins::for_legend(true, LegendPosition::Left).left, 150.0);
        assert_eq!(Margins::for_legend(true, LegendPosition::Bottom).bottom, 100.0);
        assert_eq!(Margins::for_legend(true, LegendPosition::Top).top, 100.0);
    }

    #[test]
    fn diameter_is_the_smaller_chart_side() {
        let frame = compose(&sample(), &ChartSettings::default(), &SelectionTracker::default());

        assert_eq!(frame.diameter, 560.0);
        assert_eq!(frame.center, [400.0, 300.0]);
        assert!((frame.circles[0].radius - 280.0).abs() < 1e-2);
    }

    #[test]
    fn circles_follow_pack_order_with_styles() {
        let settings = ChartSettings::default();
        let frame = compose(&sample(), &settings, &SelectionTracker::default());

        assert_eq!(frame.circles.len(), 6);
        let root = &frame.circles[0];
        assert_eq!(root.kind, NodeKind::Root);
        assert_eq!(root.fill, None);

        let groups = frame.group_circles().collect::<Vec<_>>();
        assert_eq!(groups[0].fill_opacity, settings.group_bubble_opacity);
        assert_eq!(groups[0].stroke_width, 2.0);
        assert_eq!(groups[0].stroke, groups[0].fill);

        for leaf in frame.leaves() {
            assert_eq!(leaf.fill_opacity, settings.bubble_opacity);
            assert_eq!(leaf.stroke.as_deref(), Some(settings.border_color.as_str()));
            assert_eq!(leaf.shadow, None);
        }
        let g1 = frame
            .leaves()
            .find(|leaf| leaf.item.as_ref().is_some_and(|item| item.group == "G1"))
            .unwrap();
        assert_eq!(g1.fill.as_deref(), Some(settings.color_palette.color(0)));
    }

    #[test]
    fn hidden_group_bubbles_have_no_paint_or_labels() {
        let settings = ChartSettings {
            show_group_bubbles: false,
            ..ChartSettings::default()
        };
        let frame = compose(&sample(), &settings, &SelectionTracker::default());

        for group in frame.group_circles() {
            assert_eq!(group.fill, None);
            assert_eq!(group.stroke_width, 0.0);
        }
        assert!(frame.group_labels.is_empty());
    }

    #[test]
    fn labels_respect_size_thresholds() {
        let settings = ChartSettings {
            min_size_for_label: 10_000.0,
            ..ChartSettings::default()
        };
        let frame = compose(&sample(), &settings, &SelectionTracker::default());
        assert!(frame.labels.is_empty());

        let settings = ChartSettings {
            min_size_for_label: 0.0,
            min_size_for_value: 10_000.0,
            ..ChartSettings::default()
        };
        let frame = compose(&sample(), &settings, &SelectionTracker::default());
        assert_eq!(frame.labels.len(), 3);
        for (label, leaf) in frame.labels.iter().zip(frame.leaves()) {
            assert!(label.size <= settings.label_size);
            assert!(label.size <= leaf.radius * LABEL_SCALE + 1e-4);
        }
    }

    #[test]
    fn value_labels_sit_below_names() {
        let settings = ChartSettings {
            min_size_for_label: 0.0,
            min_size_for_value: 0.0,
            ..ChartSettings::default()
        };
        let frame = compose(&sample(), &settings, &SelectionTracker::default());

        assert_eq!(frame.labels.len(), 6);
        let name = &frame.labels[0];
        let value = &frame.labels[1];
        assert!(name.position[1] < value.position[1]);
        assert_eq!(value.color, settings.value_color);
    }

    #[test]
    fn group_labels_sit_under_the_circle() {
        let settings = ChartSettings {
            min_group_size_for_label: 0.0,
            ..ChartSettings::default()
        };
        let frame = compose(&sample(), &settings, &SelectionTracker::default());

        assert_eq!(frame.group_labels.len(), 2);
        for (label, circle) in frame.group_labels.iter().zip(frame.group_circles()) {
            assert!((label.position[1] - (circle.center[1] + circle.radius + 10.0)).abs() < 1e-3);
            assert_eq!(Some(label.color.as_str()), circle.fill.as_deref());
            assert!(label.size >= 12.0 && label.size <= 16.0);
        }
    }

    #[test]
    fn mapped_groups_get_an_image_badge() {
        let settings = ChartSettings {
            min_group_size_for_label: 0.0,
            show_group_images: true,
            group_image_mapping: HashMap::from([("G2".to_owned(), "flags/g2.png".to_owned())]),
            ..ChartSettings::default()
        };
        let frame = compose(&sample(), &settings, &SelectionTracker::default());

        assert_eq!(frame.group_images.len(), 1);
        let image = &frame.group_images[0];
        assert_eq!(image.group, "G2");
        assert_eq!(image.badge_radius, settings.group_image_size / 2.0 + 2.0);
    }

    #[test]
    fn pending_selection_dims_the_rest_and_disables_hover() {
        let mut tracker = SelectionTracker::default();
        tracker.toggle("Gamma");
        let frame = compose(&sample(), &ChartSettings::default(), &tracker);

        for leaf in frame.leaves() {
            let name = &leaf.item.as_ref().unwrap().name;
            let expected = if name == "Gamma" { 1.0 } else { 0.2 };
            assert_eq!(leaf.fill_opacity, expected, "{name}");
        }
        assert_eq!(frame.hover, None);
    }

    #[test]
    fn hover_style_when_idle() {
        let frame = compose(&sample(), &ChartSettings::default(), &SelectionTracker::default());

        assert_eq!(
            frame.hover,
            Some(HoverStyle { scale: 1.08, stroke_width: 4.0, fill_opacity: 1.0 })
        );
    }

    #[test]
    fn hit_test_finds_leaves_only() {
        let frame = compose(&sample(), &ChartSettings::default(), &SelectionTracker::default());
        let leaf_index = frame
            .circles
            .iter()
            .position(|circle| circle.item.is_some())
            .unwrap();
        let leaf = &frame.circles[leaf_index];

        assert_eq!(frame.hit_test(leaf.center), Some(leaf_index));
        assert_eq!(frame.hit_test([1.0, 1.0]), None);

        let tooltip = frame.tooltip(leaf_index).unwrap();
        let item = leaf.item.as_ref().unwrap();
        assert_eq!(tooltip.title, item.name);
        assert_eq!(tooltip.lines[0], format!("Group: {}", item.group));
        assert_eq!(frame.tooltip(0), None);
    }

    #[test]
    fn legend_lists_groups_in_first_seen_order() {
        let settings = ChartSettings {
            show_legend: true,
            ..ChartSettings::default()
        };
        let frame = compose(&sample(), &settings, &SelectionTracker::default());

        let labels = frame.legend.iter().map(|entry| entry.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["G1", "G2"]);
        assert_eq!(frame.legend[0].swatch_center, [670.0, 280.0]);
        assert_eq!(frame.legend[1].swatch_center, [670.0, 300.0]);
        assert_eq!(frame.legend[1].color, settings.color_palette.color(1));
    }

    #[test]
    fn stacked_legend_wraps_every_five() {
        let rows = (0..7)
            .map(|index| row(&format!("I{index}"), &format!("G{index}"), 10.0 + index as f64, "O"))
            .collect::<Vec<_>>();
        let settings = ChartSettings {
            show_legend: true,
            legend_position: LegendPosition::Bottom,
            ..ChartSettings::default()
        };
        let frame = compose(&hierarchy(&rows), &settings, &SelectionTracker::default());

        assert_eq!(frame.legend[0].swatch_center, [350.0, 520.0]);
        assert_eq!(frame.legend[4].swatch_center, [750.0, 520.0]);
        assert_eq!(frame.legend[5].swatch_center, [350.0, 540.0]);
    }
}
