use std::collections::HashMap;

use thiserror::Error;

use crate::util::{format_large_number, group_thousands};

use super::data::Cell;
use super::scale::SqrtScale;
use super::selection::SelectionState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("no row carried a finite, positive measure")]
    NoValidRows,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub name: String,
    pub group: String,
    pub value: f64,
    pub formatted_value: String,
    pub elem: Option<i64>,
    pub radius: f32,
    pub state: SelectionState,
}

impl Item {
    pub fn is_selected(&self) -> bool {
        self.state.is_selected()
    }

    pub fn is_excluded(&self) -> bool {
        self.state == SelectionState::Excluded
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub name: String,
    pub total: f64,
    pub formatted_values: Vec<String>,
    pub formatted_total: String,
    /// First color found in the rows of this group.
    pub color: Option<String>,
    pub items: Vec<Item>,
}

impl Group {
    fn new(name: String) -> Self {
        Self {
            name,
            total: 0.0,
            formatted_values: Vec::new(),
            formatted_total: String::new(),
            color: None,
            items: Vec::new(),
        }
    }

    /// Sum of the item radii, which is what the packer sizes groups by.
    pub fn weight(&self) -> f64 {
        self.items.iter().map(|item| f64::from(item.radius)).sum()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hierarchy {
    pub groups: Vec<Group>,
    pub scale: SqrtScale,
}

impl Hierarchy {
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.groups.iter().flat_map(|group| group.items.iter())
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|group| group.name.as_str()).collect()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct HierarchyBuilder {
    pub dimension_count: usize,
    pub measure_index: usize,
    pub max_items: usize,
    pub radius_range: (f32, f32),
}

impl HierarchyBuilder {
    pub fn new(
        dimension_count: usize,
        measure_index: usize,
        max_items: usize,
        radius_range: (f32, f32),
    ) -> Self {
        Self {
            dimension_count,
            measure_index,
            max_items,
            radius_range,
        }
    }

    fn measure(&self, row: &[Cell]) -> Option<f64> {
        row.get(self.measure_index).and_then(Cell::measure)
    }

    pub fn build(&self, rows: &[Vec<Cell>]) -> Result<Hierarchy, BuildError> {
        // The scale domain covers every valid row, including ones past the item cap.
        let values = rows
            .iter()
            .filter_map(|row| self.measure(row))
            .collect::<Vec<_>>();
        let scale = SqrtScale::from_values(&values, self.radius_range);

        let mut groups: Vec<Group> = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut accepted = 0usize;

        for row in rows {
            if accepted >= self.max_items {
                break;
            }
            let Some(value) = self.measure(row) else {
                continue;
            };

            let primary = row.first();
            let grouping = if self.dimension_count > 1 {
                row.get(1)
            } else {
                None
            };

            let name = primary
                .and_then(Cell::display_text)
                .unwrap_or("Unknown")
                .to_owned();
            let group_name = if self.dimension_count > 1 {
                grouping
                    .and_then(Cell::display_text)
                    .unwrap_or("Other")
                    .to_owned()
            } else {
                "Default".to_owned()
            };
            let formatted_value = row
                .get(self.measure_index)
                .and_then(Cell::display_text)
                .map(str::to_owned)
                .unwrap_or_else(|| value.to_string());
            let state = primary
                .map(|cell| SelectionState::from_code(cell.state_code()))
                .unwrap_or_default();

            let index = *group_index.entry(group_name.clone()).or_insert_with(|| {
                groups.push(Group::new(group_name.clone()));
                groups.len() - 1
            });
            let group = &mut groups[index];

            if group.color.is_none() {
                group.color = grouping.and_then(Cell::embedded_color);
            }
            group.total += value;
            group.formatted_values.push(formatted_value.clone());
            group.items.push(Item {
                name,
                group: group_name,
                value,
                formatted_value,
                elem: primary.and_then(|cell| cell.elem),
                radius: scale.scale(value),
                state,
            });
            accepted += 1;
        }

        if groups.is_empty() {
            return Err(BuildError::NoValidRows);
        }

        for group in &mut groups {
            if let Some(sample) = group.formatted_values.first() {
                group.formatted_total = format_group_total(group.total, sample);
            }
        }

        Ok(Hierarchy { groups, scale })
    }
}

/// Formats a group total using the precision and separator style of one of its
/// member values.
pub fn format_group_total(total: f64, sample: &str) -> String {
    let uses_separators = sample.contains(',');
    let decimals = sample
        .split_once('.')
        .map(|(_, fraction)| fraction.chars().take_while(char::is_ascii_digit).count())
        .unwrap_or(0);

    if total >= 1e3 {
        return format_large_number(total, decimals.max(1));
    }

    let plain = format!("{total:.decimals$}");
    if uses_separators {
        group_thousands(&plain)
    } else {
        plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str) -> Cell {
        Cell {
            text: Some(text.to_owned()),
            ..Cell::default()
        }
    }

    fn measure(value: f64) -> Cell {
        Cell {
            num: Some(value),
            text: Some(value.to_string()),
            ..Cell::default()
        }
    }

    fn row(item: &str, group: &str, value: f64) -> Vec<Cell> {
        vec![cell(item), cell(group), measure(value)]
    }

    fn builder(max_items: usize) -> HierarchyBuilder {
        HierarchyBuilder::new(2, 2, max_items, (20.0, 120.0))
    }

    #[test]
    fn groups_items_and_totals() {
        let rows = vec![row("A", "G1", 100.0), row("B", "G1", 300.0), row("C", "G2", 50.0)];
        let hierarchy = builder(10).build(&rows).unwrap();

        assert_eq!(hierarchy.group_names(), vec!["G1", "G2"]);
        assert_eq!(hierarchy.groups[0].total, 400.0);
        assert_eq!(hierarchy.groups[1].total, 50.0);
        assert_eq!(hierarchy.item_count(), 3);
    }

    #[test]
    fn invalid_measures_are_skipped_everywhere() {
        let rows = vec![
            row("A", "G1", 10.0),
            row("B", "G1", -5.0),
            row("C", "G2", 0.0),
            row("D", "G2", f64::NAN),
            row("E", "G3", 90.0),
        ];
        let hierarchy = builder(10).build(&rows).unwrap();

        assert_eq!(hierarchy.scale.domain(), (10.0, 90.0));
        assert_eq!(hierarchy.group_names(), vec!["G1", "G3"]);
        let names = hierarchy.items().map(|item| item.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "E"]);
    }

    #[test]
    fn first_valid_rows_win_the_item_cap() {
        let rows = vec![
            row("A", "G1", 1.0),
            row("skip", "G1", 0.0),
            row("B", "G2", 2.0),
            row("C", "G1", 3.0),
            row("D", "G3", 400.0),
        ];
        let hierarchy = builder(3).build(&rows).unwrap();

        let names = hierarchy.items().map(|item| item.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "C", "B"]);
        assert_eq!(hierarchy.item_count(), 3);
        assert_eq!(hierarchy.group_names(), vec!["G1", "G2"]);
        // The capped-out row still widens the scale domain.
        assert_eq!(hierarchy.scale.domain(), (1.0, 400.0));
    }

    #[test]
    fn no_valid_rows_is_an_error() {
        let rows = vec![row("A", "G1", 0.0)];
        assert_eq!(builder(10).build(&rows), Err(BuildError::NoValidRows));
    }

    #[test]
    fn names_fall_back() {
        let rows = vec![vec![cell(""), cell(""), measure(5.0)]];
        let hierarchy = builder(10).build(&rows).unwrap();

        assert_eq!(hierarchy.groups[0].name, "Other");
        assert_eq!(hierarchy.groups[0].items[0].name, "Unknown");
    }

    #[test]
    fn single_dimension_uses_default_group() {
        let rows = vec![vec![cell("A"), measure(5.0)], vec![cell("B"), measure(8.0)]];
        let hierarchy = HierarchyBuilder::new(1, 1, 10, (20.0, 120.0))
            .build(&rows)
            .unwrap();

        assert_eq!(hierarchy.group_names(), vec!["Default"]);
        assert_eq!(hierarchy.item_count(), 2);
    }

    #[test]
    fn formatted_value_falls_back_to_raw_value() {
        let rows = vec![vec![
            cell("A"),
            cell("G"),
            Cell {
                num: Some(12.5),
                ..Cell::default()
            },
        ]];
        let hierarchy = builder(10).build(&rows).unwrap();

        assert_eq!(hierarchy.groups[0].items[0].formatted_value, "12.5");
    }

    #[test]
    fn state_codes_map_to_selection_states() {
        let mut rows = Vec::new();
        for (name, code) in [("s", "S"), ("l", "L"), ("x", "X"), ("a", "A"), ("o", "O")] {
            let mut primary = cell(name);
            primary.state = Some(code.to_owned());
            rows.push(vec![primary, cell("G"), measure(1.0)]);
        }
        let hierarchy = builder(10).build(&rows).unwrap();
        let items = &hierarchy.groups[0].items;

        assert!(items[0].is_selected());
        assert!(items[1].is_selected());
        assert_eq!(items[1].state, SelectionState::Locked);
        assert!(items[2].is_excluded());
        assert_eq!(items[3].state, SelectionState::Alternative);
        assert!(!items[4].is_selected() && !items[4].is_excluded());
    }

    #[test]
    fn first_embedded_group_color_wins() {
        let mut red = cell("G1");
        red.attr_exps.push(crate::chart::data::AttrValue {
            text: Some("#ff0000".to_owned()),
            num: None,
        });
        let mut blue = cell("G1");
        blue.attr_exps.push(crate::chart::data::AttrValue {
            text: Some("#0000ff".to_owned()),
            num: None,
        });
        let rows = vec![
            vec![cell("A"), cell("G1"), measure(1.0)],
            vec![cell("B"), red, measure(2.0)],
            vec![cell("C"), blue, measure(3.0)],
        ];
        let hierarchy = builder(10).build(&rows).unwrap();

        assert_eq!(hierarchy.groups[0].color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn radii_come_from_the_sqrt_scale() {
        let rows = vec![row("A", "G1", 4.0), row("B", "G1", 100.0)];
        let hierarchy = builder(10).build(&rows).unwrap();
        let items = &hierarchy.groups[0].items;

        assert!((items[0].radius - 20.0).abs() < 1e-4);
        assert!((items[1].radius - 120.0).abs() < 1e-4);
        assert!((hierarchy.groups[0].weight() - 140.0).abs() < 1e-3);
    }

    #[test]
    fn group_totals_reuse_the_sample_format() {
        assert_eq!(format_group_total(400.0, "100"), "400");
        assert_eq!(format_group_total(12.5, "1.25"), "12.50");
        assert_eq!(format_group_total(1_234.0, "1,000"), "1.2K");
        assert_eq!(format_group_total(2_500_000.0, "1,250,000.00"), "2.50M");
        assert_eq!(format_group_total(7.0e9, "$3.5B"), "7.0B");
        assert_eq!(format_group_total(3.0e12, "1"), "3.0T");
    }
}
