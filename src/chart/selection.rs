use std::collections::HashSet;

use super::data::Cell;
use super::hierarchy::Item;

/// Opacity applied to everything outside the active selection.
pub const DIMMED_OPACITY: f32 = 0.2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Optional,
    Selected,
    Excluded,
    Alternative,
    Locked,
}

impl SelectionState {
    pub fn from_code(code: &str) -> Self {
        match code {
            "S" => Self::Selected,
            "L" => Self::Locked,
            "X" => Self::Excluded,
            "A" => Self::Alternative,
            _ => Self::Optional,
        }
    }

    pub fn is_selected(self) -> bool {
        matches!(self, Self::Selected | Self::Locked)
    }
}

/// Items clicked locally whose selection the external engine has not confirmed yet.
#[derive(Clone, Debug, Default)]
pub struct SelectionTracker {
    pending: HashSet<String>,
}

impl SelectionTracker {
    /// Returns true when the item is pending after the toggle.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.pending.remove(name) {
            false
        } else {
            self.pending.insert(name.to_owned());
            true
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pending.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// True when any row reports a confirmed, non-default state.
pub fn has_confirmed_selection(rows: &[Vec<Cell>]) -> bool {
    rows.iter()
        .filter_map(|row| row.first())
        .any(|cell| SelectionState::from_code(cell.state_code()) != SelectionState::Optional)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
    /// No selection signal is active.
    Neutral,
    Emphasized,
    Dimmed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Opacities {
    pub fill: f32,
    pub stroke: f32,
    pub label: f32,
}

impl Emphasis {
    pub fn opacities(self, bubble_opacity: f32, border_opacity: f32) -> Opacities {
        match self {
            Self::Neutral => Opacities {
                fill: bubble_opacity,
                stroke: border_opacity,
                label: 1.0,
            },
            Self::Emphasized => Opacities {
                fill: 1.0,
                stroke: border_opacity,
                label: 1.0,
            },
            Self::Dimmed => Opacities {
                fill: DIMMED_OPACITY,
                stroke: DIMMED_OPACITY,
                label: DIMMED_OPACITY,
            },
        }
    }
}

/// Selection signals observed by one render pass.
#[derive(Clone, Copy, Debug)]
pub struct SelectionView<'a> {
    pub tracker: &'a SelectionTracker,
    pub confirmed_active: bool,
}

impl SelectionView<'_> {
    pub fn emphasis(&self, item: &Item) -> Emphasis {
        // Pending clicks win over the engine's confirmed state until it catches up.
        if !self.tracker.is_empty() {
            return if self.tracker.contains(&item.name) {
                Emphasis::Emphasized
            } else {
                Emphasis::Dimmed
            };
        }

        if self.confirmed_active {
            return if item.is_selected() {
                Emphasis::Emphasized
            } else {
                Emphasis::Dimmed
            };
        }

        Emphasis::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, state: SelectionState) -> Item {
        Item {
            name: name.to_owned(),
            group: "G".to_owned(),
            value: 1.0,
            formatted_value: "1".to_owned(),
            elem: Some(0),
            radius: 10.0,
            state,
        }
    }

    fn row_with_state(code: &str) -> Vec<Cell> {
        vec![Cell {
            state: Some(code.to_owned()),
            ..Cell::default()
        }]
    }

    #[test]
    fn toggling_twice_restores_the_tracker() {
        let mut tracker = SelectionTracker::default();
        tracker.toggle("keep");

        assert!(tracker.toggle("x"));
        assert!(!tracker.toggle("x"));
        assert_eq!(tracker.len(), 1);
        assert!(tracker.contains("keep"));
        assert!(!tracker.contains("x"));
    }

    #[test]
    fn any_non_default_row_state_is_a_confirmed_selection() {
        assert!(!has_confirmed_selection(&[row_with_state("O"), vec![]]));
        assert!(has_confirmed_selection(&[row_with_state("O"), row_with_state("X")]));
        assert!(has_confirmed_selection(&[row_with_state("L")]));
    }

    #[test]
    fn no_signal_is_neutral() {
        let tracker = SelectionTracker::default();
        let view = SelectionView {
            tracker: &tracker,
            confirmed_active: false,
        };

        assert_eq!(view.emphasis(&item("a", SelectionState::Optional)), Emphasis::Neutral);
    }

    #[test]
    fn confirmed_selection_emphasizes_selected_and_locked() {
        let tracker = SelectionTracker::default();
        let view = SelectionView {
            tracker: &tracker,
            confirmed_active: true,
        };

        assert_eq!(view.emphasis(&item("a", SelectionState::Selected)), Emphasis::Emphasized);
        assert_eq!(view.emphasis(&item("b", SelectionState::Locked)), Emphasis::Emphasized);
        assert_eq!(view.emphasis(&item("c", SelectionState::Excluded)), Emphasis::Dimmed);
        assert_eq!(view.emphasis(&item("d", SelectionState::Alternative)), Emphasis::Dimmed);
    }

    #[test]
    fn pending_selection_takes_precedence() {
        let mut tracker = SelectionTracker::default();
        tracker.toggle("c");
        let view = SelectionView {
            tracker: &tracker,
            confirmed_active: true,
        };

        assert_eq!(view.emphasis(&item("a", SelectionState::Selected)), Emphasis::Dimmed);
        assert_eq!(view.emphasis(&item("c", SelectionState::Excluded)), Emphasis::Emphasized);
    }

    #[test]
    fn emphasis_maps_to_opacities() {
        let neutral = Emphasis::Neutral.opacities(0.7, 0.9);
        let emphasized = Emphasis::Emphasized.opacities(0.7, 0.9);
        let dimmed = Emphasis::Dimmed.opacities(0.7, 0.9);

        assert_eq!(neutral, Opacities { fill: 0.7, stroke: 0.9, label: 1.0 });
        assert_eq!(emphasized, Opacities { fill: 1.0, stroke: 0.9, label: 1.0 });
        assert_eq!(dimmed, Opacities { fill: 0.2, stroke: 0.2, label: 0.2 });
    }
}
