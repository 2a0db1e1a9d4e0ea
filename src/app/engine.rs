use std::collections::HashSet;
use std::time::{Duration, Instant};

use bubblepack::chart::{DataSnapshot, SelectionEngine};
use tracing::debug;

/// How long toggles stay pending before they are written back into the
/// snapshot as a confirmed selection.
pub(in crate::app) const CONFIRM_DELAY: Duration = Duration::from_millis(300);

/// Stand-in for an external selection engine: toggled element numbers are
/// applied to the snapshot's row states after a short delay.
#[derive(Debug, Default)]
pub(in crate::app) struct LocalSelectionEngine {
    selected: HashSet<i64>,
    queued: Vec<i64>,
    queued_at: Option<Instant>,
}

impl SelectionEngine for LocalSelectionEngine {
    fn select_values(&mut self, dimension: usize, elements: &[i64], toggle: bool) {
        debug!(dimension, ?elements, toggle, "selection requested");
        if !toggle {
            self.selected.clear();
        }
        self.queued.extend_from_slice(elements);
        self.queued_at = Some(Instant::now());
    }
}

impl LocalSelectionEngine {
    pub(in crate::app) fn has_queued(&self) -> bool {
        self.queued_at.is_some()
    }

    /// Applies queued toggles once `CONFIRM_DELAY` has passed since the last
    /// one. Returns true when the snapshot changed.
    pub(in crate::app) fn apply_due(&mut self, now: Instant, snapshot: &mut DataSnapshot) -> bool {
        let Some(queued_at) = self.queued_at else {
            return false;
        };
        if now.duration_since(queued_at) < CONFIRM_DELAY {
            return false;
        }

        for elem in self.queued.drain(..) {
            if !self.selected.remove(&elem) {
                self.selected.insert(elem);
            }
        }
        self.queued_at = None;
        self.write_states(snapshot);
        true
    }

    pub(in crate::app) fn clear(&mut self, snapshot: &mut DataSnapshot) {
        self.selected.clear();
        self.queued.clear();
        self.queued_at = None;
        self.write_states(snapshot);
    }

    fn write_states(&self, snapshot: &mut DataSnapshot) {
        let Some(rows) = snapshot.rows.as_mut() else {
            return;
        };

        for cell in rows.iter_mut().filter_map(|row| row.first_mut()) {
            let state = match cell.elem {
                _ if self.selected.is_empty() => "O",
                Some(elem) if self.selected.contains(&elem) => "S",
                _ => "X",
            };
            cell.state = Some(state.to_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use bubblepack::chart::Cell;

    use super::*;

    fn snapshot() -> DataSnapshot {
        let row = |elem| {
            vec![Cell {
                text: Some(format!("item {elem}")),
                elem: Some(elem),
                ..Cell::default()
            }]
        };
        DataSnapshot {
            rows: Some(vec![row(1), row(2), row(3)]),
            ..DataSnapshot::default()
        }
    }

    fn states(snapshot: &DataSnapshot) -> Vec<&str> {
        snapshot.rows().iter().map(|row| row[0].state_code()).collect()
    }

    #[test]
    fn toggles_wait_for_the_confirm_delay() {
        let mut engine = LocalSelectionEngine::default();
        let mut snapshot = snapshot();

        engine.select_values(0, &[2], true);
        assert!(engine.has_queued());
        assert!(!engine.apply_due(Instant::now(), &mut snapshot));
        assert_eq!(states(&snapshot), vec!["O", "O", "O"]);

        let later = Instant::now() + CONFIRM_DELAY;
        assert!(engine.apply_due(later, &mut snapshot));
        assert_eq!(states(&snapshot), vec!["X", "S", "X"]);
        assert!(!engine.has_queued());
    }

    #[test]
    fn toggling_twice_deselects() {
        let mut engine = LocalSelectionEngine::default();
        let mut snapshot = snapshot();

        engine.select_values(0, &[1], true);
        engine.apply_due(Instant::now() + CONFIRM_DELAY, &mut snapshot);
        engine.select_values(0, &[1], true);
        engine.apply_due(Instant::now() + CONFIRM_DELAY, &mut snapshot);

        assert_eq!(states(&snapshot), vec!["O", "O", "O"]);
    }

    #[test]
    fn clear_resets_every_row() {
        let mut engine = LocalSelectionEngine::default();
        let mut snapshot = snapshot();

        engine.select_values(0, &[3], true);
        engine.apply_due(Instant::now() + CONFIRM_DELAY, &mut snapshot);
        engine.clear(&mut snapshot);

        assert_eq!(states(&snapshot), vec!["O", "O", "O"]);
    }
}
