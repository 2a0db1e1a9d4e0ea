use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};


use super::color::{
    ColorCache, ColorMap, ColorSource, FetchOutcome, FetchRequest, spawn_fetch,
    spawn_fingerprint_check,
};
use super::data::DataSnapshot;
use super::hierarchy::HierarchyBuilder;
use super::render::{RenderFrame, Viewport};
use super::selection::{SelectionTracker, SelectionView, has_confirmed_selection};
use super::settings::{ChartSettings, ColorMode};

/// Receives selection requests produced by clicks.
pub trait SelectionEngine {
    fn select_values(&mut self, dimension: usize, elements: &[i64], toggle: bool);
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderOutcome {
    /// A color fetch is still outstanding; nothing was touched.
    Skipped,
    /// No snapshot or no rows yet.
    Loading,
    /// A color fetch just started; the host shows a spinner until `poll`
    /// requests a re-render.
    FetchingColors,
    NoData,
    NoValidRows,
    Ready(Box<RenderFrame>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollEvent {
    Rerender,
}

/// Per-mount chart state: color cache, pending selections and the background
/// workers feeding them.
#[derive(Default)]
pub struct ChartInstance {
    source: Option<Arc<dyn ColorSource>>,
    cache: ColorCache,
    tracker: SelectionTracker,
    fetch_rx: Option<Receiver<FetchOutcome>>,
    check_rx: Option<Receiver<Option<String>>>,
    debug: bool,
}

impl ChartInstance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(source: Arc<dyn ColorSource>) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    pub fn cache(&self) -> &ColorCache {
        &self.cache
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    /// True while a fetch or fingerprint check is running.
    pub fn is_busy(&self) -> bool {
        self.fetch_rx.is_some() || self.check_rx.is_some()
    }

    pub fn render(
        &mut self,
        snapshot: Option<&DataSnapshot>,
        settings: &ChartSettings,
        viewport: Viewport,
    ) -> RenderOutcome {
        if self.cache.is_fetching() {
            return RenderOutcome::Skipped;
        }

        let settings = settings.clone().normalize();
        self.debug = settings.enable_debug;
        let debug = self.debug;

        let Some(snapshot) = snapshot else {
            return RenderOutcome::Loading;
        };
        let Some(rows) = snapshot.rows.as_deref() else {
            return RenderOutcome::Loading;
        };
        if rows.is_empty() {
            debug_log!(debug, "snapshot has no rows");
            return RenderOutcome::NoData;
        }

        if settings.color_mode == ColorMode::Master && self.sync_master_colors(snapshot) {
            return RenderOutcome::FetchingColors;
        }

        let confirmed_active = has_confirmed_selection(rows);
        if confirmed_active && !self.tracker.is_empty() {
            debug_log!(debug, pending = self.tracker.len(), "confirmed selection replaces pending clicks");
            self.tracker.clear();
        }

        let builder = HierarchyBuilder::new(
            snapshot.dimension_count(),
            snapshot.measure_index(),
            settings.max_bubbles,
            (settings.min_bubble_size, settings.max_bubble_size),
        );
        let hierarchy = match builder.build(rows) {
            Ok(hierarchy) => hierarchy,
            Err(error) => {
                debug_log!(debug, %error, "nothing to draw");
                return RenderOutcome::NoValidRows;
            }
        };
        debug_log!(
            debug,
            groups = hierarchy.groups.len(),
            items = hierarchy.item_count(),
            "hierarchy built"
        );

        let empty = ColorMap::new();
        let cached = if settings.color_mode == ColorMode::Master {
            self.cache.colors()
        } else {
            &empty
        };
        let selection = SelectionView {
            tracker: &self.tracker,
            confirmed_active,
        };
        let frame = RenderFrame::compose(&hierarchy, &settings, cached, selection, viewport);
        RenderOutcome::Ready(Box::new(frame))
    }

    /// Starts a fetch when master colors are missing, or a freshness check when
    /// cached ones carry a fingerprint. Returns true when rendering has to wait.
    fn sync_master_colors(&mut self, snapshot: &DataSnapshot) -> bool {
        let Some(source) = self.source.clone() else {
            return false;
        };

        if !self.cache.is_fetched() {
            let Some(request) = FetchRequest::from_snapshot(snapshot, self.debug) else {
                return false;
            };
            debug_log!(
                self.debug,
                library_id = ?request.library_id,
                color_map_ref = ?request.color_map_ref,
                "starting color fetch"
            );
            self.cache.begin_fetch();
            self.fetch_rx = Some(spawn_fetch(source, request));
            return true;
        }

        if self.cache.has_colors()
            && self.cache.fingerprint().is_some()
            && self.check_rx.is_none()
            && let Some(library_id) = snapshot
                .grouping_dimension()
                .and_then(|dimension| dimension.library_id.clone())
                .filter(|id| !id.is_empty())
        {
            self.check_rx = Some(spawn_fingerprint_check(source, library_id, self.debug));
        }
        false
    }

    /// Drains finished background work. `Some(Rerender)` means the host should
    /// call `render` again.
    pub fn poll(&mut self) -> Option<PollEvent> {
        let mut rerender = false;

        if let Some(rx) = self.fetch_rx.take() {
            match rx.try_recv() {
                Ok(outcome) => {
                    debug_log!(
                        self.debug,
                        colors = outcome.colors.len(),
                        fingerprint = ?outcome.fingerprint,
                        "colors fetched"
                    );
                    self.cache.store(outcome.colors, outcome.fingerprint);
                    rerender = true;
                }
                Err(TryRecvError::Empty) => self.fetch_rx = Some(rx),
                Err(TryRecvError::Disconnected) => {
                    debug_warn!(self.debug, "color fetch worker disconnected");
                    self.cache.store(ColorMap::new(), None);
                    rerender = true;
                }
            }
        }

        if let Some(rx) = self.check_rx.take() {
            match rx.try_recv() {
                Ok(observed) => {
                    if self.cache.observe_fingerprint(observed.as_deref()) {
                        debug_log!(self.debug, observed = ?observed, "colors changed upstream");
                        rerender = true;
                    }
                }
                Err(TryRecvError::Empty) => self.check_rx = Some(rx),
                Err(TryRecvError::Disconnected) => {}
            }
        }

        rerender.then_some(PollEvent::Rerender)
    }

    /// Toggles the clicked leaf in the pending set and forwards the selection.
    /// Returns false when `index` is not a leaf of `frame`.
    pub fn click(
        &mut self,
        frame: &RenderFrame,
        index: usize,
        engine: &mut dyn SelectionEngine,
    ) -> bool {
        let Some(item) = frame.item(index) else {
            return false;
        };

        let pending = self.tracker.toggle(&item.name);
        debug_log!(self.debug, item = %item.name, pending, "item clicked");
        if let Some(elem) = item.elem {
            engine.select_values(0, &[elem], true);
        }
        true
    }
}
