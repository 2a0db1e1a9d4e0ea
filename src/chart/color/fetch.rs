use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use crate::chart::data::DataSnapshot;

use super::extract::{
    ColorMap, color_map_payload, color_map_ref, fingerprint, layout_colors, merge_row_colors,
    property_value_colors,
};
use super::source::ColorSource;

const COLOR_MAP_PREFIX: &str = "ColorMapModel_";

/// Everything a background fetch needs, detached from the snapshot.
#[derive(Clone, Debug, Default)]
pub struct FetchRequest {
    pub library_id: Option<String>,
    pub color_map_ref: Option<String>,
    pub group_values: Vec<String>,
    pub row_colors: ColorMap,
    pub debug: bool,
}

impl FetchRequest {
    /// `None` when the grouping dimension links to no external colors.
    pub fn from_snapshot(snapshot: &DataSnapshot, debug: bool) -> Option<Self> {
        let dimension = snapshot.grouping_dimension()?;
        let library_id = dimension.library_id.clone().filter(|id| !id.is_empty());
        let color_map_ref = dimension.color_map_ref.clone().filter(|id| !id.is_empty());
        if library_id.is_none() && color_map_ref.is_none() {
            return None;
        }

        let mut row_colors = ColorMap::new();
        merge_row_colors(snapshot.rows(), &mut row_colors);

        Some(Self {
            library_id,
            color_map_ref,
            group_values: snapshot.group_values(),
            row_colors,
            debug,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchOutcome {
    pub colors: ColorMap,
    pub fingerprint: Option<String>,
}

/// Runs the fallback chain against `source`. A direct color map reference
/// wins over the master dimension. Lookup failures move on to the next
/// strategy; the result is empty when nothing produced a color.
pub fn fetch_colors(source: &dyn ColorSource, request: &FetchRequest) -> FetchOutcome {
    let debug = request.debug;
    let mut outcome = match (&request.library_id, &request.color_map_ref) {
        (_, Some(reference)) => {
            debug_log!(debug, reference = %reference, "fetching linked color map");
            let colors = match source.object_layout(reference) {
                Ok(payload) => color_map_payload(&payload, &request.group_values),
                Err(error) => {
                    debug_warn!(debug, %error, reference = %reference, "color map lookup failed");
                    ColorMap::new()
                }
            };
            FetchOutcome {
                colors,
                fingerprint: None,
            }
        }
        (Some(library_id), None) => fetch_master_dimension(source, library_id, request),
        (None, None) => FetchOutcome::default(),
    };

    for (group, color) in &request.row_colors {
        outcome
            .colors
            .entry(group.clone())
            .or_insert_with(|| color.clone());
    }

    debug_log!(debug, count = outcome.colors.len(), "color fetch finished");
    outcome
}

fn fetch_master_dimension(
    source: &dyn ColorSource,
    library_id: &str,
    request: &FetchRequest,
) -> FetchOutcome {
    let debug = request.debug;
    debug_log!(debug, library_id, "fetching master dimension");

    let layout = match source.dimension_layout(library_id) {
        Ok(layout) => layout,
        Err(error) => {
            debug_warn!(
                debug,
                %error,
                library_id,
                "master dimension lookup failed, trying generic object"
            );
            let colors = match source.object_layout(library_id) {
                Ok(layout) => layout_colors(&layout, &request.group_values),
                Err(error) => {
                    debug_warn!(debug, %error, library_id, "generic object lookup failed");
                    ColorMap::new()
                }
            };
            return FetchOutcome {
                colors,
                fingerprint: None,
            };
        }
    };

    let fingerprint = fingerprint(&layout);
    debug_log!(debug, fingerprint = ?fingerprint, "master dimension layout received");

    let Some(reference) = color_map_ref(&layout) else {
        return FetchOutcome {
            colors: layout_colors(&layout, &request.group_values),
            fingerprint,
        };
    };

    let from_properties = source
        .dimension_properties(library_id)
        .map(|properties| property_value_colors(&properties))
        .unwrap_or_default();
    if !from_properties.is_empty() {
        debug_log!(debug, count = from_properties.len(), "colors from dimension properties");
        return FetchOutcome {
            colors: from_properties,
            fingerprint,
        };
    }

    let object_id = format!("{COLOR_MAP_PREFIX}{reference}");
    debug_log!(debug, object_id = %object_id, "fetching color map object");
    let colors = match source.object_layout(&object_id) {
        Ok(payload) => color_map_payload(&payload, &request.group_values),
        Err(error) => {
            debug_warn!(
                debug,
                %error,
                object_id = %object_id,
                "color map lookup failed, using layout colors"
            );
            layout_colors(&layout, &request.group_values)
        }
    };

    FetchOutcome {
        colors,
        fingerprint,
    }
}

pub fn spawn_fetch(source: Arc<dyn ColorSource>, request: FetchRequest) -> Receiver<FetchOutcome> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let outcome = fetch_colors(source.as_ref(), &request);
        let _ = tx.send(outcome);
    });

    rx
}

/// Re-reads the master dimension fingerprint in the background. Sends `None`
/// when the lookup fails or the layout has no fingerprint.
pub fn spawn_fingerprint_check(
    source: Arc<dyn ColorSource>,
    library_id: String,
    debug: bool,
) -> Receiver<Option<String>> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let observed = source
            .dimension_layout(&library_id)
            .ok()
            .and_then(|layout| fingerprint(&layout));
        debug_log!(debug, library_id = %library_id, observed = ?observed, "fingerprint check");
        let _ = tx.send(observed);
    });

    rx
}
