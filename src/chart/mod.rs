//! Hierarchical bubble chart: snapshot rows in, positioned draw commands out.

/// `tracing::debug!` gated on the chart's debug setting.
macro_rules! debug_log {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            ::tracing::debug!($($arg)+);
        }
    };
}

/// `tracing::warn!` gated the same way, for lookups that fall back.
macro_rules! debug_warn {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            ::tracing::warn!($($arg)+);
        }
    };
}

pub mod color;
pub mod data;
pub mod hierarchy;
pub mod instance;
pub mod pack;
pub mod palette;
pub mod render;
pub mod scale;
pub mod selection;
pub mod settings;

pub use color::{ColorCache, ColorResolver, ColorSource, FileColorSource, SourceError};
pub use data::{Cell, DataSnapshot};
pub use hierarchy::{BuildError, Hierarchy, HierarchyBuilder};
pub use instance::{ChartInstance, PollEvent, RenderOutcome, SelectionEngine};
pub use render::{RenderFrame, Viewport};
pub use settings::ChartSettings;
