use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::{self, Align, Context, Layout, Vec2};
use tracing::debug;

use bubblepack::chart::{ChartInstance, ColorSource, PollEvent, RenderOutcome, Viewport};

use super::super::engine::LocalSelectionEngine;
use super::super::{ChartStatus, LaunchConfig, LoadedInputs, ViewModel};

const BUSY_REPAINT_INTERVAL: Duration = Duration::from_millis(50);

impl ViewModel {
    pub(in crate::app) fn new(inputs: LoadedInputs, source: Option<Arc<dyn ColorSource>>) -> Self {
        let LoadedInputs { snapshot, settings } = inputs;
        let custom_colors_raw = string_map_json(&settings.custom_colors);
        let image_mapping_raw = string_map_json(&settings.group_image_mapping);

        Self {
            snapshot,
            settings,
            chart: source.map_or_else(ChartInstance::new, ChartInstance::with_source),
            engine: LocalSelectionEngine::default(),
            frame: None,
            status: Some(ChartStatus::Loading),
            dirty: true,
            last_size: Vec2::ZERO,
            pan: Vec2::ZERO,
            zoom: 1.0,
            custom_colors_raw,
            image_mapping_raw,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        config: &LaunchConfig,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        if let Some(PollEvent::Rerender) = self.chart.poll() {
            self.dirty = true;
        }
        if self.engine.apply_due(Instant::now(), &mut self.snapshot) {
            debug!("local selection confirmed");
            self.dirty = true;
        }
        if self.chart.is_busy() || self.engine.has_queued() {
            ctx.request_repaint_after(BUSY_REPAINT_INTERVAL);
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("bubblepack");
                    ui.separator();
                    ui.label(format!("snapshot: {}", config.snapshot_path.display()));
                    ui.label(format!("rows: {}", self.snapshot.rows().len()));
                    if let Some(frame) = &self.frame {
                        ui.label(format!("bubbles: {}", frame.leaves().count()));
                    }
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload inputs"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Clear selections").clicked() {
                        self.engine.clear(&mut self.snapshot);
                        self.dirty = true;
                    }
                    if ui.button("Reset view").clicked() {
                        self.reset_view();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if !self.chart.tracker().is_empty() {
                            ui.label(format!("pending: {}", self.chart.tracker().len()));
                        }
                        if self.chart.is_busy() {
                            ui.spinner();
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui));
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_chart(ui));
    }

    /// Runs the chart pipeline for the current canvas size.
    pub(in crate::app) fn rerender(&mut self) {
        let viewport = Viewport::new(self.last_size.x, self.last_size.y);
        let outcome = self.chart.render(Some(&self.snapshot), &self.settings, viewport);
        self.dirty = false;

        match outcome {
            RenderOutcome::Ready(frame) => {
                self.frame = Some(*frame);
                self.status = None;
            }
            RenderOutcome::Skipped => {}
            RenderOutcome::Loading => self.show_status(ChartStatus::Loading),
            RenderOutcome::FetchingColors => self.show_status(ChartStatus::FetchingColors),
            RenderOutcome::NoData => self.show_status(ChartStatus::NoData),
            RenderOutcome::NoValidRows => self.show_status(ChartStatus::NoValidRows),
        }
    }

    fn show_status(&mut self, status: ChartStatus) {
        self.frame = None;
        self.status = Some(status);
    }
}

fn string_map_json(map: &std::collections::HashMap<String, String>) -> String {
    if map.is_empty() {
        return String::new();
    }
    serde_json::to_string_pretty(map).unwrap_or_default()
}
