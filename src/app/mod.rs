use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context, Vec2};
use tracing::{info, warn};

use bubblepack::chart::render::RenderFrame;
use bubblepack::chart::{ChartInstance, ChartSettings, ColorSource, DataSnapshot, FileColorSource};

mod canvas;
mod engine;
mod render_utils;
mod ui;

use engine::LocalSelectionEngine;

/// Command-line inputs the app reloads from.
#[derive(Clone, Debug)]
pub struct LaunchConfig {
    pub snapshot_path: PathBuf,
    pub settings_path: Option<PathBuf>,
    pub color_source_path: Option<PathBuf>,
    pub debug: bool,
}

pub struct BubbleChartApp {
    config: LaunchConfig,
    state: AppState,
    reload_rx: Option<Receiver<Result<LoadedInputs, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LoadedInputs, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct LoadedInputs {
    snapshot: DataSnapshot,
    settings: ChartSettings,
}

/// What the canvas shows instead of a chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChartStatus {
    Loading,
    FetchingColors,
    NoData,
    NoValidRows,
}

impl ChartStatus {
    fn message(self) -> &'static str {
        match self {
            Self::Loading => "Loading...",
            Self::FetchingColors => "Loading colors...",
            Self::NoData => "No data available",
            Self::NoValidRows => "No valid data to display",
        }
    }
}

struct ViewModel {
    snapshot: DataSnapshot,
    settings: ChartSettings,
    chart: ChartInstance,
    engine: LocalSelectionEngine,
    frame: Option<RenderFrame>,
    status: Option<ChartStatus>,
    dirty: bool,
    last_size: Vec2,
    pan: Vec2,
    zoom: f32,
    custom_colors_raw: String,
    image_mapping_raw: String,
}

impl BubbleChartApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: LaunchConfig) -> Self {
        let state = Self::start_load(config.clone());
        Self {
            config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(config: LaunchConfig) -> Receiver<Result<LoadedInputs, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_inputs(&config).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(config: LaunchConfig) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(config),
        }
    }
}

fn ready_state(config: &LaunchConfig, inputs: LoadedInputs) -> AppState {
    let source = config.color_source_path.as_ref().map(|path| {
        let source: Arc<dyn ColorSource> = Arc::new(FileColorSource::new(path.clone()));
        source
    });
    AppState::Ready(Box::new(ViewModel::new(inputs, source)))
}

fn load_inputs(config: &LaunchConfig) -> anyhow::Result<LoadedInputs> {
    let snapshot = DataSnapshot::load(&config.snapshot_path)?;

    let mut settings = match &config.settings_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings {}", path.display()))?;
            ChartSettings::from_json(&raw).unwrap_or_else(|error| {
                warn!(%error, path = %path.display(), "ignoring settings file");
                ChartSettings::default()
            })
        }
        None => ChartSettings::default(),
    };
    settings.enable_debug |= config.debug;

    info!(
        rows = snapshot.rows().len(),
        dimensions = snapshot.dimension_count(),
        "snapshot loaded"
    );
    Ok(LoadedInputs { snapshot, settings })
}

impl eframe::App for BubbleChartApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(inputs) => ready_state(&self.config, inputs),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading snapshot...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the chart inputs");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.config.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.config, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.config.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(inputs) => ready_state(&self.config, inputs),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
