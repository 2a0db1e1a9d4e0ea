mod app;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Data snapshot JSON (dimensions, measures and rows).
    #[arg(long)]
    snapshot: PathBuf,

    /// Chart settings JSON; every option falls back to its default.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Master item color definitions, re-read on every lookup.
    #[arg(long)]
    color_source: Option<PathBuf>,

    /// Log chart diagnostics.
    #[arg(long)]
    debug: bool,

    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    #[arg(long, default_value_t = 860.0)]
    height: f32,
}

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "bubblepack=debug"
    } else {
        "bubblepack=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([args.width, args.height]),
        ..Default::default()
    };
    let launch = app::LaunchConfig {
        snapshot_path: args.snapshot,
        settings_path: args.settings,
        color_source_path: args.color_source,
        debug: args.debug,
    };

    eframe::run_native(
        "bubblepack",
        options,
        Box::new(move |cc| Ok(Box::new(app::BubbleChartApp::new(cc, launch)))),
    )
}
