use std::time::{SystemTime, UNIX_EPOCH};

use engine::{run_app, LoopConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use super::config;
use super::gameplay;

pub(crate) fn run() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = config::load_settings();
    let seed = settings.seed.unwrap_or_else(seed_from_clock);
    info!(
        viewport_width = settings.viewport_width,
        viewport_height = settings.viewport_height,
        target_tps = settings.target_tps,
        slowdown = settings.slowdown,
        drop_percent = settings.drop_percent,
        seed,
        "settings"
    );

    let config = LoopConfig {
        window_title: "Astro Raid".to_string(),
        viewport_width: settings.viewport_width,
        viewport_height: settings.viewport_height,
        target_tps: settings.target_tps,
        max_render_fps: settings.max_render_fps,
        show_debug_panel: settings.show_debug_panel,
        ..LoopConfig::default()
    };
    let scene = gameplay::build_scene(&settings, seed);

    if let Err(error) = run_app(config, scene) {
        let mut chain = error.to_string();
        let mut source = std::error::Error::source(&error);
        while let Some(cause) = source {
            chain.push_str(": ");
            chain.push_str(&cause.to_string());
            source = cause.source();
        }
        error!(error = %chain, "app_failed");
        std::process::exit(1);
    }
}

fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0x5eed)
}
