use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, warn};

pub(crate) const SETTINGS_ENV_VAR: &str = "ASTRORAID_SETTINGS";
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Optional tuning knobs; every field falls back to the stock arcade setup
/// when the file or the field is absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct RaidSettings {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub target_tps: u32,
    /// Slow-motion divisor: with N > 1 only every Nth tick runs the sim body.
    pub slowdown: u64,
    /// Percent chance a destroyed enemy drops a power-up.
    pub drop_percent: u32,
    pub seed: Option<u64>,
    pub max_render_fps: Option<u32>,
    pub show_debug_panel: bool,
}

impl Default for RaidSettings {
    fn default() -> Self {
        Self {
            viewport_width: 400,
            viewport_height: 400,
            target_tps: 100,
            slowdown: 1,
            drop_percent: 33,
            seed: None,
            max_render_fps: None,
            show_debug_panel: false,
        }
    }
}

pub(crate) fn load_settings() -> RaidSettings {
    let Some(path) = settings_path() else {
        debug!("settings_path_unresolved_using_defaults");
        return RaidSettings::default();
    };

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "settings_file_absent_using_defaults");
            return RaidSettings::default();
        }
        Err(error) => {
            warn!(
                path = %path.display(),
                error = %error,
                "settings_read_failed_using_defaults"
            );
            return RaidSettings::default();
        }
    };

    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    match serde_path_to_error::deserialize(&mut deserializer) {
        Ok(settings) => settings,
        Err(error) => {
            warn!(
                path = %path.display(),
                field = %error.path(),
                error = %error,
                "settings_load_failed_using_defaults"
            );
            RaidSettings::default()
        }
    }
}

fn settings_path() -> Option<PathBuf> {
    if let Ok(value) = env::var(SETTINGS_ENV_VAR) {
        return Some(PathBuf::from(value));
    }
    engine::resolve_app_paths()
        .ok()
        .map(|paths| paths.assets_dir.join(SETTINGS_FILE_NAME))
}
