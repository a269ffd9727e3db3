use std::path::{Path, PathBuf};

use eucmorph_core::MorphAlgorithm;
use serde::{Deserialize, Serialize};

use crate::args::Report;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct AppConfig {
    #[serde(default)]
    pub rhythm: RhythmConfig,
    #[serde(default)]
    pub morph: MorphConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RhythmConfig {
    pub note: u8,
    pub tempo: u32,
    pub subdivision: u32,
    pub velocity: u8,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self { note: 36, tempo: 120, subdivision: 4, velocity: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct MorphConfig {
    pub algorithm: MorphAlgorithm,
    pub amount: i32,
    pub bars: u32,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self { algorithm: MorphAlgorithm::default(), amount: 50, bars: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct OutputConfig {
    pub path: PathBuf,
    pub report: Report,
    /// MIDI channel (0-15)
    pub channel: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("output.mid"), report: Report::Rhythm, channel: 9 }
    }
}

pub(crate) fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("eucmorph")
        .join("config.toml")
}

/// Missing or unreadable config falls back to defaults
pub(crate) fn load_config(path: &Path) -> AppConfig {
    match std::fs::read_to_string(path) {
        Ok(s) => toml::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config {}: {}", path.display(), e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}
