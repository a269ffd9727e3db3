use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use eucmorph_core::MorphAlgorithm;
use serde::{Deserialize, Serialize};

/// What to print after each generate call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Report {
    Quiet,
    #[default]
    Rhythm,
    /// Probability table, positions and MIDI events as well
    All,
}

/// Morph a base rhythm toward a Euclidean rhythm and write the result as MIDI
#[derive(Debug, Parser)]
#[command(name = "eucmorph", version)]
pub(crate) struct Args {
    /// Base rhythm, e.g. "1000100010001000" or "x...x...x...x..."
    #[arg(short, long, required_unless_present = "list_algorithms")]
    pub base: Option<String>,

    /// Onsets in the Euclidean target
    #[arg(short = 'k', long, default_value_t = 3)]
    pub onsets: usize,

    /// Euclidean target length [default: length of the base rhythm]
    #[arg(short = 'n', long)]
    pub length: Option<usize>,

    /// Right rotation of the Euclidean target
    #[arg(short, long, default_value_t = 0)]
    pub rotation: usize,

    /// Morph amount, 0-100 (clamped)
    #[arg(short, long, allow_hyphen_values = true)]
    pub amount: Option<i32>,

    /// Morph algorithm name, see --list-algorithms
    #[arg(long, value_parser = parse_algorithm)]
    pub algorithm: Option<MorphAlgorithm>,

    /// Bars per generate call; 0 emits one full probability cycle
    #[arg(long)]
    pub bars: Option<u32>,

    /// Number of successive generate calls, continuing the position
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,

    /// MIDI note number (0-127)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub note: Option<u8>,

    /// Tempo in BPM
    #[arg(long)]
    pub tempo: Option<u32>,

    /// Steps per beat
    #[arg(long)]
    pub subdivision: Option<u32>,

    /// Onset velocity (0-127)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub velocity: Option<u8>,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum)]
    pub report: Option<Report>,

    /// Print the probability steps of the last call as JSON
    #[arg(long)]
    pub json: bool,

    /// MIDI file to write
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip writing the MIDI file
    #[arg(long)]
    pub no_save: bool,

    /// Config file [default: <config dir>/eucmorph/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long)]
    pub list_algorithms: bool,
}

fn parse_algorithm(s: &str) -> Result<MorphAlgorithm, String> {
    s.parse().map_err(|e: eucmorph_core::MorphError| e.to_string())
}
