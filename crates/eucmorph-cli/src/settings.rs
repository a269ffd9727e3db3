//! Flags layered over the config file

use std::path::PathBuf;

use anyhow::{bail, Context};
use eucmorph_core::{EuclideanParams, MorphAlgorithm, MorphRequest, StepSequence};

use crate::args::{Args, Report};
use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub request: MorphRequest,
    pub repeat: u32,
    pub seed: Option<u64>,
    pub report: Report,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub channel: u8,
}

/// Parse a rhythm string. `1`/`x`/`X` are onsets, `0`/`.`/`-` are rests;
/// whitespace, `|` and `_` are separators.
pub(crate) fn parse_rhythm(s: &str) -> anyhow::Result<Vec<bool>> {
    let pattern = s
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '|' | '_'))
        .enumerate()
        .map(|(i, c)| match c {
            '1' | 'x' | 'X' => Ok(true),
            '0' | '.' | '-' => Ok(false),
            other => bail!("unexpected '{}' at step {} of rhythm", other, i + 1),
        })
        .collect::<anyhow::Result<Vec<bool>>>()?;

    if pattern.is_empty() {
        bail!("rhythm is empty");
    }
    Ok(pattern)
}

impl Settings {
    pub fn resolve(args: &Args, config: &AppConfig) -> anyhow::Result<Self> {
        let base_str = args.base.as_deref().context("missing --base rhythm")?;
        let pattern = parse_rhythm(base_str).context("invalid --base rhythm")?;

        let base = StepSequence::default()
            .with_note(args.note.unwrap_or(config.rhythm.note))
            .with_default_velocity(args.velocity.unwrap_or(config.rhythm.velocity))
            .with_tempo(args.tempo.unwrap_or(config.rhythm.tempo))
            .with_subdivision(args.subdivision.unwrap_or(config.rhythm.subdivision))
            .init_from_pattern(&pattern);

        let length = args.length.unwrap_or(pattern.len());
        let params = EuclideanParams::new(args.onsets, length, args.rotation);
        params.validate().context("invalid Euclidean target")?;

        let algorithm: MorphAlgorithm = args.algorithm.unwrap_or(config.morph.algorithm);

        Ok(Self {
            request: MorphRequest {
                base,
                params,
                morph_amount: args.amount.unwrap_or(config.morph.amount),
                algorithm,
                num_bars: args.bars.unwrap_or(config.morph.bars),
            },
            repeat: args.repeat.max(1),
            seed: args.seed,
            report: args.report.unwrap_or(config.output.report),
            json: args.json,
            output: (!args.no_save)
                .then(|| args.output.clone().unwrap_or_else(|| config.output.path.clone())),
            channel: config.output.channel,
        })
    }
}
