//! Probability steps and the merge shared by every morph algorithm

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::step_seq::StepSequence;

/// Which input rhythm contributed an onset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepSource {
    /// The user-supplied base rhythm (`s`)
    Base,
    /// The Euclidean target rhythm (`e`)
    Target,
}

impl StepSource {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Base => "s",
            Self::Target => "e",
        }
    }
}

/// One step of a merged rhythm with its chance of sounding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbStep {
    pub onset: bool,
    /// Probability of realizing an onset when sampled (0.0-1.0)
    pub probability: f64,
    /// Provenance; read by algorithms, never by the sampler
    pub properties: BTreeSet<StepSource>,
}

impl ProbStep {
    pub fn has(&self, source: StepSource) -> bool {
        self.properties.contains(&source)
    }

    pub fn from_base(&self) -> bool {
        self.has(StepSource::Base)
    }

    pub fn from_target(&self) -> bool {
        self.has(StepSource::Target)
    }

    /// Onset in both the base and the target
    pub fn from_both(&self) -> bool {
        self.from_base() && self.from_target()
    }
}

impl fmt::Display for ProbStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "| {} | {:.2}\t|", if self.onset { 'x' } else { '.' }, self.probability)?;
        if !self.properties.is_empty() {
            let tags: Vec<&str> = self.properties.iter().map(StepSource::tag).collect();
            write!(f, " {{{}}}", tags.join(", "))?;
        }
        Ok(())
    }
}

/// Display adapter listing a whole probability sequence
pub struct ProbStepTable<'a>(pub &'a [ProbStep]);

impl fmt::Display for ProbStepTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PROBABILITY STEPS")?;
        write!(f, "length: {}", self.0.len())?;
        for (i, step) in self.0.iter().enumerate() {
            write!(f, "\n{}:\t{}", i + 1, step)?;
        }
        Ok(())
    }
}

/// Normalize a 0-100 morph amount to 0.0-1.0, clamping out-of-range values
pub fn morph_ratio(morph_amount: i32) -> f64 {
    (morph_amount as f64 / 100.0).clamp(0.0, 1.0)
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: usize, b: usize) -> usize {
    a / gcd(a, b) * b
}

/// Merge base and target onsets over their hyperperiod.
///
/// Inputs without any onset are dropped. The result has lcm(len) steps and
/// each step is an onset when any remaining input sounds at `i % len`. With
/// `tag_sources` the contributing inputs are recorded in `properties`.
/// Probabilities are left at 0.
///
/// When neither input has an onset the result is an all-rest sequence of the
/// base's length.
pub fn merge_onsets(
    base: &StepSequence,
    target: &StepSequence,
    tag_sources: bool,
) -> Vec<ProbStep> {
    let inputs: Vec<(StepSource, &StepSequence)> =
        [(StepSource::Base, base), (StepSource::Target, target)]
            .into_iter()
            .filter(|(_, seq)| seq.has_onset())
            .collect();

    if inputs.is_empty() {
        return vec![ProbStep::default(); base.len()];
    }

    let length = inputs.iter().fold(1, |acc, (_, seq)| lcm(acc, seq.len()));

    (0..length)
        .map(|i| {
            let mut step = ProbStep::default();
            for (source, seq) in &inputs {
                if seq.steps()[i % seq.len()].onset {
                    step.onset = true;
                    if tag_sources {
                        step.properties.insert(*source);
                    }
                }
            }
            step
        })
        .collect()
}
