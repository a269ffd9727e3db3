//! Step sequences: onset/velocity steps plus tempo and note metadata

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MorphError, Result};

/// A single step in a sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub onset: bool,
    /// Velocity (0-127)
    pub velocity: u8,
}

impl Step {
    pub fn new(onset: bool, velocity: u8) -> Self {
        Self { onset, velocity }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "| {} |", if self.onset { 'x' } else { '.' })
    }
}

/// Ordered steps sharing one note/velocity/tempo context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSequence {
    steps: Vec<Step>,
    /// MIDI note number (36 = kick on GM drum maps)
    note: u8,
    default_velocity: u8,
    /// Tempo in BPM
    tempo: u32,
    /// Steps per beat
    subdivision: u32,
}

impl Default for StepSequence {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            note: 36,
            default_velocity: 100,
            tempo: 120,
            subdivision: 4,
        }
    }
}

impl StepSequence {
    /// Sequence of `length` rests
    pub fn new(length: usize) -> Self {
        Self {
            steps: vec![Step::default(); length],
            ..Default::default()
        }
    }

    pub fn from_pattern(pattern: &[bool]) -> Self {
        Self::default().init_from_pattern(pattern)
    }

    /// Replace all steps with `pattern`; onsets take the default velocity
    pub fn init_from_pattern(mut self, pattern: &[bool]) -> Self {
        let velocity = self.default_velocity;
        self.steps = pattern
            .iter()
            .map(|&onset| if onset { Step::new(true, velocity) } else { Step::default() })
            .collect();
        self
    }

    pub fn with_note(mut self, note: u8) -> Self {
        self.note = note;
        self
    }

    pub fn with_default_velocity(mut self, velocity: u8) -> Self {
        self.default_velocity = velocity;
        self
    }

    pub fn with_tempo(mut self, tempo: u32) -> Self {
        self.tempo = tempo.max(1);
        self
    }

    pub fn with_subdivision(mut self, subdivision: u32) -> Self {
        self.subdivision = subdivision.max(1);
        self
    }

    /// Copy note, velocity, tempo and subdivision from `other`
    pub fn with_metadata_of(mut self, other: &StepSequence) -> Self {
        self.note = other.note;
        self.default_velocity = other.default_velocity;
        self.tempo = other.tempo;
        self.subdivision = other.subdivision;
        self
    }

    /// Mark an onset, using the default velocity when none is given
    pub fn set_step(&mut self, index: usize, velocity: Option<u8>) -> Result<()> {
        let default_velocity = self.default_velocity;
        let step = self.step_mut(index)?;
        step.onset = true;
        step.velocity = velocity.unwrap_or(default_velocity);
        Ok(())
    }

    pub fn toggle_step(&mut self, index: usize) -> Result<()> {
        let step = self.step_mut(index)?;
        step.onset = !step.onset;
        Ok(())
    }

    /// Append a step
    pub fn push(&mut self, onset: bool, velocity: Option<u8>) {
        let velocity = velocity.unwrap_or(self.default_velocity);
        self.steps.push(Step::new(onset, velocity));
    }

    fn step_mut(&mut self, index: usize) -> Result<&mut Step> {
        let len = self.steps.len();
        self.steps
            .get_mut(index)
            .ok_or(MorphError::StepOutOfRange { index, len })
    }

    pub fn has_onset(&self) -> bool {
        self.steps.iter().any(|s| s.onset)
    }

    /// Same length and identical onset flags; velocity is ignored
    pub fn is_same_rhythm(&self, other: &StepSequence) -> bool {
        self.steps.len() == other.steps.len()
            && self.steps.iter().zip(&other.steps).all(|(a, b)| a.onset == b.onset)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Onset flags in step order
    pub fn onsets(&self) -> Vec<bool> {
        self.steps.iter().map(|s| s.onset).collect()
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn default_velocity(&self) -> u8 {
        self.default_velocity
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn subdivision(&self) -> u32 {
        self.subdivision
    }

    /// Compact form, e.g. `[x..x..x.]`
    pub fn rhythm_notation(&self) -> String {
        let body: String = self.steps.iter().map(|s| if s.onset { 'x' } else { '.' }).collect();
        format!("[{}]", body)
    }

    /// One line per step, numbered from 1
    pub fn seq_string(&self) -> String {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}:\t{}", i + 1, step))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for StepSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "STEP SEQUENCE")?;
        writeln!(
            f,
            "note: {}, default_velocity: {}, length: {}",
            self.note,
            self.default_velocity,
            self.steps.len()
        )?;
        write!(f, "{}", self.seq_string())
    }
}
