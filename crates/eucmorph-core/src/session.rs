//! Morph session: tracks the sampling position across successive generate calls

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::euclidean::EuclideanParams;
use crate::morph_alg::MorphAlgorithm;
use crate::morpher::EucMorpher;
use crate::prob_step::ProbStep;
use crate::random::RandomSource;
use crate::step_seq::StepSequence;

/// Everything needed for one generate call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphRequest {
    pub base: StepSequence,
    pub params: EuclideanParams,
    /// Morph amount (0-100)
    pub morph_amount: i32,
    pub algorithm: MorphAlgorithm,
    /// Bars to emit; 0 emits one full probability cycle
    pub num_bars: u32,
}

/// Result of one generate call
#[derive(Debug, Clone)]
pub struct MorphOutput {
    pub sequence: StepSequence,
    pub prob_steps: Vec<ProbStep>,
    /// Position sampling started from
    pub start_pos: usize,
    /// Position the next call continues from
    pub end_pos: usize,
}

/// Caller-owned sampling state.
///
/// The position carries over while the Euclidean parameters and base rhythm
/// stay the same; changing either restarts at 0. Algorithm, morph amount and
/// base metadata may change without a restart.
#[derive(Debug, Clone, Default)]
pub struct MorphSession {
    position: usize,
    last_params: Option<EuclideanParams>,
    last_base: Option<StepSequence>,
}

impl MorphSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn reset(&mut self) {
        self.position = 0;
        self.last_params = None;
        self.last_base = None;
    }

    fn rhythm_changed(&self, request: &MorphRequest) -> bool {
        self.last_params != Some(request.params)
            || !self
                .last_base
                .as_ref()
                .is_some_and(|base| base.is_same_rhythm(&request.base))
    }

    pub fn generate<R: RandomSource>(
        &mut self,
        request: &MorphRequest,
        rng: &mut R,
    ) -> Result<MorphOutput> {
        let morpher = EucMorpher::new(
            &request.base,
            request.params,
            request.morph_amount,
            request.algorithm,
        )?;

        if self.rhythm_changed(request) && self.position != 0 {
            debug!("Rhythm changed, restarting from position 0 (was {})", self.position);
            self.position = 0;
        }

        let start_pos = self.position;
        let sequence = morpher.generate(request.num_bars, start_pos, rng);
        let end_pos = morpher.next_position(start_pos, sequence.len());
        debug!("Generated {} steps, position {} -> {}", sequence.len(), start_pos, end_pos);

        self.position = end_pos;
        self.last_params = Some(request.params);
        self.last_base = Some(request.base.clone());

        Ok(MorphOutput {
            sequence,
            prob_steps: morpher.prob_steps().to_vec(),
            start_pos,
            end_pos,
        })
    }
}
