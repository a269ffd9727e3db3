//! Morph engine: builds the Euclidean target, caches the probability
//! sequence and samples it into concrete step sequences

use tracing::debug;

use crate::error::Result;
use crate::euclidean::EuclideanParams;
use crate::morph_alg::{MorphAlgorithm, ProbStepAlgorithm};
use crate::prob_step::ProbStep;
use crate::random::RandomSource;
use crate::step_seq::StepSequence;

/// Morphs one base rhythm toward a Euclidean target
#[derive(Debug, Clone)]
pub struct EucMorpher {
    algorithm: MorphAlgorithm,
    base: StepSequence,
    target: StepSequence,
    prob_steps: Vec<ProbStep>,
}

impl EucMorpher {
    /// The base is copied, so later edits to the caller's sequence have no
    /// effect on this morpher.
    pub fn new(
        base: &StepSequence,
        params: EuclideanParams,
        morph_amount: i32,
        algorithm: MorphAlgorithm,
    ) -> Result<Self> {
        let base = base.clone();
        let target = StepSequence::new(0)
            .with_metadata_of(&base)
            .init_from_pattern(&params.pattern()?);
        let prob_steps = algorithm.generate(&base, &target, morph_amount);

        debug!(
            "{} morph {} -> {} ({:?}, amount {}): {} prob steps",
            algorithm,
            base.rhythm_notation(),
            target.rhythm_notation(),
            params,
            morph_amount,
            prob_steps.len()
        );

        Ok(Self { algorithm, base, target, prob_steps })
    }

    pub fn prob_steps(&self) -> &[ProbStep] {
        &self.prob_steps
    }

    pub fn base(&self) -> &StepSequence {
        &self.base
    }

    pub fn target(&self) -> &StepSequence {
        &self.target
    }

    pub fn algorithm(&self) -> MorphAlgorithm {
        self.algorithm
    }

    /// Steps produced by `generate(num_bars, ..)`; 0 bars means one full
    /// probability cycle
    pub fn output_len(&self, num_bars: u32) -> usize {
        if num_bars > 0 {
            num_bars as usize * self.base.len()
        } else {
            self.prob_steps.len()
        }
    }

    /// Position to pass as `start_pos` to continue after `output_len` steps
    pub fn next_position(&self, start_pos: usize, output_len: usize) -> usize {
        match self.prob_steps.len() {
            0 => 0,
            len => (start_pos + output_len) % len,
        }
    }

    /// Sample the probability sequence starting at `start_pos`.
    ///
    /// Draws one sample per output step; the step sounds when the sample is
    /// below that step's probability.
    pub fn generate<R: RandomSource>(
        &self,
        num_bars: u32,
        start_pos: usize,
        rng: &mut R,
    ) -> StepSequence {
        let length = self.output_len(num_bars);
        let cycle = self.prob_steps.len();

        let pattern: Vec<bool> = if cycle == 0 {
            vec![false; length]
        } else {
            (0..length)
                .map(|i| rng.next_f64() < self.prob_steps[(i + start_pos) % cycle].probability)
                .collect()
        };

        StepSequence::new(0)
            .with_metadata_of(&self.base)
            .init_from_pattern(&pattern)
    }
}
