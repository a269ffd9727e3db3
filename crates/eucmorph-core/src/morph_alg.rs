//! Morph algorithms: probability assignment over a merged base/target rhythm

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MorphError;
use crate::prob_step::{merge_onsets, morph_ratio, ProbStep};
use crate::step_seq::StepSequence;

/// Trait for probability-step algorithms
///
/// Implementors only decide probabilities; the merge over the hyperperiod is
/// shared through [`ProbStepAlgorithm::generate`].
pub trait ProbStepAlgorithm {
    fn name(&self) -> &str;

    /// Whether merged steps carry base/target tags
    fn records_sources(&self) -> bool {
        true
    }

    /// Probability for a step that is an onset in the merged rhythm
    fn onset_probability(&self, step: &ProbStep, rp: f64) -> f64;

    /// Probability for a rest, given its cyclic neighbors
    fn rest_probability(&self, prev: &ProbStep, next: &ProbStep, rp: f64) -> f64;

    fn generate(
        &self,
        base: &StepSequence,
        target: &StepSequence,
        morph_amount: i32,
    ) -> Vec<ProbStep> {
        let rp = morph_ratio(morph_amount);
        let merged = merge_onsets(base, target, self.records_sources());
        let len = merged.len();

        let probabilities: Vec<f64> = (0..len)
            .map(|i| {
                let step = &merged[i];
                if step.onset {
                    self.onset_probability(step, rp)
                } else {
                    let prev = &merged[(i + len - 1) % len];
                    let next = &merged[(i + 1) % len];
                    self.rest_probability(prev, next, rp)
                }
            })
            .collect();

        merged
            .into_iter()
            .zip(probabilities)
            .map(|(mut step, p)| {
                step.probability = p;
                step
            })
            .collect()
    }
}

// ============================================================================
// Simple
// ============================================================================

/// Untagged merge; rests next to any onset may sound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleProbStepAlg;

impl ProbStepAlgorithm for SimpleProbStepAlg {
    fn name(&self) -> &str {
        "SimpleProbStepAlg"
    }

    fn records_sources(&self) -> bool {
        false
    }

    fn onset_probability(&self, _step: &ProbStep, rp: f64) -> f64 {
        1.0 - rp / 2.0
    }

    fn rest_probability(&self, prev: &ProbStep, next: &ProbStep, rp: f64) -> f64 {
        if prev.onset || next.onset { rp / 2.0 } else { 0.0 }
    }
}

/// Like [`SimpleProbStepAlg`] but favors the base rhythm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleProbStepAlgV2;

impl ProbStepAlgorithm for SimpleProbStepAlgV2 {
    fn name(&self) -> &str {
        "SimpleProbStepAlgV2"
    }

    fn onset_probability(&self, step: &ProbStep, rp: f64) -> f64 {
        if step.from_base() { 1.0 - rp / 4.0 } else { 1.0 - rp / 2.0 }
    }

    fn rest_probability(&self, prev: &ProbStep, next: &ProbStep, rp: f64) -> f64 {
        if prev.from_base() || next.from_base() {
            rp / 4.0
        } else if prev.onset || next.onset {
            rp / 2.0
        } else {
            0.0
        }
    }
}

// ============================================================================
// Mega morph
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MegaMorphV1;

impl ProbStepAlgorithm for MegaMorphV1 {
    fn name(&self) -> &str {
        "MegaMorphV1"
    }

    fn onset_probability(&self, step: &ProbStep, rp: f64) -> f64 {
        if step.from_both() {
            1.0 - rp / 4.0
        } else if step.from_base() {
            1.0 - rp / 2.0
        } else if step.from_target() {
            rp
        } else {
            0.0
        }
    }

    fn rest_probability(&self, prev: &ProbStep, next: &ProbStep, rp: f64) -> f64 {
        if prev.from_both() || next.from_both() {
            rp / 4.0
        } else if prev.from_base() || next.from_base() {
            rp / 2.0
        } else {
            0.0
        }
    }
}

// ============================================================================
// Direct morphs
// ============================================================================

/// Crossfade from base (rp = 0) to target (rp = 1); rests never sound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMorph100;

impl ProbStepAlgorithm for DirectMorph100 {
    fn name(&self) -> &str {
        "DirectMorph100"
    }

    fn onset_probability(&self, step: &ProbStep, rp: f64) -> f64 {
        if step.from_both() {
            (1.0 - rp).max(rp)
        } else if step.from_base() {
            1.0 - rp
        } else if step.from_target() {
            rp
        } else {
            0.0
        }
    }

    fn rest_probability(&self, _prev: &ProbStep, _next: &ProbStep, _rp: f64) -> f64 {
        0.0
    }
}

/// Crossfade that stops halfway: at rp = 1 both rhythms sound half the time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMorph50;

impl ProbStepAlgorithm for DirectMorph50 {
    fn name(&self) -> &str {
        "DirectMorph50"
    }

    fn onset_probability(&self, step: &ProbStep, rp: f64) -> f64 {
        if step.from_base() {
            1.0 - rp / 2.0
        } else if step.from_target() {
            rp / 2.0
        } else {
            0.0
        }
    }

    fn rest_probability(&self, _prev: &ProbStep, _next: &ProbStep, _rp: f64) -> f64 {
        0.0
    }
}

// ============================================================================
// Deterministic
// ============================================================================

/// Every merged onset always sounds; ignores the morph amount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestingNoRandom;

impl ProbStepAlgorithm for TestingNoRandom {
    fn name(&self) -> &str {
        "TestingNoRandom"
    }

    fn onset_probability(&self, _step: &ProbStep, _rp: f64) -> f64 {
        1.0
    }

    fn rest_probability(&self, _prev: &ProbStep, _next: &ProbStep, _rp: f64) -> f64 {
        0.0
    }
}

// ============================================================================
// Enum wrapper
// ============================================================================

/// Enum wrapper for all morph algorithms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MorphAlgorithm {
    #[default]
    DirectMorph100,
    DirectMorph50,
    MegaMorphV1,
    #[serde(rename = "SimpleProbStepAlg")]
    Simple,
    #[serde(rename = "SimpleProbStepAlgV2")]
    SimpleV2,
    TestingNoRandom,
}

impl MorphAlgorithm {
    pub const ALL: [MorphAlgorithm; 6] = [
        Self::DirectMorph100,
        Self::DirectMorph50,
        Self::MegaMorphV1,
        Self::Simple,
        Self::SimpleV2,
        Self::TestingNoRandom,
    ];

    fn inner(&self) -> &'static dyn ProbStepAlgorithm {
        match self {
            Self::DirectMorph100 => &DirectMorph100,
            Self::DirectMorph50 => &DirectMorph50,
            Self::MegaMorphV1 => &MegaMorphV1,
            Self::Simple => &SimpleProbStepAlg,
            Self::SimpleV2 => &SimpleProbStepAlgV2,
            Self::TestingNoRandom => &TestingNoRandom,
        }
    }
}

impl ProbStepAlgorithm for MorphAlgorithm {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn records_sources(&self) -> bool {
        self.inner().records_sources()
    }

    fn onset_probability(&self, step: &ProbStep, rp: f64) -> f64 {
        self.inner().onset_probability(step, rp)
    }

    fn rest_probability(&self, prev: &ProbStep, next: &ProbStep, rp: f64) -> f64 {
        self.inner().rest_probability(prev, next, rp)
    }
}

impl fmt::Display for MorphAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MorphAlgorithm {
    type Err = MorphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MorphError::InvalidParameter(format!("unknown morph algorithm: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(pattern: &[u8]) -> StepSequence {
        StepSequence::from_pattern(&pattern.iter().map(|&b| b == 1).collect::<Vec<_>>())
    }

    fn probs(steps: &[ProbStep]) -> Vec<f64> {
        steps.iter().map(|s| s.probability).collect()
    }

    // base:   x . . . x . . .
    // target: x . . x . . x .
    fn base() -> StepSequence {
        seq(&[1, 0, 0, 0, 1, 0, 0, 0])
    }

    fn target() -> StepSequence {
        seq(&[1, 0, 0, 1, 0, 0, 1, 0])
    }

    #[test]
    fn test_simple() {
        let steps = SimpleProbStepAlg.generate(&base(), &target(), 50);
        assert!(steps.iter().all(|s| s.properties.is_empty()));
        assert_eq!(probs(&steps), vec![0.75, 0.25, 0.25, 0.75, 0.75, 0.25, 0.75, 0.25]);
    }

    #[test]
    fn test_simple_v2() {
        let steps = SimpleProbStepAlgV2.generate(&base(), &target(), 100);
        // 0: both, 3: target, 4: base, 6: target
        // 1: next to base 0; 2: next to target 3 only; 5: next to base 4;
        // 7: wraps around to base 0
        assert_eq!(probs(&steps), vec![0.75, 0.25, 0.5, 0.5, 0.75, 0.25, 0.5, 0.25]);
    }

    #[test]
    fn test_mega_morph() {
        let steps = MegaMorphV1.generate(&base(), &target(), 40);
        // 1 and 7 sit next to the shared onset at 0; 5 is next to base-only 4;
        // 2 only touches the target onset at 3
        let expected = [0.9, 0.1, 0.0, 0.4, 0.8, 0.2, 0.4, 0.1];
        for (p, e) in probs(&steps).iter().zip(expected) {
            assert!((p - e).abs() < 1e-12, "{p} != {e}");
        }
    }

    #[test]
    fn test_rest_wraps_to_last_step() {
        // . . . x against E(1, 4, 3) = . . . x: the rest at 0 only touches
        // the shared onset at 3 through the wrap-around
        let base = seq(&[0, 0, 0, 1]);
        let target = StepSequence::from_pattern(&crate::euclidean_rhythm(1, 4, 3).unwrap());
        assert!(target.is_same_rhythm(&base));

        let cases: [(&dyn ProbStepAlgorithm, [f64; 4]); 3] = [
            (&SimpleProbStepAlg, [0.25, 0.0, 0.25, 0.75]),
            (&SimpleProbStepAlgV2, [0.125, 0.0, 0.125, 0.875]),
            (&MegaMorphV1, [0.125, 0.0, 0.125, 0.875]),
        ];
        for (alg, expected) in cases {
            let steps = alg.generate(&base, &target, 50);
            assert_eq!(probs(&steps), expected, "{}", alg.name());
        }
    }

    #[test]
    fn test_direct_morph_100() {
        let steps = DirectMorph100.generate(&base(), &target(), 0);
        assert_eq!(probs(&steps), vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);

        let steps = DirectMorph100.generate(&base(), &target(), 100);
        assert_eq!(probs(&steps), vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);

        let steps = DirectMorph100.generate(&base(), &target(), 25);
        assert_eq!(probs(&steps), vec![0.75, 0.0, 0.0, 0.25, 0.75, 0.0, 0.25, 0.0]);
    }

    #[test]
    fn test_direct_morph_50() {
        let steps = DirectMorph50.generate(&base(), &target(), 100);
        assert_eq!(probs(&steps), vec![0.5, 0.0, 0.0, 0.5, 0.5, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_testing_no_random_ignores_amount() {
        for amount in [-10, 0, 37, 100, 500] {
            let steps = TestingNoRandom.generate(&base(), &target(), amount);
            for step in &steps {
                assert_eq!(step.probability, if step.onset { 1.0 } else { 0.0 });
            }
            assert_eq!(steps.iter().filter(|s| s.onset).count(), 4);
        }
    }

    #[test]
    fn test_onset_probabilities_at_zero() {
        // With rp = 0 every base onset is certain
        for alg in MorphAlgorithm::ALL {
            let steps = alg.generate(&base(), &target(), 0);
            for step in steps.iter().filter(|s| s.onset) {
                assert!(step.probability >= 0.0 && step.probability <= 1.0);
                if alg.records_sources() && step.from_base() {
                    assert_eq!(step.probability, 1.0, "{}", alg);
                }
            }
        }
    }

    #[test]
    fn test_amount_is_clamped() {
        for alg in MorphAlgorithm::ALL {
            assert_eq!(
                alg.generate(&base(), &target(), 300),
                alg.generate(&base(), &target(), 100)
            );
            assert_eq!(alg.generate(&base(), &target(), -5), alg.generate(&base(), &target(), 0));
        }
    }

    #[test]
    fn test_different_lengths() {
        // lcm(4, 3) = 12
        let steps = DirectMorph100.generate(&seq(&[1, 0, 0, 0]), &seq(&[1, 0, 0]), 100);
        assert_eq!(steps.len(), 12);
        let sounding: Vec<usize> = (0..12).filter(|&i| steps[i].probability > 0.0).collect();
        assert_eq!(sounding, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_degenerate_merge() {
        for alg in MorphAlgorithm::ALL {
            let steps = alg.generate(&seq(&[0, 0, 0, 0, 0, 0]), &seq(&[0, 0, 0, 0]), 50);
            assert_eq!(steps.len(), 6);
            assert!(steps.iter().all(|s| !s.onset && s.probability == 0.0));
        }
    }

    #[test]
    fn test_enum_dispatch_and_names() {
        let names: Vec<String> = MorphAlgorithm::ALL.iter().map(|a| a.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "DirectMorph100",
                "DirectMorph50",
                "MegaMorphV1",
                "SimpleProbStepAlg",
                "SimpleProbStepAlgV2",
                "TestingNoRandom"
            ]
        );
        assert_eq!(
            MorphAlgorithm::default().generate(&base(), &target(), 30),
            DirectMorph100.generate(&base(), &target(), 30)
        );
        assert_eq!("megamorphv1".parse::<MorphAlgorithm>().unwrap(), MorphAlgorithm::MegaMorphV1);
        assert!("Nope".parse::<MorphAlgorithm>().is_err());
    }
}
