//! eucmorph-core: Euclidean rhythm morphing engine

mod error;
pub mod euclidean;
pub mod morph_alg;
pub mod morpher;
pub mod prob_step;
pub mod random;
pub mod session;
mod step_seq;

pub use error::{MorphError, Result};
pub use euclidean::{euclidean_rhythm, EuclideanParams};
pub use morph_alg::{
    DirectMorph100, DirectMorph50, MegaMorphV1, MorphAlgorithm, ProbStepAlgorithm,
    SimpleProbStepAlg, SimpleProbStepAlgV2, TestingNoRandom,
};
pub use morpher::EucMorpher;
pub use prob_step::{merge_onsets, morph_ratio, ProbStep, ProbStepTable, StepSource};
pub use random::{FixedSource, RandomSource};
pub use session::{MorphOutput, MorphRequest, MorphSession};
pub use step_seq::{Step, StepSequence};
