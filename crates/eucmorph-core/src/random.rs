//! Uniform randomness consumed by the sampler

/// Source of independent uniform samples in [0, 1)
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl RandomSource for fastrand::Rng {
    fn next_f64(&mut self) -> f64 {
        self.f64()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Replays a fixed list of samples, wrapping around at the end
#[derive(Debug, Clone)]
pub struct FixedSource {
    values: Vec<f64>,
    index: usize,
    draws: usize,
}

impl FixedSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, index: 0, draws: 0 }
    }

    /// Always returns `value`
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of samples handed out so far
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl RandomSource for FixedSource {
    fn next_f64(&mut self) -> f64 {
        self.draws += 1;
        let Some(&value) = self.values.get(self.index) else { return 0.0 };
        self.index = (self.index + 1) % self.values.len();
        value
    }
}
