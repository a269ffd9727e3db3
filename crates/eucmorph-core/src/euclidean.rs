//! Euclidean rhythm generation (Bjorklund's algorithm, bucket-merge form)

use serde::{Deserialize, Serialize};

use crate::error::{MorphError, Result};

/// Parameters of a Euclidean target rhythm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EuclideanParams {
    /// Number of onsets (k)
    pub onsets: usize,
    /// Pattern length in steps (n)
    pub length: usize,
    /// Right rotation in steps (r)
    pub rotation: usize,
}

impl EuclideanParams {
    pub fn new(onsets: usize, length: usize, rotation: usize) -> Self {
        Self { onsets, length, rotation }
    }

    pub fn validate(&self) -> Result<()> {
        if self.length == 0 {
            return Err(MorphError::InvalidParameter("length must be at least 1".into()));
        }
        if self.onsets > self.length {
            return Err(MorphError::InvalidParameter(format!(
                "onsets ({}) exceed length ({})",
                self.onsets, self.length
            )));
        }
        if self.rotation >= self.length {
            return Err(MorphError::InvalidParameter(format!(
                "rotation ({}) must be less than length ({})",
                self.rotation, self.length
            )));
        }
        Ok(())
    }

    pub fn pattern(&self) -> Result<Vec<bool>> {
        euclidean_rhythm(self.onsets, self.length, self.rotation)
    }
}

/// Generate a Euclidean rhythm pattern
///
/// # Arguments
/// * `onsets` - Number of hits to distribute (k)
/// * `length` - Total number of steps (n)
/// * `rotation` - Rotate the pattern right by this many steps (0 <= r < n)
///
/// # Returns
/// Vec of bools where true = onset, false = rest
///
/// # Example
/// ```
/// use eucmorph_core::euclidean_rhythm;
/// let pattern = euclidean_rhythm(3, 8, 0).unwrap();
/// assert_eq!(pattern, vec![true, false, false, true, false, false, true, false]);
/// ```
pub fn euclidean_rhythm(onsets: usize, length: usize, rotation: usize) -> Result<Vec<bool>> {
    EuclideanParams::new(onsets, length, rotation).validate()?;

    let mut buckets: Vec<Vec<bool>> = (0..length).map(|i| vec![i < onsets]).collect();
    let mut a = onsets.min(length - onsets);
    let mut b = onsets.max(length - onsets);

    if a >= 1 {
        for _ in 0..b / a {
            fold_tail(&mut buckets, a);
        }
        b %= a;

        while b > 1 {
            for _ in 0..a / b {
                fold_tail(&mut buckets, b);
            }
            let prev = b;
            b = a % b;
            a = prev;
        }
    }

    let mut pattern: Vec<bool> = buckets.into_iter().flatten().collect();
    pattern.rotate_right(rotation);
    Ok(pattern)
}

/// Pop the last bucket onto each of the first `count` buckets in turn
fn fold_tail(buckets: &mut Vec<Vec<bool>>, count: usize) {
    for j in 0..count {
        let Some(tail) = buckets.pop() else { return };
        match buckets.get_mut(j) {
            Some(head) => head.extend(tail),
            None => buckets.push(tail),
        }
    }
}
