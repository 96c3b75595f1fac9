use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Tensor extents; `-1` marks a dimension resolved only at run time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dims(pub Vec<i64>);

impl Dims {
    pub fn new(dims: impl Into<Vec<i64>>) -> Self {
        Self(dims.into())
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<i64> {
        self.0.clone()
    }

    pub fn is_static(&self) -> bool {
        self.0.iter().all(|dim| *dim >= 0)
    }

    /// Number of elements, when every extent is known and the count fits an `i64`.
    pub fn volume(&self) -> Option<i64> {
        if !self.is_static() {
            return None;
        }
        self.0.iter().try_fold(1i64, |count, dim| count.checked_mul(*dim))
    }

    /// Prepends unit dimensions until the rank reaches `rank`; larger shapes
    /// are returned unchanged.
    pub fn pad_to(&self, rank: usize) -> Dims {
        if self.rank() >= rank {
            return self.clone();
        }
        let mut padded = vec![1; rank - self.rank()];
        padded.extend_from_slice(&self.0);
        Dims(padded)
    }
}

impl From<Vec<i64>> for Dims {
    fn from(value: Vec<i64>) -> Self {
        Dims(value)
    }
}

impl From<&[i64]> for Dims {
    fn from(value: &[i64]) -> Self {
        Dims(value.to_vec())
    }
}

impl FromIterator<i64> for Dims {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Dims(iter.into_iter().collect())
    }
}

impl Display for Dims {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.iter().join(", "))
    }
}
