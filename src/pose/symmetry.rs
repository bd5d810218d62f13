//! Left/right landmark pairing
//!
//! Built once, read-only afterwards. Used by the smoother to borrow motion
//! from a visible limb and by the analyzer to mirror bilateral joints.

use super::landmarks::*;

/// Bilateral landmark pairs (left, right)
pub const SYMMETRIC_PAIRS: [(usize, usize); 11] = [
    (LEFT_SHOULDER, RIGHT_SHOULDER),
    (LEFT_ELBOW, RIGHT_ELBOW),
    (LEFT_WRIST, RIGHT_WRIST),
    (LEFT_PINKY, RIGHT_PINKY),
    (LEFT_INDEX, RIGHT_INDEX),
    (LEFT_THUMB, RIGHT_THUMB),
    (LEFT_HIP, RIGHT_HIP),
    (LEFT_KNEE, RIGHT_KNEE),
    (LEFT_ANKLE, RIGHT_ANKLE),
    (LEFT_HEEL, RIGHT_HEEL),
    (LEFT_FOOT_INDEX, RIGHT_FOOT_INDEX),
];

/// Bidirectional index -> partner lookup
#[derive(Clone, Debug)]
pub struct SymmetricPairMap {
    partners: [Option<usize>; LANDMARK_COUNT],
}

impl SymmetricPairMap {
    pub fn new() -> Self {
        let mut partners = [None; LANDMARK_COUNT];
        for &(left, right) in SYMMETRIC_PAIRS.iter() {
            partners[left] = Some(right);
            partners[right] = Some(left);
        }
        Self { partners }
    }

    /// Mirror counterpart of a landmark, if it has one
    pub fn partner(&self, index: usize) -> Option<usize> {
        self.partners.get(index).copied().flatten()
    }

    /// Landmark on the requested side. Midline landmarks map to themselves.
    pub fn on_side(&self, index: usize, side: Side) -> usize {
        let name = match landmark_name(index) {
            Some(name) => name,
            None => return index,
        };
        match Side::of_name(name) {
            Some(own) if own != side => self.partner(index).unwrap_or(index),
            _ => index,
        }
    }
}

impl Default for SymmetricPairMap {
    fn default() -> Self {
        Self::new()
    }
}
