//! Landmark data and the MediaPipe Pose topology
//!
//! The upstream detector hands us 33 landmarks in a fixed order. Index
//! position carries meaning (11 = left shoulder, 25 = left knee, ...), so
//! everything downstream works on indices and only the config layer ever
//! sees names.

use serde::{Deserialize, Serialize};

// ============================================================================
// LANDMARK INDICES (MediaPipe Pose - 33 total)
// ============================================================================

pub const LANDMARK_COUNT: usize = 33;

/// Values per landmark in a flat buffer: x, y, z, visibility
pub const FLAT_STRIDE: usize = 4;

pub const NOSE: usize = 0;
pub const LEFT_EYE_INNER: usize = 1;
pub const LEFT_EYE: usize = 2;
pub const LEFT_EYE_OUTER: usize = 3;
pub const RIGHT_EYE_INNER: usize = 4;
pub const RIGHT_EYE: usize = 5;
pub const RIGHT_EYE_OUTER: usize = 6;
pub const LEFT_EAR: usize = 7;
pub const RIGHT_EAR: usize = 8;
pub const MOUTH_LEFT: usize = 9;
pub const MOUTH_RIGHT: usize = 10;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_PINKY: usize = 17;
pub const RIGHT_PINKY: usize = 18;
pub const LEFT_INDEX: usize = 19;
pub const RIGHT_INDEX: usize = 20;
pub const LEFT_THUMB: usize = 21;
pub const RIGHT_THUMB: usize = 22;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;
pub const LEFT_HEEL: usize = 29;
pub const RIGHT_HEEL: usize = 30;
pub const LEFT_FOOT_INDEX: usize = 31;
pub const RIGHT_FOOT_INDEX: usize = 32;

/// Landmark names in index order, as they appear in exercise configs
pub const LANDMARK_NAMES: [&str; LANDMARK_COUNT] = [
    "NOSE",
    "LEFT_EYE_INNER", "LEFT_EYE", "LEFT_EYE_OUTER",
    "RIGHT_EYE_INNER", "RIGHT_EYE", "RIGHT_EYE_OUTER",
    "LEFT_EAR", "RIGHT_EAR",
    "MOUTH_LEFT", "MOUTH_RIGHT",
    "LEFT_SHOULDER", "RIGHT_SHOULDER",
    "LEFT_ELBOW", "RIGHT_ELBOW",
    "LEFT_WRIST", "RIGHT_WRIST",
    "LEFT_PINKY", "RIGHT_PINKY",
    "LEFT_INDEX", "RIGHT_INDEX",
    "LEFT_THUMB", "RIGHT_THUMB",
    "LEFT_HIP", "RIGHT_HIP",
    "LEFT_KNEE", "RIGHT_KNEE",
    "LEFT_ANKLE", "RIGHT_ANKLE",
    "LEFT_HEEL", "RIGHT_HEEL",
    "LEFT_FOOT_INDEX", "RIGHT_FOOT_INDEX",
];

/// Resolve a joint name (case-insensitive) to its landmark index
pub fn landmark_index(name: &str) -> Option<usize> {
    LANDMARK_NAMES
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(name.trim()))
}

/// Name of a landmark index, if it is part of the topology
pub fn landmark_name(index: usize) -> Option<&'static str> {
    LANDMARK_NAMES.get(index).copied()
}

/// Wrists and hand points. They swing faster than the torso, so the
/// smoother damps their motion state harder.
pub fn is_extremity(index: usize) -> bool {
    (LEFT_WRIST..=RIGHT_THUMB).contains(&index)
}

// ============================================================================
// BODY SIDE
// ============================================================================

/// Left or right half of a bilateral measurement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Side encoded in a `left_`/`right_` prefixed name, if any
    pub fn of_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        if lower.starts_with("left_") {
            Some(Side::Left)
        } else if lower.starts_with("right_") {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Same name with its side prefix swapped (`left_knee` -> `right_knee`).
    /// Case of the remainder is preserved.
    pub fn mirror_name(name: &str) -> Option<String> {
        let trimmed = name.trim();
        let side = Side::of_name(trimmed)?;
        let prefix_len = match side {
            Side::Left => "left_".len(),
            Side::Right => "right_".len(),
        };
        let is_upper = trimmed[..prefix_len].chars().all(|c| !c.is_ascii_lowercase());
        let prefix = match (side.opposite(), is_upper) {
            (Side::Left, true) => "LEFT_",
            (Side::Left, false) => "left_",
            (Side::Right, true) => "RIGHT_",
            (Side::Right, false) => "right_",
        };
        Some(format!("{}{}", prefix, &trimmed[prefix_len..]))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

// ============================================================================
// LANDMARK DATA STRUCTURE
// ============================================================================

/// A single 3D landmark point (normalized coordinates)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,  // 0-1 normalized, grows rightwards
    pub y: f32,  // 0-1 normalized, grows downwards
    pub z: f32,  // Relative depth
    pub visibility: f32,  // 0-1 detector confidence
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    pub fn position(&self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }

    /// Image-plane position
    pub fn xy(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Parse a flat buffer of `[x, y, z, visibility] * 33`.
    ///
    /// An empty buffer is a valid "no person" frame and yields an empty
    /// vector. Any other length is rejected.
    pub fn from_flat(data: &[f32]) -> Option<Vec<Landmark>> {
        if data.is_empty() {
            return Some(Vec::new());
        }
        if data.len() != LANDMARK_COUNT * FLAT_STRIDE {
            return None;
        }
        Some(
            data.chunks_exact(FLAT_STRIDE)
                .map(|c| Landmark::new(c[0], c[1], c[2], c[3]))
                .collect(),
        )
    }
}

/// Mean visibility of the given landmark indices. Indices outside the
/// frame count as invisible.
pub fn mean_visibility(landmarks: &[Landmark], indices: &[usize]) -> f32 {
    if indices.is_empty() {
        return 0.0;
    }
    let total: f32 = indices
        .iter()
        .map(|&i| landmarks.get(i).map_or(0.0, |lm| lm.visibility))
        .sum();
    total / indices.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup() {
        assert_eq!(landmark_index("LEFT_SHOULDER"), Some(LEFT_SHOULDER));
        assert_eq!(landmark_index("right_knee"), Some(RIGHT_KNEE));
        assert_eq!(landmark_index("LEFT_KNEECAP"), None);
        assert_eq!(landmark_name(RIGHT_FOOT_INDEX), Some("RIGHT_FOOT_INDEX"));
    }

    #[test]
    fn test_mirror_name_keeps_case() {
        assert_eq!(Side::mirror_name("right_knee").as_deref(), Some("left_knee"));
        assert_eq!(Side::mirror_name("LEFT_HIP").as_deref(), Some("RIGHT_HIP"));
        assert_eq!(Side::mirror_name("spine"), None);
    }

    #[test]
    fn test_flat_parsing() {
        assert_eq!(Landmark::from_flat(&[]), Some(Vec::new()));
        assert!(Landmark::from_flat(&[0.0; 99]).is_none());

        let mut data = vec![0.0; LANDMARK_COUNT * FLAT_STRIDE];
        data[LEFT_KNEE * FLAT_STRIDE..(LEFT_KNEE + 1) * FLAT_STRIDE]
            .copy_from_slice(&[0.4, 0.7, -0.1, 0.9]);
        let parsed = Landmark::from_flat(&data).unwrap();
        assert_eq!(parsed.len(), LANDMARK_COUNT);
        assert_eq!(parsed[LEFT_KNEE], Landmark::new(0.4, 0.7, -0.1, 0.9));
    }

    #[test]
    fn test_extremities() {
        assert!(is_extremity(LEFT_WRIST));
        assert!(is_extremity(RIGHT_THUMB));
        assert!(!is_extremity(LEFT_ELBOW));
        assert!(!is_extremity(LEFT_HIP));
    }
}
