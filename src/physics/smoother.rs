//! Landmark smoother - one Kalman filter per landmark with a symmetry heuristic
//!
//! An occluded landmark borrows the motion state of its visible mirror
//! partner before extrapolating.

use log::warn;
use serde::{Deserialize, Serialize};

use super::kalman::{Damping, KalmanFilter, KalmanParams};
use crate::pose::{is_extremity, Landmark, SymmetricPairMap, LANDMARK_COUNT};

type Motion = ((f32, f32, f32), (f32, f32, f32));

/// Smoother tunables
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    /// Measurements at or below this visibility are treated as occluded
    pub visibility_threshold: f32,
    pub kalman: KalmanParams,
    pub body_damping: Damping,
    pub extremity_damping: Damping,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.65,
            kalman: KalmanParams::default(),
            body_damping: Damping::BODY,
            extremity_damping: Damping::EXTREMITY,
        }
    }
}

/// Bank of independent per-landmark filters
///
/// Slots are created lazily on first sight of an index and live as long as
/// the smoother.
pub struct LandmarkSmoother {
    filters: [Option<KalmanFilter>; LANDMARK_COUNT],
    pairs: SymmetricPairMap,
    config: SmootherConfig,
}

impl LandmarkSmoother {
    pub fn new(config: SmootherConfig) -> Self {
        Self {
            filters: std::array::from_fn(|_| None),
            pairs: SymmetricPairMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SmootherConfig {
        &self.config
    }

    /// Filter state for a landmark, once it has been seen
    pub fn filter(&self, index: usize) -> Option<&KalmanFilter> {
        self.filters.get(index).and_then(Option::as_ref)
    }

    /// Drop all filter state (next frame re-initialises from measurements)
    pub fn reset(&mut self) {
        self.filters = std::array::from_fn(|_| None);
    }

    fn damping_for(&self, index: usize) -> Damping {
        if is_extremity(index) {
            self.config.extremity_damping
        } else {
            self.config.body_damping
        }
    }

    /// Smooth one frame of raw landmarks.
    ///
    /// Output has one entry per input landmark (up to 33): smoothed position,
    /// original visibility. Slots tracked from earlier frames but missing
    /// from a shorter one still advance on their prediction. Empty input yields empty output and leaves the
    /// filters untouched.
    pub fn smooth(&mut self, raw: &[Landmark]) -> Vec<Landmark> {
        if raw.is_empty() {
            return Vec::new();
        }
        if raw.len() > LANDMARK_COUNT {
            warn!(
                "Ignoring {} landmarks beyond the {}-point topology",
                raw.len() - LANDMARK_COUNT,
                LANDMARK_COUNT
            );
        }
        let raw = &raw[..raw.len().min(LANDMARK_COUNT)];
        let threshold = self.config.visibility_threshold;

        // 1. First sight: start at the measurement, at rest
        for (i, lm) in raw.iter().enumerate() {
            if self.filters[i].is_none() {
                self.filters[i] = Some(KalmanFilter::new(lm.position(), self.config.kalman));
            }
        }

        // 2. Motion snapshot taken before any slot advances, so the transfer
        //    does not depend on iteration order
        let motion: [Option<Motion>; LANDMARK_COUNT] = std::array::from_fn(|i| {
            self.filters[i]
                .as_ref()
                .map(|kf| (kf.velocity(), kf.acceleration()))
        });

        let mut smoothed = Vec::with_capacity(raw.len());
        for i in 0..LANDMARK_COUNT {
            let damping = self.damping_for(i);
            let measured = raw.get(i);

            // 3. Symmetry transfer for occluded landmarks with a visible partner
            let borrowed = match measured {
                Some(lm) if lm.visibility < threshold => self
                    .pairs
                    .partner(i)
                    .filter(|&p| raw.get(p).map_or(false, |partner| partner.visibility > threshold))
                    .and_then(|p| motion[p]),
                _ => None,
            };

            let Some(kf) = self.filters[i].as_mut() else {
                continue;
            };
            if let Some((velocity, acceleration)) = borrowed {
                kf.set_motion(velocity, acceleration);
            }

            // 4. Every tracked slot predicts, even when this frame is too
            //    short to carry it; only trusted measurements correct
            kf.predict(damping);
            let Some(lm) = measured else {
                continue;
            };
            if lm.visibility > threshold {
                kf.update(lm.position());
            }

            let (x, y, z) = kf.position();
            smoothed.push(Landmark::new(x, y, z, lm.visibility));
        }

        smoothed
    }
}

impl Default for LandmarkSmoother {
    fn default() -> Self {
        Self::new(SmootherConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{LEFT_KNEE, LEFT_WRIST, RIGHT_KNEE, RIGHT_WRIST};
    use approx::assert_relative_eq;

    fn frame(visibility: f32) -> Vec<Landmark> {
        vec![Landmark::new(0.5, 0.5, 0.0, visibility); LANDMARK_COUNT]
    }

    #[test]
    fn test_empty_frame_passes_through() {
        let mut smoother = LandmarkSmoother::default();
        assert!(smoother.smooth(&[]).is_empty());
        assert!(smoother.filter(0).is_none());
    }

    #[test]
    fn test_first_frame_initialises_at_measurement() {
        let mut smoother = LandmarkSmoother::default();
        let mut raw = frame(0.9);
        raw[LEFT_KNEE] = Landmark::new(0.3, 0.7, -0.2, 0.9);

        let out = smoother.smooth(&raw);
        assert_eq!(out.len(), LANDMARK_COUNT);
        assert_relative_eq!(out[LEFT_KNEE].x, 0.3, epsilon = 1e-6);
        assert_relative_eq!(out[LEFT_KNEE].y, 0.7, epsilon = 1e-6);
        assert_relative_eq!(out[LEFT_KNEE].z, -0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_visibility_passes_through_unfiltered() {
        let mut smoother = LandmarkSmoother::default();
        let mut raw = frame(0.9);
        raw[LEFT_WRIST].visibility = 0.12;
        let out = smoother.smooth(&raw);
        assert_eq!(out[LEFT_WRIST].visibility, 0.12);
        assert_eq!(out[0].visibility, 0.9);
    }

    #[test]
    fn test_stationary_point_converges() {
        let mut smoother = LandmarkSmoother::default();
        let mut raw = frame(0.9);
        raw[LEFT_KNEE] = Landmark::new(0.2, 0.2, 0.0, 0.9);
        smoother.smooth(&raw);

        // Point jumps once, then holds still
        raw[LEFT_KNEE] = Landmark::new(0.4, 0.6, 0.1, 0.9);
        let mut out = Vec::new();
        for _ in 0..400 {
            out = smoother.smooth(&raw);
        }

        assert_relative_eq!(out[LEFT_KNEE].x, 0.4, epsilon = 1e-2);
        assert_relative_eq!(out[LEFT_KNEE].y, 0.6, epsilon = 1e-2);
        assert_relative_eq!(out[LEFT_KNEE].z, 0.1, epsilon = 1e-2);

        let kf = smoother.filter(LEFT_KNEE).unwrap();
        let (vx, vy, vz) = kf.velocity();
        assert!(vx.abs() < 1e-2 && vy.abs() < 1e-2 && vz.abs() < 1e-2);
        let (ax, ay, az) = kf.acceleration();
        assert!(ax.abs() < 1e-2 && ay.abs() < 1e-2 && az.abs() < 1e-2);
    }

    #[test]
    fn test_occluded_without_partner_extrapolates() {
        let mut smoother = LandmarkSmoother::default();
        let raw = frame(0.9);
        smoother.smooth(&raw);

        // Measurement jumps but is not trusted: output stays on the prediction
        let mut occluded = raw.clone();
        occluded[LEFT_KNEE] = Landmark::new(0.9, 0.9, 0.0, 0.3);
        occluded[RIGHT_KNEE].visibility = 0.3;
        let out = smoother.smooth(&occluded);
        assert_relative_eq!(out[LEFT_KNEE].x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(out[LEFT_KNEE].y, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_symmetry_transfer_copies_partner_motion() {
        let mut smoother = LandmarkSmoother::default();

        // Both knees start together, then the left knee moves steadily right
        let mut raw = frame(0.9);
        smoother.smooth(&raw);
        for step in 1..=30 {
            raw[LEFT_KNEE].x = 0.5 + 0.01 * step as f32;
            raw[RIGHT_KNEE].x = 0.5;
            smoother.smooth(&raw);
        }

        let visible = smoother.filter(LEFT_KNEE).unwrap().clone();
        assert!(visible.velocity().0 > 0.0);

        // Right knee drops out while the left keeps moving
        raw[LEFT_KNEE].x += 0.01;
        raw[RIGHT_KNEE].visibility = 0.2;
        smoother.smooth(&raw);

        // Occluded knee carried the partner's motion through the same prediction
        let mut expected = visible.clone();
        expected.predict(Damping::BODY);
        let occluded = smoother.filter(RIGHT_KNEE).unwrap();
        assert_relative_eq!(occluded.velocity().0, expected.velocity().0, epsilon = 1e-6);
        assert_relative_eq!(occluded.velocity().1, expected.velocity().1, epsilon = 1e-6);
        assert_relative_eq!(occluded.acceleration().0, expected.acceleration().0, epsilon = 1e-6);
        assert!(occluded.velocity().0 > 0.0);
    }

    #[test]
    fn test_extra_landmarks_ignored() {
        let mut smoother = LandmarkSmoother::default();
        let raw = vec![Landmark::new(0.1, 0.1, 0.0, 0.9); LANDMARK_COUNT + 3];
        assert_eq!(smoother.smooth(&raw).len(), LANDMARK_COUNT);
    }

    #[test]
    fn test_short_frame_still_advances_tracked_slots() {
        let mut smoother = LandmarkSmoother::default();
        let mut raw = frame(0.9);
        for step in 0..20 {
            raw[LEFT_KNEE].x = 0.3 + 0.01 * step as f32;
            smoother.smooth(&raw);
        }
        let tracked = smoother.filter(LEFT_KNEE).unwrap().clone();
        assert!(tracked.velocity().0 > 0.0);

        // Only the face arrives this frame
        let out = smoother.smooth(&raw[..10]);
        assert_eq!(out.len(), 10);

        let mut expected = tracked.clone();
        expected.predict(Damping::BODY);
        let knee = smoother.filter(LEFT_KNEE).unwrap();
        assert_relative_eq!(knee.position().0, expected.position().0, epsilon = 1e-6);
        assert!(knee.position().0 > tracked.position().0);
    }

    #[test]
    fn test_extremities_damped_harder() {
        let mut smoother = LandmarkSmoother::default();
        let mut raw = frame(0.9);
        smoother.smooth(&raw);

        // Same drift on a wrist and a knee, then both sides go dark
        for index in [LEFT_WRIST, LEFT_KNEE] {
            if let Some(kf) = smoother.filters[index].as_mut() {
                kf.set_motion((0.01, 0.0, 0.0), (0.0, 0.0, 0.0));
            }
        }
        for index in [LEFT_WRIST, RIGHT_WRIST, LEFT_KNEE, RIGHT_KNEE] {
            raw[index].visibility = 0.1;
        }
        smoother.smooth(&raw);

        let wrist = smoother.filter(LEFT_WRIST).unwrap().velocity().0;
        let knee = smoother.filter(LEFT_KNEE).unwrap().velocity().0;
        assert_relative_eq!(wrist, 0.01 * Damping::EXTREMITY.velocity, epsilon = 1e-6);
        assert_relative_eq!(knee, 0.01 * Damping::BODY.velocity, epsilon = 1e-6);
    }
}
