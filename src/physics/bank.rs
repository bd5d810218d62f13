//! Smoothing method selection
//!
//! Exercise configs pick the Kalman bank (default) or the One Euro filters.

use serde::{Deserialize, Serialize};

use super::kalman::{Damping, KalmanParams};
use super::one_euro::{OneEuroParams, OneEuroSmoother};
use super::smoother::{LandmarkSmoother, SmootherConfig};
use crate::pose::Landmark;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMethod {
    #[default]
    Kalman,
    OneEuro,
}

/// `smoothing` block of an exercise config
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub method: SmoothingMethod,
    pub visibility_threshold: f32,
    pub body_damping: Damping,
    pub extremity_damping: Damping,
    pub one_euro: OneEuroParams,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        let kalman = SmootherConfig::default();
        Self {
            method: SmoothingMethod::default(),
            visibility_threshold: kalman.visibility_threshold,
            body_damping: kalman.body_damping,
            extremity_damping: kalman.extremity_damping,
            one_euro: OneEuroParams::default(),
        }
    }
}

impl SmoothingConfig {
    /// Kalman bank settings with the config's noise block folded in
    pub fn smoother_config(&self, kalman: KalmanParams) -> SmootherConfig {
        SmootherConfig {
            visibility_threshold: self.visibility_threshold,
            kalman,
            body_damping: self.body_damping,
            extremity_damping: self.extremity_damping,
        }
    }
}

/// Whichever smoother the session runs
pub enum LandmarkFilter {
    Kalman(LandmarkSmoother),
    OneEuro(OneEuroSmoother),
}

impl LandmarkFilter {
    pub fn new(config: &SmoothingConfig, kalman: KalmanParams) -> Self {
        match config.method {
            SmoothingMethod::Kalman => {
                LandmarkFilter::Kalman(LandmarkSmoother::new(config.smoother_config(kalman)))
            }
            SmoothingMethod::OneEuro => LandmarkFilter::OneEuro(OneEuroSmoother::new(config.one_euro)),
        }
    }

    /// Smooth one frame. `t` (seconds) only matters to the One Euro filters.
    pub fn smooth(&mut self, t: f64, raw: &[Landmark]) -> Vec<Landmark> {
        match self {
            LandmarkFilter::Kalman(smoother) => smoother.smooth(raw),
            LandmarkFilter::OneEuro(smoother) => smoother.smooth(t, raw),
        }
    }

    pub fn reset(&mut self) {
        match self {
            LandmarkFilter::Kalman(smoother) => smoother.reset(),
            LandmarkFilter::OneEuro(smoother) => smoother.reset(),
        }
    }
}
