//! One Euro Filter - adaptive low-pass smoothing for landmark positions
//!
//! Smooth when slow (reduces jitter), responsive when fast (follows reps).
//! Alternative to the Kalman bank: no motion model, so no occlusion
//! extrapolation, but nothing to tune beyond two cutoffs and a slope.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::pose::{Landmark, LANDMARK_COUNT};

/// Cutoff tunables shared by every coordinate filter
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OneEuroParams {
    /// Cutoff (Hz) for a still landmark
    pub min_cutoff: f32,
    /// How fast the cutoff opens up with speed
    pub beta: f32,
    /// Cutoff (Hz) for the speed estimate
    pub d_cutoff: f32,
}

impl Default for OneEuroParams {
    fn default() -> Self {
        Self {
            min_cutoff: 1.0,
            beta: 0.0,
            d_cutoff: 1.0,
        }
    }
}

/// Adaptive low-pass filter for a single scalar signal
#[derive(Clone, Debug)]
pub struct OneEuroFilter {
    params: OneEuroParams,

    // State
    raw_prev: f32,
    filtered_prev: f32,
    dx_prev: f32,
    t_prev: f64,
    initialized: bool,
}

impl OneEuroFilter {
    pub fn new(params: OneEuroParams) -> Self {
        Self {
            params,
            raw_prev: 0.0,
            filtered_prev: 0.0,
            dx_prev: 0.0,
            t_prev: 0.0,
            initialized: false,
        }
    }

    /// Smoothing factor alpha for a cutoff over a sample period `t_e`
    fn smoothing_factor(t_e: f32, cutoff: f32) -> f32 {
        let r = 2.0 * PI * cutoff * t_e;
        r / (r + 1.0)
    }

    /// Feed sample `x` taken at `t` seconds. A timestamp that does not
    /// advance returns the previous output.
    pub fn filter(&mut self, t: f64, x: f32) -> f32 {
        if !self.initialized {
            self.raw_prev = x;
            self.filtered_prev = x;
            self.t_prev = t;
            self.initialized = true;
            return x;
        }

        let t_e = (t - self.t_prev) as f32;
        if t_e <= 0.0 {
            return self.filtered_prev;
        }

        // 1. Derivative of the raw signal, low-passed
        let a_d = Self::smoothing_factor(t_e, self.params.d_cutoff);
        let dx = (x - self.raw_prev) / t_e;
        let dx_hat = a_d * dx + (1.0 - a_d) * self.dx_prev;

        // 2. Cutoff rises with speed
        let cutoff = self.params.min_cutoff + self.params.beta * dx_hat.abs();
        let a = Self::smoothing_factor(t_e, cutoff);

        let x_hat = a * x + (1.0 - a) * self.filtered_prev;

        self.raw_prev = x;
        self.filtered_prev = x_hat;
        self.dx_prev = dx_hat;
        self.t_prev = t;

        x_hat
    }

    pub fn reset(&mut self) {
        self.initialized = false;
        self.dx_prev = 0.0;
    }
}

/// One Euro filters for every coordinate of every landmark
pub struct OneEuroSmoother {
    filters: [Option<[OneEuroFilter; 3]>; LANDMARK_COUNT],
    params: OneEuroParams,
}

impl OneEuroSmoother {
    pub fn new(params: OneEuroParams) -> Self {
        Self {
            filters: std::array::from_fn(|_| None),
            params,
        }
    }

    /// Smooth one frame captured at `t` seconds. Visibility passes through.
    pub fn smooth(&mut self, t: f64, raw: &[Landmark]) -> Vec<Landmark> {
        let params = self.params;
        raw.iter()
            .take(LANDMARK_COUNT)
            .enumerate()
            .map(|(i, lm)| {
                let [fx, fy, fz] = self.filters[i]
                    .get_or_insert_with(|| std::array::from_fn(|_| OneEuroFilter::new(params)));
                Landmark::new(
                    fx.filter(t, lm.x),
                    fy.filter(t, lm.y),
                    fz.filter(t, lm.z),
                    lm.visibility,
                )
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.filters = std::array::from_fn(|_| None);
    }
}
