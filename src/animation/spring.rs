use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};

pub const MIN_SPRING_STIFFNESS: f64 = 100.0;
pub const MIN_SPRING_DAMPING: f64 = 10.0;

/// Damped mass-spring pulled from 0 toward a target of 1, starting at rest.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Spring {
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
}

impl Default for Spring {
    fn default() -> Self {
        Self {
            mass: 1.0,
            stiffness: MIN_SPRING_STIFFNESS,
            damping: MIN_SPRING_DAMPING,
        }
    }
}

impl Spring {
    pub fn new(mass: f64, stiffness: f64, damping: f64) -> Self {
        Self {
            mass,
            stiffness,
            damping,
        }
    }

    pub fn validate(&self) -> ReelResult<()> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(ReelError::compilation("spring mass must be > 0"));
        }
        if !(self.stiffness.is_finite() && self.stiffness >= MIN_SPRING_STIFFNESS) {
            return Err(ReelError::compilation(format!(
                "spring stiffness must be >= {MIN_SPRING_STIFFNESS}"
            )));
        }
        if !(self.damping.is_finite() && self.damping >= MIN_SPRING_DAMPING) {
            return Err(ReelError::compilation(format!(
                "spring damping must be >= {MIN_SPRING_DAMPING}"
            )));
        }
        Ok(())
    }

    /// Damping ratio; 1.0 is critical damping.
    pub fn damping_ratio(&self) -> f64 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }

    /// Displacement toward the target after `t` seconds.
    ///
    /// Non-positive `t` reads as the initial condition (0), so delayed elements never see a
    /// negative-time value.
    pub fn sample_secs(&self, t: f64) -> f64 {
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t.is_infinite() {
            return 1.0;
        }

        let omega0 = (self.stiffness / self.mass).sqrt();
        let zeta = self.damping_ratio();

        if (zeta - 1.0).abs() < 1e-9 {
            1.0 - (-omega0 * t).exp() * (1.0 + omega0 * t)
        } else if zeta < 1.0 {
            let omega_d = omega0 * (1.0 - zeta * zeta).sqrt();
            let decay = (-zeta * omega0 * t).exp();
            1.0 - decay
                * ((omega_d * t).cos() + (zeta * omega0 / omega_d) * (omega_d * t).sin())
        } else {
            let root = (zeta * zeta - 1.0).sqrt();
            let r1 = -omega0 * (zeta - root);
            let r2 = -omega0 * (zeta + root);
            1.0 - (r2 * (r1 * t).exp() - r1 * (r2 * t).exp()) / (r2 - r1)
        }
    }

    /// Sample at a frame offset, which may be negative while an element is still delayed.
    pub fn sample_frame(&self, frame_offset: i64, fps: Fps) -> f64 {
        if frame_offset <= 0 {
            return 0.0;
        }
        self.sample_secs(fps.frames_to_secs(frame_offset as u64))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/spring.rs"]
mod tests;
