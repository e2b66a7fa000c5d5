#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }
}

/// A 0 -> 1 ramp over the frame window `[start, start + len]`, clamped on both sides.
///
/// Frames before the window read 0 and frames after it read exactly 1.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Ramp {
    pub start: u64,
    pub len: u64,
    pub ease: Ease,
}

impl Ramp {
    pub fn new(start: u64, len: u64, ease: Ease) -> Self {
        Self { start, len, ease }
    }

    pub fn end(self) -> u64 {
        self.start.saturating_add(self.len)
    }

    pub fn sample(self, frame: u64) -> f64 {
        if frame <= self.start {
            // A zero-length ramp is a step at `start`.
            return if self.len == 0 && frame == self.start {
                1.0
            } else {
                0.0
            };
        }
        if frame >= self.end() {
            return 1.0;
        }
        let t = (frame - self.start) as f64 / self.len as f64;
        self.ease.apply(t)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
