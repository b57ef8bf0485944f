//! Bounded actor resource (health, stamina, concentration)

use serde::{Deserialize, Serialize};

/// A value clamped to `[0, max]` that depletes on negative events
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Meter {
    value: f32,
    max: f32,
}

impl Meter {
    /// A full meter. Negative or NaN maxima collapse to an empty zero-sized meter.
    pub fn full(max: f32) -> Self {
        let max = max.max(0.0);
        Self { value: max, max }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Fill level in `[0, 1]`
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.value / self.max
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value <= 0.0
    }

    /// Remove `amount`. Returns true only for the drain that empties a non-empty meter.
    pub fn drain(&mut self, amount: f32) -> bool {
        let was_live = !self.is_empty();
        self.value = (self.value - amount.max(0.0)).clamp(0.0, self.max);
        was_live && self.is_empty()
    }

    pub fn restore(&mut self, amount: f32) {
        self.value = (self.value + amount.max(0.0)).clamp(0.0, self.max);
    }

    pub fn refill(&mut self) {
        self.value = self.max;
    }
}
