//! Score → background color for the latest-values table.

use serde::Serialize;

/// Fixed blue channel of every row style.
pub const BLUE: u8 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleDescriptor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl StyleDescriptor {
    /// CSS color, e.g. `rgb(255, 255, 150)`.
    pub fn css(&self) -> String {
        format!("rgb({}, {}, {})", self.red, self.green, self.blue)
    }
}

/// Map a sentiment score to a red/green style.
///
/// NaN counts as 0; everything else is clamped to [-1, 1] first, so the
/// function is total.
pub fn score_to_style(score: f64) -> StyleDescriptor {
    let s = if score.is_nan() { 0.0 } else { score.clamp(-1.0, 1.0) };
    let red = 255.0 * (1.0 - s.max(0.0));
    let green = 255.0 * (1.0 + s.min(0.0));
    StyleDescriptor {
        red: channel(red),
        green: channel(green),
        blue: BLUE,
    }
}

#[inline]
fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
