//! Gain and pan state shown under each meter strip.
//!
//! These do not feed back into the meters; they only share the strip's column in the panel.
use std::{ops::RangeInclusive, sync::Arc};

pub const GAIN_RANGE: RangeInclusive<f64> = 0.0..=100.0;
pub const PAN_RANGE: RangeInclusive<f64> = -100.0..=100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GainControl {
    name: Arc<str>,
    gain: f64,
    pan: f64,
    pan_enabled: bool,
}

impl GainControl {
    /// Full gain, centered pan, pan disabled.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        GainControl {
            name: name.into(),
            gain: *GAIN_RANGE.end(),
            pan: 0.0,
            pan_enabled: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn pan(&self) -> f64 {
        self.pan
    }

    pub fn pan_enabled(&self) -> bool {
        self.pan_enabled
    }

    /// Set the gain, clamped to `GAIN_RANGE`.
    pub fn set_gain(&mut self, gain: f64) {
        self.gain = clamp(gain, &GAIN_RANGE);
    }

    /// Set the pan, clamped to `PAN_RANGE`. Ignored (returns `false`) while pan is disabled.
    pub fn set_pan(&mut self, pan: f64) -> bool {
        if !self.pan_enabled {
            return false;
        }
        self.pan = clamp(pan, &PAN_RANGE);
        true
    }

    /// Toggling pan either way recenters it.
    pub fn set_pan_enabled(&mut self, enabled: bool) {
        self.pan_enabled = enabled;
        self.pan = 0.0;
    }
}

fn clamp(v: f64, range: &RangeInclusive<f64>) -> f64 {
    if v.is_nan() {
        return *range.start();
    }
    v.max(*range.start()).min(*range.end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ctrl = GainControl::new("Master");
        assert_eq!(ctrl.name(), "Master");
        assert_eq!(ctrl.gain(), 100.0);
        assert_eq!(ctrl.pan(), 0.0);
        assert!(!ctrl.pan_enabled());
    }

    #[test]
    fn test_gain_clamped() {
        let mut ctrl = GainControl::new("V1");
        ctrl.set_gain(42.0);
        assert_eq!(ctrl.gain(), 42.0);
        ctrl.set_gain(150.0);
        assert_eq!(ctrl.gain(), 100.0);
        ctrl.set_gain(-3.0);
        assert_eq!(ctrl.gain(), 0.0);
    }

    #[test]
    fn test_pan_needs_toggle() {
        let mut ctrl = GainControl::new("A1");
        assert!(!ctrl.set_pan(50.0));
        assert_eq!(ctrl.pan(), 0.0);

        ctrl.set_pan_enabled(true);
        assert!(ctrl.set_pan(-250.0));
        assert_eq!(ctrl.pan(), -100.0);

        ctrl.set_pan_enabled(false);
        assert_eq!(ctrl.pan(), 0.0);
        ctrl.set_pan_enabled(true);
        assert_eq!(ctrl.pan(), 0.0);
    }
}
