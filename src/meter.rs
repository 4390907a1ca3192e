//! Per-channel meter state and the left/right strips built from it.
//!
//! Meters are drawn as a dashed vertical line growing up from the bottom of the meter area, so all
//! positions here are in pixels with y increasing downwards.
use std::sync::Arc;

/// Length of a lit dash.
pub const DASH_INK: f64 = 5.0;
/// Gap between two dashes.
pub const DASH_SKIP: f64 = 2.0;
/// One dash plus the gap after it.
pub const DASH_PERIOD: f64 = DASH_INK + DASH_SKIP;

/// Number of dashes in a full-height meter.
pub const METER_LIGHTS: usize = 57;
/// Height of the meter area: every light plus the gaps between them.
pub const METER_HEIGHT: f64 = METER_LIGHTS as f64 * DASH_INK + (METER_LIGHTS - 1) as f64 * DASH_SKIP;
/// Width of a channel's bar.
pub const METER_WIDTH: f64 = 10.0;

/// Number of ticks a peak is held before it drops back to zero.
pub const PEAK_HOLD_TICKS: u32 = 5;

/// An axis-aligned rectangle, origin at the top left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// A rectangle of the given size with its horizontal center at `center_x`.
    pub fn centered_x(center_x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x: center_x - 0.5 * width,
            y,
            width,
            height,
        }
    }
}

/// Level and peak-hold state for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelMeter {
    current: f64,
    peak: f64,
    countdown: u32,
    hold_ticks: u32,
}

impl Default for ChannelMeter {
    fn default() -> Self {
        ChannelMeter::with_hold(PEAK_HOLD_TICKS)
    }
}

impl ChannelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A meter that holds peaks for `hold_ticks` ticks instead of the default.
    pub fn with_hold(hold_ticks: u32) -> Self {
        ChannelMeter {
            current: 0.0,
            peak: 0.0,
            countdown: 0,
            hold_ticks,
        }
    }

    /// Feed in this tick's level. Must be called exactly once per tick.
    ///
    /// A new peak restarts the hold. On every other tick the hold counts down, and the peak falls
    /// back to 0 when it runs out.
    pub fn update(&mut self, value: f64) {
        self.current = value;
        if value > self.peak {
            self.peak = value;
            self.countdown = self.hold_ticks;
        } else {
            self.countdown = self.countdown.saturating_sub(1);
            if self.countdown == 0 {
                self.peak = 0.0;
            }
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Whether the peak marker should be drawn above the bar.
    pub fn shows_peak(&self) -> bool {
        self.peak > self.current
    }

    /// Top of the bar in a meter `height` pixels tall, snapped down onto a dash boundary.
    pub fn bar_top(&self, height: f64) -> f64 {
        meter_y_for_value(self.current, height)
    }

    /// The peak-hold marker for a channel centered on `x`, if there is one to draw.
    ///
    /// The marker is one dash tall and sits over the last dash below the held peak.
    pub fn peak_marker(&self, x: f64, height: f64) -> Option<Rect> {
        if !self.shows_peak() {
            return None;
        }
        let y = meter_y_for_value(self.peak, height) + DASH_SKIP * 2.0 + DASH_INK;
        Some(Rect::centered_x(x, y, METER_WIDTH, DASH_INK))
    }
}

/// Unsnapped y position of `value` in a meter `height` pixels tall.
pub fn y_for_value(value: f64, height: f64) -> f64 {
    height - value * height
}

/// y position of `value`, moved down so the filled length is a whole number of dash periods.
///
/// Values outside `0..=1` are not clamped and give positions outside the meter.
pub fn meter_y_for_value(value: f64, height: f64) -> f64 {
    let y = y_for_value(value, height);
    y + (height - y).rem_euclid(DASH_PERIOD)
}

/// The two channel meters of one track, or of the master bus.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterStrip {
    id: usize,
    name: Arc<str>,
    pub left: ChannelMeter,
    pub right: ChannelMeter,
}

impl MeterStrip {
    pub fn new(id: usize, name: impl Into<Arc<str>>, hold_ticks: u32) -> Self {
        MeterStrip {
            id,
            name: name.into(),
            left: ChannelMeter::with_hold(hold_ticks),
            right: ChannelMeter::with_hold(hold_ticks),
        }
    }

    /// Position in the session. 0 is always the master bus.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_master(&self) -> bool {
        self.id == 0
    }

    pub fn update(&mut self, left: f64, right: f64) {
        self.left.update(left);
        self.right.update(right);
    }
}
