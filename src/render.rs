//! Geometry for drawing meter strips.
//!
//! A [`RenderPlan`] says where every bar, peak marker and label goes, and which colour zones each
//! bar passes through. Toolkits turn a plan into pixels by implementing [`Painter`].
use crate::{
    meter::{ChannelMeter, MeterStrip, Rect, DASH_PERIOD, METER_HEIGHT, METER_LIGHTS},
    scale::{DB_IEC_MINUS_12, DB_IEC_MINUS_4},
    session::Snapshot,
    Result,
};
use std::io::Write;

/// Width of the column given to each strip.
pub const SLOT_W: f64 = 60.0;
/// Height of the meter area including the channel labels.
pub const METER_SLOT_H: f64 = 416.0;
/// Where the left channel's bar sits in its slot.
const LEFT_OFFSET: f64 = 18.0;
/// Where the right channel's bar sits in its slot.
const RIGHT_OFFSET: f64 = SLOT_W / 2.0 + 6.0;

/// Where the red zone ends, as a fraction of the meter height from the top.
const RED_END: f64 = 1.0 - DB_IEC_MINUS_4;
/// Where the yellow zone ends, as a fraction of the meter height from the top.
const YELLOW_END: f64 = 1.0 - DB_IEC_MINUS_12;

/// A colour stop of the vertical meter gradient. Offsets run from the top of the meter (0.0) to
/// the bottom (1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub rgba: [f64; 4],
}

const RED: [f64; 4] = [1.0, 0.0, 0.0, 1.0];
const YELLOW: [f64; 4] = [1.0, 1.0, 0.0, 1.0];
const GREEN: [f64; 4] = [0.0, 1.0, 0.0, 1.0];

/// Red above -4 dB, yellow down to -12 dB, green below.
pub const GRADIENT_STOPS: [GradientStop; 6] = [
    GradientStop {
        offset: 0.0,
        rgba: RED,
    },
    GradientStop {
        offset: RED_END,
        rgba: RED,
    },
    GradientStop {
        offset: RED_END + 0.001,
        rgba: YELLOW,
    },
    GradientStop {
        offset: YELLOW_END,
        rgba: YELLOW,
    },
    GradientStop {
        offset: YELLOW_END + 0.001,
        rgba: GREEN,
    },
    GradientStop {
        offset: 1.0,
        rgba: GREEN,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColorZone {
    /// Nothing lit.
    Off,
    Green,
    Yellow,
    Red,
}

impl ColorZone {
    /// The zone at `y` in a meter `height` pixels tall.
    pub fn at_y(y: f64, height: f64) -> Self {
        let offset = y / height;
        if offset <= RED_END {
            ColorZone::Red
        } else if offset <= YELLOW_END {
            ColorZone::Yellow
        } else {
            ColorZone::Green
        }
    }

    pub fn rgba(self) -> Option<[f64; 4]> {
        match self {
            ColorZone::Off => None,
            ColorZone::Green => Some(GREEN),
            ColorZone::Yellow => Some(YELLOW),
            ColorZone::Red => Some(RED),
        }
    }
}

/// The part of a bar lying in one colour zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub zone: ColorZone,
    pub top: f64,
    pub bottom: f64,
}

/// Everything needed to draw one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPlan {
    pub label: &'static str,
    /// Horizontal center of the bar.
    pub x: f64,
    pub bar_top: f64,
    pub bar_bottom: f64,
    pub peak: Option<Rect>,
    /// Zone reached by the top of the bar.
    pub zone: ColorZone,
    /// Zoned pieces of the bar, bottom first, clipped to the meter area.
    pub bands: Vec<Band>,
    /// Number of dashes lit.
    pub lit_lights: usize,
    /// Top left of the channel label.
    pub label_pos: (f64, f64),
}

impl ChannelPlan {
    pub fn new(meter: &ChannelMeter, label: &'static str, x: f64, height: f64) -> Self {
        let bar_top = meter.bar_top(height);
        let bar_bottom = height;
        let filled = bar_bottom - bar_top;
        let zone = if filled > 0.0 {
            ColorZone::at_y(bar_top, height)
        } else {
            ColorZone::Off
        };
        let lit_lights = if filled > 0.0 {
            ((filled / DASH_PERIOD).round() as usize).min(METER_LIGHTS)
        } else {
            0
        };
        ChannelPlan {
            label,
            x,
            bar_top,
            bar_bottom,
            peak: meter.peak_marker(x, height),
            zone,
            bands: bands(bar_top, bar_bottom, height),
            lit_lights,
            label_pos: (x - 4.0, height + 2.0),
        }
    }
}

fn bands(top: f64, bottom: f64, height: f64) -> Vec<Band> {
    let red_end = RED_END * height;
    let yellow_end = YELLOW_END * height;
    let top = top.max(0.0);
    let bottom = bottom.min(height);
    [
        (ColorZone::Green, yellow_end, height),
        (ColorZone::Yellow, red_end, yellow_end),
        (ColorZone::Red, 0.0, red_end),
    ]
    .iter()
    .filter_map(|&(zone, zone_top, zone_bottom)| {
        let band_top = top.max(zone_top);
        let band_bottom = bottom.min(zone_bottom);
        if band_top < band_bottom {
            Some(Band {
                zone,
                top: band_top,
                bottom: band_bottom,
            })
        } else {
            None
        }
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct StripPlan {
    pub name: String,
    pub is_master: bool,
    /// Left edge of the strip's slot.
    pub x: f64,
    pub left: ChannelPlan,
    pub right: ChannelPlan,
}

impl StripPlan {
    pub fn new(strip: &MeterStrip, height: f64) -> Self {
        let x = strip.id() as f64 * SLOT_W;
        StripPlan {
            name: strip.name().to_owned(),
            is_master: strip.is_master(),
            x,
            left: ChannelPlan::new(&strip.left, "L", x + LEFT_OFFSET, height),
            right: ChannelPlan::new(&strip.right, "R", x + RIGHT_OFFSET, height),
        }
    }
}

/// The full meter panel for one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub tick: u64,
    pub width: f64,
    pub height: f64,
    pub meter_height: f64,
    pub strips: Vec<StripPlan>,
}

impl RenderPlan {
    pub fn new(snapshot: &Snapshot) -> Self {
        Self::with_height(snapshot, METER_HEIGHT)
    }

    /// A plan for meters `meter_height` pixels tall.
    pub fn with_height(snapshot: &Snapshot, meter_height: f64) -> Self {
        let strips: Vec<_> = snapshot
            .strips
            .iter()
            .map(|strip| StripPlan::new(strip, meter_height))
            .collect();
        RenderPlan {
            tick: snapshot.tick,
            width: strips.len() as f64 * SLOT_W,
            height: METER_SLOT_H.max(meter_height),
            meter_height,
            strips,
        }
    }

    pub fn gradient(&self) -> &'static [GradientStop] {
        &GRADIENT_STOPS
    }
}

/// Something that can draw a [`RenderPlan`].
pub trait Painter {
    fn paint(&mut self, plan: &RenderPlan) -> Result;
}

/// Draws each strip as a line of text, redrawing in place on ANSI terminals.
pub struct TextPainter<W> {
    out: W,
    columns: usize,
    lines_drawn: usize,
}

impl<W: Write> TextPainter<W> {
    pub fn new(out: W) -> Self {
        TextPainter {
            out,
            columns: 19,
            lines_drawn: 0,
        }
    }

    /// How many characters a full-scale channel takes. At least 1.
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn channel_line(&self, channel: &ChannelPlan, meter_height: f64) -> String {
        let per_column = METER_LIGHTS as f64 / self.columns as f64;
        let lit_columns = (channel.lit_lights as f64 / per_column).ceil() as usize;
        let peak_column = channel.peak.map(|rect| {
            let lights_below = ((meter_height - rect.y - rect.height) / DASH_PERIOD).max(0.0);
            ((lights_below / per_column) as usize).min(self.columns - 1)
        });
        (0..self.columns)
            .map(|col| {
                if Some(col) == peak_column && col >= lit_columns {
                    return '|';
                }
                if col >= lit_columns {
                    return '.';
                }
                // position of the column's top light, measured from the meter top
                let y = meter_height - (col as f64 + 1.0) * per_column * DASH_PERIOD;
                match ColorZone::at_y(y, meter_height) {
                    ColorZone::Red => '#',
                    ColorZone::Yellow => '+',
                    _ => '=',
                }
            })
            .collect()
    }
}

impl<W: Write> Painter for TextPainter<W> {
    fn paint(&mut self, plan: &RenderPlan) -> Result {
        if self.lines_drawn > 0 {
            // move back up over the previous frame
            write!(self.out, "\x1b[{}A", self.lines_drawn)?;
        }
        writeln!(self.out, "tick {:<10}\x1b[K", plan.tick)?;
        for strip in &plan.strips {
            writeln!(
                self.out,
                "{:>10} {} [{}] {} [{}]\x1b[K",
                strip.name,
                strip.left.label,
                self.channel_line(&strip.left, plan.meter_height),
                strip.right.label,
                self.channel_line(&strip.right, plan.meter_height),
            )?;
        }
        self.out.flush()?;
        self.lines_drawn = plan.strips.len() + 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meter::{METER_WIDTH, PEAK_HOLD_TICKS};
    use approx::assert_abs_diff_eq;

    fn strip_with(id: usize, levels: &[(f64, f64)]) -> MeterStrip {
        let mut strip = MeterStrip::new(id, format!("T{}", id), PEAK_HOLD_TICKS);
        for &(l, r) in levels {
            strip.update(l, r);
        }
        strip
    }

    fn snapshot(strips: Vec<MeterStrip>) -> Snapshot {
        Snapshot {
            tick: 1,
            strips: strips.into_iter().collect(),
        }
    }

    #[test]
    fn test_gradient_stops() {
        assert_eq!(GRADIENT_STOPS.len(), 6);
        assert_abs_diff_eq!(GRADIENT_STOPS[1].offset, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(GRADIENT_STOPS[2].offset, 0.101, epsilon = 1e-12);
        assert_abs_diff_eq!(GRADIENT_STOPS[3].offset, 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(GRADIENT_STOPS[4].offset, 0.301, epsilon = 1e-12);
        assert!(GRADIENT_STOPS
            .windows(2)
            .all(|pair| pair[0].offset < pair[1].offset));
    }

    #[test]
    fn test_zone_of_fill() {
        let cases = [
            (0.0, ColorZone::Off),
            (0.5, ColorZone::Green),
            (0.8, ColorZone::Yellow),
            (1.0, ColorZone::Red),
        ];
        for &(level, zone) in cases.iter() {
            let strip = strip_with(1, &[(level, 0.0)]);
            let plan = StripPlan::new(&strip, METER_HEIGHT);
            assert_eq!(plan.left.zone, zone, "level {}", level);
            assert_eq!(plan.right.zone, ColorZone::Off);
        }
    }

    #[test]
    fn test_bands_bottom_up() {
        let strip = strip_with(0, &[(1.0, 0.5)]);
        let plan = StripPlan::new(&strip, METER_HEIGHT);

        let zones: Vec<_> = plan.left.bands.iter().map(|b| b.zone).collect();
        assert_eq!(
            zones,
            vec![ColorZone::Green, ColorZone::Yellow, ColorZone::Red]
        );
        assert_eq!(plan.left.bands[0].bottom, METER_HEIGHT);
        assert_eq!(plan.left.bands[2].top, plan.left.bar_top);
        for pair in plan.left.bands.windows(2) {
            assert_abs_diff_eq!(pair[0].top, pair[1].bottom, epsilon = 1e-9);
        }

        let zones: Vec<_> = plan.right.bands.iter().map(|b| b.zone).collect();
        assert_eq!(zones, vec![ColorZone::Green]);
        assert_eq!(strip_with(0, &[]).left.bar_top(METER_HEIGHT), METER_HEIGHT);
    }

    #[test]
    fn test_empty_bar_has_no_bands() {
        let plan = StripPlan::new(&strip_with(0, &[(0.0, 0.0)]), METER_HEIGHT);
        assert!(plan.left.bands.is_empty());
        assert_eq!(plan.left.lit_lights, 0);
        assert_eq!(plan.left.peak, None);
    }

    #[test]
    fn test_strip_positions() {
        let plan = RenderPlan::new(&snapshot(vec![
            strip_with(0, &[]),
            strip_with(1, &[]),
            strip_with(2, &[]),
        ]));
        assert_eq!(plan.width, 180.0);
        assert_eq!(plan.height, METER_SLOT_H);
        let third = &plan.strips[2];
        assert_eq!(third.x, 120.0);
        assert_eq!(third.left.x, 138.0);
        assert_eq!(third.right.x, 156.0);
        assert_eq!(third.left.label_pos, (134.0, METER_HEIGHT + 2.0));
        assert!(plan.strips[0].is_master);
        assert!(!third.is_master);
    }

    #[test]
    fn test_peak_marker_follows_hold() {
        let strip = strip_with(1, &[(0.9, 0.0), (0.2, 0.0)]);
        let plan = StripPlan::new(&strip, METER_HEIGHT);
        let peak = plan.left.peak.unwrap();
        assert_eq!(peak.width, METER_WIDTH);
        assert!(peak.y < plan.left.bar_top);
        assert_eq!(plan.right.peak, None);
    }

    #[test]
    fn test_full_scale_lights() {
        let plan = StripPlan::new(&strip_with(0, &[(1.0, 1.0)]), METER_HEIGHT);
        assert_eq!(plan.left.lit_lights, METER_LIGHTS - 1);
    }

    #[test]
    fn test_text_painter() {
        let plan = RenderPlan::new(&snapshot(vec![
            strip_with(0, &[(1.0, 0.0)]),
            strip_with(1, &[(0.9, 0.0), (0.2, 0.0)]),
        ]));
        let mut painter = TextPainter::new(Vec::new()).with_columns(10);
        painter.paint(&plan).unwrap();
        painter.paint(&plan).unwrap();
        let out = String::from_utf8(painter.into_inner()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("L [======++##]"), "{}", lines[1]);
        assert!(lines[1].contains("R [..........]"), "{}", lines[1]);
        assert!(lines[2].contains('|'), "{}", lines[2]);
        // second frame starts by moving the cursor back up
        assert!(lines[3].starts_with("\x1b[3A"));
    }
}
