//! The IEC 60268-18 meter curve.
//!
//! Maps a level in decibels to a position on the meter, where 0.0 is the bottom and 1.0 is 0 dB.
//! The curve is piecewise linear, giving more room to the loud end of the range.

/// Meter position of -2 dB.
pub const DB_IEC_MINUS_2: f64 = 0.95;
/// Meter position of -4 dB. The red zone starts here.
pub const DB_IEC_MINUS_4: f64 = 0.9;
/// Meter position of -6 dB.
pub const DB_IEC_MINUS_6: f64 = 0.85;
/// Meter position of -10 dB.
pub const DB_IEC_MINUS_10: f64 = 0.75;
/// Meter position of -12 dB. The yellow zone starts here.
pub const DB_IEC_MINUS_12: f64 = 0.70;

/// Map `db` onto the meter.
///
/// Anything below -70 dB is silence. Levels above 0 dB map above 1.0 (+12 dB is 1.3), so callers
/// that need a bounded position have to clamp. A value within 0.001 of 0 dB is unity.
pub fn iec_scale(db: f64) -> f64 {
    if db < -70.0 {
        0.0
    } else if db < -60.0 {
        (db + 70.0) * 0.0025
    } else if db < -50.0 {
        (db + 60.0) * 0.005 + 0.025
    } else if db < -40.0 {
        (db + 50.0) * 0.0075 + 0.075
    } else if db < -30.0 {
        (db + 40.0) * 0.015 + 0.15
    } else if db < -20.0 {
        (db + 30.0) * 0.02 + 0.3
    } else if db < -0.001 || db > 0.001 {
        (db + 20.0) * 0.025 + 0.5
    } else {
        1.0
    }
}
