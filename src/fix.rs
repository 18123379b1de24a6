use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::DateTimeError;

/// Fix quality reported by the receiver, plus the driver's own staleness
/// signal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FixStatus {
    /// No sentence start seen within the freshness window; the receiver is
    /// treated as absent.
    Timeout,
    #[default]
    NoFix,
    /// Fix acquired with the given GGA quality indicator (>= 1).
    Fix(u8),
}

impl FixStatus {
    pub fn has_fix(self) -> bool {
        matches!(self, FixStatus::Fix(_))
    }

    /// The legacy signed convention: -1 timeout, 0 no fix, quality otherwise.
    pub fn as_i8(self) -> i8 {
        match self {
            FixStatus::Timeout => -1,
            FixStatus::NoFix => 0,
            FixStatus::Fix(quality) => quality.min(i8::MAX as u8) as i8,
        }
    }
}

/// Most recent navigation solution, merged from the NMEA stream.
///
/// Each sentence kind only touches its own fields (GGA: time, position,
/// status, satellites used, altitude; RMC: speed, course, date; GSV:
/// satellites visible); the rest keep their previous values. There is no
/// atomic snapshot, so time and position may be drawn from different
/// sentences. Fields default to zero/unknown until first written.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct NavFix {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub day: u8,
    pub month: u8,
    /// Full year (two NMEA digits offset by 2000).
    pub year: u16,
    /// Signed decimal degrees, south negative.
    pub latitude: f32,
    /// Signed decimal degrees, west negative.
    pub longitude: f32,
    /// Meters above mean sea level.
    pub altitude: f32,
    pub sats_used: u8,
    pub sats_visible: u8,
    /// Ground speed, knots converted to km/h and truncated.
    pub speed_kmh: u16,
    /// Course over ground, whole degrees.
    pub course: u16,
    pub status: FixStatus,
    /// Raw ddmm.mm latitude digits (dot removed) captured for the APRS
    /// position report, which transmits the NMEA encoding verbatim.
    pub aprs_latitude: [u8; 6],
}

impl NavFix {
    /// Calendar view of the GGA time and RMC date fields.
    pub fn datetime(&self) -> Result<NaiveDateTime, DateTimeError> {
        let date =
            NaiveDate::from_ymd_opt(i32::from(self.year), u32::from(self.month), u32::from(self.day))
                .ok_or(DateTimeError::InvalidDate)?;
        let time = NaiveTime::from_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
        .ok_or(DateTimeError::InvalidTime)?;
        Ok(NaiveDateTime::new(date, time))
    }

    pub fn aprs_latitude_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.aprs_latitude).ok()
    }
}
