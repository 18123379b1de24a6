use crate::fix::{FixStatus, NavFix};
use crate::scan::{advance, next_field, parse_digits, parse_float, parse_hex, parse_int, skip_fields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    Gga,
    Rmc,
    Gsv,
}

/// What became of one complete line.
///
/// The three cases are deliberately distinct so callers can tell a corrupted
/// sentence from one the driver simply does not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceOutcome {
    /// Recognized and decoded; the navigation record was updated.
    Accepted(SentenceKind),
    /// Missing `$`/`*` framing or a checksum mismatch; nothing was touched.
    BadChecksum,
    /// Valid line of a talker or type this driver does not decode.
    Ignored,
}

impl SentenceOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SentenceOutcome::Accepted(_))
    }
}

/// Integrity gate: `$`, a `*` before the end, and the XOR of everything in
/// between equal to the two hex digits after the `*`.
pub fn validate(line: &[u8]) -> bool {
    let Some((&b'$', rest)) = line.split_first() else {
        return false;
    };
    let mut checksum = 0u8;
    for (i, &byte) in rest.iter().enumerate() {
        if byte == b'*' {
            return u32::from(checksum) == parse_hex(&rest[i + 1..]);
        }
        checksum ^= byte;
    }
    false
}

/// Decodes one complete sentence (no trailing CR/LF) into the navigation
/// record.
///
/// The talker prefix is matched literally: this receiver is configured for
/// GPS-only output, so `GP` sentences are decoded and every other talker
/// falls through as [`SentenceOutcome::Ignored`].
pub fn parse(line: &[u8], fix: &mut NavFix) -> SentenceOutcome {
    if !validate(line) {
        return SentenceOutcome::BadChecksum;
    }
    let body = &line[1..];
    if body.starts_with(b"GPGGA") {
        parse_gga(body, fix);
        SentenceOutcome::Accepted(SentenceKind::Gga)
    } else if body.starts_with(b"GPRMC") {
        parse_rmc(body, fix);
        SentenceOutcome::Accepted(SentenceKind::Rmc)
    } else if body.starts_with(b"GPGSV") {
        parse_gsv(body, fix);
        SentenceOutcome::Accepted(SentenceKind::Gsv)
    } else {
        SentenceOutcome::Ignored
    }
}

/// ddmm.mmmm to signed-magnitude decimal degrees.
///
/// Dividing by 100 leaves degrees in the integer part and minutes/100 in the
/// fraction; the 5/3 factor is 100/60, completing the minutes-to-degrees
/// conversion.
fn ddmm_to_degrees(raw: f32) -> f32 {
    let scaled = raw / 100.0;
    let degrees = scaled.trunc();
    let minutes = scaled.fract();
    degrees + minutes * 5.0 / 3.0
}

// Time, position, fix quality, satellites used, altitude.
fn parse_gga(body: &[u8], fix: &mut NavFix) {
    let s = next_field(body);
    fix.hour = parse_digits(s, 2) as u8;
    let s2 = advance(s, 2);
    fix.minute = parse_digits(s2, 2) as u8;
    let s2 = advance(s2, 2);
    fix.second = parse_digits(s2, 2) as u8;

    let s = next_field(s);
    // The beacon formatter wants the raw ddmm.mm digits with the dot
    // removed, exactly as they appeared on the wire.
    for (i, slot) in fix.aprs_latitude.iter_mut().enumerate() {
        let src = if i < 4 { i } else { i + 1 };
        *slot = s.get(src).copied().unwrap_or(b' ');
    }
    fix.latitude = ddmm_to_degrees(parse_float(s));
    let s = next_field(s);
    if s.first() == Some(&b'S') {
        fix.latitude = -fix.latitude;
    }
    let s = next_field(s);
    fix.longitude = ddmm_to_degrees(parse_float(s));
    let s = next_field(s);
    if s.first() == Some(&b'W') {
        fix.longitude = -fix.longitude;
    }
    let s = next_field(s);
    let quality = parse_int(s);
    fix.status = if quality == 0 {
        FixStatus::NoFix
    } else {
        FixStatus::Fix(quality.min(u32::from(u8::MAX)) as u8)
    };
    let s = next_field(s);
    fix.sats_used = parse_int(s).min(u32::from(u8::MAX)) as u8;
    let s = skip_fields(s, 2); // past HDOP
    fix.altitude = parse_float(s);
}

// Speed, course, date.
fn parse_rmc(body: &[u8], fix: &mut NavFix) {
    let s = skip_fields(body, 7);
    fix.speed_kmh = (parse_float(s) * 1.852) as u16;
    let s = next_field(s);
    fix.course = parse_int(s).min(u32::from(u16::MAX)) as u16;
    let s = next_field(s);
    fix.day = parse_digits(s, 2) as u8;
    let s2 = advance(s, 2);
    fix.month = parse_digits(s2, 2) as u8;
    let s2 = advance(s2, 2);
    fix.year = 2000 + parse_digits(s2, 2) as u16;
}

// Satellites in view only.
fn parse_gsv(body: &[u8], fix: &mut NavFix) {
    let s = skip_fields(body, 3);
    fix.sats_visible = parse_int(s).min(u32::from(u8::MAX)) as u8;
}
