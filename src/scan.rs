//! Byte-level helpers for walking comma-delimited ASCII buffers.
//!
//! These are pure and defensive: malformed input yields a best-effort value
//! (usually zero or an empty slice) instead of an error, because a corrupted
//! NMEA field must never take the polling loop down.

/// Accumulates up to `max_digits` leading decimal digits, stopping at the
/// first non-digit.
pub fn parse_digits(s: &[u8], max_digits: usize) -> u32 {
    let mut value = 0u32;
    for &b in s.iter().take(max_digits) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.wrapping_mul(10).wrapping_add(u32::from(b - b'0'));
    }
    value
}

/// Accumulates all leading decimal digits.
pub fn parse_int(s: &[u8]) -> u32 {
    parse_digits(s, s.len())
}

/// Parses a leading `[+-]digits[.digits]` run; 0.0 when no number leads.
pub fn parse_float(s: &[u8]) -> f32 {
    let mut end = 0;
    if matches!(s.first(), Some(&b'-') | Some(&b'+')) {
        end = 1;
    }
    let mut seen_dot = false;
    while end < s.len() {
        match s[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            },
            _ => break,
        }
    }
    std::str::from_utf8(&s[..end])
        .ok()
        .and_then(|t| t.parse::<f32>().ok())
        .unwrap_or(0.0)
}

/// Skips leading spaces/tabs, then accumulates case-insensitive hex digits
/// until the first non-hex byte. Empty or malformed input yields 0.
pub fn parse_hex(s: &[u8]) -> u32 {
    let mut value = 0u32;
    let digits = s.iter().skip_while(|&&b| b == b' ' || b == b'\t');
    for &b in digits {
        match (b as char).to_digit(16) {
            Some(d) => value = (value << 4) | d,
            None => break,
        }
    }
    value
}

/// Returns the slice just past the next comma, or an empty slice at the end
/// of the buffer when no comma remains.
pub fn next_field(s: &[u8]) -> &[u8] {
    match s.iter().position(|&b| b == b',') {
        Some(comma) => &s[comma + 1..],
        None => &s[s.len()..],
    }
}

/// Applies [`next_field`] `n` times.
pub fn skip_fields(mut s: &[u8], n: usize) -> &[u8] {
    for _ in 0..n {
        s = next_field(s);
    }
    s
}

/// Advances by `n` bytes, never past the end of the buffer.
pub fn advance(s: &[u8], n: usize) -> &[u8] {
    &s[n.min(s.len())..]
}
