//! Time representation and display formatting.
//! All positions, durations, offsets, and deltas are milliseconds (i64).

/// Time in milliseconds. Signed, because offsets and drift deltas can be
/// negative even though reported positions and durations never are.
pub type TimeMs = i64;

/// Time zero constant
pub const ZERO: TimeMs = 0;

/// Controls whether a leading `+` is emitted for non-negative values.
///
/// Absolute positions use [`Sign::IfNegative`]; anchor drift deltas use
/// [`Sign::Always`] so the direction of drift is always visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// Only negative values carry a sign.
    IfNegative,
    /// Non-negative values are prefixed with `+`.
    Always,
}

fn split(ms: TimeMs) -> (TimeMs, TimeMs, TimeMs) {
    let mins = ms / 60_000;
    let secs = (ms / 1_000) % 60;
    let millis = ms % 1_000;
    (mins, secs, millis)
}

fn sign_prefix(negative: bool, sign: Sign) -> &'static str {
    if negative {
        "-"
    } else if sign == Sign::Always {
        "+"
    } else {
        ""
    }
}

/// Format milliseconds as `MM:SS.mmm`, zero-padded.
///
/// Zero renders as `00:00.000` with no sign regardless of mode. Negative
/// values render with a leading `-` and the absolute value. Minutes grow
/// past two digits for long inputs.
pub fn format_full(ms: TimeMs, sign: Sign) -> String {
    if ms == 0 {
        return "00:00.000".to_string();
    }
    let prefix = sign_prefix(ms < 0, sign);
    let (mins, secs, millis) = split(ms.abs());
    format!("{}{:02}:{:02}.{:03}", prefix, mins, secs, millis)
}

/// Format milliseconds compactly: the minutes field is dropped when it is
/// zero (`S.mmm` instead of `00:0S.mmm`), and zero renders as just `0`.
///
/// Used for small drift deltas where `+0.033` reads better than
/// `+00:00.033`.
pub fn format_compact(ms: TimeMs, sign: Sign) -> String {
    if ms == 0 {
        return "0".to_string();
    }
    let prefix = sign_prefix(ms < 0, sign);
    let (mins, secs, millis) = split(ms.abs());
    if mins > 0 {
        format!("{}{:02}:{:02}.{:03}", prefix, mins, secs, millis)
    } else {
        format!("{}{}.{:03}", prefix, secs, millis)
    }
}
