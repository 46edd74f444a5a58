use crate::error::{AmberError, Result};
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Zone used by the National Electricity Market: UTC+10 without DST
pub const NEM_TIMEZONE: Tz = chrono_tz::Australia::Brisbane;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an interval timestamp into an absolute instant.
///
/// Timestamps carrying an offset are taken as-is. Timestamps without one are
/// wall-clock times in `source_tz`; a wall-clock time that occurs twice
/// resolves to the earlier instant and one that never occurs is an error.
pub fn parse_nem_time(raw: &str, source_tz: Tz) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AmberError::parse("empty timestamp"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| AmberError::parse(format!("unrecognised timestamp '{raw}'")))?;

    match source_tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(AmberError::parse(format!(
            "'{raw}' does not exist in {source_tz}"
        ))),
    }
}
