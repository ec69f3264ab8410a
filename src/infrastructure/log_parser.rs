// Log parser - turns the plaintext field log into structured readings
//
// Line shape:
// 2026-02-07 21:38:55 >>> 89.109.46.243 >>> host/path/?id=0&coords=...&m1=...&charge=...
use chrono::{Local, NaiveDateTime, TimeZone};

use crate::domain::reading::{Parameter, RawLogPoint};

const SEGMENT_DELIMITER: &str = ">>>";

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Result of parsing a whole log snapshot
#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    pub points: Vec<RawLogPoint>,
    /// Non-blank lines that failed to parse
    pub dropped: usize,
}

/// Parse one log line, `None` if it is malformed.
pub fn parse_line(line: &str) -> Option<RawLogPoint> {
    let segments: Vec<&str> = line.split(SEGMENT_DELIMITER).map(str::trim).collect();
    if segments.len() < 3 {
        return None;
    }

    let timestamp = parse_local_timestamp(segments[0])?;

    let url = segments[2];
    let query = &url[url.find('?')? + 1..];
    let params = QueryParams::parse(query);

    let sensor_id = params.get("id").filter(|id| !id.is_empty())?;

    let mut point = RawLogPoint::new(timestamp, sensor_id);
    point.coords = params.get("coords");
    for parameter in Parameter::ALL {
        *point.slot_mut(parameter) = params.get(parameter.key()).and_then(|v| parse_number(&v));
    }

    Some(point)
}

/// Parse a full snapshot, keeping well-formed lines in their original order.
pub fn parse_text(text: &str) -> Vec<RawLogPoint> {
    parse_text_counted(text).points
}

pub fn parse_text_counted(text: &str) -> ParsedLog {
    let mut parsed = ParsedLog::default();
    for line in text.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
        match parse_line(line) {
            Some(point) => parsed.points.push(point),
            None => parsed.dropped += 1,
        }
    }
    parsed
}

/// "YYYY-MM-DD HH:MM:SS" in the host's local time zone to epoch milliseconds.
/// Wall-clock times skipped by a DST jump do not exist and are rejected;
/// ambiguous ones resolve to the earlier instant.
fn parse_local_timestamp(raw: &str) -> Option<i64> {
    let iso = raw.replacen(' ', "T", 1);
    let naive = TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&iso, fmt).ok())?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

/// An empty value (`m1=`) is a sensor that reported nothing for that field,
/// so it stays absent instead of plotting as zero.
fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Decoded `application/x-www-form-urlencoded` pairs; the first occurrence of
/// a key wins on lookup.
struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    fn parse(query: &str) -> Self {
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self { pairs }
    }

    fn get(&self, key: &str) -> Option<String> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}
