//! Telemetry line parsing.
//!
//! The device interleaves telemetry with acks and diagnostic chatter; a
//! telemetry line contains `CO2=<int>,HUM=<float>,TMP=<float>` as a
//! substring, with arbitrary surrounding text tolerated.

/// One structurally-matched reading, before a `Sample` is built from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    pub co2: u64,
    pub humidity: f64,
    pub temperature: f64,
}

/// Extract the first telemetry match from a line.
///
/// Structure must match exactly (`CO2=` digits, `,HUM=` float chars, `,TMP=`
/// signed float chars, each non-empty); numeric conversion is best-effort and
/// falls back to the default value, so callers must treat any field as
/// potentially defaulted due to unparsable input.
pub fn parse_telemetry(line: &str) -> Option<RawReading> {
    line.match_indices("CO2=")
        .find_map(|(idx, _)| parse_fields(&line[idx..]))
}

fn parse_fields(s: &str) -> Option<RawReading> {
    let s = s.strip_prefix("CO2=")?;
    let (co2, s) = take_while(s, |c| c.is_ascii_digit());
    if co2.is_empty() {
        return None;
    }

    let s = s.strip_prefix(",HUM=")?;
    let (humidity, s) = take_while(s, |c| c.is_ascii_digit() || c == '.');
    if humidity.is_empty() {
        return None;
    }

    let s = s.strip_prefix(",TMP=")?;
    let (temperature, _) = take_while(s, |c| c.is_ascii_digit() || c == '.' || c == '-');
    if temperature.is_empty() {
        return None;
    }

    Some(RawReading {
        co2: co2.parse().unwrap_or_default(),
        humidity: humidity.parse().unwrap_or_default(),
        temperature: temperature.parse().unwrap_or_default(),
    })
}

/// Split at the end of the longest prefix satisfying the predicate.
fn take_while(s: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    let end = s.find(|c| !pred(c)).unwrap_or(s.len());
    s.split_at(end)
}
