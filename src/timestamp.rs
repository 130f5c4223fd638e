use chrono::NaiveDateTime;
use thiserror::Error;

const K33_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
const KOINLY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a K33 `Timestamp (UTC)` value and renders it the way Koinly expects it.
pub fn try_convert_timestamp(timestamp: &str) -> Result<String, TimestampError> {
    if !has_k33_shape(timestamp) {
        return Err(TimestampError::Malformed {
            timestamp: timestamp.into(),
        });
    }
    NaiveDateTime::parse_from_str(timestamp, K33_FORMAT)
        .map(|parsed| parsed.format(KOINLY_FORMAT).to_string())
        .map_err(|source| TimestampError::Unparseable {
            timestamp: timestamp.into(),
            source,
        })
}

// Zero-padded fields and single separators only.
fn has_k33_shape(timestamp: &str) -> bool {
    timestamp.len() == 19
        && timestamp.bytes().enumerate().all(|(offset, byte)| match offset {
            4 | 7 => byte == b'/',
            10 => byte == b' ',
            13 | 16 => byte == b':',
            _ => byte.is_ascii_digit(),
        })
}

/// Same as [`try_convert_timestamp`], but an unparseable value is logged and
/// passed through untouched.
pub fn convert_timestamp(timestamp: &str) -> String {
    try_convert_timestamp(timestamp).unwrap_or_else(|error| {
        log::warn!("{}. Passing it through unchanged.", error);
        timestamp.to_owned()
    })
}

#[derive(Error, Debug)]
pub enum TimestampError {
    #[error("timestamp <{timestamp}> is not in YYYY/MM/DD HH:MM:SS form")]
    Malformed { timestamp: String },

    #[error("could not parse timestamp <{timestamp}>")]
    Unparseable {
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}
