//! Text wire format for telemetry records
//!
//! Each frame is written as a single record of comma-separated `key:value`
//! pairs with a fixed key set and order:
//!
//! ```text
//! track_progress:<f>,speed_kmh:<f>,world_loc[0]:<f>,world_loc[1]:<f>,world_loc[2]:<f>,
//! throttle:<f>,brake:<f>,steer:<f>,lap_time:<i>,lap_invalid:<b>,lap_count:<i>
//! ```
//!
//! The trainer on the other end is a Python process that parses by position,
//! so floats always carry a fractional part or exponent (`1.0`, `1e-7`) and
//! booleans are written as `True`/`False`. There is no length prefix; an
//! optional newline terminator can be appended for line-oriented readers.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::types::Frame;
use crate::{BridgeError, Result};

/// Keys of a telemetry record in wire order.
pub const FIELD_KEYS: [&str; 11] = [
    "track_progress",
    "speed_kmh",
    "world_loc[0]",
    "world_loc[1]",
    "world_loc[2]",
    "throttle",
    "brake",
    "steer",
    "lap_time",
    "lap_invalid",
    "lap_count",
];

/// How a record is terminated on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordTerminator {
    /// One write per record, no delimiter
    #[default]
    None,

    /// Append `\n` after each record
    Newline,
}

impl RecordTerminator {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordTerminator::None => "",
            RecordTerminator::Newline => "\n",
        }
    }
}

/// Encode a frame as a record without terminator.
pub fn encode(frame: &Frame) -> String {
    let mut record = String::with_capacity(256);
    encode_into(frame, RecordTerminator::None, &mut record);
    record
}

/// Append the record for `frame` to `out`, followed by `terminator`.
///
/// Reusing `out` across ticks avoids one allocation per frame.
pub fn encode_into(frame: &Frame, terminator: RecordTerminator, out: &mut String) {
    let [x, y, z] = frame.world_location;

    // Writing into a String cannot fail
    let _ = write!(
        out,
        "track_progress:{:?},speed_kmh:{:?},world_loc[0]:{:?},world_loc[1]:{:?},world_loc[2]:{:?},\
         throttle:{:?},brake:{:?},steer:{:?},lap_time:{},lap_invalid:{},lap_count:{}",
        frame.track_progress,
        frame.speed_kmh,
        x,
        y,
        z,
        frame.throttle,
        frame.brake,
        frame.steer,
        frame.lap_time,
        format_bool(frame.lap_invalid),
        frame.lap_count,
    );
    out.push_str(terminator.as_str());
}

fn format_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Split a record into its eleven `(key, value)` pairs, in wire order.
///
/// A trailing `\n` or `\r\n` is ignored. Keys must match [`FIELD_KEYS`]
/// exactly and in order; values are returned unparsed.
pub fn decode_pairs(record: &str) -> Result<Vec<(&str, &str)>> {
    let record = record.trim_end_matches(['\n', '\r']);
    let mut pairs = Vec::with_capacity(FIELD_KEYS.len());

    for (index, field) in record.split(',').enumerate() {
        let Some(expected) = FIELD_KEYS.get(index) else {
            return Err(BridgeError::parse_error(
                "telemetry record",
                format!("expected {} fields, found more", FIELD_KEYS.len()),
            ));
        };

        let (key, value) = field.split_once(':').ok_or_else(|| {
            BridgeError::parse_error(
                "telemetry record",
                format!("field {} ('{}') is not a key:value pair", index, field),
            )
        })?;

        if key != *expected {
            return Err(BridgeError::parse_error(
                "telemetry record",
                format!("field {} has key '{}', expected '{}'", index, key, expected),
            ));
        }

        pairs.push((key, value));
    }

    if pairs.len() != FIELD_KEYS.len() {
        return Err(BridgeError::parse_error(
            "telemetry record",
            format!("expected {} fields, found {}", FIELD_KEYS.len(), pairs.len()),
        ));
    }

    Ok(pairs)
}

/// Decode a record back into a [`Frame`].
pub fn decode_frame(record: &str) -> Result<Frame> {
    let pairs = decode_pairs(record)?;
    let value = |index: usize| pairs[index].1;

    Ok(Frame {
        track_progress: parse_float(FIELD_KEYS[0], value(0))?,
        speed_kmh: parse_float(FIELD_KEYS[1], value(1))?,
        world_location: [
            parse_float(FIELD_KEYS[2], value(2))?,
            parse_float(FIELD_KEYS[3], value(3))?,
            parse_float(FIELD_KEYS[4], value(4))?,
        ],
        throttle: parse_float(FIELD_KEYS[5], value(5))?,
        brake: parse_float(FIELD_KEYS[6], value(6))?,
        steer: parse_float(FIELD_KEYS[7], value(7))?,
        lap_time: parse_int(FIELD_KEYS[8], value(8))?,
        lap_invalid: parse_bool(FIELD_KEYS[9], value(9))?,
        lap_count: parse_int(FIELD_KEYS[10], value(10))?,
    })
}

fn parse_float(key: &str, value: &str) -> Result<f32> {
    value.parse().map_err(|_| {
        BridgeError::parse_error(
            "telemetry record",
            format!("'{}' is not a float: '{}'", key, value),
        )
    })
}

fn parse_int(key: &str, value: &str) -> Result<i64> {
    value.parse().map_err(|_| {
        BridgeError::parse_error(
            "telemetry record",
            format!("'{}' is not an integer: '{}'", key, value),
        )
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "True" | "true" => Ok(true),
        "False" | "false" => Ok(false),
        _ => Err(BridgeError::parse_error(
            "telemetry record",
            format!("'{}' is not a boolean: '{}'", key, value),
        )),
    }
}
