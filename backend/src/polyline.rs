//! Encoded polyline format: zig-zag deltas of fixed-precision integers,
//! written as 5-bit groups offset by 63.

use crate::models::Coordinate;

pub const DEFAULT_PRECISION: u32 = 5;

const CHUNK_BITS: u32 = 5;
const CHUNK_MASK: i64 = 0x1f;
const CONTINUATION: i64 = 0x20;
const CHAR_OFFSET: i64 = 63;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolylineError {
    #[error("invalid polyline character {character:?} at byte {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("polyline ends in the middle of a value")]
    Truncated,
    #[error("polyline value overflows at byte {0}")]
    Overflow(usize),
}

pub fn encode_default(path: &[Coordinate]) -> String {
    encode(path, DEFAULT_PRECISION)
}

pub fn encode(path: &[Coordinate], precision: u32) -> String {
    let multiplier = 10f64.powi(precision as i32);
    let mut encoded = String::with_capacity(path.len() * 8);
    let (mut prev_lat, mut prev_lon) = (0i64, 0i64);

    for coord in path {
        let lat = (coord.lat * multiplier).round() as i64;
        let lon = (coord.lon * multiplier).round() as i64;
        encode_value(lat - prev_lat, &mut encoded);
        encode_value(lon - prev_lon, &mut encoded);
        prev_lat = lat;
        prev_lon = lon;
    }

    encoded
}

fn encode_value(delta: i64, out: &mut String) {
    let mut value = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while value >= CONTINUATION {
        push_chunk((CONTINUATION | (value & CHUNK_MASK)) + CHAR_OFFSET, out);
        value >>= CHUNK_BITS;
    }
    push_chunk(value + CHAR_OFFSET, out);
}

fn push_chunk(code: i64, out: &mut String) {
    // code is always within 63..=126
    out.push(char::from(code as u8));
}

pub fn decode(encoded: &str, precision: u32) -> Result<Vec<Coordinate>, PolylineError> {
    let multiplier = 10f64.powi(precision as i32);
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let (mut lat, mut lon) = (0i64, 0i64);
    let mut path = Vec::new();

    while index < bytes.len() {
        lat += decode_value(encoded, bytes, &mut index)?;
        lon += decode_value(encoded, bytes, &mut index)?;
        path.push(Coordinate {
            lat: lat as f64 / multiplier,
            lon: lon as f64 / multiplier,
        });
    }

    Ok(path)
}

fn decode_value(encoded: &str, bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0u32;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(PolylineError::Truncated);
        };
        if !(63..=126).contains(&byte) {
            let character = encoded[*index..].chars().next().unwrap_or('\u{fffd}');
            return Err(PolylineError::InvalidCharacter {
                character,
                position: *index,
            });
        }
        if shift > 60 {
            return Err(PolylineError::Overflow(*index));
        }

        let chunk = i64::from(byte) - CHAR_OFFSET;
        result |= (chunk & CHUNK_MASK) << shift;
        shift += CHUNK_BITS;
        *index += 1;

        if chunk < CONTINUATION {
            break;
        }
    }

    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}
