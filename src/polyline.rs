//! Encoded polyline geometries.
//!
//! Valhalla returns each leg shape as a polyline string: zig-zag encoded
//! latitude/longitude deltas in 5-bit chunks. Decoding happens here, at the
//! boundary, so the rest of the crate only sees coordinates.

use serde::{Deserialize, Serialize};

/// Precision Valhalla encodes shapes with (six decimal digits).
pub const DEFAULT_PRECISION: u32 = 6;

/// A decoded polyline as `[longitude, latitude]` points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<[f64; 2]>,
}

impl Polyline {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    /// Decodes a polyline with [`DEFAULT_PRECISION`].
    pub fn decode(encoded: &str) -> Self {
        Self::decode_with_precision(encoded, DEFAULT_PRECISION)
    }

    /// Decodes a polyline whose values were scaled by `10^precision`.
    ///
    /// A truncated trailing point is dropped. Decoding stops at the first
    /// point whose accumulated value would overflow.
    pub fn decode_with_precision(encoded: &str, precision: u32) -> Self {
        let factor = 10f64.powi(precision as i32);
        let mut bytes = encoded.bytes();
        let mut points = Vec::new();
        let (mut lat, mut lon) = (0i64, 0i64);

        while let Some(dlat) = next_value(&mut bytes) {
            let Some(dlon) = next_value(&mut bytes) else {
                break;
            };
            let (Some(next_lat), Some(next_lon)) = (lat.checked_add(dlat), lon.checked_add(dlon))
            else {
                break;
            };
            (lat, lon) = (next_lat, next_lon);
            points.push([lon as f64 / factor, lat as f64 / factor]);
        }

        Self { points }
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    pub fn into_points(self) -> Vec<[f64; 2]> {
        self.points
    }
}

/// Reads one zig-zag encoded varint, `None` at the end or on bad input.
fn next_value(bytes: &mut impl Iterator<Item = u8>) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let chunk = i64::from(bytes.next()?.checked_sub(63)?);
        if shift > 58 {
            return None;
        }
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Some(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}
