//! Polyline representation for route geometries.
//!
//! The solver ships geometry as an encoded polyline string (Google format,
//! five decimal places). Routes keep that string as-is; decoding into a
//! coordinate sequence happens at the edge, when something wants to draw it.

use serde::{Deserialize, Serialize};

use crate::error::PolylineError;

/// Decimal places used by the solver's encoding.
pub const PRECISION: u32 = 5;

/// A polyline representing a route geometry as decoded coordinates.
///
/// Points are (latitude, longitude) tuples, the order the encoding uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    /// Decodes an encoded polyline string.
    ///
    /// No normalization is applied: points come out exactly as encoded.
    pub fn decode(encoded: &str) -> Result<Self, PolylineError> {
        let factor = 10f64.powi(PRECISION as i32);
        let bytes = encoded.as_bytes();
        let mut index = 0;
        let mut lat: i64 = 0;
        let mut lon: i64 = 0;
        let mut points = Vec::new();

        while index < bytes.len() {
            lat += next_delta(bytes, &mut index)?;
            lon += next_delta(bytes, &mut index)?;
            points.push((lat as f64 / factor, lon as f64 / factor));
        }

        Ok(Self { points })
    }

    /// Encodes the points with the same convention [`Polyline::decode`] reads.
    pub fn encode(&self) -> String {
        let factor = 10f64.powi(PRECISION as i32);
        let mut out = String::new();
        let mut prev_lat: i64 = 0;
        let mut prev_lon: i64 = 0;

        for &(lat, lon) in &self.points {
            let lat = (lat * factor).round() as i64;
            let lon = (lon * factor).round() as i64;
            push_delta(&mut out, lat - prev_lat);
            push_delta(&mut out, lon - prev_lon);
            prev_lat = lat;
            prev_lon = lon;
        }

        out
    }
}

fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes.get(*index).ok_or(PolylineError::Truncated)?;
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                position: *index,
                character: byte as char,
            });
        }
        *index += 1;

        let chunk = i64::from(byte - 63);
        if shift > 60 {
            return Err(PolylineError::Overflow { position: *index - 1 });
        }
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

fn push_delta(out: &mut String, delta: i64) {
    let mut value = delta << 1;
    if delta < 0 {
        value = !value;
    }
    while value >= 0x20 {
        out.push((((value & 0x1f) | 0x20) as u8 + 63) as char);
        value >>= 5;
    }
    out.push((value as u8 + 63) as char);
}
