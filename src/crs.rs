//! Coordinate reference system handles.
//!
//! CRS names are stored opaquely. Only operations that need the resolved
//! system (dimension lookup, reprojection) go through [`CrsResolver`] or
//! [`CoordinateTransformer`], and only those can fail.

use std::fmt;

use crate::error::{GmlError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs {
    name: String,
}

impl Crs {
    pub fn new(name: impl Into<String>) -> Self {
        Crs { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub trait CrsResolver {
    /// Number of ordinates per position in the given system.
    fn dimension(&self, crs: &Crs) -> Result<usize>;
}

/// Resolves EPSG codes in their common spellings plus `CRS:84`.
///
/// Geographic and projected EPSG codes are 2D unless they are listed as 3D.
#[derive(Debug, Clone, Default)]
pub struct WellKnownCrs;

const EPSG_3D_CODES: &[u32] = &[4978, 4979, 4937, 4936, 7415, 7423, 5555, 5556];

impl WellKnownCrs {
    fn epsg_code(name: &str) -> Option<&str> {
        let lower = name.to_ascii_lowercase();
        let prefixes = [
            "epsg:",
            "urn:ogc:def:crs:epsg::",
            "urn:ogc:def:crs:epsg:",
            "urn:x-ogc:def:crs:epsg:",
            "http://www.opengis.net/def/crs/epsg/0/",
            "http://www.opengis.net/gml/srs/epsg.xml#",
        ];
        for prefix in prefixes {
            if lower.starts_with(prefix) {
                let code = &name[prefix.len()..];
                // urn:ogc:def:crs:EPSG:6.6:4326 carries a version segment
                return Some(code.rsplit(':').next().unwrap_or(code));
            }
        }
        None
    }
}

impl CrsResolver for WellKnownCrs {
    fn dimension(&self, crs: &Crs) -> Result<usize> {
        let name = crs.name();
        if name.eq_ignore_ascii_case("CRS:84") || name.eq_ignore_ascii_case("urn:ogc:def:crs:OGC:1.3:CRS84") {
            return Ok(2);
        }
        let code = Self::epsg_code(name)
            .and_then(|code| code.trim().parse::<u32>().ok())
            .ok_or_else(|| GmlError::UnknownCrs(name.to_string()))?;
        if EPSG_3D_CODES.contains(&code) {
            Ok(3)
        } else {
            Ok(2)
        }
    }
}

/// Reprojection capability supplied by the caller.
pub trait CoordinateTransformer {
    /// Transforms `coords` (positions of `dim` ordinates each, packed) in place.
    fn transform(&self, source: &Crs, target: &Crs, dim: usize, coords: &mut [f64]) -> Result<()>;
}

/// Leaves ordinates untouched, so writing with an output CRS only renames
/// `srsName`. For data already in the target system under another name, or
/// when no transformation library is at hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relabel;

impl CoordinateTransformer for Relabel {
    fn transform(&self, _source: &Crs, _target: &Crs, _dim: usize, _coords: &mut [f64]) -> Result<()> {
        Ok(())
    }
}
