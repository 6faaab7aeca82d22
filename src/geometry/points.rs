use crate::crs::Crs;
use crate::error::Result;

use super::{GeometryId, Member};

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub coords: Vec<f64>,
}

impl Point {
    pub fn new(coords: Vec<f64>) -> Self {
        Point {
            id: None,
            crs: None,
            coords,
        }
    }

    pub fn with_crs(mut self, crs: Option<Crs>) -> Self {
        self.crs = crs;
        self
    }

    pub fn x(&self) -> f64 {
        self.coords.first().copied().unwrap_or(f64::NAN)
    }

    pub fn y(&self) -> f64 {
        self.coords.get(1).copied().unwrap_or(f64::NAN)
    }

    pub fn z(&self) -> Option<f64> {
        self.coords.get(2).copied()
    }

    pub fn dimension(&self) -> usize {
        self.coords.len()
    }
}

/// Ordered control points. Individual points may be `xlink:href` references
/// (`pointProperty`/`pointRep`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Points(pub Vec<Member<Point>>);

impl Points {
    pub fn from_coords(coords: Vec<Vec<f64>>, crs: Option<&Crs>) -> Self {
        Points(
            coords
                .into_iter()
                .map(|c| Member::Inline(Point::new(c).with_crs(crs.cloned())))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member<Point>> {
        self.0.iter()
    }

    /// True when every point is given inline, i.e. the list can be written
    /// as a single `posList`/`coordinates` element.
    pub fn all_inline(&self) -> bool {
        self.0.iter().all(|p| matches!(p, Member::Inline(_)))
    }

    /// Resolved points in order. Fails on unresolved references.
    pub fn resolved(&self) -> Result<Vec<Point>> {
        self.0.iter().map(Member::resolve).collect()
    }

    pub fn dimension(&self) -> usize {
        self.0
            .iter()
            .find_map(|p| p.resolve().ok().map(|p| p.dimension()))
            .unwrap_or(2)
    }
}
