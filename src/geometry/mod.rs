//! In-memory geometry model.
//!
//! Geometries are closed enums over reference-counted payloads: cloning a
//! geometry never duplicates its content, which is how objects shared through
//! `xlink:href` end up as one instance with several owners.

use std::fmt;
use std::sync::Arc;

use crate::crs::Crs;
use crate::error::{GmlError, Result};

pub mod curves;
pub mod measure;
pub mod patches;
pub mod points;
pub mod reference;
pub mod segments;
pub mod solids;
pub mod surfaces;
pub mod walk;

pub use curves::{CompositeCurve, Curve, CurveRing, LineString, LinearRing, OrientableCurve, Ring, SegmentedCurve};
pub use measure::{Measure, Orientation};
pub use patches::{GriddedKind, GriddedPatch, PolygonPatch, Rectangle, SurfacePatch, Triangle};
pub use points::{Point, Points};
pub use reference::{GeometryReference, ReferenceKind};
pub use segments::{AffinePlacement, CurveSegment, Knot, KnotType};
pub use solids::{CompositeSolid, Solid, SolidBody};
pub use walk::VisitReferences;
pub use surfaces::{
    CompositeSurface, OrientableSurface, PatchSurface, Polygon, PolyhedralSurface, Surface, Tin,
    TriangulatedSurface,
};

/// Object identifier (`gid` / `gml:id`): no leading digit, no colon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(String);

impl GeometryId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let valid = match value.chars().next() {
            Some(first) => !first.is_ascii_digit() && !value.contains(':'),
            None => false,
        };
        if !valid {
            return Err(GmlError::InvalidIdentifier(value));
        }
        Ok(GeometryId(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeometryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A property value that is either given inline or by `xlink:href`.
#[derive(Debug, Clone, PartialEq)]
pub enum Member<T> {
    Inline(T),
    Reference(GeometryReference),
}

impl<T: GeometryKind> Member<T> {
    /// The inline value or the resolved reference target.
    pub fn resolve(&self) -> Result<T> {
        match self {
            Member::Inline(value) => Ok(value.clone()),
            Member::Reference(reference) => {
                let target = reference.target()?;
                T::from_geometry(target).ok_or_else(|| GmlError::ReferenceMismatch {
                    href: reference.href().to_string(),
                    expected: T::EXPECTED.name().to_string(),
                    found: target.kind_name().to_string(),
                })
            }
        }
    }

    pub fn as_inline(&self) -> Option<&T> {
        match self {
            Member::Inline(value) => Some(value),
            Member::Reference(_) => None,
        }
    }
}

/// Conversion between a concrete member type and [`Geometry`].
pub trait GeometryKind: Clone {
    const EXPECTED: ReferenceKind;

    fn from_geometry(geometry: &Geometry) -> Option<Self>;
    fn into_geometry(self) -> Geometry;
}

impl GeometryKind for Point {
    const EXPECTED: ReferenceKind = ReferenceKind::Point;

    fn from_geometry(geometry: &Geometry) -> Option<Self> {
        match geometry {
            Geometry::Point(p) => Some(p.clone()),
            _ => None,
        }
    }

    fn into_geometry(self) -> Geometry {
        Geometry::Point(self)
    }
}

impl GeometryKind for Arc<LineString> {
    const EXPECTED: ReferenceKind = ReferenceKind::LineString;

    fn from_geometry(geometry: &Geometry) -> Option<Self> {
        match geometry {
            Geometry::Curve(Curve::LineString(ls)) => Some(ls.clone()),
            _ => None,
        }
    }

    fn into_geometry(self) -> Geometry {
        Geometry::Curve(Curve::LineString(self))
    }
}

impl GeometryKind for Arc<Polygon> {
    const EXPECTED: ReferenceKind = ReferenceKind::Polygon;

    fn from_geometry(geometry: &Geometry) -> Option<Self> {
        match geometry {
            Geometry::Surface(Surface::Polygon(p)) => Some(p.clone()),
            _ => None,
        }
    }

    fn into_geometry(self) -> Geometry {
        Geometry::Surface(Surface::Polygon(self))
    }
}

impl GeometryKind for Curve {
    const EXPECTED: ReferenceKind = ReferenceKind::Curve;

    fn from_geometry(geometry: &Geometry) -> Option<Self> {
        match geometry {
            Geometry::Curve(c) => Some(c.clone()),
            _ => None,
        }
    }

    fn into_geometry(self) -> Geometry {
        Geometry::Curve(self)
    }
}

impl GeometryKind for Ring {
    const EXPECTED: ReferenceKind = ReferenceKind::Ring;

    fn from_geometry(geometry: &Geometry) -> Option<Self> {
        match geometry {
            Geometry::Curve(Curve::Ring(r)) => Some(r.clone()),
            _ => None,
        }
    }

    fn into_geometry(self) -> Geometry {
        Geometry::Curve(Curve::Ring(self))
    }
}

impl GeometryKind for Surface {
    const EXPECTED: ReferenceKind = ReferenceKind::Surface;

    fn from_geometry(geometry: &Geometry) -> Option<Self> {
        match geometry {
            Geometry::Surface(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn into_geometry(self) -> Geometry {
        Geometry::Surface(self)
    }
}

impl GeometryKind for Solid {
    const EXPECTED: ReferenceKind = ReferenceKind::Solid;

    fn from_geometry(geometry: &Geometry) -> Option<Self> {
        match geometry {
            Geometry::Solid(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn into_geometry(self) -> Geometry {
        Geometry::Solid(self)
    }
}

impl GeometryKind for Geometry {
    const EXPECTED: ReferenceKind = ReferenceKind::Geometry;

    fn from_geometry(geometry: &Geometry) -> Option<Self> {
        Some(geometry.clone())
    }

    fn into_geometry(self) -> Geometry {
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

/// Homogeneous ordered member list shared by all multi-geometries.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate<T> {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub members: Vec<Member<T>>,
}

impl<T> Aggregate<T> {
    pub fn new(members: Vec<Member<T>>) -> Self {
        Aggregate {
            id: None,
            crs: None,
            members,
        }
    }
}

/// `GeometricComplex`: an ordered set of arbitrary primitives.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeGeometry {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub members: Vec<Member<Geometry>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    Curve(Curve),
    Surface(Surface),
    Solid(Solid),
    Envelope(Arc<Envelope>),
    MultiPoint(Arc<Aggregate<Point>>),
    MultiCurve(Arc<Aggregate<Curve>>),
    MultiLineString(Arc<Aggregate<Arc<LineString>>>),
    MultiSurface(Arc<Aggregate<Surface>>),
    MultiPolygon(Arc<Aggregate<Arc<Polygon>>>),
    MultiSolid(Arc<Aggregate<Solid>>),
    MultiGeometry(Arc<Aggregate<Geometry>>),
    Composite(Arc<CompositeGeometry>),
    Reference(GeometryReference),
}

impl Geometry {
    pub fn id(&self) -> Option<&GeometryId> {
        match self {
            Geometry::Point(p) => p.id.as_ref(),
            Geometry::Curve(c) => c.id(),
            Geometry::Surface(s) => s.id(),
            Geometry::Solid(s) => s.id(),
            Geometry::Envelope(e) => e.id.as_ref(),
            Geometry::MultiPoint(m) => m.id.as_ref(),
            Geometry::MultiCurve(m) => m.id.as_ref(),
            Geometry::MultiLineString(m) => m.id.as_ref(),
            Geometry::MultiSurface(m) => m.id.as_ref(),
            Geometry::MultiPolygon(m) => m.id.as_ref(),
            Geometry::MultiSolid(m) => m.id.as_ref(),
            Geometry::MultiGeometry(m) => m.id.as_ref(),
            Geometry::Composite(c) => c.id.as_ref(),
            Geometry::Reference(_) => None,
        }
    }

    pub fn crs(&self) -> Option<&Crs> {
        match self {
            Geometry::Point(p) => p.crs.as_ref(),
            Geometry::Curve(c) => c.crs(),
            Geometry::Surface(s) => s.crs(),
            Geometry::Solid(s) => s.crs(),
            Geometry::Envelope(e) => e.crs.as_ref(),
            Geometry::MultiPoint(m) => m.crs.as_ref(),
            Geometry::MultiCurve(m) => m.crs.as_ref(),
            Geometry::MultiLineString(m) => m.crs.as_ref(),
            Geometry::MultiSurface(m) => m.crs.as_ref(),
            Geometry::MultiPolygon(m) => m.crs.as_ref(),
            Geometry::MultiSolid(m) => m.crs.as_ref(),
            Geometry::MultiGeometry(m) => m.crs.as_ref(),
            Geometry::Composite(c) => c.crs.as_ref(),
            Geometry::Reference(r) => r.target().ok().and_then(|g| g.crs()),
        }
    }

    /// Element-style name of the concrete kind, e.g. `"Polygon"`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::Curve(c) => c.kind_name(),
            Geometry::Surface(s) => s.kind_name(),
            Geometry::Solid(s) => s.kind_name(),
            Geometry::Envelope(_) => "Envelope",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiCurve(_) => "MultiCurve",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::MultiSurface(_) => "MultiSurface",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::MultiSolid(_) => "MultiSolid",
            Geometry::MultiGeometry(_) => "MultiGeometry",
            Geometry::Composite(_) => "GeometricComplex",
            Geometry::Reference(_) => "GeometryReference",
        }
    }

    /// Coordinate dimension, taken from the first reachable position.
    pub fn dimension(&self) -> usize {
        match self {
            Geometry::Point(p) => p.dimension(),
            Geometry::Curve(c) => c.dimension(),
            Geometry::Surface(s) => s.dimension(),
            Geometry::Solid(s) => s.dimension(),
            Geometry::Envelope(e) => e.min.len(),
            Geometry::MultiPoint(m) => first_dimension(&m.members, |p| p.dimension()),
            Geometry::MultiCurve(m) => first_dimension(&m.members, |c| c.dimension()),
            Geometry::MultiLineString(m) => first_dimension(&m.members, |l| l.points.dimension()),
            Geometry::MultiSurface(m) => first_dimension(&m.members, |s| s.dimension()),
            Geometry::MultiPolygon(m) => first_dimension(&m.members, |p| p.dimension()),
            Geometry::MultiSolid(m) => first_dimension(&m.members, |s| s.dimension()),
            Geometry::MultiGeometry(m) => first_dimension(&m.members, |g| g.dimension()),
            Geometry::Composite(c) => first_dimension(&c.members, |g| g.dimension()),
            Geometry::Reference(r) => r.target().map(|g| g.dimension()).unwrap_or(2),
        }
    }

    /// Follows a top-level reference to its target.
    pub fn dereference(&self) -> Result<&Geometry> {
        match self {
            Geometry::Reference(r) => r.target(),
            other => Ok(other),
        }
    }
}

pub(crate) fn first_dimension<T: GeometryKind>(members: &[Member<T>], dim: impl Fn(&T) -> usize) -> usize {
    members
        .iter()
        .find_map(|m| m.resolve().ok().map(|v| dim(&v)))
        .unwrap_or(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_syntax() {
        assert!(GeometryId::new("0abc").is_err());
        assert!(GeometryId::new("a:b").is_err());
        assert!(GeometryId::new("").is_err());
        assert_eq!(GeometryId::new("abc-1").unwrap().as_str(), "abc-1");
        assert!(GeometryId::new("p").is_ok());
    }

    #[test]
    fn test_member_resolution_checks_kind() {
        let reference = GeometryReference::new("#p1", ReferenceKind::Polygon);
        let member: Member<Arc<Polygon>> = Member::Reference(reference.clone());
        assert!(matches!(member.resolve(), Err(GmlError::UnresolvedReference(_))));

        reference.resolve_to(Geometry::Point(Point::new(vec![1.0, 2.0])));
        match member.resolve() {
            Err(GmlError::ReferenceMismatch { expected, found, .. }) => {
                assert_eq!(expected, "Polygon");
                assert_eq!(found, "Point");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_generic_member_accepts_any_kind() {
        let reference = GeometryReference::new("#p1", ReferenceKind::Geometry);
        reference.resolve_to(Geometry::Point(Point::new(vec![1.0, 2.0, 3.0])));
        let member: Member<Geometry> = Member::Reference(reference);
        let resolved = member.resolve().unwrap();
        assert_eq!(resolved.dimension(), 3);
    }
}
