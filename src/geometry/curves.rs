use std::sync::Arc;

use crate::crs::Crs;

use super::{first_dimension, CurveSegment, GeometryId, Member, Orientation, Points};

#[derive(Debug, Clone, PartialEq)]
pub struct LineString {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub points: Points,
}

/// Closed boundary of at least four control points. First and last point
/// are not required to be equal.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRing {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub points: Points,
}

/// `gml:Ring`: a ring made of curve members.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveRing {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub members: Vec<Member<Curve>>,
}

/// `gml:Curve`: a curve made of segments.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedCurve {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub segments: Vec<CurveSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrientableCurve {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub base: Member<Curve>,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeCurve {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub members: Vec<Member<Curve>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ring {
    Linear(Arc<LinearRing>),
    Curves(Arc<CurveRing>),
}

impl Ring {
    pub fn id(&self) -> Option<&GeometryId> {
        match self {
            Ring::Linear(r) => r.id.as_ref(),
            Ring::Curves(r) => r.id.as_ref(),
        }
    }

    pub fn crs(&self) -> Option<&Crs> {
        match self {
            Ring::Linear(r) => r.crs.as_ref(),
            Ring::Curves(r) => r.crs.as_ref(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Ring::Linear(_) => "LinearRing",
            Ring::Curves(_) => "Ring",
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Ring::Linear(r) => r.points.dimension(),
            Ring::Curves(r) => first_dimension(&r.members, Curve::dimension),
        }
    }

    /// True when both rings are the same shared instance.
    pub fn ptr_eq(&self, other: &Ring) -> bool {
        match (self, other) {
            (Ring::Linear(a), Ring::Linear(b)) => Arc::ptr_eq(a, b),
            (Ring::Curves(a), Ring::Curves(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    LineString(Arc<LineString>),
    Segmented(Arc<SegmentedCurve>),
    Orientable(Arc<OrientableCurve>),
    Composite(Arc<CompositeCurve>),
    Ring(Ring),
}

impl Curve {
    pub fn id(&self) -> Option<&GeometryId> {
        match self {
            Curve::LineString(c) => c.id.as_ref(),
            Curve::Segmented(c) => c.id.as_ref(),
            Curve::Orientable(c) => c.id.as_ref(),
            Curve::Composite(c) => c.id.as_ref(),
            Curve::Ring(r) => r.id(),
        }
    }

    pub fn crs(&self) -> Option<&Crs> {
        match self {
            Curve::LineString(c) => c.crs.as_ref(),
            Curve::Segmented(c) => c.crs.as_ref(),
            Curve::Orientable(c) => c.crs.as_ref(),
            Curve::Composite(c) => c.crs.as_ref(),
            Curve::Ring(r) => r.crs(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Curve::LineString(_) => "LineString",
            Curve::Segmented(_) => "Curve",
            Curve::Orientable(_) => "OrientableCurve",
            Curve::Composite(_) => "CompositeCurve",
            Curve::Ring(r) => r.kind_name(),
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Curve::LineString(c) => c.points.dimension(),
            Curve::Segmented(c) => c.segments.first().map(CurveSegment::dimension).unwrap_or(2),
            Curve::Orientable(c) => c.base.resolve().map(|b| b.dimension()).unwrap_or(2),
            Curve::Composite(c) => first_dimension(&c.members, Curve::dimension),
            Curve::Ring(r) => r.dimension(),
        }
    }
}
