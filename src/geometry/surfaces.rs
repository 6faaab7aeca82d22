use std::sync::Arc;

use crate::crs::Crs;

use super::{
    first_dimension, CurveSegment, GeometryId, Measure, Member, Orientation, PolygonPatch, Points, Ring,
    SurfacePatch, Triangle,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub exterior: Option<Member<Ring>>,
    pub interiors: Vec<Member<Ring>>,
}

impl Polygon {
    pub fn dimension(&self) -> usize {
        match &self.exterior {
            Some(exterior) => first_dimension(std::slice::from_ref(exterior), Ring::dimension),
            None => first_dimension(&self.interiors, Ring::dimension),
        }
    }
}

/// `gml:Surface`: a surface made of arbitrary patches.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSurface {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub patches: Vec<SurfacePatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolyhedralSurface {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub patches: Vec<PolygonPatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriangulatedSurface {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub patches: Vec<Triangle>,
}

/// Triangulated irregular network with its construction constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct Tin {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub patches: Vec<Triangle>,
    /// Each inner list holds the `LineStringSegment`s of one `stopLines` element.
    pub stop_lines: Vec<Vec<CurveSegment>>,
    pub break_lines: Vec<Vec<CurveSegment>>,
    pub max_length: Measure,
    pub control_points: Points,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrientableSurface {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub base: Member<Surface>,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSurface {
    pub id: Option<GeometryId>,
    pub crs: Option<Crs>,
    pub members: Vec<Member<Surface>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    Polygon(Arc<Polygon>),
    Patches(Arc<PatchSurface>),
    PolyhedralSurface(Arc<PolyhedralSurface>),
    TriangulatedSurface(Arc<TriangulatedSurface>),
    Tin(Arc<Tin>),
    Composite(Arc<CompositeSurface>),
    Orientable(Arc<OrientableSurface>),
}

impl Surface {
    pub fn id(&self) -> Option<&GeometryId> {
        match self {
            Surface::Polygon(s) => s.id.as_ref(),
            Surface::Patches(s) => s.id.as_ref(),
            Surface::PolyhedralSurface(s) => s.id.as_ref(),
            Surface::TriangulatedSurface(s) => s.id.as_ref(),
            Surface::Tin(s) => s.id.as_ref(),
            Surface::Composite(s) => s.id.as_ref(),
            Surface::Orientable(s) => s.id.as_ref(),
        }
    }

    pub fn crs(&self) -> Option<&Crs> {
        match self {
            Surface::Polygon(s) => s.crs.as_ref(),
            Surface::Patches(s) => s.crs.as_ref(),
            Surface::PolyhedralSurface(s) => s.crs.as_ref(),
            Surface::TriangulatedSurface(s) => s.crs.as_ref(),
            Surface::Tin(s) => s.crs.as_ref(),
            Surface::Composite(s) => s.crs.as_ref(),
            Surface::Orientable(s) => s.crs.as_ref(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Surface::Polygon(_) => "Polygon",
            Surface::Patches(_) => "Surface",
            Surface::PolyhedralSurface(_) => "PolyhedralSurface",
            Surface::TriangulatedSurface(_) => "TriangulatedSurface",
            Surface::Tin(_) => "Tin",
            Surface::Composite(_) => "CompositeSurface",
            Surface::Orientable(_) => "OrientableSurface",
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Surface::Polygon(s) => s.dimension(),
            Surface::Patches(s) => s.patches.first().map(SurfacePatch::dimension).unwrap_or(2),
            Surface::PolyhedralSurface(s) => s
                .patches
                .first()
                .map(|p| SurfacePatch::Polygon(p.clone()).dimension())
                .unwrap_or(2),
            Surface::TriangulatedSurface(s) => triangle_dimension(&s.patches),
            Surface::Tin(s) => triangle_dimension(&s.patches),
            Surface::Composite(s) => first_dimension(&s.members, Surface::dimension),
            Surface::Orientable(s) => s.base.resolve().map(|b| b.dimension()).unwrap_or(2),
        }
    }
}

fn triangle_dimension(patches: &[Triangle]) -> usize {
    patches
        .first()
        .map(|t| first_dimension(std::slice::from_ref(&t.exterior), Ring::dimension))
        .unwrap_or(2)
}
