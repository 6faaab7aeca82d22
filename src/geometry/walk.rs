//! Enumerates the `xlink:href` references held anywhere inside a geometry.
//!
//! The walk stays within inline content; it never follows a reference into
//! its target.

use super::{
    Curve, CurveSegment, Geometry, GeometryReference, Member, Points, Polygon, PolygonPatch, Ring, Solid, Surface,
    SurfacePatch,
};

pub trait VisitReferences {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference));
}

impl<T: VisitReferences> VisitReferences for Member<T> {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        match self {
            Member::Inline(value) => value.visit_references(f),
            Member::Reference(reference) => f(reference),
        }
    }
}

impl<T: VisitReferences> VisitReferences for std::sync::Arc<T> {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        (**self).visit_references(f)
    }
}

fn visit_all<T: VisitReferences>(items: &[T], f: &mut dyn FnMut(&GeometryReference)) {
    for item in items {
        item.visit_references(f);
    }
}

impl VisitReferences for super::Point {
    fn visit_references(&self, _: &mut dyn FnMut(&GeometryReference)) {}
}

impl VisitReferences for Points {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        visit_all(&self.0, f)
    }
}

impl VisitReferences for Ring {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        match self {
            Ring::Linear(ring) => ring.points.visit_references(f),
            Ring::Curves(ring) => visit_all(&ring.members, f),
        }
    }
}

impl VisitReferences for CurveSegment {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        match self {
            CurveSegment::ArcByCenterPoint { center, .. } | CurveSegment::CircleByCenterPoint { center, .. } => {
                center.visit_references(f)
            }
            CurveSegment::OffsetCurve { base, .. } => base.visit_references(f),
            CurveSegment::Clothoid { .. } => {}
            other => {
                if let Some(points) = other.control_points() {
                    points.visit_references(f)
                }
            }
        }
    }
}

impl VisitReferences for Curve {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        match self {
            Curve::LineString(line) => line.points.visit_references(f),
            Curve::Segmented(curve) => visit_all(&curve.segments, f),
            Curve::Orientable(curve) => curve.base.visit_references(f),
            Curve::Composite(curve) => visit_all(&curve.members, f),
            Curve::Ring(ring) => ring.visit_references(f),
        }
    }
}

impl VisitReferences for Polygon {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        if let Some(exterior) = &self.exterior {
            exterior.visit_references(f);
        }
        visit_all(&self.interiors, f)
    }
}

impl VisitReferences for PolygonPatch {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        if let Some(exterior) = &self.exterior {
            exterior.visit_references(f);
        }
        visit_all(&self.interiors, f)
    }
}

impl VisitReferences for SurfacePatch {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        match self {
            SurfacePatch::Polygon(patch) => patch.visit_references(f),
            SurfacePatch::Rectangle(patch) => patch.exterior.visit_references(f),
            SurfacePatch::Triangle(patch) => patch.exterior.visit_references(f),
            SurfacePatch::Gridded(patch) => visit_all(&patch.rows, f),
        }
    }
}

impl VisitReferences for Surface {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        match self {
            Surface::Polygon(polygon) => polygon.visit_references(f),
            Surface::Patches(surface) => visit_all(&surface.patches, f),
            Surface::PolyhedralSurface(surface) => visit_all(&surface.patches, f),
            Surface::TriangulatedSurface(surface) => {
                surface.patches.iter().for_each(|t| t.exterior.visit_references(f))
            }
            Surface::Tin(tin) => {
                tin.patches.iter().for_each(|t| t.exterior.visit_references(f));
                tin.stop_lines.iter().chain(&tin.break_lines).for_each(|line| visit_all(line, f));
                tin.control_points.visit_references(f);
            }
            Surface::Composite(surface) => visit_all(&surface.members, f),
            Surface::Orientable(surface) => surface.base.visit_references(f),
        }
    }
}

impl VisitReferences for Solid {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        match self {
            Solid::Solid(solid) => {
                if let Some(exterior) = &solid.exterior {
                    exterior.visit_references(f);
                }
                visit_all(&solid.interiors, f)
            }
            Solid::Composite(solid) => visit_all(&solid.members, f),
        }
    }
}

impl VisitReferences for Geometry {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        match self {
            Geometry::Point(_) | Geometry::Envelope(_) => {}
            Geometry::Curve(curve) => curve.visit_references(f),
            Geometry::Surface(surface) => surface.visit_references(f),
            Geometry::Solid(solid) => solid.visit_references(f),
            Geometry::MultiPoint(m) => visit_all(&m.members, f),
            Geometry::MultiCurve(m) => visit_all(&m.members, f),
            Geometry::MultiLineString(m) => visit_all(&m.members, f),
            Geometry::MultiSurface(m) => visit_all(&m.members, f),
            Geometry::MultiPolygon(m) => visit_all(&m.members, f),
            Geometry::MultiSolid(m) => visit_all(&m.members, f),
            Geometry::MultiGeometry(m) => visit_all(&m.members, f),
            Geometry::Composite(c) => visit_all(&c.members, f),
            Geometry::Reference(reference) => f(reference),
        }
    }
}

impl VisitReferences for super::LineString {
    fn visit_references(&self, f: &mut dyn FnMut(&GeometryReference)) {
        self.points.visit_references(f)
    }
}
