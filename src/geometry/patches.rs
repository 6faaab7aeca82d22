use super::{first_dimension, Member, Points, Ring};

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonPatch {
    pub exterior: Option<Member<Ring>>,
    pub interiors: Vec<Member<Ring>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub exterior: Member<Ring>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub exterior: Member<Ring>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GriddedKind {
    Cone,
    Cylinder,
    Sphere,
}

impl GriddedKind {
    pub fn name(self) -> &'static str {
        match self {
            GriddedKind::Cone => "Cone",
            GriddedKind::Cylinder => "Cylinder",
            GriddedKind::Sphere => "Sphere",
        }
    }
}

/// Row-major point grid of a cone, cylinder or sphere patch.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedPatch {
    pub kind: GriddedKind,
    pub rows: Vec<Points>,
}

impl GriddedPatch {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map(Points::len).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfacePatch {
    Polygon(PolygonPatch),
    Rectangle(Rectangle),
    Triangle(Triangle),
    Gridded(GriddedPatch),
}

impl SurfacePatch {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SurfacePatch::Polygon(_) => "PolygonPatch",
            SurfacePatch::Rectangle(_) => "Rectangle",
            SurfacePatch::Triangle(_) => "Triangle",
            SurfacePatch::Gridded(g) => g.kind.name(),
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            SurfacePatch::Polygon(p) => p
                .exterior
                .as_ref()
                .map(|e| first_dimension(std::slice::from_ref(e), Ring::dimension))
                .unwrap_or(2),
            SurfacePatch::Rectangle(r) => first_dimension(std::slice::from_ref(&r.exterior), Ring::dimension),
            SurfacePatch::Triangle(t) => first_dimension(std::slice::from_ref(&t.exterior), Ring::dimension),
            SurfacePatch::Gridded(g) => g.rows.first().map(Points::dimension).unwrap_or(2),
        }
    }
}
