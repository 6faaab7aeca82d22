//! The fifteen curve segment kinds of GML 3.

use super::{Curve, Measure, Member, Point, Points};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnotType {
    Uniform,
    QuasiUniform,
    PiecewiseBezier,
}

impl KnotType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "uniform" => Some(KnotType::Uniform),
            "quasiUniform" => Some(KnotType::QuasiUniform),
            "piecewiseBezier" => Some(KnotType::PiecewiseBezier),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KnotType::Uniform => "uniform",
            KnotType::QuasiUniform => "quasiUniform",
            KnotType::PiecewiseBezier => "piecewiseBezier",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Knot {
    pub value: f64,
    pub multiplicity: u32,
    pub weight: f64,
}

/// Local frame of a clothoid: origin plus reference directions.
#[derive(Debug, Clone, PartialEq)]
pub struct AffinePlacement {
    pub location: Vec<f64>,
    pub ref_directions: Vec<Vec<f64>>,
    pub in_dimension: usize,
    pub out_dimension: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CurveSegment {
    Arc {
        points: Points,
    },
    ArcByBulge {
        points: Points,
        bulge: f64,
        normal: Vec<f64>,
    },
    ArcByCenterPoint {
        center: Member<Point>,
        radius: Measure,
        start_angle: Option<Measure>,
        end_angle: Option<Measure>,
    },
    ArcString {
        points: Points,
    },
    ArcStringByBulge {
        points: Points,
        bulges: Vec<f64>,
        normals: Vec<Vec<f64>>,
    },
    Bezier {
        points: Points,
        degree: u32,
        knots: [Knot; 2],
    },
    BSpline {
        points: Points,
        degree: u32,
        knots: Vec<Knot>,
        polynomial: bool,
        knot_type: Option<KnotType>,
    },
    Circle {
        points: Points,
    },
    CircleByCenterPoint {
        center: Member<Point>,
        radius: Measure,
        start_angle: Option<Measure>,
    },
    Clothoid {
        placement: AffinePlacement,
        scale_factor: f64,
        start_parameter: f64,
        end_parameter: f64,
    },
    CubicSpline {
        points: Points,
        vector_at_start: Vec<f64>,
        vector_at_end: Vec<f64>,
    },
    Geodesic {
        points: Points,
    },
    GeodesicString {
        points: Points,
    },
    LineStringSegment {
        points: Points,
    },
    OffsetCurve {
        base: Member<Curve>,
        distance: Measure,
        direction: Option<Vec<f64>>,
    },
}

impl CurveSegment {
    pub fn kind_name(&self) -> &'static str {
        match self {
            CurveSegment::Arc { .. } => "Arc",
            CurveSegment::ArcByBulge { .. } => "ArcByBulge",
            CurveSegment::ArcByCenterPoint { .. } => "ArcByCenterPoint",
            CurveSegment::ArcString { .. } => "ArcString",
            CurveSegment::ArcStringByBulge { .. } => "ArcStringByBulge",
            CurveSegment::Bezier { .. } => "Bezier",
            CurveSegment::BSpline { .. } => "BSpline",
            CurveSegment::Circle { .. } => "Circle",
            CurveSegment::CircleByCenterPoint { .. } => "CircleByCenterPoint",
            CurveSegment::Clothoid { .. } => "Clothoid",
            CurveSegment::CubicSpline { .. } => "CubicSpline",
            CurveSegment::Geodesic { .. } => "Geodesic",
            CurveSegment::GeodesicString { .. } => "GeodesicString",
            CurveSegment::LineStringSegment { .. } => "LineStringSegment",
            CurveSegment::OffsetCurve { .. } => "OffsetCurve",
        }
    }

    /// Fixed `interpolation` attribute value of the kind.
    pub fn interpolation(&self) -> &'static str {
        match self {
            CurveSegment::Arc { .. } | CurveSegment::ArcString { .. } | CurveSegment::Circle { .. } => {
                "circularArc3Points"
            }
            CurveSegment::ArcByBulge { .. } | CurveSegment::ArcStringByBulge { .. } => {
                "circularArc2PointWithBulge"
            }
            CurveSegment::ArcByCenterPoint { .. } | CurveSegment::CircleByCenterPoint { .. } => {
                "circularArcCenterPointWithRadius"
            }
            CurveSegment::Bezier { .. } => "polynomialSpline",
            CurveSegment::BSpline { polynomial, .. } => {
                if *polynomial {
                    "polynomialSpline"
                } else {
                    "rationalSpline"
                }
            }
            CurveSegment::CubicSpline { .. } => "cubicSpline",
            CurveSegment::Geodesic { .. } | CurveSegment::GeodesicString { .. } => "geodesic",
            CurveSegment::LineStringSegment { .. } => "linear",
            // no interpolation attribute in the schema
            CurveSegment::Clothoid { .. } | CurveSegment::OffsetCurve { .. } => "",
        }
    }

    /// Control points, for the kinds that have a point list.
    pub fn control_points(&self) -> Option<&Points> {
        match self {
            CurveSegment::Arc { points }
            | CurveSegment::ArcByBulge { points, .. }
            | CurveSegment::ArcString { points }
            | CurveSegment::ArcStringByBulge { points, .. }
            | CurveSegment::Bezier { points, .. }
            | CurveSegment::BSpline { points, .. }
            | CurveSegment::Circle { points }
            | CurveSegment::CubicSpline { points, .. }
            | CurveSegment::Geodesic { points }
            | CurveSegment::GeodesicString { points }
            | CurveSegment::LineStringSegment { points } => Some(points),
            CurveSegment::ArcByCenterPoint { .. }
            | CurveSegment::CircleByCenterPoint { .. }
            | CurveSegment::Clothoid { .. }
            | CurveSegment::OffsetCurve { .. } => None,
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            CurveSegment::ArcByCenterPoint { center, .. } | CurveSegment::CircleByCenterPoint { center, .. } => {
                center.resolve().map(|p| p.dimension()).unwrap_or(2)
            }
            CurveSegment::Clothoid { placement, .. } => placement.out_dimension,
            CurveSegment::OffsetCurve { base, .. } => base.resolve().map(|c| c.dimension()).unwrap_or(2),
            other => other.control_points().map(Points::dimension).unwrap_or(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_literals() {
        let points = Points::from_coords(vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 0.0]], None);
        let arc = CurveSegment::Arc { points: points.clone() };
        assert_eq!(arc.interpolation(), "circularArc3Points");
        let spline = CurveSegment::BSpline {
            points,
            degree: 2,
            knots: vec![],
            polynomial: false,
            knot_type: None,
        };
        assert_eq!(spline.interpolation(), "rationalSpline");
    }

    #[test]
    fn test_segment_dimension() {
        let seg = CurveSegment::LineStringSegment {
            points: Points::from_coords(vec![vec![0.0, 0.0, 1.0], vec![1.0, 1.0, 1.0]], None),
        };
        assert_eq!(seg.dimension(), 3);
    }
}
