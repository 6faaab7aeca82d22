//! GML 3 curve segments.

use std::io::BufRead;

use tracing::debug;

use crate::crs::Crs;
use crate::error::{GmlError, Result};
use crate::geometry::{AffinePlacement, CurveSegment, Knot, KnotType, Measure, Member, Point, Points};

use super::GeometryReader;

impl<'a, R: BufRead> GeometryReader<'a, R> {
    /// Any `gml:_CurveSegment`.
    pub fn parse_curve_segment(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        self.require_gml_start("gml:_CurveSegment")?;
        let name = self.xml.local_name().to_string();
        debug!(element = name.as_str(), "parsing gml:_CurveSegment");
        let crs = self.determine_active_crs(crs);
        let crs = crs.as_ref();
        let segment = match name.as_str() {
            "Arc" => self.parse_arc(crs)?,
            "ArcByBulge" => self.parse_arc_by_bulge(crs)?,
            "ArcByCenterPoint" => self.parse_arc_by_center_point(crs)?,
            "ArcString" => self.parse_arc_string(crs)?,
            "ArcStringByBulge" => self.parse_arc_string_by_bulge(crs)?,
            "Bezier" => self.parse_bezier(crs)?,
            "BSpline" => self.parse_bspline(crs)?,
            "Circle" => self.parse_circle(crs)?,
            "CircleByCenterPoint" => self.parse_circle_by_center_point(crs)?,
            "Clothoid" => self.parse_clothoid()?,
            "CubicSpline" => self.parse_cubic_spline(crs)?,
            "Geodesic" => CurveSegment::Geodesic {
                points: self.parse_geodesic_points(crs, "Geodesic", |n| n == 2, "exactly two")?,
            },
            "GeodesicString" => CurveSegment::GeodesicString {
                points: self.parse_geodesic_points(crs, "GeodesicString", |n| n >= 2, "at least two")?,
            },
            "LineStringSegment" => self.parse_line_string_segment(crs)?,
            "OffsetCurve" => self.parse_offset_curve(crs)?,
            _ => return Err(self.unexpected("gml:_CurveSegment")),
        };
        Ok(segment)
    }

    fn validate_interpolation(&self, expected: &str) -> Result<()> {
        match self.xml.attribute("interpolation") {
            Some(actual) if actual != expected => Err(GmlError::format(
                self.xml.local_name(),
                format!("invalid interpolation '{}', must be '{}'", actual, expected),
            )),
            _ => Ok(()),
        }
    }

    /// Interpolation check, then the control points right after the start tag.
    fn segment_points(&mut self, crs: Option<&Crs>, interpolation: &str) -> Result<Points> {
        self.validate_interpolation(interpolation)?;
        self.xml.next_tag()?;
        self.parse_control_points(crs)
    }

    fn check_count(element: &str, points: &Points, ok: bool, expected: &str) -> Result<()> {
        if ok {
            return Ok(());
        }
        Err(GmlError::format(
            element,
            format!("must contain {} control points, found {}", expected, points.len()),
        ))
    }

    fn parse_arc(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        let points = self.segment_points(crs, "circularArc3Points")?;
        Self::check_count("Arc", &points, points.len() == 3, "exactly three")?;
        self.xml.require_end(self.ns, "Arc")?;
        Ok(CurveSegment::Arc { points })
    }

    fn parse_circle(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        let points = self.segment_points(crs, "circularArc3Points")?;
        Self::check_count("Circle", &points, points.len() == 3, "exactly three")?;
        self.xml.require_end(self.ns, "Circle")?;
        Ok(CurveSegment::Circle { points })
    }

    fn parse_arc_string(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        let points = self.segment_points(crs, "circularArc3Points")?;
        let n = points.len();
        Self::check_count("ArcString", &points, n >= 3 && n % 2 == 1, "an odd number (at least three) of")?;
        self.xml.require_end(self.ns, "ArcString")?;
        Ok(CurveSegment::ArcString { points })
    }

    fn parse_arc_by_bulge(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        let ns = self.ns;
        let points = self.segment_points(crs, "circularArc2PointWithBulge")?;
        Self::check_count("ArcByBulge", &points, points.len() == 2, "exactly two")?;

        self.xml.require_start(ns, "bulge")?;
        let bulge = self.xml.element_text_as_f64()?;
        self.xml.next_start(ns, "normal")?;
        let normal = self.parse_double_list()?;
        self.xml.next_tag()?;
        self.xml.require_end(ns, "ArcByBulge")?;
        Ok(CurveSegment::ArcByBulge { points, bulge, normal })
    }

    fn parse_arc_string_by_bulge(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        let ns = self.ns;
        let points = self.segment_points(crs, "circularArc2PointWithBulge")?;
        Self::check_count("ArcStringByBulge", &points, points.len() >= 2, "at least two")?;

        let mut bulges = Vec::new();
        while self.xml.is_start() && self.xml.is_element(ns, "bulge") {
            bulges.push(self.xml.element_text_as_f64()?);
            self.xml.next_tag()?;
        }
        let mut normals = Vec::new();
        while self.xml.is_start() && self.xml.is_element(ns, "normal") {
            normals.push(self.parse_double_list()?);
            self.xml.next_tag()?;
        }
        // one bulge and one normal per pair of adjacent points
        let expected = points.len() - 1;
        if bulges.len() != expected || normals.len() != expected {
            return Err(GmlError::format(
                "ArcStringByBulge",
                format!(
                    "{} control points need {} bulges and normals, found {} bulges and {} normals",
                    points.len(),
                    expected,
                    bulges.len(),
                    normals.len()
                ),
            ));
        }
        self.xml.require_end(ns, "ArcStringByBulge")?;
        Ok(CurveSegment::ArcStringByBulge {
            points,
            bulges,
            normals,
        })
    }

    /// Center point, radius and the optional start/end angles.
    fn parse_center_point_arc(
        &mut self,
        crs: Option<&Crs>,
        element: &str,
    ) -> Result<(Member<Point>, Measure, Option<Measure>, Option<Measure>)> {
        let ns = self.ns;
        let points = self.segment_points(crs, "circularArcCenterPointWithRadius")?;
        Self::check_count(element, &points, points.len() == 1, "exactly one (the center)")?;
        let center = points.0.into_iter().next().ok_or_else(|| GmlError::format(element, "missing center point"))?;

        self.xml.require_start(ns, "radius")?;
        let radius = self.parse_length()?;
        self.xml.next_tag()?;

        let mut start_angle = None;
        if self.xml.is_start() && self.xml.is_element(ns, "startAngle") {
            start_angle = Some(self.parse_angle()?);
            self.xml.next_tag()?;
        }
        let mut end_angle = None;
        if self.xml.is_start() && self.xml.is_element(ns, "endAngle") {
            end_angle = Some(self.parse_angle()?);
            self.xml.next_tag()?;
        }
        self.xml.require_end(ns, element)?;
        Ok((center, radius, start_angle, end_angle))
    }

    fn parse_arc_by_center_point(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        let (center, radius, start_angle, end_angle) = self.parse_center_point_arc(crs, "ArcByCenterPoint")?;
        Ok(CurveSegment::ArcByCenterPoint {
            center,
            radius,
            start_angle,
            end_angle,
        })
    }

    /// A full circle has a single angle: both given must agree, a lone end
    /// angle becomes the start angle.
    fn parse_circle_by_center_point(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        let (center, radius, start_angle, end_angle) = self.parse_center_point_arc(crs, "CircleByCenterPoint")?;
        let start_angle = match (start_angle, end_angle) {
            (Some(start), Some(end)) => {
                if start.value != end.value {
                    return Err(GmlError::format(
                        "CircleByCenterPoint",
                        format!("start angle ({}) and end angle ({}) differ", start, end),
                    ));
                }
                Some(start)
            }
            (None, Some(end)) => Some(end),
            (start, None) => start,
        };
        Ok(CurveSegment::CircleByCenterPoint {
            center,
            radius,
            start_angle,
        })
    }

    /// `degree` followed by `knot` elements.
    fn parse_knots(&mut self) -> Result<(u32, Vec<Knot>)> {
        let ns = self.ns;
        self.xml.require_start(ns, "degree")?;
        let degree = self.xml.element_text_as_u32()?;
        self.xml.next_tag()?;
        let mut knots = Vec::new();
        while self.xml.is_start() && self.xml.is_element(ns, "knot") {
            self.xml.next_start(ns, "Knot")?;
            self.xml.next_start(ns, "value")?;
            let value = self.xml.element_text_as_f64()?;
            self.xml.next_start(ns, "multiplicity")?;
            let multiplicity = self.xml.element_text_as_u32()?;
            self.xml.next_start(ns, "weight")?;
            let weight = self.xml.element_text_as_f64()?;
            self.xml.next_tag()?;
            self.xml.require_end(ns, "Knot")?;
            self.xml.next_tag()?;
            self.xml.require_end(ns, "knot")?;
            knots.push(Knot {
                value,
                multiplicity,
                weight,
            });
            self.xml.next_tag()?;
        }
        Ok((degree, knots))
    }

    fn parse_bezier(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        let points = self.segment_points(crs, "polynomialSpline")?;
        let (degree, knots) = self.parse_knots()?;
        let knots: [Knot; 2] = knots.try_into().map_err(|knots: Vec<Knot>| {
            GmlError::format("Bezier", format!("must specify exactly two knots, found {}", knots.len()))
        })?;
        self.xml.require_end(self.ns, "Bezier")?;
        Ok(CurveSegment::Bezier { points, degree, knots })
    }

    fn parse_bspline(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        let polynomial = match self.xml.attribute("interpolation").unwrap_or("polynomialSpline") {
            "polynomialSpline" => true,
            "rationalSpline" => false,
            other => {
                return Err(GmlError::format(
                    "BSpline",
                    format!("invalid interpolation '{}', must be 'polynomialSpline' or 'rationalSpline'", other),
                ))
            }
        };
        let knot_type = match self.xml.attribute("knotType") {
            Some(value) => Some(
                KnotType::parse(value)
                    .ok_or_else(|| GmlError::format("BSpline", format!("invalid knotType '{}'", value)))?,
            ),
            None => None,
        };
        self.xml.next_tag()?;
        let points = self.parse_control_points(crs)?;
        let (degree, knots) = self.parse_knots()?;
        if knots.len() < 2 {
            return Err(GmlError::format(
                "BSpline",
                format!("must specify at least two knots, found {}", knots.len()),
            ));
        }
        self.xml.require_end(self.ns, "BSpline")?;
        Ok(CurveSegment::BSpline {
            points,
            degree,
            knots,
            polynomial,
            knot_type,
        })
    }

    fn parse_cubic_spline(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        let ns = self.ns;
        let points = self.segment_points(crs, "cubicSpline")?;
        Self::check_count("CubicSpline", &points, points.len() >= 2, "at least two")?;
        self.xml.require_start(ns, "vectorAtStart")?;
        let vector_at_start = self.parse_double_list()?;
        self.xml.next_start(ns, "vectorAtEnd")?;
        let vector_at_end = self.parse_double_list()?;
        self.xml.next_tag()?;
        self.xml.require_end(ns, "CubicSpline")?;
        Ok(CurveSegment::CubicSpline {
            points,
            vector_at_start,
            vector_at_end,
        })
    }

    /// Geodesics only allow `posList` or a run of `pos`/`pointProperty`.
    fn parse_geodesic_points(
        &mut self,
        crs: Option<&Crs>,
        element: &str,
        valid: impl Fn(usize) -> bool,
        expected: &str,
    ) -> Result<Points> {
        let ns = self.ns;
        self.validate_interpolation("geodesic")?;
        self.xml.next_tag()?;
        let points = if self.xml.is_start() && self.xml.is_element(ns, "posList") {
            let crs = self.determine_active_crs(crs);
            let coords = self.parse_pos_list(crs.as_ref())?;
            self.xml.next_tag()?;
            Points::from_coords(coords, crs.as_ref())
        } else {
            self.parse_point_run(crs, false)?
        };
        Self::check_count(element, &points, valid(points.len()), expected)?;
        self.xml.require_end(ns, element)?;
        Ok(points)
    }

    fn parse_line_string_segment(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        let points = self.segment_points(crs, "linear")?;
        Self::check_count("LineStringSegment", &points, points.len() >= 2, "at least two")?;
        self.xml.require_end(self.ns, "LineStringSegment")?;
        Ok(CurveSegment::LineStringSegment { points })
    }

    fn parse_clothoid(&mut self) -> Result<CurveSegment> {
        let ns = self.ns;
        self.xml.next_start(ns, "refLocation")?;
        self.xml.next_start(ns, "AffinePlacement")?;
        let placement = self.parse_affine_placement()?;
        self.xml.next_tag()?;
        self.xml.require_end(ns, "refLocation")?;
        self.xml.next_start(ns, "scaleFactor")?;
        let scale_factor = self.xml.element_text_as_f64()?;
        self.xml.next_start(ns, "startParameter")?;
        let start_parameter = self.xml.element_text_as_f64()?;
        self.xml.next_start(ns, "endParameter")?;
        let end_parameter = self.xml.element_text_as_f64()?;
        self.xml.next_tag()?;
        self.xml.require_end(ns, "Clothoid")?;
        Ok(CurveSegment::Clothoid {
            placement,
            scale_factor,
            start_parameter,
            end_parameter,
        })
    }

    /// `location`, 1..n `refDirection`, `inDimension`, `outDimension`,
    /// cross-checked against each other.
    pub fn parse_affine_placement(&mut self) -> Result<AffinePlacement> {
        let ns = self.ns;
        self.xml.next_start(ns, "location")?;
        let location = self.parse_double_list()?;
        self.xml.next_start(ns, "refDirection")?;

        let mut ref_directions: Vec<Vec<f64>> = Vec::new();
        while self.xml.is_start() && self.xml.is_element(ns, "refDirection") {
            let direction = self.parse_double_list()?;
            if let Some(first) = ref_directions.first() {
                if first.len() != direction.len() {
                    return Err(GmlError::format(
                        "AffinePlacement",
                        "inconsistent dimensions of gml:refDirection positions",
                    ));
                }
            }
            ref_directions.push(direction);
            self.xml.next_tag()?;
        }
        let direction_dim = ref_directions.first().map(Vec::len).unwrap_or(0);

        self.xml.require_start(ns, "inDimension")?;
        let in_dimension = self.xml.element_text_as_usize()?;
        if in_dimension != ref_directions.len() {
            return Err(GmlError::format(
                "AffinePlacement",
                format!(
                    "inDimension ({}) does not match the number of gml:refDirection elements ({})",
                    in_dimension,
                    ref_directions.len()
                ),
            ));
        }
        self.xml.next_start(ns, "outDimension")?;
        let out_dimension = self.xml.element_text_as_usize()?;
        if out_dimension != direction_dim {
            return Err(GmlError::format(
                "AffinePlacement",
                format!(
                    "outDimension ({}) does not match the dimension of gml:refDirection ({})",
                    out_dimension, direction_dim
                ),
            ));
        }
        self.xml.next_tag()?;
        self.xml.require_end(ns, "AffinePlacement")?;
        Ok(AffinePlacement {
            location,
            ref_directions,
            in_dimension,
            out_dimension,
        })
    }

    fn parse_offset_curve(&mut self, crs: Option<&Crs>) -> Result<CurveSegment> {
        let ns = self.ns;
        self.xml.next_start(ns, "offsetBase")?;
        let base = self.parse_member(crs, Self::parse_curve)?;
        self.xml.next_start(ns, "distance")?;
        let distance = self.parse_length()?;
        self.xml.next_tag()?;
        let mut direction = None;
        if self.xml.is_start() {
            self.xml.require_start(ns, "refDirection")?;
            direction = Some(self.parse_double_list()?);
            self.xml.next_tag()?;
        }
        self.xml.require_end(ns, "OffsetCurve")?;
        Ok(CurveSegment::OffsetCurve {
            base,
            distance,
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GmlError;
    use crate::geometry::{CurveSegment, Measure};
    use crate::reader::GeometryReader;
    use crate::registry::IdContext;
    use crate::version::GmlVersion;
    use crate::xml::XmlStream;

    fn segment(body: &str) -> Result<CurveSegment, GmlError> {
        let xml = body.replacen('>', r#" xmlns:gml="http://www.opengis.net/gml">"#, 1);
        let mut stream = XmlStream::from_str(&xml);
        stream.next_tag().unwrap();
        let mut ctx = IdContext::new();
        let mut reader = GeometryReader::new(&mut stream, &mut ctx, GmlVersion::Gml31);
        reader.parse_curve_segment(None)
    }

    #[test]
    fn test_arc_needs_three_points() {
        let ok = segment(r#"<gml:Arc interpolation="circularArc3Points"><gml:posList>0 0 1 1 2 0</gml:posList></gml:Arc>"#);
        assert!(matches!(ok, Ok(CurveSegment::Arc { ref points }) if points.len() == 3));
        let bad = segment(r#"<gml:Arc><gml:posList>0 0 1 1</gml:posList></gml:Arc>"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_degree_overflow_rejected() {
        let bezier = r#"<gml:Bezier><gml:posList>0 0 1 1</gml:posList><gml:degree>4294967296</gml:degree>
            <gml:knot><gml:Knot><gml:value>0</gml:value><gml:multiplicity>2</gml:multiplicity><gml:weight>1</gml:weight></gml:Knot></gml:knot>
            <gml:knot><gml:Knot><gml:value>1</gml:value><gml:multiplicity>2</gml:multiplicity><gml:weight>1</gml:weight></gml:Knot></gml:knot>
            </gml:Bezier>"#;
        match segment(bezier) {
            Err(GmlError::Format { element, .. }) => assert_eq!(element, "degree"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_wrong_interpolation_rejected() {
        let bad = segment(r#"<gml:Arc interpolation="linear"><gml:posList>0 0 1 1 2 0</gml:posList></gml:Arc>"#);
        assert!(bad.unwrap_err().to_string().contains("circularArc3Points"));
    }

    #[test]
    fn test_circle_by_center_point_angles() {
        let differ = segment(
            r#"<gml:CircleByCenterPoint><gml:pos>0 0</gml:pos><gml:radius uom="m">5</gml:radius><gml:startAngle uom="deg">10</gml:startAngle><gml:endAngle uom="deg">20</gml:endAngle></gml:CircleByCenterPoint>"#,
        );
        assert!(differ.is_err());

        let end_only = segment(
            r#"<gml:CircleByCenterPoint><gml:pos>0 0</gml:pos><gml:radius uom="m">5</gml:radius><gml:endAngle uom="deg">20</gml:endAngle></gml:CircleByCenterPoint>"#,
        )
        .unwrap();
        match end_only {
            CurveSegment::CircleByCenterPoint { start_angle, radius, .. } => {
                assert_eq!(start_angle, Some(Measure::new(20.0, "deg")));
                assert_eq!(radius, Measure::new(5.0, "m"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_arc_by_center_point_keeps_both_angles() {
        let arc = segment(
            r#"<gml:ArcByCenterPoint><gml:pos>0 0</gml:pos><gml:radius uom="m">5</gml:radius><gml:startAngle uom="deg">10</gml:startAngle><gml:endAngle uom="deg">20</gml:endAngle></gml:ArcByCenterPoint>"#,
        )
        .unwrap();
        match arc {
            CurveSegment::ArcByCenterPoint { start_angle, end_angle, .. } => {
                assert_eq!(start_angle.unwrap().value, 10.0);
                assert_eq!(end_angle.unwrap().value, 20.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_arc_string_by_bulge_counts() {
        let ok = segment(
            r#"<gml:ArcStringByBulge><gml:posList>0 0 1 0 2 0</gml:posList><gml:bulge>0.5</gml:bulge><gml:bulge>0.25</gml:bulge><gml:normal>0 0 1</gml:normal><gml:normal>0 0 1</gml:normal></gml:ArcStringByBulge>"#,
        );
        assert!(ok.is_ok());
        let bad = segment(
            r#"<gml:ArcStringByBulge><gml:posList>0 0 1 0 2 0</gml:posList><gml:bulge>0.5</gml:bulge><gml:normal>0 0 1</gml:normal></gml:ArcStringByBulge>"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_bezier_and_bspline_knots() {
        let knot = "<gml:knot><gml:Knot><gml:value>0</gml:value><gml:multiplicity>1</gml:multiplicity><gml:weight>1</gml:weight></gml:Knot></gml:knot>";
        let bezier = segment(&format!(
            "<gml:Bezier><gml:posList>0 0 1 1 2 0</gml:posList><gml:degree>2</gml:degree>{}{}</gml:Bezier>",
            knot, knot
        ));
        assert!(bezier.is_ok());
        let bezier = segment(&format!(
            "<gml:Bezier><gml:posList>0 0 1 1 2 0</gml:posList><gml:degree>2</gml:degree>{}</gml:Bezier>",
            knot
        ));
        assert!(bezier.is_err());

        let spline = segment(&format!(
            "<gml:BSpline interpolation=\"rationalSpline\" knotType=\"uniform\"><gml:posList>0 0 1 1 2 0</gml:posList><gml:degree>2</gml:degree>{}{}{}</gml:BSpline>",
            knot, knot, knot
        ))
        .unwrap();
        match spline {
            CurveSegment::BSpline { polynomial, knots, .. } => {
                assert!(!polynomial);
                assert_eq!(knots.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_clothoid_placement_cross_checks() {
        let clothoid = |in_dim: usize, out_dim: usize| {
            segment(&format!(
                "<gml:Clothoid><gml:refLocation><gml:AffinePlacement><gml:location>0 0</gml:location><gml:refDirection>1 0</gml:refDirection><gml:refDirection>0 1</gml:refDirection><gml:inDimension>{}</gml:inDimension><gml:outDimension>{}</gml:outDimension></gml:AffinePlacement></gml:refLocation><gml:scaleFactor>1</gml:scaleFactor><gml:startParameter>0</gml:startParameter><gml:endParameter>10</gml:endParameter></gml:Clothoid>",
                in_dim, out_dim
            ))
        };
        assert!(clothoid(2, 2).is_ok());
        assert!(clothoid(1, 2).is_err());
        assert!(clothoid(2, 3).is_err());
    }

    #[test]
    fn test_geodesic_rejects_coordinates() {
        let ok = segment("<gml:Geodesic><gml:pos>0 0</gml:pos><gml:pos>1 1</gml:pos></gml:Geodesic>");
        assert!(ok.is_ok());
        let bad = segment("<gml:Geodesic><gml:coordinates>0,0 1,1</gml:coordinates></gml:Geodesic>");
        assert!(bad.is_err());
    }

    #[test]
    fn test_unknown_segment() {
        let err = segment("<gml:Spiral></gml:Spiral>").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Spiral") && message.contains("_CurveSegment"), "{}", message);
    }
}
