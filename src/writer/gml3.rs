//! GML 3.0 / 3.1 / 3.2 encoding.

use std::io::Write;

use crate::crs::Crs;
use crate::error::{GmlError, Result};
use crate::geometry::{
    Aggregate, AffinePlacement, CompositeGeometry, Curve, CurveSegment, Envelope, Geometry, GeometryKind,
    GriddedPatch, Knot, LineString, Measure, Member, Point, Points, Polygon, PolygonPatch, Ring, Solid, Surface,
    SurfacePatch, Tin,
};
use crate::version::GmlVersion;

use super::GeometryWriter;

type WriteFn<'a, W, T> = fn(&mut GeometryWriter<'a, W>, &T) -> Result<()>;

impl<'a, W: Write> GeometryWriter<'a, W> {
    pub(crate) fn write_gml3_geometry(&mut self, geometry: &Geometry) -> Result<()> {
        let gml32 = self.options.version == GmlVersion::Gml32;
        match geometry {
            Geometry::Point(point) => self.write_point(point),
            Geometry::Curve(curve) => self.write_curve(curve),
            Geometry::Surface(surface) => self.write_surface(surface),
            Geometry::Solid(solid) => self.write_solid(solid),
            Geometry::Envelope(envelope) => self.write_envelope(envelope),
            Geometry::MultiPoint(multi) => self.write_aggregate("MultiPoint", "pointMember", multi, Self::write_point),
            Geometry::MultiCurve(multi) => self.write_aggregate("MultiCurve", "curveMember", multi, Self::write_curve),
            // MultiLineString and MultiPolygon are gone from GML 3.2
            Geometry::MultiLineString(multi) if gml32 => {
                self.write_aggregate("MultiCurve", "curveMember", multi, |w, l| w.write_line_string(l))
            }
            Geometry::MultiLineString(multi) => {
                self.write_aggregate("MultiLineString", "lineStringMember", multi, |w, l| w.write_line_string(l))
            }
            Geometry::MultiSurface(multi) => {
                self.write_aggregate("MultiSurface", "surfaceMember", multi, Self::write_surface)
            }
            Geometry::MultiPolygon(multi) if gml32 => {
                self.write_aggregate("MultiSurface", "surfaceMember", multi, |w, p| w.write_polygon(p))
            }
            Geometry::MultiPolygon(multi) => {
                self.write_aggregate("MultiPolygon", "polygonMember", multi, |w, p| w.write_polygon(p))
            }
            Geometry::MultiSolid(multi) => self.write_aggregate("MultiSolid", "solidMember", multi, Self::write_solid),
            Geometry::MultiGeometry(multi) => {
                self.write_aggregate("MultiGeometry", "geometryMember", multi, Self::write_gml3_geometry)
            }
            Geometry::Composite(complex) => self.write_geometric_complex(complex),
            Geometry::Reference(reference) => {
                let target = reference.target()?;
                self.write_gml3_geometry(target)
            }
        }
    }

    fn write_point(&mut self, point: &Point) -> Result<()> {
        let previous = self.begin_object("Point", point.id.as_ref(), point.crs.as_ref())?;
        let text = self.format_position(point.crs.as_ref(), &point.coords)?;
        self.text_element("pos", &text)?;
        self.end_object(previous)
    }

    /// `posList` (3.1, 3.2) when every point is an anonymous inline position,
    /// otherwise a run of `pos` and `pointProperty`.
    fn write_points(&mut self, points: &Points, crs: Option<&Crs>) -> Result<()> {
        let simple = self.options.simple_features;
        let anonymous = |member: &Member<Point>| matches!(member, Member::Inline(p) if p.id.is_none() || simple);
        if self.options.version != GmlVersion::Gml30 && points.iter().all(anonymous) {
            let dimension = points.dimension();
            let mut text = String::new();
            for member in points.iter() {
                if let Member::Inline(point) = member {
                    if point.coords.len() != dimension {
                        return Err(GmlError::format(
                            "posList",
                            format!("position has {} ordinates, expected {}", point.coords.len(), dimension),
                        ));
                    }
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    self.append_position(&mut text, point.crs.as_ref().or(crs), &point.coords, ' ')?;
                }
            }
            self.start("posList")?;
            self.sink.attribute("srsDimension", &dimension.to_string())?;
            self.sink.text(&text)?;
            return self.end();
        }

        for member in points.iter() {
            match member {
                Member::Inline(point) if anonymous(member) => {
                    let text = self.format_position(point.crs.as_ref().or(crs), &point.coords)?;
                    self.text_element("pos", &text)?;
                }
                _ => self.write_member("pointProperty", member, Self::write_point)?,
            }
        }
        Ok(())
    }

    fn write_curve(&mut self, curve: &Curve) -> Result<()> {
        match curve {
            Curve::LineString(line) => self.write_line_string(line),
            Curve::Segmented(curve) => {
                let previous = self.begin_object("Curve", curve.id.as_ref(), curve.crs.as_ref())?;
                self.start("segments")?;
                for segment in &curve.segments {
                    self.write_segment(segment, curve.crs.as_ref())?;
                }
                self.end()?;
                self.end_object(previous)
            }
            Curve::Orientable(curve) => {
                let previous = self.begin_object("OrientableCurve", curve.id.as_ref(), curve.crs.as_ref())?;
                self.sink.attribute("orientation", curve.orientation.as_sign())?;
                self.write_member("baseCurve", &curve.base, Self::write_curve)?;
                self.end_object(previous)
            }
            Curve::Composite(curve) => {
                let previous = self.begin_object("CompositeCurve", curve.id.as_ref(), curve.crs.as_ref())?;
                for member in &curve.members {
                    self.write_member("curveMember", member, Self::write_curve)?;
                }
                self.end_object(previous)
            }
            Curve::Ring(ring) => self.write_ring(ring),
        }
    }

    fn write_line_string(&mut self, line: &LineString) -> Result<()> {
        let previous = self.begin_object("LineString", line.id.as_ref(), line.crs.as_ref())?;
        self.write_points(&line.points, line.crs.as_ref())?;
        self.end_object(previous)
    }

    fn write_ring(&mut self, ring: &Ring) -> Result<()> {
        match ring {
            Ring::Linear(ring) => {
                let previous = self.begin_object("LinearRing", ring.id.as_ref(), ring.crs.as_ref())?;
                self.write_points(&ring.points, ring.crs.as_ref())?;
                self.end_object(previous)
            }
            Ring::Curves(ring) => {
                let previous = self.begin_object("Ring", ring.id.as_ref(), ring.crs.as_ref())?;
                for member in &ring.members {
                    self.write_member("curveMember", member, Self::write_curve)?;
                }
                self.end_object(previous)
            }
        }
    }

    fn write_surface(&mut self, surface: &Surface) -> Result<()> {
        match surface {
            Surface::Polygon(polygon) => self.write_polygon(polygon),
            Surface::Patches(surface) => {
                let previous = self.begin_object("Surface", surface.id.as_ref(), surface.crs.as_ref())?;
                self.start("patches")?;
                for patch in &surface.patches {
                    self.write_patch(patch, surface.crs.as_ref())?;
                }
                self.end()?;
                self.end_object(previous)
            }
            Surface::PolyhedralSurface(surface) => {
                let previous = self.begin_object("PolyhedralSurface", surface.id.as_ref(), surface.crs.as_ref())?;
                self.start("polygonPatches")?;
                for patch in &surface.patches {
                    self.write_polygon_patch(patch)?;
                }
                self.end()?;
                self.end_object(previous)
            }
            Surface::TriangulatedSurface(surface) => {
                let previous = self.begin_object("TriangulatedSurface", surface.id.as_ref(), surface.crs.as_ref())?;
                self.start("trianglePatches")?;
                for triangle in &surface.patches {
                    self.write_ring_patch("Triangle", &triangle.exterior)?;
                }
                self.end()?;
                self.end_object(previous)
            }
            Surface::Tin(tin) => self.write_tin(tin),
            Surface::Composite(surface) => {
                let previous = self.begin_object("CompositeSurface", surface.id.as_ref(), surface.crs.as_ref())?;
                for member in &surface.members {
                    self.write_member("surfaceMember", member, Self::write_surface)?;
                }
                self.end_object(previous)
            }
            Surface::Orientable(surface) => {
                let previous = self.begin_object("OrientableSurface", surface.id.as_ref(), surface.crs.as_ref())?;
                self.sink.attribute("orientation", surface.orientation.as_sign())?;
                self.write_member("baseSurface", &surface.base, Self::write_surface)?;
                self.end_object(previous)
            }
        }
    }

    fn write_polygon(&mut self, polygon: &Polygon) -> Result<()> {
        let previous = self.begin_object("Polygon", polygon.id.as_ref(), polygon.crs.as_ref())?;
        if let Some(exterior) = &polygon.exterior {
            self.write_member("exterior", exterior, Self::write_ring)?;
        }
        for interior in &polygon.interiors {
            self.write_member("interior", interior, Self::write_ring)?;
        }
        self.end_object(previous)
    }

    fn write_patch(&mut self, patch: &SurfacePatch, crs: Option<&Crs>) -> Result<()> {
        match patch {
            SurfacePatch::Polygon(patch) => self.write_polygon_patch(patch),
            SurfacePatch::Rectangle(rectangle) => self.write_ring_patch("Rectangle", &rectangle.exterior),
            SurfacePatch::Triangle(triangle) => self.write_ring_patch("Triangle", &triangle.exterior),
            SurfacePatch::Gridded(grid) => self.write_gridded_patch(grid, crs),
        }
    }

    fn write_polygon_patch(&mut self, patch: &PolygonPatch) -> Result<()> {
        self.start("PolygonPatch")?;
        self.sink.attribute("interpolation", "planar")?;
        if let Some(exterior) = &patch.exterior {
            self.write_member("exterior", exterior, Self::write_ring)?;
        }
        for interior in &patch.interiors {
            self.write_member("interior", interior, Self::write_ring)?;
        }
        self.end()
    }

    fn write_ring_patch(&mut self, element: &str, exterior: &Member<Ring>) -> Result<()> {
        self.start(element)?;
        self.sink.attribute("interpolation", "planar")?;
        self.write_member("exterior", exterior, Self::write_ring)?;
        self.end()
    }

    fn write_gridded_patch(&mut self, grid: &GriddedPatch, crs: Option<&Crs>) -> Result<()> {
        self.start(grid.kind.name())?;
        for row in &grid.rows {
            self.start("row")?;
            self.write_points(row, crs)?;
            self.end()?;
        }
        if !grid.rows.is_empty() {
            self.text_element("rows", &grid.row_count().to_string())?;
            self.text_element("columns", &grid.column_count().to_string())?;
        }
        self.end()
    }

    fn write_tin(&mut self, tin: &Tin) -> Result<()> {
        let crs = tin.crs.as_ref();
        let previous = self.begin_object("Tin", tin.id.as_ref(), crs)?;
        self.start("trianglePatches")?;
        for triangle in &tin.patches {
            self.write_ring_patch("Triangle", &triangle.exterior)?;
        }
        self.end()?;
        for (element, lines) in [("stopLines", &tin.stop_lines), ("breakLines", &tin.break_lines)] {
            for line in lines {
                self.start(element)?;
                for segment in line {
                    self.write_segment(segment, crs)?;
                }
                self.end()?;
            }
        }
        self.write_measure("maxLength", &tin.max_length)?;
        self.start("controlPoint")?;
        self.write_points(&tin.control_points, crs)?;
        self.end()?;
        self.end_object(previous)
    }

    fn write_solid(&mut self, solid: &Solid) -> Result<()> {
        match solid {
            Solid::Solid(body) => {
                let previous = self.begin_object("Solid", body.id.as_ref(), body.crs.as_ref())?;
                if let Some(exterior) = &body.exterior {
                    self.write_member("exterior", exterior, Self::write_surface)?;
                }
                for interior in &body.interiors {
                    self.write_member("interior", interior, Self::write_surface)?;
                }
                self.end_object(previous)
            }
            Solid::Composite(composite) => {
                let previous = self.begin_object("CompositeSolid", composite.id.as_ref(), composite.crs.as_ref())?;
                for member in &composite.members {
                    self.write_member("solidMember", member, Self::write_solid)?;
                }
                self.end_object(previous)
            }
        }
    }

    /// GML 3.0 has no `lowerCorner`/`upperCorner`; its corners are two `pos`.
    fn write_envelope(&mut self, envelope: &Envelope) -> Result<()> {
        let crs = envelope.crs.as_ref();
        let previous = self.begin_object("Envelope", None, crs)?;
        let (lower, upper) = if self.options.version == GmlVersion::Gml30 {
            ("pos", "pos")
        } else {
            ("lowerCorner", "upperCorner")
        };
        let min = self.format_position(crs, &envelope.min)?;
        self.text_element(lower, &min)?;
        let max = self.format_position(crs, &envelope.max)?;
        self.text_element(upper, &max)?;
        self.end_object(previous)
    }

    fn write_geometric_complex(&mut self, complex: &CompositeGeometry) -> Result<()> {
        let previous = self.begin_object("GeometricComplex", complex.id.as_ref(), complex.crs.as_ref())?;
        for member in &complex.members {
            self.write_member("element", member, Self::write_gml3_geometry)?;
        }
        self.end_object(previous)
    }

    fn write_aggregate<T: GeometryKind>(
        &mut self,
        element: &str,
        property: &str,
        aggregate: &Aggregate<T>,
        write: WriteFn<'a, W, T>,
    ) -> Result<()> {
        let previous = self.begin_object(element, aggregate.id.as_ref(), aggregate.crs.as_ref())?;
        for member in &aggregate.members {
            self.write_member(property, member, write)?;
        }
        self.end_object(previous)
    }

    fn write_measure(&mut self, element: &str, measure: &Measure) -> Result<()> {
        self.start(element)?;
        self.sink.attribute("uom", &measure.uom)?;
        self.sink.text(&measure.value.to_string())?;
        self.end()
    }

    fn write_segment(&mut self, segment: &CurveSegment, crs: Option<&Crs>) -> Result<()> {
        self.start(segment.kind_name())?;
        let interpolation = segment.interpolation();
        if !interpolation.is_empty() {
            self.sink.attribute("interpolation", interpolation)?;
        }
        match segment {
            CurveSegment::Arc { points }
            | CurveSegment::ArcString { points }
            | CurveSegment::Circle { points }
            | CurveSegment::Geodesic { points }
            | CurveSegment::GeodesicString { points }
            | CurveSegment::LineStringSegment { points } => self.write_points(points, crs)?,
            CurveSegment::ArcByBulge { points, bulge, normal } => {
                self.write_points(points, crs)?;
                self.text_element("bulge", &bulge.to_string())?;
                let normal = self.format_vector(normal);
                self.text_element("normal", &normal)?;
            }
            CurveSegment::ArcStringByBulge { points, bulges, normals } => {
                self.write_points(points, crs)?;
                for bulge in bulges {
                    self.text_element("bulge", &bulge.to_string())?;
                }
                for normal in normals {
                    let normal = self.format_vector(normal);
                    self.text_element("normal", &normal)?;
                }
            }
            CurveSegment::ArcByCenterPoint {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                self.write_points(&Points(vec![center.clone()]), crs)?;
                self.write_measure("radius", radius)?;
                if let Some(angle) = start_angle {
                    self.write_measure("startAngle", angle)?;
                }
                if let Some(angle) = end_angle {
                    self.write_measure("endAngle", angle)?;
                }
            }
            CurveSegment::CircleByCenterPoint {
                center,
                radius,
                start_angle,
            } => {
                self.write_points(&Points(vec![center.clone()]), crs)?;
                self.write_measure("radius", radius)?;
                if let Some(angle) = start_angle {
                    self.write_measure("startAngle", angle)?;
                }
            }
            CurveSegment::Bezier { points, degree, knots } => {
                self.write_points(points, crs)?;
                self.write_knots(*degree, knots)?;
            }
            CurveSegment::BSpline {
                points,
                degree,
                knots,
                knot_type,
                ..
            } => {
                if let Some(knot_type) = knot_type {
                    self.sink.attribute("knotType", knot_type.as_str())?;
                }
                self.write_points(points, crs)?;
                self.write_knots(*degree, knots)?;
            }
            CurveSegment::CubicSpline {
                points,
                vector_at_start,
                vector_at_end,
            } => {
                self.write_points(points, crs)?;
                let start = self.format_vector(vector_at_start);
                self.text_element("vectorAtStart", &start)?;
                let end = self.format_vector(vector_at_end);
                self.text_element("vectorAtEnd", &end)?;
            }
            CurveSegment::Clothoid {
                placement,
                scale_factor,
                start_parameter,
                end_parameter,
            } => {
                self.start("refLocation")?;
                self.write_affine_placement(placement, crs)?;
                self.end()?;
                self.text_element("scaleFactor", &scale_factor.to_string())?;
                self.text_element("startParameter", &start_parameter.to_string())?;
                self.text_element("endParameter", &end_parameter.to_string())?;
            }
            CurveSegment::OffsetCurve {
                base,
                distance,
                direction,
            } => {
                self.write_member("offsetBase", base, Self::write_curve)?;
                self.write_measure("distance", distance)?;
                if let Some(direction) = direction {
                    let direction = self.format_vector(direction);
                    self.text_element("refDirection", &direction)?;
                }
            }
        }
        self.end()
    }

    fn write_knots(&mut self, degree: u32, knots: &[Knot]) -> Result<()> {
        self.text_element("degree", &degree.to_string())?;
        for knot in knots {
            self.start("knot")?;
            self.start("Knot")?;
            self.text_element("value", &knot.value.to_string())?;
            self.text_element("multiplicity", &knot.multiplicity.to_string())?;
            self.text_element("weight", &knot.weight.to_string())?;
            self.end()?;
            self.end()?;
        }
        Ok(())
    }

    fn write_affine_placement(&mut self, placement: &AffinePlacement, crs: Option<&Crs>) -> Result<()> {
        self.start("AffinePlacement")?;
        let location = self.format_position(crs, &placement.location)?;
        self.text_element("location", &location)?;
        for direction in &placement.ref_directions {
            let direction = self.format_vector(direction);
            self.text_element("refDirection", &direction)?;
        }
        self.text_element("inDimension", &placement.in_dimension.to_string())?;
        self.text_element("outDimension", &placement.out_dimension.to_string())?;
        self.end()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::crs::Crs;
    use crate::geometry::{Curve, CurveSegment, Geometry, LineString, Measure, Member, Point, Points, SegmentedCurve};
    use crate::version::GmlVersion;
    use crate::writer::{write_geometry_to_string, WriterOptions};

    fn line(crs: Option<Crs>) -> Geometry {
        let points = Points::from_coords(vec![vec![0.0, 0.0], vec![10.0, 0.0], vec![10.0, 10.0]], crs.as_ref());
        Geometry::Curve(Curve::LineString(Arc::new(LineString {
            id: None,
            crs,
            points,
        })))
    }

    #[test]
    fn test_pos_list_with_dimension() {
        let xml = write_geometry_to_string(&line(Some(Crs::new("EPSG:4326"))), &WriterOptions::default()).unwrap();
        assert!(xml.contains(r#"srsName="EPSG:4326""#));
        assert!(xml.contains(
            r#"<gml:posList srsDimension="2">0.00000 0.00000 10.00000 0.00000 10.00000 10.00000</gml:posList>"#
        ));
    }

    #[test]
    fn test_mixed_dimension_points_rejected() {
        let line = Geometry::Curve(Curve::LineString(Arc::new(LineString {
            id: None,
            crs: None,
            points: Points::from_coords(vec![vec![0.0, 0.0], vec![1.0, 1.0, 1.0]], None),
        })));
        let err = write_geometry_to_string(&line, &WriterOptions::default()).unwrap_err();
        assert!(matches!(err, crate::error::GmlError::Format { ref element, .. } if element == "posList"), "{:?}", err);
    }

    #[test]
    fn test_gml30_writes_pos_runs() {
        let xml = write_geometry_to_string(&line(None), &WriterOptions::new(GmlVersion::Gml30)).unwrap();
        assert!(!xml.contains("posList"));
        assert_eq!(xml.matches("<gml:pos>").count(), 3);
    }

    #[test]
    fn test_gml32_namespace() {
        let xml = write_geometry_to_string(&line(None), &WriterOptions::new(GmlVersion::Gml32)).unwrap();
        assert!(xml.starts_with(r#"<gml:LineString xmlns:gml="http://www.opengis.net/gml/3.2""#));
    }

    #[test]
    fn test_center_point_segment() {
        let segment = CurveSegment::CircleByCenterPoint {
            center: Member::Inline(Point::new(vec![1.0, 2.0])),
            radius: Measure::new(5.0, "m"),
            start_angle: Some(Measure::new(90.0, "deg")),
        };
        let curve = Geometry::Curve(Curve::Segmented(Arc::new(SegmentedCurve {
            id: None,
            crs: None,
            segments: vec![segment],
        })));
        let xml = write_geometry_to_string(&curve, &WriterOptions::default()).unwrap();
        assert!(xml.contains(r#"<gml:CircleByCenterPoint interpolation="circularArcCenterPointWithRadius">"#));
        assert!(xml.contains(r#"<gml:radius uom="m">5</gml:radius>"#));
        assert!(xml.contains(r#"<gml:startAngle uom="deg">90</gml:startAngle>"#));
    }
}
