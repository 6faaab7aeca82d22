//! GML 2.1 geometries: flat `coordinates`/`coord` syntax, `gid` identifiers.

use std::io::BufRead;
use std::sync::Arc;

use tracing::debug;

use crate::crs::Crs;
use crate::error::{GmlError, Result};
use crate::geometry::{
    Aggregate, Envelope, Geometry, GeometryKind, LineString, LinearRing, Point, Points, Polygon, Ring,
};

use super::primitives::require_dimension;
use super::GeometryReader;

type Gml2ParseFn<'a, R, T> = fn(&mut GeometryReader<'a, R>, Option<&Crs>) -> Result<T>;

impl<'a, R: BufRead> GeometryReader<'a, R> {
    pub fn parse_gml2_geometry(&mut self, crs: Option<&Crs>) -> Result<Geometry> {
        self.require_gml_start("gml:_Geometry")?;
        let name = self.xml.local_name().to_string();
        debug!(element = name.as_str(), "parsing GML2 geometry");
        let geometry = match name.as_str() {
            "Point" => Geometry::Point(self.parse_gml2_point(crs)?),
            "LineString" => self.parse_gml2_line_string(crs)?.into_geometry(),
            "LinearRing" => self.parse_gml2_linear_ring(crs)?.into_geometry(),
            "Polygon" => self.parse_gml2_polygon(crs)?.into_geometry(),
            "Box" => self.parse_box(crs)?,
            "MultiPoint" => {
                let agg = self.parse_gml2_aggregate(crs, "MultiPoint", "pointMember", Self::parse_gml2_point)?;
                self.register(Geometry::MultiPoint(Arc::new(agg)))?
            }
            "MultiLineString" => {
                let agg =
                    self.parse_gml2_aggregate(crs, "MultiLineString", "lineStringMember", Self::parse_gml2_line_string)?;
                self.register(Geometry::MultiLineString(Arc::new(agg)))?
            }
            "MultiPolygon" => {
                let agg = self.parse_gml2_aggregate(crs, "MultiPolygon", "polygonMember", Self::parse_gml2_polygon)?;
                self.register(Geometry::MultiPolygon(Arc::new(agg)))?
            }
            "MultiGeometry" => {
                let agg =
                    self.parse_gml2_aggregate(crs, "MultiGeometry", "geometryMember", Self::parse_gml2_geometry)?;
                self.register(Geometry::MultiGeometry(Arc::new(agg)))?
            }
            _ => return Err(self.unexpected("gml:_Geometry")),
        };
        Ok(geometry)
    }

    pub fn parse_gml2_point(&mut self, crs: Option<&Crs>) -> Result<Point> {
        let ns = self.ns;
        self.xml.require_start(ns, "Point")?;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.xml.next_tag()?;
        let mut tuples = self.parse_gml2_coordinates("Point")?;
        if tuples.len() != 1 {
            return Err(GmlError::format(
                "Point",
                format!("expected exactly one coordinate tuple, found {}", tuples.len()),
            ));
        }
        self.xml.require_end(ns, "Point")?;
        let coords = tuples.remove(0);
        self.register(Point { id, crs, coords })
    }

    pub fn parse_gml2_line_string(&mut self, crs: Option<&Crs>) -> Result<Arc<LineString>> {
        let ns = self.ns;
        self.xml.require_start(ns, "LineString")?;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.xml.next_tag()?;
        let tuples = self.parse_gml2_coordinates("LineString")?;
        if tuples.len() < 2 {
            return Err(GmlError::format(
                "LineString",
                format!("must contain at least two points, found {}", tuples.len()),
            ));
        }
        self.xml.require_end(ns, "LineString")?;
        let points = Points::from_coords(tuples, crs.as_ref());
        self.register(Arc::new(LineString { id, crs, points }))
    }

    pub fn parse_gml2_linear_ring(&mut self, crs: Option<&Crs>) -> Result<Ring> {
        let ns = self.ns;
        self.xml.require_start(ns, "LinearRing")?;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.xml.next_tag()?;
        let tuples = self.parse_gml2_coordinates("LinearRing")?;
        if tuples.len() < 4 {
            return Err(GmlError::format(
                "LinearRing",
                format!("must contain at least four points, found {}", tuples.len()),
            ));
        }
        self.xml.require_end(ns, "LinearRing")?;
        let points = Points::from_coords(tuples, crs.as_ref());
        self.register(Ring::Linear(Arc::new(LinearRing { id, crs, points })))
    }

    pub fn parse_gml2_polygon(&mut self, crs: Option<&Crs>) -> Result<Arc<Polygon>> {
        let ns = self.ns;
        self.xml.require_start(ns, "Polygon")?;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.xml.next_tag()?;

        let mut exterior = None;
        if self.xml.is_start() && self.xml.is_element(ns, "outerBoundaryIs") {
            exterior = Some(self.parse_member(crs.as_ref(), Self::parse_gml2_linear_ring)?);
            self.xml.next_tag()?;
        }
        let mut interiors = Vec::new();
        while self.xml.is_start() && self.xml.is_element(ns, "innerBoundaryIs") {
            interiors.push(self.parse_member(crs.as_ref(), Self::parse_gml2_linear_ring)?);
            self.xml.next_tag()?;
        }
        if self.xml.is_start() && self.xml.is_element(ns, "outerBoundaryIs") {
            return Err(GmlError::format("Polygon", "gml:outerBoundaryIs may appear at most once"));
        }
        self.xml.require_end(ns, "Polygon")?;

        self.register(Arc::new(Polygon {
            id,
            crs,
            exterior,
            interiors,
        }))
    }

    /// `gml:Box`, read as an envelope.
    fn parse_box(&mut self, crs: Option<&Crs>) -> Result<Geometry> {
        let ns = self.ns;
        self.xml.require_start(ns, "Box")?;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.xml.next_tag()?;
        let mut tuples = self.parse_gml2_coordinates("Box")?;
        if tuples.len() != 2 {
            return Err(GmlError::format(
                "Box",
                format!("expected exactly two points, found {}", tuples.len()),
            ));
        }
        self.xml.require_end(ns, "Box")?;
        let max = tuples.remove(1);
        let min = tuples.remove(0);
        if min.len() != max.len() {
            return Err(GmlError::format("Box", "corners have different dimensions"));
        }
        self.register(Geometry::Envelope(Arc::new(Envelope { id, crs, min, max })))
    }

    /// Either one `coordinates` element or a run of `coord`s. Leaves the cursor
    /// on the first tag after them.
    fn parse_gml2_coordinates(&mut self, element: &str) -> Result<Vec<Vec<f64>>> {
        let ns = self.ns;
        if self.xml.is_start() && self.xml.is_element(ns, "coordinates") {
            let tuples = self.parse_coordinates()?;
            self.xml.next_tag()?;
            return Ok(tuples);
        }
        let mut tuples = Vec::new();
        let mut dim = None;
        while self.xml.is_start() && self.xml.is_element(ns, "coord") {
            let tuple = self.parse_coord_type()?;
            require_dimension("coord", &mut dim, tuple.len())?;
            tuples.push(tuple);
            self.xml.next_tag()?;
        }
        if tuples.is_empty() && self.xml.is_start() {
            return Err(GmlError::format(
                element,
                format!("expected gml:coordinates or gml:coord, {}", self.xml.describe()),
            ));
        }
        Ok(tuples)
    }

    fn parse_gml2_aggregate<T: GeometryKind>(
        &mut self,
        crs: Option<&Crs>,
        element: &str,
        member: &str,
        parse: Gml2ParseFn<'a, R, T>,
    ) -> Result<Aggregate<T>> {
        let ns = self.ns;
        self.xml.require_start(ns, element)?;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.xml.next_tag()?;
        let mut members = Vec::new();
        while self.xml.is_start() {
            if !self.xml.is_element(ns, member) {
                return Err(self.unexpected(&format!("gml:{}", member)));
            }
            members.push(self.parse_member(crs.as_ref(), parse)?);
            self.xml.next_tag()?;
        }
        self.xml.require_end(ns, element)?;
        Ok(Aggregate { id, crs, members })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GmlError;
    use crate::geometry::{Curve, Geometry, Member, Ring, Surface};
    use crate::reader::read_geometry;
    use crate::version::GmlVersion;

    const GML: &str = r#"xmlns:gml="http://www.opengis.net/gml" xmlns:xlink="http://www.w3.org/1999/xlink""#;

    fn read(body: &str) -> crate::error::Result<Geometry> {
        let xml = body.replacen('>', &format!(" {}>", GML), 1);
        read_geometry(&xml, GmlVersion::Gml21).map(|(g, _)| g)
    }

    #[test]
    fn test_point_with_coord() {
        let point = read("<gml:Point gid=\"p1\"><gml:coord><gml:X>1</gml:X><gml:Y>2</gml:Y></gml:coord></gml:Point>")
            .unwrap();
        match point {
            Geometry::Point(p) => {
                assert_eq!(p.coords, vec![1.0, 2.0]);
                assert_eq!(p.id.unwrap().as_str(), "p1");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_point_needs_one_tuple() {
        let result = read("<gml:Point><gml:coordinates>1,2 3,4</gml:coordinates></gml:Point>");
        assert!(matches!(result, Err(GmlError::Format { .. })));
    }

    #[test]
    fn test_polygon_with_holes() {
        let polygon = read(
            "<gml:Polygon srsName=\"EPSG:4326\">\
             <gml:outerBoundaryIs><gml:LinearRing><gml:coordinates>0,0 10,0 10,10 0,0</gml:coordinates></gml:LinearRing></gml:outerBoundaryIs>\
             <gml:innerBoundaryIs><gml:LinearRing><gml:coordinates>1,1 2,1 2,2 1,1</gml:coordinates></gml:LinearRing></gml:innerBoundaryIs>\
             </gml:Polygon>",
        )
        .unwrap();
        match polygon {
            Geometry::Surface(Surface::Polygon(p)) => {
                assert_eq!(p.crs.as_ref().unwrap().name(), "EPSG:4326");
                assert_eq!(p.interiors.len(), 1);
                match p.exterior.as_ref().and_then(Member::as_inline) {
                    Some(Ring::Linear(ring)) => assert_eq!(ring.points.len(), 4),
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_short_ring_fails() {
        let result = read(
            "<gml:Polygon><gml:outerBoundaryIs><gml:LinearRing><gml:coordinates>0,0 1,0 0,0</gml:coordinates></gml:LinearRing></gml:outerBoundaryIs></gml:Polygon>",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_box_reads_as_envelope() {
        let envelope = read("<gml:Box><gml:coordinates>0,0 5,5</gml:coordinates></gml:Box>").unwrap();
        match envelope {
            Geometry::Envelope(e) => {
                assert_eq!(e.min, vec![0.0, 0.0]);
                assert_eq!(e.max, vec![5.0, 5.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_multi_line_string_with_reference() {
        let multi = read(
            "<gml:MultiGeometry>\
             <gml:geometryMember><gml:LineString gid=\"l1\"><gml:coordinates>0,0 1,1</gml:coordinates></gml:LineString></gml:geometryMember>\
             <gml:geometryMember><gml:MultiLineString><gml:lineStringMember xlink:href=\"#l1\"/></gml:MultiLineString></gml:geometryMember>\
             </gml:MultiGeometry>",
        )
        .unwrap();
        let Geometry::MultiGeometry(agg) = multi else {
            panic!("expected MultiGeometry");
        };
        assert_eq!(agg.members.len(), 2);
        let Some(Geometry::MultiLineString(lines)) = agg.members[1].as_inline() else {
            panic!("expected MultiLineString");
        };
        let line = lines.members[0].resolve().unwrap();
        assert_eq!(line.id.as_ref().unwrap().as_str(), "l1");
        assert!(matches!(agg.members[0].as_inline(), Some(Geometry::Curve(Curve::LineString(_)))));
    }

    #[test]
    fn test_wrong_member_type_fails() {
        let result = read(
            "<gml:MultiPoint><gml:pointMember><gml:LineString><gml:coordinates>0,0 1,1</gml:coordinates></gml:LineString></gml:pointMember></gml:MultiPoint>",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_gml3_only_element_rejected() {
        let result = read("<gml:Curve></gml:Curve>");
        match result {
            Err(GmlError::Format { element, .. }) => assert_eq!(element, "Curve"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_leading_digit_gid_fails() {
        let result = read("<gml:Point gid=\"1p\"><gml:coordinates>1,2</gml:coordinates></gml:Point>");
        assert!(matches!(result, Err(GmlError::InvalidIdentifier(_))));
    }
}
