//! GML 2.1 encoding: `coordinates`/`coord` syntax and `gid` identifiers.

use std::io::Write;

use crate::crs::Crs;
use crate::error::Result;
use crate::geometry::{Aggregate, Curve, Envelope, Geometry, GeometryKind, Point, Points, Polygon, Ring, Surface};

use super::{unsupported_version, GeometryWriter};

const ORDINATE_NAMES: [&str; 3] = ["X", "Y", "Z"];

impl<'a, W: Write> GeometryWriter<'a, W> {
    pub(crate) fn write_gml2_geometry(&mut self, geometry: &Geometry) -> Result<()> {
        match geometry {
            Geometry::Point(point) => self.write_gml2_point(point),
            Geometry::Curve(Curve::LineString(line)) => {
                let previous = self.begin_object("LineString", line.id.as_ref(), line.crs.as_ref())?;
                self.write_coordinates(&line.points, line.crs.as_ref())?;
                self.end_object(previous)
            }
            Geometry::Curve(Curve::Ring(ring)) => self.write_gml2_ring(ring),
            Geometry::Surface(Surface::Polygon(polygon)) => self.write_gml2_polygon(polygon),
            Geometry::Envelope(envelope) => self.write_box(envelope),
            Geometry::MultiPoint(multi) => {
                self.write_gml2_aggregate("MultiPoint", "pointMember", multi, Self::write_gml2_point)
            }
            Geometry::MultiLineString(multi) => {
                self.write_gml2_aggregate("MultiLineString", "lineStringMember", multi, |w, line| {
                    w.write_gml2_geometry(&line.clone().into_geometry())
                })
            }
            Geometry::MultiCurve(multi) => {
                self.write_gml2_aggregate("MultiLineString", "lineStringMember", multi, |w, curve| match curve {
                    Curve::LineString(_) => w.write_gml2_geometry(&Geometry::Curve(curve.clone())),
                    other => Err(unsupported_version(other.kind_name())),
                })
            }
            Geometry::MultiPolygon(multi) => {
                self.write_gml2_aggregate("MultiPolygon", "polygonMember", multi, |w, p| w.write_gml2_polygon(p))
            }
            Geometry::MultiSurface(multi) => {
                self.write_gml2_aggregate("MultiPolygon", "polygonMember", multi, |w, surface| match surface {
                    Surface::Polygon(polygon) => w.write_gml2_polygon(polygon),
                    other => Err(unsupported_version(other.kind_name())),
                })
            }
            Geometry::MultiGeometry(multi) => {
                self.write_gml2_aggregate("MultiGeometry", "geometryMember", multi, Self::write_gml2_geometry)
            }
            other => Err(unsupported_version(other.kind_name())),
        }
    }

    fn write_gml2_point(&mut self, point: &Point) -> Result<()> {
        let previous = self.begin_object("Point", point.id.as_ref(), point.crs.as_ref())?;
        self.write_coord(point.crs.as_ref(), &point.coords)?;
        self.end_object(previous)
    }

    fn write_gml2_ring(&mut self, ring: &Ring) -> Result<()> {
        match ring {
            Ring::Linear(ring) => {
                let previous = self.begin_object("LinearRing", ring.id.as_ref(), ring.crs.as_ref())?;
                self.write_coordinates(&ring.points, ring.crs.as_ref())?;
                self.end_object(previous)
            }
            Ring::Curves(_) => Err(unsupported_version("Ring")),
        }
    }

    fn write_gml2_polygon(&mut self, polygon: &Polygon) -> Result<()> {
        let previous = self.begin_object("Polygon", polygon.id.as_ref(), polygon.crs.as_ref())?;
        if let Some(exterior) = &polygon.exterior {
            self.write_member("outerBoundaryIs", exterior, Self::write_gml2_ring)?;
        }
        for interior in &polygon.interiors {
            self.write_member("innerBoundaryIs", interior, Self::write_gml2_ring)?;
        }
        self.end_object(previous)
    }

    fn write_box(&mut self, envelope: &Envelope) -> Result<()> {
        let crs = envelope.crs.as_ref();
        let previous = self.begin_object("Box", envelope.id.as_ref(), crs)?;
        let mut text = String::new();
        self.append_position(&mut text, crs, &envelope.min, ',')?;
        text.push(' ');
        self.append_position(&mut text, crs, &envelope.max, ',')?;
        self.coordinates_element(&text)?;
        self.end_object(previous)
    }

    fn write_gml2_aggregate<T: GeometryKind>(
        &mut self,
        element: &str,
        property: &str,
        aggregate: &Aggregate<T>,
        write: fn(&mut Self, &T) -> Result<()>,
    ) -> Result<()> {
        let previous = self.begin_object(element, aggregate.id.as_ref(), aggregate.crs.as_ref())?;
        for member in &aggregate.members {
            self.write_member(property, member, write)?;
        }
        self.end_object(previous)
    }

    /// All points as one `coordinates` element; referenced points are
    /// written by value.
    fn write_coordinates(&mut self, points: &Points, crs: Option<&Crs>) -> Result<()> {
        let mut text = String::new();
        for point in points.resolved()? {
            if !text.is_empty() {
                text.push(' ');
            }
            self.append_position(&mut text, point.crs.as_ref().or(crs), &point.coords, ',')?;
        }
        self.coordinates_element(&text)
    }

    fn coordinates_element(&mut self, text: &str) -> Result<()> {
        self.start("coordinates")?;
        self.sink.attribute("decimal", ".")?;
        self.sink.attribute("cs", ",")?;
        self.sink.attribute("ts", " ")?;
        self.sink.text(text)?;
        self.end()
    }

    fn write_coord(&mut self, crs: Option<&Crs>, coords: &[f64]) -> Result<()> {
        self.project(crs, coords)?;
        let values: Vec<String> = self.buffer.iter().map(|v| self.options.formatter.format(*v)).collect();
        self.start("coord")?;
        for (name, value) in ORDINATE_NAMES.iter().zip(&values) {
            self.text_element(name, value)?;
        }
        self.end()
    }
}
