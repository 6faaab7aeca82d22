//! GML 3 primitives, composites and aggregates.

use std::io::BufRead;
use std::sync::Arc;

use tracing::debug;

use crate::crs::Crs;
use crate::error::{GmlError, Result};
use crate::geometry::{
    Aggregate, CompositeCurve, CompositeGeometry, CompositeSolid, CompositeSurface, Curve, CurveRing, CurveSegment,
    Envelope, Geometry, GeometryId, GeometryKind, LineString, LinearRing, Member, OrientableCurve, OrientableSurface,
    PatchSurface, Point, Points, Polygon, PolyhedralSurface, Ring, SegmentedCurve, Solid, SolidBody, Surface,
    SurfacePatch, Tin, Triangle, TriangulatedSurface,
};

use super::GeometryReader;

type ParseFn<'a, R, T> = fn(&mut GeometryReader<'a, R>, Option<&Crs>) -> Result<T>;

impl<'a, R: BufRead> GeometryReader<'a, R> {
    /// Any `gml:_Geometry` (plus `gml:Envelope`).
    pub fn parse_geometry(&mut self, crs: Option<&Crs>) -> Result<Geometry> {
        self.require_gml_start("gml:_Geometry")?;
        let name = self.xml.local_name().to_string();
        debug!(element = name.as_str(), "parsing gml:_Geometry");
        let geometry = match name.as_str() {
            "Point" => Geometry::Point(self.parse_point(crs)?),
            "LineString" | "Curve" | "OrientableCurve" | "CompositeCurve" | "LinearRing" | "Ring" => {
                Geometry::Curve(self.parse_curve(crs)?)
            }
            "Polygon" | "Surface" | "PolyhedralSurface" | "TriangulatedSurface" | "Tin" | "CompositeSurface"
            | "OrientableSurface" => Geometry::Surface(self.parse_surface(crs)?),
            "Solid" | "CompositeSolid" => Geometry::Solid(self.parse_solid(crs)?),
            "Envelope" => Geometry::Envelope(Arc::new(self.parse_envelope(crs)?)),
            "MultiPoint" => {
                let agg = self.parse_aggregate(crs, "MultiPoint", "pointMember", Some("pointMembers"), Self::parse_point)?;
                self.register(Geometry::MultiPoint(Arc::new(agg)))?
            }
            "MultiCurve" => {
                let agg = self.parse_aggregate(crs, "MultiCurve", "curveMember", Some("curveMembers"), Self::parse_curve)?;
                self.register(Geometry::MultiCurve(Arc::new(agg)))?
            }
            "MultiLineString" => {
                let agg = self.parse_aggregate(crs, "MultiLineString", "lineStringMember", None, Self::parse_line_string)?;
                self.register(Geometry::MultiLineString(Arc::new(agg)))?
            }
            "MultiSurface" => {
                let agg =
                    self.parse_aggregate(crs, "MultiSurface", "surfaceMember", Some("surfaceMembers"), Self::parse_surface)?;
                self.register(Geometry::MultiSurface(Arc::new(agg)))?
            }
            "MultiPolygon" => {
                let agg = self.parse_aggregate(crs, "MultiPolygon", "polygonMember", None, Self::parse_polygon)?;
                self.register(Geometry::MultiPolygon(Arc::new(agg)))?
            }
            "MultiSolid" => {
                let agg = self.parse_aggregate(crs, "MultiSolid", "solidMember", Some("solidMembers"), Self::parse_solid)?;
                self.register(Geometry::MultiSolid(Arc::new(agg)))?
            }
            "MultiGeometry" => {
                let agg = self.parse_aggregate(
                    crs,
                    "MultiGeometry",
                    "geometryMember",
                    Some("geometryMembers"),
                    Self::parse_geometry,
                )?;
                self.register(Geometry::MultiGeometry(Arc::new(agg)))?
            }
            "GeometricComplex" => Geometry::Composite(self.parse_geometric_complex(crs)?),
            _ => return Err(self.unexpected("gml:_Geometry")),
        };
        Ok(geometry)
    }

    pub fn parse_point(&mut self, crs: Option<&Crs>) -> Result<Point> {
        let ns = self.ns;
        self.xml.require_start(ns, "Point")?;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.skip_to_content()?;

        self.require_gml_start("gml:pos")?;
        let child = self.xml.local_name().to_string();
        let coords = match child.as_str() {
            "pos" => self.parse_double_list()?,
            "coordinates" => {
                let mut tuples = self.parse_coordinates()?;
                if tuples.len() != 1 {
                    return Err(GmlError::format(
                        "Point",
                        format!("expected exactly one coordinate tuple, found {}", tuples.len()),
                    ));
                }
                tuples.remove(0)
            }
            "coord" => self.parse_coord_type()?,
            _ => return Err(self.unexpected("gml:pos")),
        };
        self.xml.next_tag()?;
        self.xml.require_end(ns, "Point")?;

        self.register(Point { id, crs, coords })
    }

    /// Any `gml:_Curve`, including rings.
    pub fn parse_curve(&mut self, crs: Option<&Crs>) -> Result<Curve> {
        self.require_gml_start("gml:_Curve")?;
        let name = self.xml.local_name().to_string();
        let curve = match name.as_str() {
            "LineString" => Curve::LineString(self.parse_line_string(crs)?),
            "Curve" => Curve::Segmented(self.parse_segmented_curve(crs)?),
            "OrientableCurve" => Curve::Orientable(self.parse_orientable_curve(crs)?),
            "CompositeCurve" => Curve::Composite(self.parse_composite_curve(crs)?),
            "LinearRing" | "Ring" => Curve::Ring(self.parse_ring(crs)?),
            _ => return Err(self.unexpected("gml:_Curve")),
        };
        Ok(curve)
    }

    pub fn parse_line_string(&mut self, crs: Option<&Crs>) -> Result<Arc<LineString>> {
        let ns = self.ns;
        self.xml.require_start(ns, "LineString")?;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.skip_to_content()?;
        let points = self.parse_control_points(crs.as_ref())?;
        if points.len() < 2 {
            return Err(GmlError::format(
                "LineString",
                format!("must contain at least two points, found {}", points.len()),
            ));
        }
        self.xml.require_end(ns, "LineString")?;
        self.register(Arc::new(LineString { id, crs, points }))
    }

    fn parse_segmented_curve(&mut self, crs: Option<&Crs>) -> Result<Arc<SegmentedCurve>> {
        let ns = self.ns;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.skip_to_content()?;
        self.xml.require_start(ns, "segments")?;
        self.xml.next_tag()?;
        let mut segments = Vec::new();
        while self.xml.is_start() {
            segments.push(self.parse_curve_segment(crs.as_ref())?);
            self.xml.next_tag()?;
        }
        self.xml.require_end(ns, "segments")?;
        self.xml.next_tag()?;
        self.xml.require_end(ns, "Curve")?;

        let curve = Arc::new(SegmentedCurve { id, crs, segments });
        self.register(Curve::Segmented(curve.clone()))?;
        Ok(curve)
    }

    fn parse_orientable_curve(&mut self, crs: Option<&Crs>) -> Result<Arc<OrientableCurve>> {
        let ns = self.ns;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        let orientation = self.parse_orientation()?;
        self.skip_to_content()?;
        self.xml.require_start(ns, "baseCurve")?;
        let base = self.parse_member(crs.as_ref(), Self::parse_curve)?;
        self.xml.next_tag()?;
        self.xml.require_end(ns, "OrientableCurve")?;

        let curve = Arc::new(OrientableCurve {
            id,
            crs,
            base,
            orientation,
        });
        self.register(Curve::Orientable(curve.clone()))?;
        Ok(curve)
    }

    fn parse_composite_curve(&mut self, crs: Option<&Crs>) -> Result<Arc<CompositeCurve>> {
        let ns = self.ns;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.skip_to_content()?;
        let members = self.parse_curve_members(crs.as_ref())?;
        self.xml.require_end(ns, "CompositeCurve")?;

        let curve = Arc::new(CompositeCurve { id, crs, members });
        self.register(Curve::Composite(curve.clone()))?;
        Ok(curve)
    }

    /// One or more `curveMember`s; leaves the cursor after the last one.
    fn parse_curve_members(&mut self, crs: Option<&Crs>) -> Result<Vec<Member<Curve>>> {
        let ns = self.ns;
        let element = self.xml.local_name().to_string();
        let mut members = Vec::new();
        while self.xml.is_start() && self.xml.is_element(ns, "curveMember") {
            members.push(self.parse_member(crs, Self::parse_curve)?);
            self.xml.next_tag()?;
        }
        if members.is_empty() {
            return Err(GmlError::format(element, "expected at least one gml:curveMember"));
        }
        Ok(members)
    }

    /// `gml:LinearRing` or `gml:Ring`.
    pub fn parse_ring(&mut self, crs: Option<&Crs>) -> Result<Ring> {
        self.require_gml_start("gml:_Ring")?;
        let ns = self.ns;
        let name = self.xml.local_name().to_string();
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        let ring = match name.as_str() {
            "LinearRing" => {
                self.skip_to_content()?;
                let points = self.parse_control_points(crs.as_ref())?;
                if points.len() < 4 {
                    return Err(GmlError::format(
                        "LinearRing",
                        format!("must contain at least four points, found {}", points.len()),
                    ));
                }
                self.xml.require_end(ns, "LinearRing")?;
                Ring::Linear(Arc::new(LinearRing { id, crs, points }))
            }
            "Ring" => {
                self.skip_to_content()?;
                let members = self.parse_curve_members(crs.as_ref())?;
                self.xml.require_end(ns, "Ring")?;
                Ring::Curves(Arc::new(CurveRing { id, crs, members }))
            }
            _ => return Err(self.unexpected("gml:_Ring")),
        };
        self.register(ring)
    }

    /// Any `gml:_Surface`.
    pub fn parse_surface(&mut self, crs: Option<&Crs>) -> Result<Surface> {
        self.require_gml_start("gml:_Surface")?;
        let name = self.xml.local_name().to_string();
        let surface = match name.as_str() {
            "Polygon" => Surface::Polygon(self.parse_polygon(crs)?),
            "Surface" => {
                let (id, crs, patches) = self.parse_patch_container(crs, "Surface", &["patches", "polygonPatches", "trianglePatches"])?;
                Surface::Patches(Arc::new(PatchSurface { id, crs, patches }))
            }
            "PolyhedralSurface" => {
                let (id, crs, patches) = self.parse_patch_container(crs, "PolyhedralSurface", &["polygonPatches"])?;
                let patches = patches
                    .into_iter()
                    .map(|p| match p {
                        SurfacePatch::Polygon(p) => Ok(p),
                        other => Err(GmlError::format(
                            "PolyhedralSurface",
                            format!("'{}' is not a gml:PolygonPatch", other.kind_name()),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Surface::PolyhedralSurface(Arc::new(PolyhedralSurface { id, crs, patches }))
            }
            "TriangulatedSurface" => {
                let (id, crs, patches) = self.parse_patch_container(crs, "TriangulatedSurface", &["trianglePatches"])?;
                let patches = into_triangles("TriangulatedSurface", patches)?;
                Surface::TriangulatedSurface(Arc::new(TriangulatedSurface { id, crs, patches }))
            }
            "Tin" => Surface::Tin(self.parse_tin(crs)?),
            "CompositeSurface" => Surface::Composite(self.parse_composite_surface(crs)?),
            "OrientableSurface" => Surface::Orientable(self.parse_orientable_surface(crs)?),
            _ => return Err(self.unexpected("gml:_Surface")),
        };
        // polygons register themselves so they can also be parsed on their own
        if !matches!(surface, Surface::Polygon(_)) {
            self.register(surface.clone())?;
        }
        Ok(surface)
    }

    pub fn parse_polygon(&mut self, crs: Option<&Crs>) -> Result<Arc<Polygon>> {
        let ns = self.ns;
        self.xml.require_start(ns, "Polygon")?;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.skip_to_content()?;

        let mut exterior = None;
        if self.xml.is_start() && (self.xml.is_element(ns, "exterior") || self.xml.is_element(ns, "outerBoundaryIs")) {
            exterior = Some(self.parse_member(crs.as_ref(), Self::parse_ring)?);
            self.xml.next_tag()?;
        }
        let mut interiors = Vec::new();
        while self.xml.is_start() && (self.xml.is_element(ns, "interior") || self.xml.is_element(ns, "innerBoundaryIs")) {
            interiors.push(self.parse_member(crs.as_ref(), Self::parse_ring)?);
            self.xml.next_tag()?;
        }
        self.xml.require_end(ns, "Polygon")?;

        self.register(Arc::new(Polygon {
            id,
            crs,
            exterior,
            interiors,
        }))
    }

    /// Shared by `Surface`, `PolyhedralSurface` and `TriangulatedSurface`.
    fn parse_patch_container(
        &mut self,
        crs: Option<&Crs>,
        element: &str,
        containers: &[&str],
    ) -> Result<(Option<GeometryId>, Option<Crs>, Vec<SurfacePatch>)> {
        let ns = self.ns;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.skip_to_content()?;
        let container = self.xml.local_name().to_string();
        if !self.xml.is_start() || self.xml.namespace() != ns || !containers.contains(&container.as_str()) {
            return Err(GmlError::format(
                element,
                format!("expected one of {:?}, {}", containers, self.xml.describe()),
            ));
        }
        self.xml.next_tag()?;
        let mut patches = Vec::new();
        while self.xml.is_start() {
            patches.push(self.parse_surface_patch(crs.as_ref())?);
            self.xml.next_tag()?;
        }
        self.xml.require_end(ns, &container)?;
        self.xml.next_tag()?;
        self.xml.require_end(ns, element)?;
        Ok((id, crs, patches))
    }

    fn parse_tin(&mut self, crs: Option<&Crs>) -> Result<Arc<Tin>> {
        let ns = self.ns;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.skip_to_content()?;

        self.xml.require_start(ns, "trianglePatches")?;
        self.xml.next_tag()?;
        let mut patches = Vec::new();
        while self.xml.is_start() {
            patches.push(self.parse_surface_patch(crs.as_ref())?);
            self.xml.next_tag()?;
        }
        self.xml.require_end(ns, "trianglePatches")?;
        let patches = into_triangles("Tin", patches)?;
        self.xml.next_tag()?;

        let stop_lines = self.parse_line_constraints(crs.as_ref(), "stopLines")?;
        let break_lines = self.parse_line_constraints(crs.as_ref(), "breakLines")?;

        self.xml.require_start(ns, "maxLength")?;
        let max_length = self.parse_length()?;
        self.xml.next_tag()?;

        self.xml.require_start(ns, "controlPoint")?;
        self.xml.next_tag()?;
        let control_points = if self.xml.is_start() && self.xml.is_element(ns, "posList") {
            let coords = self.parse_pos_list(crs.as_ref())?;
            self.xml.next_tag()?;
            Points::from_coords(coords, crs.as_ref())
        } else {
            self.parse_point_run(crs.as_ref(), false)?
        };
        if control_points.len() < 3 {
            return Err(GmlError::format(
                "controlPoint",
                format!("a Tin needs at least three control points, found {}", control_points.len()),
            ));
        }
        self.xml.require_end(ns, "controlPoint")?;
        self.xml.next_tag()?;
        self.xml.require_end(ns, "Tin")?;

        Ok(Arc::new(Tin {
            id,
            crs,
            patches,
            stop_lines,
            break_lines,
            max_length,
            control_points,
        }))
    }

    /// Repeated `stopLines`/`breakLines`, each a list of `LineStringSegment`s.
    fn parse_line_constraints(&mut self, crs: Option<&Crs>, element: &str) -> Result<Vec<Vec<CurveSegment>>> {
        let ns = self.ns;
        let mut lines = Vec::new();
        while self.xml.is_start() && self.xml.is_element(ns, element) {
            self.xml.next_tag()?;
            let mut segments = Vec::new();
            while self.xml.is_start() {
                self.xml.require_start(ns, "LineStringSegment")?;
                segments.push(self.parse_curve_segment(crs)?);
                self.xml.next_tag()?;
            }
            self.xml.require_end(ns, element)?;
            lines.push(segments);
            self.xml.next_tag()?;
        }
        Ok(lines)
    }

    fn parse_composite_surface(&mut self, crs: Option<&Crs>) -> Result<Arc<CompositeSurface>> {
        let ns = self.ns;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.skip_to_content()?;
        let mut members = Vec::new();
        while self.xml.is_start() && self.xml.is_element(ns, "surfaceMember") {
            members.push(self.parse_member(crs.as_ref(), Self::parse_surface)?);
            self.xml.next_tag()?;
        }
        if members.is_empty() {
            return Err(GmlError::format("CompositeSurface", "expected at least one gml:surfaceMember"));
        }
        self.xml.require_end(ns, "CompositeSurface")?;
        Ok(Arc::new(CompositeSurface { id, crs, members }))
    }

    fn parse_orientable_surface(&mut self, crs: Option<&Crs>) -> Result<Arc<OrientableSurface>> {
        let ns = self.ns;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        let orientation = self.parse_orientation()?;
        self.skip_to_content()?;
        self.xml.require_start(ns, "baseSurface")?;
        let base = self.parse_member(crs.as_ref(), Self::parse_surface)?;
        self.xml.next_tag()?;
        self.xml.require_end(ns, "OrientableSurface")?;
        Ok(Arc::new(OrientableSurface {
            id,
            crs,
            base,
            orientation,
        }))
    }

    /// Any `gml:_Solid`.
    pub fn parse_solid(&mut self, crs: Option<&Crs>) -> Result<Solid> {
        self.require_gml_start("gml:_Solid")?;
        let ns = self.ns;
        let name = self.xml.local_name().to_string();
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.skip_to_content()?;
        let solid = match name.as_str() {
            "Solid" => {
                let mut exterior = None;
                if self.xml.is_start() && self.xml.is_element(ns, "exterior") {
                    exterior = Some(self.parse_member(crs.as_ref(), Self::parse_surface)?);
                    self.xml.next_tag()?;
                }
                let mut interiors = Vec::new();
                while self.xml.is_start() && self.xml.is_element(ns, "interior") {
                    interiors.push(self.parse_member(crs.as_ref(), Self::parse_surface)?);
                    self.xml.next_tag()?;
                }
                self.xml.require_end(ns, "Solid")?;
                Solid::Solid(Arc::new(SolidBody {
                    id,
                    crs,
                    exterior,
                    interiors,
                }))
            }
            "CompositeSolid" => {
                let mut members = Vec::new();
                while self.xml.is_start() && self.xml.is_element(ns, "solidMember") {
                    members.push(self.parse_member(crs.as_ref(), Self::parse_solid)?);
                    self.xml.next_tag()?;
                }
                if members.is_empty() {
                    return Err(GmlError::format("CompositeSolid", "expected at least one gml:solidMember"));
                }
                self.xml.require_end(ns, "CompositeSolid")?;
                Solid::Composite(Arc::new(CompositeSolid { id, crs, members }))
            }
            _ => return Err(self.unexpected("gml:_Solid")),
        };
        self.register(solid)
    }

    pub fn parse_envelope(&mut self, crs: Option<&Crs>) -> Result<Envelope> {
        let ns = self.ns;
        self.xml.require_start(ns, "Envelope")?;
        let crs = self.determine_active_crs(crs);
        self.xml.next_tag()?;
        self.require_gml_start("gml:lowerCorner")?;
        let child = self.xml.local_name().to_string();
        let (min, max) = match child.as_str() {
            "lowerCorner" => {
                let min = self.parse_double_list()?;
                self.xml.next_start(ns, "upperCorner")?;
                (min, self.parse_double_list()?)
            }
            "pos" => {
                let min = self.parse_double_list()?;
                self.xml.next_start(ns, "pos")?;
                (min, self.parse_double_list()?)
            }
            "coord" => {
                let min = self.parse_coord_type()?;
                self.xml.next_start(ns, "coord")?;
                (min, self.parse_coord_type()?)
            }
            "coordinates" => {
                let mut tuples = self.parse_coordinates()?;
                if tuples.len() != 2 {
                    return Err(GmlError::format(
                        "Envelope",
                        format!("expected two coordinate tuples, found {}", tuples.len()),
                    ));
                }
                let max = tuples.remove(1);
                (tuples.remove(0), max)
            }
            _ => return Err(self.unexpected("gml:lowerCorner")),
        };
        if min.len() != max.len() {
            return Err(GmlError::format("Envelope", "corners have different dimensions"));
        }
        self.xml.next_tag()?;
        self.xml.require_end(ns, "Envelope")?;
        Ok(Envelope {
            id: None,
            crs,
            min,
            max,
        })
    }

    fn parse_geometric_complex(&mut self, crs: Option<&Crs>) -> Result<Arc<CompositeGeometry>> {
        let ns = self.ns;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.skip_to_content()?;
        let mut members = Vec::new();
        while self.xml.is_start() && self.xml.is_element(ns, "element") {
            members.push(self.parse_member(crs.as_ref(), Self::parse_geometry)?);
            self.xml.next_tag()?;
        }
        self.xml.require_end(ns, "GeometricComplex")?;
        let complex = Arc::new(CompositeGeometry { id, crs, members });
        self.register(Geometry::Composite(complex.clone()))?;
        Ok(complex)
    }

    /// `gml:Multi*`: repeated `member` properties and/or one `members` array.
    fn parse_aggregate<T: GeometryKind>(
        &mut self,
        crs: Option<&Crs>,
        element: &str,
        member: &str,
        members: Option<&str>,
        parse: ParseFn<'a, R, T>,
    ) -> Result<Aggregate<T>> {
        let ns = self.ns;
        self.xml.require_start(ns, element)?;
        let crs = self.determine_active_crs(crs);
        let id = self.parse_geometry_id()?;
        self.skip_to_content()?;

        let mut result = Vec::new();
        while self.xml.is_start() {
            if self.xml.is_element(ns, member) {
                result.push(self.parse_member(crs.as_ref(), parse)?);
            } else if members.map_or(false, |m| self.xml.is_element(ns, m)) {
                let array = self.xml.local_name().to_string();
                self.xml.next_tag()?;
                while self.xml.is_start() {
                    result.push(Member::Inline(parse(self, crs.as_ref())?));
                    self.xml.next_tag()?;
                }
                self.xml.require_end(ns, &array)?;
            } else {
                return Err(self.unexpected(&format!("gml:{}", member)));
            }
            self.xml.next_tag()?;
        }
        self.xml.require_end(ns, element)?;
        Ok(Aggregate {
            id,
            crs,
            members: result,
        })
    }
}

fn into_triangles(element: &str, patches: Vec<SurfacePatch>) -> Result<Vec<Triangle>> {
    patches
        .into_iter()
        .map(|p| match p {
            SurfacePatch::Triangle(t) => Ok(t),
            other => Err(GmlError::format(element, format!("'{}' is not a gml:Triangle", other.kind_name()))),
        })
        .collect()
}
