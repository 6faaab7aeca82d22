//! GML writers.
//!
//! One [`GeometryWriter`] is one export session: it owns the XML sink, the
//! scratch buffer used for reprojection and the CRS of the element being
//! written, and shares an [`ExportedIds`] set with the caller so several
//! geometries written into the same document deduplicate against each other.

use std::fmt::Write as _;
use std::io::Write;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crs::{CoordinateTransformer, Crs};
use crate::error::{GmlError, Result};
use crate::geometry::{Curve, Geometry, GeometryId, GeometryKind, Member, Polygon, Ring, Surface};
use crate::version::{GmlVersion, XLINK_NS};
use crate::xml::XmlSink;

mod gml2;
mod gml3;

/// How ordinates are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoordinateFormatter {
    /// Fixed number of decimal places.
    Decimal { places: usize },
}

impl Default for CoordinateFormatter {
    fn default() -> Self {
        CoordinateFormatter::Decimal { places: 5 }
    }
}

impl CoordinateFormatter {
    pub fn format(&self, value: f64) -> String {
        let mut out = String::new();
        self.write_to(&mut out, value);
        out
    }

    fn write_to(&self, out: &mut String, value: f64) {
        match self {
            CoordinateFormatter::Decimal { places } => {
                let _ = write!(out, "{:.*}", *places, value);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    pub version: GmlVersion,
    /// Target CRS; coordinates in any other CRS are reprojected.
    pub output_crs: Option<String>,
    pub formatter: CoordinateFormatter,
    /// Restrict output to simple-features kinds and drop identifiers.
    pub simple_features: bool,
    /// Declare the `gml` and `xlink` prefixes on the outermost element.
    pub declare_namespaces: bool,
    pub indent: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            version: GmlVersion::Gml31,
            output_crs: None,
            formatter: CoordinateFormatter::default(),
            simple_features: false,
            declare_namespaces: true,
            indent: false,
        }
    }
}

impl WriterOptions {
    pub fn new(version: GmlVersion) -> Self {
        WriterOptions {
            version,
            ..Default::default()
        }
    }
}

/// Identifiers already written in full during one export session.
#[derive(Debug, Clone, Default)]
pub struct ExportedIds {
    ids: IndexSet<String>,
}

impl ExportedIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Records `id`; false if it was already exported.
    pub fn insert(&mut self, id: &GeometryId) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

pub struct GeometryWriter<'a, W: Write> {
    sink: XmlSink<W>,
    options: &'a WriterOptions,
    exported: &'a mut ExportedIds,
    transformer: Option<&'a dyn CoordinateTransformer>,
    output_crs: Option<Crs>,
    /// CRS announced by the innermost enclosing `srsName`.
    context_crs: Option<Crs>,
    buffer: Vec<f64>,
}

impl<'a, W: Write> GeometryWriter<'a, W> {
    /// Starts an export session.
    ///
    /// # Arguments
    /// * `writer` - Destination of the XML
    /// * `options` - Writer configuration, borrowed for the session
    /// * `exported` - Ids already written; share one set between sessions
    ///   that write into the same document
    pub fn new(writer: W, options: &'a WriterOptions, exported: &'a mut ExportedIds) -> Self {
        GeometryWriter {
            sink: XmlSink::new(writer).indented(options.indent),
            options,
            exported,
            transformer: None,
            output_crs: options.output_crs.as_deref().map(Crs::new),
            context_crs: None,
            buffer: Vec::with_capacity(16),
        }
    }

    pub fn with_transformer(mut self, transformer: &'a dyn CoordinateTransformer) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Writes one top-level geometry. Unsupported kinds are rejected before
    /// anything is emitted.
    ///
    /// # Arguments
    /// * `geometry` - The geometry to encode in the configured GML version
    ///
    /// # Returns
    /// `Ok(())` once the element is written. Fails with `UnsupportedVersion`
    /// for kinds GML 2 cannot express, `UnsupportedGeometry` for non-simple
    /// kinds in simple-features mode and `Transformation` when an output CRS
    /// needs a transformer that was not supplied.
    pub fn write(&mut self, geometry: &Geometry) -> Result<()> {
        let version = self.options.version;
        debug!(kind = geometry.kind_name(), version = version.as_str(), "writing geometry");
        if self.options.simple_features {
            check_simple(geometry)?;
        }
        if version.is_gml2() {
            check_gml2(geometry)?;
            self.write_gml2_geometry(geometry)
        } else {
            self.write_gml3_geometry(geometry)
        }
    }

    pub fn exported(&self) -> &ExportedIds {
        &*self.exported
    }

    pub fn finish(mut self) -> Result<W> {
        self.sink.flush()?;
        Ok(self.sink.into_inner())
    }

    fn start(&mut self, local: &str) -> Result<()> {
        let root = self.sink.depth() == 0;
        self.sink.start_element(&format!("gml:{}", local))?;
        if root && self.options.declare_namespaces {
            self.sink.attribute("xmlns:gml", self.options.version.namespace())?;
            self.sink.attribute("xmlns:xlink", XLINK_NS)?;
        }
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.sink.end_element()?;
        Ok(())
    }

    fn text_element(&mut self, local: &str, text: &str) -> Result<()> {
        self.start(local)?;
        self.sink.text(text)?;
        self.end()
    }

    /// Opens an object element with its identifier and, when it differs from
    /// the enclosing one, its `srsName`. Returns the CRS context to restore in
    /// [`end_object`](Self::end_object).
    fn begin_object(&mut self, local: &str, id: Option<&GeometryId>, crs: Option<&Crs>) -> Result<Option<Crs>> {
        self.start(local)?;
        if let Some(id) = id {
            if !self.options.simple_features && self.exported.insert(id) {
                let attribute = if self.options.version.is_gml2() { "gid" } else { "gml:id" };
                self.sink.attribute(attribute, id.as_str())?;
            }
        }
        let previous = self.context_crs.clone();
        if let Some(effective) = self.effective_crs(crs) {
            if previous.as_ref() != Some(&effective) {
                self.sink.attribute("srsName", effective.name())?;
            }
            self.context_crs = Some(effective);
        }
        Ok(previous)
    }

    fn end_object(&mut self, previous: Option<Crs>) -> Result<()> {
        self.context_crs = previous;
        self.end()
    }

    fn effective_crs(&self, crs: Option<&Crs>) -> Option<Crs> {
        crs.map(|crs| self.output_crs.clone().unwrap_or_else(|| crs.clone()))
    }

    /// Writes a property element: an `xlink:href` for references and for
    /// objects already exported in this session, the inline object otherwise.
    fn write_member<T: GeometryKind>(
        &mut self,
        property: &str,
        member: &Member<T>,
        write_inline: impl FnOnce(&mut Self, &T) -> Result<()>,
    ) -> Result<()> {
        self.start(property)?;
        match member {
            Member::Reference(reference) if !self.options.simple_features => {
                self.sink.attribute("xlink:href", reference.href())?;
            }
            Member::Reference(_) => {
                let value = member.resolve()?;
                write_inline(self, &value)?;
            }
            Member::Inline(value) => {
                let id = value.clone().into_geometry().id().cloned();
                match id {
                    Some(id) if !self.options.simple_features && self.exported.contains(id.as_str()) => {
                        debug!(id = id.as_str(), property, "writing repeated object as reference");
                        self.sink.attribute("xlink:href", &format!("#{}", id))?;
                    }
                    _ => write_inline(self, value)?,
                }
            }
        }
        self.end()
    }

    /// Fills the scratch buffer with `coords`, reprojected into the output
    /// CRS when needed.
    fn project(&mut self, crs: Option<&Crs>, coords: &[f64]) -> Result<()> {
        self.buffer.clear();
        self.buffer.extend_from_slice(coords);
        if let (Some(source), Some(target)) = (crs, self.output_crs.as_ref()) {
            if source != target {
                let transformer = self.transformer.ok_or_else(|| GmlError::Transformation {
                    source_crs: source.name().to_string(),
                    target_crs: target.name().to_string(),
                    reason: "no coordinate transformer configured".to_string(),
                })?;
                transformer.transform(source, target, coords.len(), &mut self.buffer)?;
            }
        }
        Ok(())
    }

    /// Appends one position to `out`, ordinates joined by `separator`.
    fn append_position(&mut self, out: &mut String, crs: Option<&Crs>, coords: &[f64], separator: char) -> Result<()> {
        self.project(crs, coords)?;
        for (i, value) in self.buffer.iter().enumerate() {
            if i > 0 {
                out.push(separator);
            }
            self.options.formatter.write_to(out, *value);
        }
        Ok(())
    }

    fn format_position(&mut self, crs: Option<&Crs>, coords: &[f64]) -> Result<String> {
        let mut out = String::new();
        self.append_position(&mut out, crs, coords, ' ')?;
        Ok(out)
    }

    /// Formats a direction or similar vector without reprojection.
    fn format_vector(&self, values: &[f64]) -> String {
        let mut out = String::new();
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            self.options.formatter.write_to(&mut out, *value);
        }
        out
    }
}

/// Writes `geometry` as a standalone fragment with a fresh session.
///
/// # Arguments
/// * `geometry` - The geometry to encode
/// * `options` - Target version, output CRS, number formatting and
///   simple-features mode
///
/// # Returns
/// The XML fragment. No transformer is attached, so an output CRS that
/// differs from the geometry's fails with `Transformation`.
pub fn write_geometry_to_string(geometry: &Geometry, options: &WriterOptions) -> Result<String> {
    let mut exported = ExportedIds::new();
    let mut writer = GeometryWriter::new(Vec::new(), options, &mut exported);
    writer.write(geometry)?;
    let bytes = writer.finish()?;
    String::from_utf8(bytes).map_err(|err| GmlError::Xml(err.to_string()))
}

fn unsupported_version(kind: &str) -> GmlError {
    GmlError::UnsupportedVersion {
        kind: kind.to_string(),
        version: GmlVersion::Gml21.as_str().to_string(),
    }
}

fn gml2_ring(member: &Member<Ring>) -> Result<()> {
    match member {
        Member::Inline(Ring::Curves(_)) => Err(unsupported_version("Ring")),
        _ => Ok(()),
    }
}

fn gml2_polygon(polygon: &Polygon) -> Result<()> {
    polygon.exterior.iter().chain(&polygon.interiors).try_for_each(gml2_ring)
}

/// Rejects anything GML 2 cannot express, looking through inline members.
fn check_gml2(geometry: &Geometry) -> Result<()> {
    match geometry {
        Geometry::Point(_) | Geometry::Envelope(_) | Geometry::MultiPoint(_) | Geometry::MultiLineString(_) => Ok(()),
        Geometry::Curve(Curve::LineString(_)) | Geometry::Curve(Curve::Ring(Ring::Linear(_))) => Ok(()),
        Geometry::Surface(Surface::Polygon(polygon)) => gml2_polygon(polygon),
        Geometry::MultiPolygon(multi) => multi
            .members
            .iter()
            .filter_map(Member::as_inline)
            .try_for_each(|p| gml2_polygon(p)),
        Geometry::MultiCurve(multi) => multi.members.iter().filter_map(Member::as_inline).try_for_each(|c| match c {
            Curve::LineString(_) => Ok(()),
            other => Err(unsupported_version(other.kind_name())),
        }),
        Geometry::MultiSurface(multi) => {
            multi.members.iter().filter_map(Member::as_inline).try_for_each(|s| match s {
                Surface::Polygon(polygon) => gml2_polygon(polygon),
                other => Err(unsupported_version(other.kind_name())),
            })
        }
        Geometry::MultiGeometry(multi) => multi.members.iter().filter_map(Member::as_inline).try_for_each(check_gml2),
        other => Err(unsupported_version(other.kind_name())),
    }
}

fn resolved_members<T: GeometryKind>(members: &[Member<T>]) -> Result<Vec<Geometry>> {
    members.iter().map(|m| m.resolve().map(GeometryKind::into_geometry)).collect()
}

fn simple_polygon(polygon: &Polygon) -> Result<()> {
    polygon
        .exterior
        .iter()
        .chain(&polygon.interiors)
        .try_for_each(|ring| match ring.resolve()? {
            Ring::Linear(_) => Ok(()),
            Ring::Curves(_) => Err(GmlError::UnsupportedGeometry("Ring".to_string())),
        })
}

/// Accepts only simple-features kinds; references are checked through their
/// targets.
fn check_simple(geometry: &Geometry) -> Result<()> {
    match geometry {
        Geometry::Point(_) | Geometry::Envelope(_) | Geometry::MultiPoint(_) | Geometry::MultiLineString(_) => Ok(()),
        Geometry::Curve(Curve::LineString(_)) | Geometry::Curve(Curve::Ring(Ring::Linear(_))) => Ok(()),
        Geometry::Surface(Surface::Polygon(polygon)) => simple_polygon(polygon),
        Geometry::MultiPolygon(multi) => multi.members.iter().try_for_each(|m| {
            let polygon = m.resolve()?;
            simple_polygon(&polygon)
        }),
        Geometry::MultiCurve(multi) => resolved_members(&multi.members)?.iter().try_for_each(|g| match g {
            Geometry::Curve(Curve::LineString(_)) => Ok(()),
            other => Err(GmlError::UnsupportedGeometry(other.kind_name().to_string())),
        }),
        Geometry::MultiSurface(multi) => resolved_members(&multi.members)?.iter().try_for_each(|g| match g {
            Geometry::Surface(Surface::Polygon(polygon)) => simple_polygon(polygon),
            other => Err(GmlError::UnsupportedGeometry(other.kind_name().to_string())),
        }),
        Geometry::MultiGeometry(multi) => resolved_members(&multi.members)?.iter().try_for_each(check_simple),
        Geometry::Reference(reference) => check_simple(reference.target()?),
        other => Err(GmlError::UnsupportedGeometry(other.kind_name().to_string())),
    }
}
