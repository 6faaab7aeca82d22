//! Positions, coordinate lists, measures and the attributes shared by all
//! geometry elements.

use std::io::BufRead;

use tracing::debug;

use crate::crs::Crs;
use crate::error::{GmlError, Result};
use crate::geometry::{GeometryId, Measure, Member, Orientation, Point, Points};
use crate::xml::stream::parse_f64;

use super::GeometryReader;

/// GML 3 properties that may precede the content of any geometry element.
const STANDARD_PROPERTIES: &[&str] = &[
    "metaDataProperty",
    "description",
    "descriptionReference",
    "identifier",
    "name",
];

impl<'a, R: BufRead> GeometryReader<'a, R> {
    /// The element's `srsName` if it is set and differs from the inherited CRS.
    pub fn determine_active_crs(&self, default_crs: Option<&Crs>) -> Option<Crs> {
        match self.xml.attribute("srsName").map(str::trim) {
            Some(name) if !name.is_empty() && default_crs.map(Crs::name) != Some(name) => Some(Crs::new(name)),
            _ => default_crs.cloned(),
        }
    }

    pub fn determine_coord_dimensions(&self, default_dim: Option<usize>) -> Result<Option<usize>> {
        match self.xml.attribute("srsDimension") {
            Some(value) => value.trim().parse::<usize>().map(Some).map_err(|_| {
                GmlError::format(
                    self.xml.local_name(),
                    format!("value '{}' of attribute 'srsDimension' is not an integer", value),
                )
            }),
            None => Ok(default_dim),
        }
    }

    /// `gml:id` (GML 3, `gid` accepted as well) or `gid` (GML 2).
    pub fn parse_geometry_id(&self) -> Result<Option<GeometryId>> {
        let value = if self.version.is_gml2() {
            self.xml.attribute("gid")
        } else {
            self.xml.attribute_ns(self.ns, "id").or_else(|| self.xml.attribute("gid"))
        };
        value.map(|v| GeometryId::new(v.trim())).transpose()
    }

    /// Advances past the start tag and any standard object properties.
    pub(crate) fn skip_to_content(&mut self) -> Result<()> {
        self.xml.next_tag()?;
        while self.xml.is_start()
            && self.xml.namespace() == self.ns
            && STANDARD_PROPERTIES.contains(&self.xml.local_name())
        {
            self.xml.skip_element()?;
            self.xml.next_tag()?;
        }
        Ok(())
    }

    /// Whitespace separated tuples of `posList`.
    pub fn parse_pos_list(&mut self, crs: Option<&Crs>) -> Result<Vec<Vec<f64>>> {
        let crs = self.determine_active_crs(crs);
        let element = self.xml.local_name().to_string();
        let explicit = self.determine_coord_dimensions(None)?;
        let text = self.xml.element_text()?;
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let dim = match (explicit, crs.as_ref()) {
            (Some(dim), _) => dim,
            (None, Some(crs)) => self.resolver.dimension(crs)?,
            (None, None) => {
                debug!(element = element.as_str(), "no srsDimension and no CRS, assuming 2D coordinates");
                2
            }
        };
        if dim == 0 || tokens.len() % dim != 0 {
            return Err(GmlError::format(
                element,
                format!(
                    "number of ordinates ({}) is not a multiple of the coordinate dimension ({})",
                    tokens.len(),
                    dim
                ),
            ));
        }

        let mut tuples = Vec::with_capacity(tokens.len() / dim);
        for chunk in tokens.chunks(dim) {
            let coords = chunk
                .iter()
                .map(|t| parse_f64(&element, t))
                .collect::<Result<Vec<f64>>>()?;
            tuples.push(coords);
        }
        Ok(tuples)
    }

    /// Legacy `coordinates` with its `decimal`, `cs` and `ts` separators.
    pub fn parse_coordinates(&mut self) -> Result<Vec<Vec<f64>>> {
        let element = self.xml.local_name().to_string();
        let decimal = self.xml.attribute("decimal").unwrap_or(".").to_string();
        let cs = self.xml.attribute("cs").unwrap_or(",").to_string();
        let ts = self.xml.attribute("ts").unwrap_or(" ").to_string();
        if decimal != "." {
            return Err(GmlError::format(
                element,
                format!("decimal separator '{}' is not supported, only '.' is", decimal),
            ));
        }
        if cs.is_empty() || ts.is_empty() {
            return Err(GmlError::format(element, "empty coordinate or tuple separator"));
        }
        let text = self.xml.element_text()?;

        let tuples: Vec<&str> = if ts.trim().is_empty() {
            text.split_whitespace().collect()
        } else {
            text.split(ts.as_str()).map(str::trim).filter(|t| !t.is_empty()).collect()
        };

        let mut result = Vec::with_capacity(tuples.len());
        for tuple in tuples {
            let coords = if cs.trim().is_empty() {
                tuple
                    .split_whitespace()
                    .map(|t| parse_f64(&element, t))
                    .collect::<Result<Vec<f64>>>()?
            } else {
                tuple
                    .split(cs.as_str())
                    .map(|t| parse_f64(&element, t.trim()))
                    .collect::<Result<Vec<f64>>>()?
            };
            if let Some(first) = result.first().map(Vec::len) {
                if coords.len() != first {
                    return Err(GmlError::format(
                        element,
                        format!("tuple '{}' has {} ordinates, expected {}", tuple, coords.len(), first),
                    ));
                }
            }
            result.push(coords);
        }
        Ok(result)
    }

    /// Deprecated `<coord><X/><Y/><Z/></coord>`.
    pub fn parse_coord_type(&mut self) -> Result<Vec<f64>> {
        let ns = self.ns;
        let mut coords = Vec::with_capacity(3);
        self.xml.next_start(ns, "X")?;
        coords.push(self.xml.element_text_as_f64()?);
        self.xml.next_tag()?;
        if self.xml.is_start() && self.xml.is_element(ns, "Y") {
            coords.push(self.xml.element_text_as_f64()?);
            self.xml.next_tag()?;
            if self.xml.is_start() && self.xml.is_element(ns, "Z") {
                coords.push(self.xml.element_text_as_f64()?);
                self.xml.next_tag()?;
            }
        }
        self.xml.require_end(ns, "coord")?;
        Ok(coords)
    }

    /// Text of a `pos`-like element as one tuple.
    pub fn parse_double_list(&mut self) -> Result<Vec<f64>> {
        let element = self.xml.local_name().to_string();
        let text = self.xml.element_text()?;
        text.split_whitespace().map(|t| parse_f64(&element, t)).collect()
    }

    /// `pos`, `location`, `refDirection` and friends as an anonymous point.
    pub fn parse_direct_position(&mut self, crs: Option<&Crs>) -> Result<Point> {
        let crs = self.determine_active_crs(crs);
        let coords = self.parse_double_list()?;
        Ok(Point::new(coords).with_crs(crs))
    }

    pub fn parse_measure(&mut self) -> Result<Measure> {
        let element = self.xml.local_name().to_string();
        let uom = self
            .xml
            .attribute("uom")
            .map(str::to_string)
            .ok_or_else(|| GmlError::format(element.as_str(), "missing mandatory attribute 'uom'"))?;
        let value = self.xml.element_text_as_f64()?;
        Ok(Measure::new(value, uom))
    }

    pub fn parse_length(&mut self) -> Result<Measure> {
        self.parse_measure()
    }

    pub fn parse_angle(&mut self) -> Result<Measure> {
        self.parse_measure()
    }

    pub fn parse_orientation(&self) -> Result<Orientation> {
        match self.xml.attribute("orientation").map(str::trim) {
            Some("+") => Ok(Orientation::Forward),
            Some("-") | None => Ok(Orientation::Reversed),
            Some(other) => Err(GmlError::format(
                self.xml.local_name(),
                format!("invalid orientation '{}', must be '+' or '-'", other),
            )),
        }
    }

    /// Control points of a segment or line string.
    ///
    /// Precondition: cursor on the first child element (or on the parent's end
    /// tag). Postcondition: cursor on the first element after the points. A
    /// run of `pos`/`pointProperty`/`pointRep`/`coord` stops at the first
    /// other element and leaves the cursor there.
    ///
    /// # Arguments
    /// * `crs` - CRS inherited from the enclosing geometry
    ///
    /// # Returns
    /// The points in document order, empty if the parent has no children.
    /// Inline positions of different dimensions fail with a format error.
    pub fn parse_control_points(&mut self, crs: Option<&Crs>) -> Result<Points> {
        if !self.xml.is_start() {
            return Ok(Points::default());
        }
        let ns = self.ns;
        if self.xml.is_element(ns, "posList") {
            let crs = self.determine_active_crs(crs);
            let coords = self.parse_pos_list(crs.as_ref())?;
            self.xml.next_tag()?;
            return Ok(Points::from_coords(coords, crs.as_ref()));
        }
        if self.xml.is_element(ns, "coordinates") {
            let coords = self.parse_coordinates()?;
            self.xml.next_tag()?;
            return Ok(Points::from_coords(coords, crs));
        }
        self.parse_point_run(crs, true)
    }

    /// A run of `pos`/`pointProperty` (plus `pointRep`/`coord` when `legacy`).
    pub(crate) fn parse_point_run(&mut self, crs: Option<&Crs>, legacy: bool) -> Result<Points> {
        let ns = self.ns;
        let mut points = Vec::new();
        let mut dim = None;
        while self.xml.is_start() && self.xml.namespace() == ns {
            let name = self.xml.local_name().to_string();
            let member = match name.as_str() {
                "pos" => Member::Inline(self.parse_direct_position(crs)?),
                "pointProperty" => self.parse_member(crs, |r, crs| r.parse_point(crs))?,
                "pointRep" if legacy => self.parse_member(crs, |r, crs| r.parse_point(crs))?,
                "coord" if legacy => Member::Inline(Point::new(self.parse_coord_type()?).with_crs(crs.cloned())),
                _ => break,
            };
            // referenced points are checked once resolved, by the writer
            if let Member::Inline(point) = &member {
                require_dimension(&name, &mut dim, point.coords.len())?;
            }
            points.push(member);
            self.xml.next_tag()?;
        }
        Ok(Points(points))
    }
}

/// Fails if a tuple's ordinate count differs from the first tuple of its run.
pub(crate) fn require_dimension(element: &str, dim: &mut Option<usize>, found: usize) -> Result<()> {
    match *dim {
        Some(expected) if expected != found => Err(GmlError::format(
            element,
            format!("position has {} ordinates, expected {} like the preceding ones", found, expected),
        )),
        Some(_) => Ok(()),
        None => {
            *dim = Some(found);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::crs::Crs;
    use crate::error::GmlError;
    use crate::geometry::Orientation;
    use crate::reader::GeometryReader;
    use crate::registry::IdContext;
    use crate::version::GmlVersion;
    use crate::xml::XmlStream;

    fn with_reader<T>(xml: &str, f: impl FnOnce(&mut GeometryReader<'_, &[u8]>) -> T) -> T {
        let mut stream = XmlStream::from_str(xml);
        stream.next_tag().unwrap();
        let mut ctx = IdContext::new();
        let mut reader = GeometryReader::new(&mut stream, &mut ctx, GmlVersion::Gml31);
        f(&mut reader)
    }

    const GML: &str = r#"xmlns:gml="http://www.opengis.net/gml""#;

    #[test]
    fn test_empty_pos_list() {
        let xml = format!("<gml:posList {}></gml:posList>", GML);
        let coords = with_reader(&xml, |r| r.parse_pos_list(None).unwrap());
        assert!(coords.is_empty());
    }

    #[test]
    fn test_pos_list_dimension_mismatch_reports_counts() {
        let xml = format!("<gml:posList {} srsDimension=\"3\">1 2 3 4 5 6 7</gml:posList>", GML);
        let err = with_reader(&xml, |r| r.parse_pos_list(None).unwrap_err());
        let message = err.to_string();
        assert!(message.contains('7'), "{}", message);
        assert!(message.contains('3'), "{}", message);
    }

    #[test]
    fn test_pos_list_dimension_from_crs() {
        let xml = format!("<gml:posList {}>1 2 3 4 5 6</gml:posList>", GML);
        let crs = Crs::new("EPSG:4979");
        let coords = with_reader(&xml, |r| r.parse_pos_list(Some(&crs)).unwrap());
        assert_eq!(coords, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_pos_list_unknown_crs_only_when_needed() {
        let xml = format!("<gml:posList {} srsName=\"local\">1 2</gml:posList>", GML);
        let err = with_reader(&xml, |r| r.parse_pos_list(None).unwrap_err());
        assert!(matches!(err, GmlError::UnknownCrs(name) if name == "local"));

        let xml = format!("<gml:posList {} srsName=\"local\" srsDimension=\"2\">1 2</gml:posList>", GML);
        let coords = with_reader(&xml, |r| r.parse_pos_list(None).unwrap());
        assert_eq!(coords.len(), 1);
    }

    #[test]
    fn test_bad_srs_dimension() {
        let xml = format!("<gml:posList {} srsDimension=\"two\">1 2</gml:posList>", GML);
        let err = with_reader(&xml, |r| r.parse_pos_list(None).unwrap_err());
        assert!(err.to_string().contains("srsDimension"));
    }

    #[test]
    fn test_active_crs() {
        let xml = format!("<gml:Point {} srsName=\"EPSG:4326\"/>", GML);
        let inherited = Crs::new("EPSG:31467");
        let active = with_reader(&xml, |r| r.determine_active_crs(Some(&inherited)));
        assert_eq!(active.unwrap().name(), "EPSG:4326");

        let xml = format!("<gml:Point {} srsName=\"\"/>", GML);
        let active = with_reader(&xml, |r| r.determine_active_crs(Some(&inherited)));
        assert_eq!(active, Some(inherited));
    }

    #[test]
    fn test_coordinates_with_separators() {
        let xml = format!("<gml:coordinates {} cs=\";\" ts=\"|\">1;2|3;4</gml:coordinates>", GML);
        let coords = with_reader(&xml, |r| r.parse_coordinates().unwrap());
        assert_eq!(coords, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);

        let xml = format!("<gml:coordinates {} decimal=\",\">1,2</gml:coordinates>", GML);
        assert!(with_reader(&xml, |r| r.parse_coordinates()).is_err());
    }

    #[test]
    fn test_coord_ordering() {
        let xml = format!("<gml:coord {}><gml:X>1</gml:X><gml:Y>2</gml:Y><gml:Z>3</gml:Z></gml:coord>", GML);
        assert_eq!(with_reader(&xml, |r| r.parse_coord_type().unwrap()), vec![1.0, 2.0, 3.0]);

        let xml = format!("<gml:coord {}><gml:X>1</gml:X><gml:Z>3</gml:Z></gml:coord>", GML);
        assert!(with_reader(&xml, |r| r.parse_coord_type()).is_err());

        let xml = format!("<gml:coord {}><gml:Y>1</gml:Y></gml:coord>", GML);
        assert!(with_reader(&xml, |r| r.parse_coord_type()).is_err());
    }

    #[test]
    fn test_point_run_rejects_mixed_dimensions() {
        let xml = format!(
            "<gml:LineString {}><gml:pos>0 0</gml:pos><gml:pos>1 1 1</gml:pos></gml:LineString>",
            GML
        );
        let err = with_reader(&xml, |r| {
            r.xml.next_tag().unwrap();
            r.parse_control_points(None).unwrap_err()
        });
        assert!(matches!(err, GmlError::Format { ref element, .. } if element == "pos"), "{:?}", err);
    }

    #[test]
    fn test_measure_requires_uom() {
        let xml = format!("<gml:radius {} uom=\"m\">2.5</gml:radius>", GML);
        let m = with_reader(&xml, |r| r.parse_length().unwrap());
        assert_eq!(m.value, 2.5);
        assert_eq!(m.uom, "m");

        let xml = format!("<gml:radius {}>2.5</gml:radius>", GML);
        assert!(with_reader(&xml, |r| r.parse_length()).is_err());
    }

    #[test]
    fn test_orientation() {
        let plus = format!("<gml:OrientableCurve {} orientation=\"+\"/>", GML);
        assert_eq!(with_reader(&plus, |r| r.parse_orientation().unwrap()), Orientation::Forward);
        let missing = format!("<gml:OrientableCurve {}/>", GML);
        assert_eq!(with_reader(&missing, |r| r.parse_orientation().unwrap()), Orientation::Reversed);
        let bad = format!("<gml:OrientableCurve {} orientation=\"x\"/>", GML);
        assert!(with_reader(&bad, |r| r.parse_orientation()).is_err());
    }

    #[test]
    fn test_invalid_id_rejected() {
        let xml = format!("<gml:Point {} gml:id=\"0abc\"/>", GML);
        assert!(with_reader(&xml, |r| r.parse_geometry_id()).is_err());
        let xml = format!("<gml:Point {} gml:id=\"abc-1\"/>", GML);
        let id = with_reader(&xml, |r| r.parse_geometry_id().unwrap());
        assert_eq!(id.unwrap().as_str(), "abc-1");
    }
}
