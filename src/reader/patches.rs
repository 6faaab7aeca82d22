//! GML 3 surface patches.

use std::io::BufRead;

use crate::crs::Crs;
use crate::error::{GmlError, Result};
use crate::geometry::{
    GriddedKind, GriddedPatch, Member, Points, PolygonPatch, Rectangle, Ring, SurfacePatch, Triangle,
};

use super::GeometryReader;

impl<'a, R: BufRead> GeometryReader<'a, R> {
    /// Any `gml:_SurfacePatch`.
    pub fn parse_surface_patch(&mut self, crs: Option<&Crs>) -> Result<SurfacePatch> {
        self.require_gml_start("gml:_SurfacePatch")?;
        let ns = self.ns;
        let name = self.xml.local_name().to_string();
        let patch = match name.as_str() {
            "PolygonPatch" => {
                self.xml.next_tag()?;
                let mut exterior = None;
                if self.xml.is_start() && self.xml.is_element(ns, "exterior") {
                    exterior = Some(self.parse_member(crs, Self::parse_ring)?);
                    self.xml.next_tag()?;
                }
                let mut interiors = Vec::new();
                while self.xml.is_start() && self.xml.is_element(ns, "interior") {
                    interiors.push(self.parse_member(crs, Self::parse_ring)?);
                    self.xml.next_tag()?;
                }
                self.xml.require_end(ns, "PolygonPatch")?;
                SurfacePatch::Polygon(PolygonPatch { exterior, interiors })
            }
            "Rectangle" => SurfacePatch::Rectangle(Rectangle {
                exterior: self.parse_single_exterior(crs, "Rectangle")?,
            }),
            "Triangle" => SurfacePatch::Triangle(Triangle {
                exterior: self.parse_single_exterior(crs, "Triangle")?,
            }),
            "Cone" => SurfacePatch::Gridded(self.parse_gridded_patch(crs, GriddedKind::Cone)?),
            "Cylinder" => SurfacePatch::Gridded(self.parse_gridded_patch(crs, GriddedKind::Cylinder)?),
            "Sphere" => SurfacePatch::Gridded(self.parse_gridded_patch(crs, GriddedKind::Sphere)?),
            _ => return Err(self.unexpected("gml:_SurfacePatch")),
        };
        Ok(patch)
    }

    fn parse_single_exterior(&mut self, crs: Option<&Crs>, element: &str) -> Result<Member<Ring>> {
        let ns = self.ns;
        self.xml.next_start(ns, "exterior")?;
        let exterior = self.parse_member(crs, Self::parse_ring)?;
        self.xml.next_tag()?;
        self.xml.require_end(ns, element)?;
        Ok(exterior)
    }

    /// Cone, cylinder and sphere: `row`s of positions plus optional
    /// `rows`/`columns` counts that must agree with the grid.
    fn parse_gridded_patch(&mut self, crs: Option<&Crs>, kind: GriddedKind) -> Result<GriddedPatch> {
        let ns = self.ns;
        let element = kind.name();
        self.xml.next_tag()?;

        let mut rows = Vec::new();
        if self.xml.is_start() && self.xml.is_element(ns, "rows") {
            // GML 3.1 wraps the rows in a gml:rows array
            self.xml.next_tag()?;
            while self.xml.is_start() && self.xml.is_element(ns, "Row") {
                rows.push(self.parse_grid_row(crs, "Row")?);
                self.xml.next_tag()?;
            }
            self.xml.require_end(ns, "rows")?;
            self.xml.next_tag()?;
        }
        while self.xml.is_start() && self.xml.is_element(ns, "row") {
            rows.push(self.parse_grid_row(crs, "row")?);
            self.xml.next_tag()?;
        }

        let mut row_count = None;
        if self.xml.is_start() && self.xml.is_element(ns, "rows") {
            row_count = Some(self.xml.element_text_as_usize()?);
            self.xml.next_tag()?;
        }
        let mut column_count = None;
        if self.xml.is_start() && self.xml.is_element(ns, "columns") {
            column_count = Some(self.xml.element_text_as_usize()?);
            self.xml.next_tag()?;
        }
        self.xml.require_end(ns, element)?;

        let patch = GriddedPatch { kind, rows };
        if let Some(first) = patch.rows.first().map(Points::len) {
            if patch.rows.iter().any(|r| r.len() != first) {
                return Err(GmlError::format(element, "grid rows have different lengths"));
            }
        }
        if row_count.map_or(false, |n| n != patch.row_count()) {
            return Err(GmlError::format(
                element,
                format!("declared {} rows, found {}", row_count.unwrap_or_default(), patch.row_count()),
            ));
        }
        if column_count.map_or(false, |n| n != patch.column_count()) {
            return Err(GmlError::format(
                element,
                format!(
                    "declared {} columns, found {}",
                    column_count.unwrap_or_default(),
                    patch.column_count()
                ),
            ));
        }
        Ok(patch)
    }

    fn parse_grid_row(&mut self, crs: Option<&Crs>, element: &str) -> Result<Points> {
        let ns = self.ns;
        self.xml.next_tag()?;
        let points = if self.xml.is_start() && self.xml.is_element(ns, "posList") {
            let crs = self.determine_active_crs(crs);
            let coords = self.parse_pos_list(crs.as_ref())?;
            self.xml.next_tag()?;
            Points::from_coords(coords, crs.as_ref())
        } else {
            self.parse_point_run(crs, false)?
        };
        self.xml.require_end(ns, element)?;
        Ok(points)
    }
}
