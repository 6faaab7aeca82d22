// xlink:href resolution on read and object sharing on write
use std::sync::Arc;

use gml_geometry::geometry::{Aggregate, LinearRing, Member, Point, Points, Polygon, Ring, Surface};
use gml_geometry::{
    read_geometry, write_geometry_to_string, ExportedIds, Geometry, GeometryId, GeometryWriter, GmlError, GmlVersion,
    WriterOptions,
};

const NS: &str = r#"xmlns:gml="http://www.opengis.net/gml" xmlns:xlink="http://www.w3.org/1999/xlink""#;

fn ring(id: Option<&str>, coords: Vec<Vec<f64>>) -> Ring {
    Ring::Linear(Arc::new(LinearRing {
        id: id.map(|id| GeometryId::new(id).unwrap()),
        crs: None,
        points: Points::from_coords(coords, None),
    }))
}

fn polygon_with_shared_hole() -> Geometry {
    let exterior = ring(
        None,
        vec![vec![0.0, 0.0], vec![10.0, 0.0], vec![10.0, 10.0], vec![0.0, 10.0], vec![0.0, 0.0]],
    );
    let hole = ring(
        Some("hole"),
        vec![vec![2.0, 2.0], vec![4.0, 2.0], vec![4.0, 4.0], vec![2.0, 2.0]],
    );
    Geometry::Surface(Surface::Polygon(Arc::new(Polygon {
        id: Some(GeometryId::new("poly").unwrap()),
        crs: None,
        exterior: Some(Member::Inline(exterior)),
        interiors: vec![Member::Inline(hole.clone()), Member::Inline(hole)],
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_ring_written_once() {
        let written = write_geometry_to_string(&polygon_with_shared_hole(), &WriterOptions::default()).unwrap();
        assert_eq!(written.matches(r#"gml:id="hole""#).count(), 1, "{}", written);
        assert!(written.contains(r##"<gml:interior xlink:href="#hole"/>"##), "{}", written);
        println!("✓ Shared interior ring exported once");
    }

    #[test]
    fn test_shared_ring_reads_back_as_one_object() {
        let written = write_geometry_to_string(&polygon_with_shared_hole(), &WriterOptions::default()).unwrap();
        let (geometry, ctx) = read_geometry(&written, GmlVersion::Gml31).expect("Failed to reparse polygon");
        assert!(ctx.get_object("hole").is_some());
        assert!(ctx.get_object("poly").is_some());

        let Geometry::Surface(Surface::Polygon(polygon)) = geometry else {
            panic!("expected a polygon");
        };
        assert_eq!(polygon.interiors.len(), 2);
        let first = polygon.interiors[0].resolve().unwrap();
        let second = polygon.interiors[1].resolve().unwrap();
        assert!(matches!(polygon.interiors[1], Member::Reference(_)));
        assert!(first.ptr_eq(&second), "both interiors should be the same ring");
    }

    #[test]
    fn test_forward_reference_resolves() {
        let xml = format!(
            r##"<gml:MultiGeometry {}>
                 <gml:geometryMember xlink:href="#p2"/>
                 <gml:geometryMember><gml:Point gml:id="p2"><gml:pos>3 4</gml:pos></gml:Point></gml:geometryMember>
               </gml:MultiGeometry>"##,
            NS
        );
        let (geometry, ctx) = read_geometry(&xml, GmlVersion::Gml31).expect("Failed to read MultiGeometry");
        assert_eq!(ctx.references().len(), 1);
        let Geometry::MultiGeometry(multi) = geometry else {
            panic!("expected a MultiGeometry");
        };
        match multi.members[0].resolve().unwrap() {
            Geometry::Point(point) => assert_eq!(point.coords, vec![3.0, 4.0]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dangling_reference_fails_on_use() {
        let xml = format!(
            r##"<gml:MultiPoint {}><gml:pointMember xlink:href="#missing"/></gml:MultiPoint>"##,
            NS
        );
        let (geometry, _) = read_geometry(&xml, GmlVersion::Gml31).expect("dangling references are legal");
        let Geometry::MultiPoint(multi) = geometry else {
            panic!("expected a MultiPoint");
        };
        assert!(matches!(multi.members[0].resolve(), Err(GmlError::UnresolvedReference(_))));
    }

    #[test]
    fn test_reference_to_wrong_kind() {
        let xml = format!(
            r##"<gml:MultiGeometry {}>
                 <gml:geometryMember><gml:LineString gml:id="l1"><gml:posList>0 0 1 1</gml:posList></gml:LineString></gml:geometryMember>
                 <gml:geometryMember><gml:MultiPoint><gml:pointMember xlink:href="#l1"/></gml:MultiPoint></gml:geometryMember>
               </gml:MultiGeometry>"##,
            NS
        );
        let (geometry, _) = read_geometry(&xml, GmlVersion::Gml31).unwrap();
        let Geometry::MultiGeometry(multi) = geometry else {
            panic!("expected a MultiGeometry");
        };
        let Some(Geometry::MultiPoint(points)) = multi.members[1].as_inline() else {
            panic!("expected a MultiPoint member");
        };
        match points.members[0].resolve() {
            Err(GmlError::ReferenceMismatch { expected, found, .. }) => {
                assert_eq!(expected, "Point");
                assert_eq!(found, "LineString");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_id_fails() {
        let xml = format!(
            r#"<gml:MultiPoint {}>
                 <gml:pointMember><gml:Point gml:id="p"><gml:pos>1 1</gml:pos></gml:Point></gml:pointMember>
                 <gml:pointMember><gml:Point gml:id="p"><gml:pos>2 2</gml:pos></gml:Point></gml:pointMember>
               </gml:MultiPoint>"#,
            NS
        );
        assert!(matches!(read_geometry(&xml, GmlVersion::Gml31), Err(GmlError::DuplicateId(id)) if id == "p"));
    }

    #[test]
    fn test_property_with_href_and_content_fails() {
        let xml = format!(
            r##"<gml:MultiPoint {}><gml:pointMember xlink:href="#p"><gml:Point><gml:pos>1 1</gml:pos></gml:Point></gml:pointMember></gml:MultiPoint>"##,
            NS
        );
        assert!(read_geometry(&xml, GmlVersion::Gml31).is_err());
    }

    #[test]
    fn test_session_shares_ids_across_geometries() {
        let shared = Point {
            id: Some(GeometryId::new("shared").unwrap()),
            crs: None,
            coords: vec![1.0, 2.0],
        };
        let point = Geometry::Point(shared.clone());
        let multi = Geometry::MultiPoint(Arc::new(Aggregate::new(vec![Member::Inline(shared)])));

        let options = WriterOptions {
            declare_namespaces: false,
            ..Default::default()
        };
        let mut exported = ExportedIds::new();
        let mut writer = GeometryWriter::new(Vec::new(), &options, &mut exported);
        writer.write(&point).unwrap();
        writer.write(&multi).unwrap();
        let xml = String::from_utf8(writer.finish().unwrap()).unwrap();

        assert!(exported.contains("shared"));
        assert!(xml.contains(r##"<gml:pointMember xlink:href="#shared"/>"##), "{}", xml);
    }

    #[test]
    fn test_self_reference_left_unresolved() {
        let xml = format!(
            r##"<gml:MultiGeometry {} gml:id="m"><gml:geometryMember xlink:href="#m"/></gml:MultiGeometry>"##,
            NS
        );
        let (geometry, ctx) = read_geometry(&xml, GmlVersion::Gml31).expect("cycles are reported, not fatal");
        assert!(!ctx.references()[0].is_resolved());
        assert_eq!(geometry.dimension(), 2);
        let options = WriterOptions {
            simple_features: true,
            ..Default::default()
        };
        assert!(matches!(
            write_geometry_to_string(&geometry, &options),
            Err(GmlError::UnresolvedReference(href)) if href == "#m"
        ));
    }
}
