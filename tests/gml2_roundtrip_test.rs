// GML 2.1 reading, writing and conversion to and from GML 3
use approx::assert_relative_eq;
use gml_geometry::geometry::{Ring, Surface};
use gml_geometry::{read_geometry, write_geometry_to_string, Geometry, GmlError, GmlVersion, WriterOptions};

const PARCEL: &str = r#"<gml:Polygon xmlns:gml="http://www.opengis.net/gml" gid="parcel" srsName="EPSG:4326">
  <gml:outerBoundaryIs><gml:LinearRing>
    <gml:coordinates>0,0 10,0 10,10 0,10 0,0</gml:coordinates>
  </gml:LinearRing></gml:outerBoundaryIs>
  <gml:innerBoundaryIs><gml:LinearRing>
    <gml:coordinates>2,2 4,2 4,4 2,2</gml:coordinates>
  </gml:LinearRing></gml:innerBoundaryIs>
</gml:Polygon>"#;

fn ring_points(ring: &Ring) -> usize {
    match ring {
        Ring::Linear(ring) => ring.points.len(),
        Ring::Curves(_) => panic!("GML 2 rings are always linear"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_with_hole_roundtrip() {
        let (geometry, ctx) = read_geometry(PARCEL, GmlVersion::Gml21).expect("Failed to read GML 2 polygon");
        assert!(ctx.get_object("parcel").is_some());

        let written = write_geometry_to_string(&geometry, &WriterOptions::new(GmlVersion::Gml21)).unwrap();
        assert!(written.contains(r#"gid="parcel""#), "{}", written);
        assert!(written.contains("<gml:outerBoundaryIs>"));
        assert!(written.contains("<gml:innerBoundaryIs>"));

        let (reparsed, _) = read_geometry(&written, GmlVersion::Gml21).expect("Failed to reparse GML 2 polygon");
        let Geometry::Surface(Surface::Polygon(polygon)) = reparsed else {
            panic!("expected a polygon");
        };
        let exterior = polygon.exterior.as_ref().and_then(|e| e.as_inline()).expect("inline exterior");
        assert_eq!(ring_points(exterior), 5);
        assert_eq!(polygon.interiors.len(), 1);
        assert_eq!(ring_points(&polygon.interiors[0].resolve().unwrap()), 4);
        println!("✓ GML 2 polygon with hole survived a round trip");
    }

    #[test]
    fn test_gml2_to_gml3() {
        let (geometry, _) = read_geometry(PARCEL, GmlVersion::Gml21).unwrap();
        let written = write_geometry_to_string(&geometry, &WriterOptions::default()).unwrap();
        assert!(written.contains(r#"gml:id="parcel""#), "{}", written);
        assert!(written.contains("<gml:exterior>"));
        assert!(written.contains("<gml:interior>"));
        assert!(written.contains("<gml:posList"));
        assert!(!written.contains("coordinates"));
    }

    #[test]
    fn test_gml3_to_gml2() {
        let xml = r#"<gml:MultiCurve xmlns:gml="http://www.opengis.net/gml">
            <gml:curveMember><gml:LineString><gml:posList>0 0 1 1</gml:posList></gml:LineString></gml:curveMember>
            <gml:curveMember><gml:LineString><gml:posList>2 2 3 3.5</gml:posList></gml:LineString></gml:curveMember>
          </gml:MultiCurve>"#;
        let (geometry, _) = read_geometry(xml, GmlVersion::Gml31).unwrap();
        let written = write_geometry_to_string(&geometry, &WriterOptions::new(GmlVersion::Gml21)).unwrap();
        assert!(written.starts_with("<gml:MultiLineString"), "{}", written);
        assert_eq!(written.matches("<gml:lineStringMember>").count(), 2);

        let (reparsed, _) = read_geometry(&written, GmlVersion::Gml21).expect("Failed to read converted document");
        let Geometry::MultiLineString(multi) = reparsed else {
            panic!("expected a MultiLineString");
        };
        let last = multi.members[1].resolve().unwrap();
        let points = last.points.resolved().unwrap();
        assert_relative_eq!(points[1].y(), 3.5);
    }

    #[test]
    fn test_segmented_curve_member_fails() {
        let xml = r#"<gml:MultiCurve xmlns:gml="http://www.opengis.net/gml"><gml:curveMember>
            <gml:Curve><gml:segments><gml:LineStringSegment><gml:posList>0 0 1 1</gml:posList></gml:LineStringSegment></gml:segments></gml:Curve>
          </gml:curveMember></gml:MultiCurve>"#;
        let (geometry, _) = read_geometry(xml, GmlVersion::Gml31).unwrap();
        let result = write_geometry_to_string(&geometry, &WriterOptions::new(GmlVersion::Gml21));
        match result {
            Err(GmlError::UnsupportedVersion { kind, .. }) => assert_eq!(kind, "Curve"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_multi_point_of_coords() {
        let xml = r#"<gml:MultiPoint xmlns:gml="http://www.opengis.net/gml">
            <gml:pointMember><gml:Point><gml:coord><gml:X>1</gml:X><gml:Y>2</gml:Y></gml:coord></gml:Point></gml:pointMember>
            <gml:pointMember><gml:Point><gml:coordinates>3,4</gml:coordinates></gml:Point></gml:pointMember>
          </gml:MultiPoint>"#;
        let (geometry, _) = read_geometry(xml, GmlVersion::Gml21).expect("Failed to read MultiPoint");
        let Geometry::MultiPoint(multi) = geometry else {
            panic!("expected a MultiPoint");
        };
        assert_eq!(multi.members.len(), 2);
        assert_eq!(multi.members[1].resolve().unwrap().coords, vec![3.0, 4.0]);
    }
}
