//! Tests for BoundingBox parsing and geometry helpers.

use mesh_common::bbox::{BboxParseError, BoundingBox};

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-180.0, -85.0, 180.0, 85.0);
    assert_eq!(bbox.min_x, -180.0);
    assert_eq!(bbox.min_y, -85.0);
    assert_eq!(bbox.max_x, 180.0);
    assert_eq!(bbox.max_y, 85.0);
    assert_eq!(bbox.width(), 360.0);
    assert_eq!(bbox.height(), 170.0);
}

// ============================================================================
// from_csv tests
// ============================================================================

#[test]
fn test_parse_csv_with_spaces() {
    let bbox = BoundingBox::from_csv(" 160, -10 , 200,10").unwrap();
    assert_eq!(bbox, BoundingBox::new(160.0, -10.0, 200.0, 10.0));
}

#[test]
fn test_parse_csv_wrong_count() {
    assert!(matches!(
        BoundingBox::from_csv("1,2,3"),
        Err(BboxParseError::InvalidFormat(_))
    ));
}

#[test]
fn test_parse_csv_bad_number() {
    assert!(matches!(
        BoundingBox::from_csv("a,0,1,1"),
        Err(BboxParseError::InvalidNumber(_))
    ));
}

#[test]
fn test_parse_csv_inverted() {
    assert!(matches!(
        BoundingBox::from_csv("10,0,0,10"),
        Err(BboxParseError::Inverted(_))
    ));
}

// ============================================================================
// Geometry tests
// ============================================================================

#[test]
fn test_contains_point_edges() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(bbox.contains_point(0.0, 0.0));
    assert!(bbox.contains_point(10.0, 10.0));
    assert!(!bbox.contains_point(10.01, 5.0));
}

#[test]
fn test_intersects_across_dateline_extent() {
    let shifted = BoundingBox::new(180.0, -10.0, 190.0, 10.0);
    assert!(!BoundingBox::web_tiles().intersects(&shifted));
    assert!(BoundingBox::new(160.0, -10.0, 200.0, 10.0).intersects(&shifted));
}
