//! Per-face mask polygons with antimeridian repair.
//!
//! A face whose ring meets the -180 meridian is moved wholesale to the
//! eastern side by adding 360 to every longitude. The ring is not clipped at
//! the crossing, so a face that genuinely straddles the meridian ends up
//! entirely east of 180.

use tracing::debug;
use ugrid_parser::FaceGeometry;

use crate::error::{RasterError, Result};

/// Longitude of the antimeridian line tested against.
pub const ANTIMERIDIAN: f64 = -180.0;

/// Latitude span of the antimeridian segment.
const LAT_RANGE: (f64, f64) = (-90.0, 90.0);

/// Longitude shift applied to rings that meet the antimeridian.
pub const SHIFT: f64 = 360.0;

/// Closed ring of one face, possibly shifted east by 360 degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskPolygon {
    face: usize,
    ring: Vec<(f64, f64)>,
    shifted: bool,
}

impl MaskPolygon {
    /// Build the polygon of one face from its real vertex ring.
    pub fn from_ring(face: usize, ring: &[(f64, f64)]) -> Result<Self> {
        let distinct = distinct_vertices(ring);
        if distinct < 3 {
            return Err(RasterError::DegenerateGeometry { face, distinct });
        }

        if !intersects_antimeridian(ring) {
            return Ok(Self {
                face,
                ring: ring.to_vec(),
                shifted: false,
            });
        }

        let shifted: Vec<(f64, f64)> = ring.iter().map(|&(x, y)| (x + SHIFT, y)).collect();
        if intersects_antimeridian(&shifted) {
            return Err(RasterError::UnresolvedAntimeridian { face });
        }

        Ok(Self {
            face,
            ring: shifted,
            shifted: true,
        })
    }

    pub fn face(&self) -> usize {
        self.face
    }

    /// Vertices in face order. The closing edge is implicit.
    pub fn ring(&self) -> &[(f64, f64)] {
        &self.ring
    }

    /// Whether the ring was moved east by [`SHIFT`].
    pub fn is_shifted(&self) -> bool {
        self.shifted
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` of the ring.
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        self.ring.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        )
    }

    /// Even-odd point-in-polygon test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        ring_contains(&self.ring, x, y)
    }
}

fn ring_contains(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    let mut inside = false;
    let Some(&last) = ring.last() else {
        return false;
    };
    let (mut xj, mut yj) = last;
    for &(xi, yi) in ring {
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        (xj, yj) = (xi, yi);
    }
    inside
}

/// Build one mask polygon per face, in face order.
///
/// Fails on the first degenerate face; no partial set is returned.
pub fn build_mask_polygons(geometry: &FaceGeometry) -> Result<Vec<MaskPolygon>> {
    let polygons = geometry
        .rings()
        .enumerate()
        .map(|(face, ring)| MaskPolygon::from_ring(face, ring))
        .collect::<Result<Vec<_>>>()?;

    let shifted = polygons.iter().filter(|p| p.is_shifted()).count();
    debug!(faces = polygons.len(), shifted, "Built mask polygons");

    Ok(polygons)
}

/// Whether the filled ring meets the segment `x = -180, -90 <= y <= 90`.
///
/// Vertices lying on the meridian count as touching it. Works for concave
/// rings: either an edge meets the segment, or the segment lies wholly
/// inside or wholly outside the ring.
pub fn intersects_antimeridian(ring: &[(f64, f64)]) -> bool {
    let (lat_min, lat_max) = LAT_RANGE;
    let n = ring.len();

    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        let (d0, d1) = (x0 - ANTIMERIDIAN, x1 - ANTIMERIDIAN);

        let (lo, hi) = if d0 == 0.0 && d1 == 0.0 {
            (y0.min(y1), y0.max(y1))
        } else if d0 * d1 <= 0.0 {
            let y = y0 + (y1 - y0) * (d0 / (d0 - d1));
            (y, y)
        } else {
            continue;
        };
        if lo <= lat_max && hi >= lat_min {
            return true;
        }
    }

    ring_contains(ring, ANTIMERIDIAN, (lat_min + lat_max) / 2.0)
}

fn distinct_vertices(ring: &[(f64, f64)]) -> usize {
    let mut keys: Vec<(u64, u64)> = ring.iter().map(|&(x, y)| (x.to_bits(), y.to_bits())).collect();
    keys.sort_unstable();
    keys.dedup();
    keys.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_away_from_meridian_is_untouched() {
        let ring = [(10.1, 0.3), (11.7, 0.3), (10.9, 1.9)];
        let poly = MaskPolygon::from_ring(4, &ring).unwrap();
        assert!(!poly.is_shifted());
        assert_eq!(poly.face(), 4);
        for (a, b) in poly.ring().iter().zip(ring.iter()) {
            assert_eq!(a.0.to_bits(), b.0.to_bits());
            assert_eq!(a.1.to_bits(), b.1.to_bits());
        }
    }

    #[test]
    fn test_ring_touching_meridian_is_shifted() {
        let ring = [(-180.0, -10.0), (-170.0, -10.0), (-180.0, 10.0)];
        let poly = MaskPolygon::from_ring(0, &ring).unwrap();
        assert!(poly.is_shifted());
        assert!(poly.ring().iter().all(|&(x, _)| x >= 180.0));
        assert!(!intersects_antimeridian(poly.ring()));
    }

    #[test]
    fn test_straddling_ring_moves_east() {
        let ring = [(-185.0, 0.0), (-175.0, 0.0), (-180.0, 5.0)];
        assert!(intersects_antimeridian(&ring));
        let poly = MaskPolygon::from_ring(0, &ring).unwrap();
        assert_eq!(poly.ring(), &[(175.0, 0.0), (185.0, 0.0), (180.0, 5.0)]);
    }

    #[test]
    fn test_crossing_outside_latitude_range() {
        let ring = [(-185.0, 95.0), (-175.0, 95.0), (-180.0, 100.0)];
        assert!(!intersects_antimeridian(&ring));

        // spans the whole segment without a vertex inside it
        let tall = [(-185.0, -100.0), (-175.0, -100.0), (-175.0, 100.0), (-185.0, 100.0)];
        assert!(intersects_antimeridian(&tall));
    }

    #[test]
    fn test_concave_rings() {
        // C opening east: the western bar holds the whole segment, and no
        // edge meets -180 within +-90
        let ring = [
            (-185.0, -100.0),
            (-170.0, -100.0),
            (-170.0, -95.0),
            (-178.0, -95.0),
            (-178.0, 95.0),
            (-170.0, 95.0),
            (-170.0, 100.0),
            (-185.0, 100.0),
        ];
        assert!(intersects_antimeridian(&ring));

        // C opening west: both arms cross -180 beyond +-90, and the segment
        // runs through the gap between them
        let ring = [
            (-190.0, -100.0),
            (-175.0, -100.0),
            (-175.0, 100.0),
            (-190.0, 100.0),
            (-190.0, 95.0),
            (-178.0, 95.0),
            (-178.0, -95.0),
            (-190.0, -95.0),
        ];
        assert!(!intersects_antimeridian(&ring));
    }

    #[test]
    fn test_positive_180_does_not_count() {
        let ring = [(170.0, 0.0), (180.0, 0.0), (180.0, 10.0)];
        assert!(!intersects_antimeridian(&ring));
    }

    #[test]
    fn test_degenerate_rings() {
        let err = MaskPolygon::from_ring(7, &[(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]).unwrap_err();
        assert!(matches!(
            err,
            RasterError::DegenerateGeometry { face: 7, distinct: 2 }
        ));
        assert!(MaskPolygon::from_ring(0, &[(0.0, 0.0), (0.0, 0.0), (0.0, 0.0)]).is_err());
    }

    #[test]
    fn test_unresolvable_ring() {
        let ring = [(-540.0, 0.0), (-530.0, 0.0), (-180.0, 5.0)];
        assert!(matches!(
            MaskPolygon::from_ring(2, &ring),
            Err(RasterError::UnresolvedAntimeridian { face: 2 })
        ));
    }

    #[test]
    fn test_contains() {
        let poly = MaskPolygon::from_ring(0, &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]).unwrap();
        assert!(poly.contains(2.0, 2.0));
        assert!(!poly.contains(5.0, 2.0));
        assert_eq!(poly.extent(), (0.0, 0.0, 4.0, 4.0));
        assert!(!ring_contains(&[], 0.0, 0.0));
    }
}
