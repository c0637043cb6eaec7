use std::f64::consts::{PI, TAU};

use serde::Serialize;

use crate::error::{GeoError, GeoResult};

/// Polar coverage of the lattice. Keeps tiles off the degenerate pole rows.
pub const LIMIT_ANGLE: f64 = 1.484_422_233_21;

/// Polar angle of the first lattice row.
pub fn start_u() -> f64 {
    (PI - 2.0 * LIMIT_ANGLE) * 0.5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentsInfo {
    u_parts: u32,
    v_parts: u32,
}

impl SegmentsInfo {
    pub fn new(u_parts: u32, v_parts: u32) -> GeoResult<Self> {
        if u_parts == 0 || v_parts == 0 {
            return Err(GeoError::InvalidSegments { u_parts, v_parts });
        }
        let points = (u_parts as usize + 1) * (v_parts as usize + 1);
        if points > usize::from(u16::MAX) + 1 {
            return Err(GeoError::LatticeTooLarge { points });
        }
        Ok(Self { u_parts, v_parts })
    }

    pub fn u_parts(&self) -> u32 {
        self.u_parts
    }

    pub fn v_parts(&self) -> u32 {
        self.v_parts
    }

    pub fn lattice_len(&self) -> usize {
        (self.u_parts as usize + 1) * (self.v_parts as usize + 1)
    }

    pub fn tile_count(&self) -> usize {
        self.u_parts as usize * self.v_parts as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamVertex {
    pub u: f64,
    pub v: f64,
}

pub fn lattice(segments: SegmentsInfo) -> Vec<ParamVertex> {
    let u_step = LIMIT_ANGLE * 2.0 / f64::from(segments.u_parts);
    let v_step = TAU / f64::from(segments.v_parts);
    let start = start_u();
    let mut vertices = Vec::with_capacity(segments.lattice_len());
    for ui in 0..=segments.u_parts {
        for vi in 0..=segments.v_parts {
            vertices.push(ParamVertex {
                u: start + f64::from(ui) * u_step,
                v: f64::from(vi) * v_step,
            });
        }
    }
    vertices
}

/// Four lattice indices per cell, in tile corner order.
pub fn quad_indices(segments: SegmentsInfo) -> Vec<u16> {
    let row = segments.v_parts as u16 + 1;
    let mut indices = Vec::with_capacity(segments.tile_count() * 4);
    let mut index: u16 = 0;
    for _ in 0..segments.u_parts {
        for _ in 0..segments.v_parts {
            indices.extend_from_slice(&[index, index + 1, index + row, index + row + 1]);
            index += 1;
        }
        // skip the wrap column
        index += 1;
    }
    indices
}

/// Immutable parameter lattice plus its quad grouping.
#[derive(Debug, Clone)]
pub struct SurfaceGrid {
    segments: SegmentsInfo,
    vertices: Vec<ParamVertex>,
    quads: Vec<u16>,
}

impl SurfaceGrid {
    pub fn new(segments: SegmentsInfo) -> Self {
        Self {
            segments,
            vertices: lattice(segments),
            quads: quad_indices(segments),
        }
    }

    pub fn segments(&self) -> SegmentsInfo {
        self.segments
    }

    pub fn vertices(&self) -> &[ParamVertex] {
        &self.vertices
    }

    pub fn quad_indices(&self) -> &[u16] {
        &self.quads
    }

    /// Corners of every cell in row-major order, keyed by tile index.
    pub fn cells(&self) -> impl Iterator<Item = (usize, [ParamVertex; 4])> + '_ {
        self.quads.chunks_exact(4).enumerate().map(|(tile_index, quad)| {
            let corner = |slot: usize| self.vertices[usize::from(quad[slot])];
            (tile_index, [corner(0), corner(1), corner(2), corner(3)])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_or_oversized_segments() {
        assert_eq!(
            SegmentsInfo::new(0, 4),
            Err(GeoError::InvalidSegments { u_parts: 0, v_parts: 4 })
        );
        assert!(matches!(
            SegmentsInfo::new(300, 300),
            Err(GeoError::LatticeTooLarge { .. })
        ));
        assert!(SegmentsInfo::new(255, 255).is_ok());
    }

    #[test]
    fn lattice_and_index_counts() {
        for (u, v) in [(1, 1), (2, 3), (16, 16), (7, 2)] {
            let segments = SegmentsInfo::new(u, v).unwrap();
            assert_eq!(lattice(segments).len(), ((u + 1) * (v + 1)) as usize);
            assert_eq!(quad_indices(segments).len(), (4 * u * v) as usize);
        }
    }

    #[test]
    fn polar_angles_stay_off_the_poles() {
        let segments = SegmentsInfo::new(16, 16).unwrap();
        let start = start_u();
        for vertex in lattice(segments) {
            assert!(vertex.u > 0.0 && vertex.u < PI);
            assert!(vertex.u >= start - 1e-12);
            assert!(vertex.u <= start + 2.0 * LIMIT_ANGLE + 1e-12);
            assert!(vertex.v >= 0.0 && vertex.v <= TAU + 1e-12);
        }
    }

    #[test]
    fn quads_reference_adjacent_lattice_points() {
        let segments = SegmentsInfo::new(3, 4).unwrap();
        let indices = quad_indices(segments);
        assert_eq!(&indices[..4], &[0, 1, 5, 6]);
        // first cell of the second row skips the wrap column
        assert_eq!(&indices[16..20], &[5, 6, 10, 11]);
        let max = *indices.iter().max().unwrap();
        assert!(usize::from(max) < segments.lattice_len());
    }

    #[test]
    fn cells_follow_quad_order() {
        let grid = SurfaceGrid::new(SegmentsInfo::new(2, 2).unwrap());
        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(cells.len(), 4);
        let (index, corners) = cells[3];
        assert_eq!(index, 3);
        let [bottom_right, bottom_left, top_right, top_left] = corners;
        assert!(bottom_left.v > bottom_right.v);
        assert!(top_right.u > bottom_right.u);
        assert_eq!(top_left.u, top_right.u);
        assert_eq!(top_left.v, bottom_left.v);
    }
}
