use bytemuck::{Pod, Zeroable};
use glam::{DMat4, Vec4};
use serde::{Deserialize, Serialize};

use crate::grid::ParamVertex;
use crate::parameterization;

/// Two triangles over the corner slots.
pub const TILE_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

/// Texture coordinates for bottom-right, bottom-left, top-right, top-left.
pub const CORNER_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileAddress {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileAddress {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Address of the quad at `tile_index` in row-major lattice order.
    pub fn for_index(zoom: u8, tile_index: usize, u_parts: u32, v_parts: u32) -> Self {
        let index = tile_index as u32;
        Self {
            zoom,
            x: index % u_parts,
            y: index / v_parts,
        }
    }

    pub fn texture_key(&self) -> String {
        format!("{}-{}-{}_rect.png", self.zoom, self.x, self.y)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TileVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub model: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
}

/// Shared by every tile of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileTransform {
    pub model: DMat4,
    pub projection: DMat4,
}

impl TileTransform {
    pub fn clip(&self) -> DMat4 {
        self.projection * self.model
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            model: self.model.as_mat4().to_cols_array_2d(),
            proj: self.projection.as_mat4().to_cols_array_2d(),
        }
    }
}

impl Default for TileTransform {
    fn default() -> Self {
        Self {
            model: DMat4::IDENTITY,
            projection: DMat4::IDENTITY,
        }
    }
}

/// One lattice cell. Corner order is fixed for the life of the tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    corners: [ParamVertex; 4],
    address: TileAddress,
    radius: f64,
    transform: TileTransform,
    vertices: [TileVertex; 4],
}

impl Tile {
    pub fn new(
        corners: [ParamVertex; 4],
        address: TileAddress,
        radius: f64,
        transform: TileTransform,
    ) -> Self {
        let vertices = std::array::from_fn(|slot| {
            let corner = corners[slot];
            let position = parameterization::position(corner.u, corner.v, radius);
            TileVertex {
                position: position.as_vec3().to_array(),
                normal: parameterization::normal(position).as_vec3().to_array(),
                uv: CORNER_UVS[slot],
            }
        });
        Self {
            corners,
            address,
            radius,
            transform,
            vertices,
        }
    }

    pub fn corners(&self) -> &[ParamVertex; 4] {
        &self.corners
    }

    pub fn address(&self) -> TileAddress {
        self.address
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn transform(&self) -> &TileTransform {
        &self.transform
    }

    pub fn vertices(&self) -> &[TileVertex; 4] {
        &self.vertices
    }

    pub fn indices(&self) -> &'static [u16; 6] {
        &TILE_INDICES
    }

    pub fn texture_key(&self) -> String {
        self.address.texture_key()
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        self.transform.uniform()
    }

    /// Corner positions after the full transform, before the perspective divide.
    pub fn projected_corners(&self) -> [Vec4; 4] {
        let clip = self.transform.clip();
        std::array::from_fn(|slot| {
            let corner = self.corners[slot];
            let position = parameterization::position(corner.u, corner.v, self.radius);
            (clip * position.extend(1.0)).as_vec4()
        })
    }
}

/// Receives each tile of a frame, in tile-index order.
pub trait TileEncoder {
    fn encode_tile(&mut self, index: usize, tile: &Tile);
}
