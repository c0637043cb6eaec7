use serde::{Deserialize, Serialize};

use crate::camera::{self, ZoomState, ZoomTransition};
use crate::error::{GeoError, GeoResult};
use crate::grid::{SegmentsInfo, SurfaceGrid};
use crate::tile::{Tile, TileAddress, TileEncoder, TileTransform};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeOptions {
    /// Geometric radius of the tessellated sphere.
    pub base_radius: f64,
    /// Imagery zoom level every tile is addressed at.
    pub tile_zoom: u8,
    pub initial_scale: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    pub rotation_step_degrees: f64,
}

impl Default for GlobeOptions {
    fn default() -> Self {
        Self {
            base_radius: 0.5,
            tile_zoom: 4,
            initial_scale: 1.0,
            min_radius: 1.0,
            max_radius: 2.0,
            rotation_step_degrees: 1.0,
        }
    }
}

pub struct GlobeMesh {
    grid: SurfaceGrid,
    options: GlobeOptions,
    zoom: ZoomState,
    aspect_ratio: f64,
    rotation_timer: f64,
    transform: TileTransform,
    tiles: Vec<Tile>,
}

impl GlobeMesh {
    pub fn new(segments: SegmentsInfo, options: GlobeOptions) -> GeoResult<Self> {
        if !(options.base_radius.is_finite() && options.base_radius > 0.0) {
            return Err(GeoError::InvalidRadius(options.base_radius));
        }
        let mut mesh = Self {
            grid: SurfaceGrid::new(segments),
            zoom: ZoomState::new(options.initial_scale, options.min_radius, options.max_radius),
            options,
            aspect_ratio: 1.0,
            rotation_timer: 0.0,
            transform: TileTransform::default(),
            tiles: Vec::with_capacity(segments.tile_count()),
        };
        mesh.update_tiles();
        Ok(mesh)
    }

    pub fn segments(&self) -> SegmentsInfo {
        self.grid.segments()
    }

    pub fn grid(&self) -> &SurfaceGrid {
        &self.grid
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    pub fn scale(&self) -> f64 {
        self.zoom.scale()
    }

    pub fn radius(&self) -> f64 {
        self.zoom.radius()
    }

    /// Geometric radius of the tiles at the current zoom level. `base_radius`
    /// is the size at `min_radius` and doubles with every level.
    pub fn tile_radius(&self) -> f64 {
        self.options.base_radius * self.zoom.radius() / self.zoom.min_radius()
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn rotation_timer(&self) -> f64 {
        self.rotation_timer
    }

    pub fn transform(&self) -> &TileTransform {
        &self.transform
    }

    /// Texture keys of every tile, in tile order.
    pub fn texture_keys(&self) -> Vec<String> {
        (0..self.segments().tile_count())
            .map(|index| self.address_for(index).texture_key())
            .collect()
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect_ratio = f64::from(height) / f64::from(width.max(1));
    }

    pub fn apply_scroll(&mut self, delta: f64) -> Option<ZoomTransition> {
        self.zoom.apply_scroll(delta)
    }

    pub fn advance_frame(&mut self) {
        self.rotation_timer += self.options.rotation_step_degrees;
    }

    /// Drops every tile and rebuilds them under the current camera.
    pub fn update_tiles(&mut self) {
        self.transform = TileTransform {
            model: camera::model(&self.zoom, self.rotation_timer),
            projection: camera::projection(self.aspect_ratio),
        };
        let radius = self.tile_radius();
        let tiles: Vec<Tile> = self
            .grid
            .cells()
            .map(|(index, corners)| {
                Tile::new(corners, self.address_for(index), radius, self.transform)
            })
            .collect();
        self.tiles = tiles;
    }

    pub fn draw(&self, encoder: &mut impl TileEncoder) {
        for (index, tile) in self.tiles.iter().enumerate() {
            encoder.encode_tile(index, tile);
        }
    }

    fn address_for(&self, index: usize) -> TileAddress {
        let segments = self.segments();
        TileAddress::for_index(
            self.options.tile_zoom,
            index,
            segments.u_parts(),
            segments.v_parts(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(u: u32, v: u32) -> GlobeMesh {
        GlobeMesh::new(SegmentsInfo::new(u, v).unwrap(), GlobeOptions::default()).unwrap()
    }

    #[derive(Default)]
    struct RecordingEncoder {
        indices: Vec<usize>,
        keys: Vec<String>,
    }

    impl TileEncoder for RecordingEncoder {
        fn encode_tile(&mut self, index: usize, tile: &Tile) {
            self.indices.push(index);
            self.keys.push(tile.texture_key());
        }
    }

    #[test]
    fn rejects_degenerate_radius() {
        let options = GlobeOptions {
            base_radius: 0.0,
            ..GlobeOptions::default()
        };
        let result = GlobeMesh::new(SegmentsInfo::new(4, 4).unwrap(), options);
        assert!(matches!(result, Err(GeoError::InvalidRadius(_))));
    }

    #[test]
    fn tile_count_holds_across_updates() {
        let mut globe = mesh(16, 16);
        assert_eq!(globe.tiles().len(), 256);
        for delta in [0.3, -0.1, -0.9, 0.05, 2.0, 0.0] {
            globe.apply_scroll(delta);
            globe.advance_frame();
            globe.update_tiles();
            assert_eq!(globe.tiles().len(), 256);
            let expected = 0.5 * globe.radius();
            assert!(globe.tiles().iter().all(|tile| tile.radius() == expected));
        }

        let mut globe = mesh(3, 7);
        globe.update_tiles();
        assert_eq!(globe.tiles().len(), 21);
    }

    #[test]
    fn tiles_share_the_frame_transform() {
        let mut globe = mesh(4, 4);
        globe.set_viewport(800, 400);
        globe.apply_scroll(-0.2);
        globe.advance_frame();
        globe.update_tiles();
        let transform = *globe.transform();
        assert!(globe.tiles().iter().all(|tile| *tile.transform() == transform));
        assert_eq!(transform.projection, camera::projection(0.5));
        assert_eq!(globe.rotation_timer(), 1.0);
    }

    #[test]
    fn scroll_drives_zoom_levels() {
        let mut globe = mesh(2, 2);
        assert_eq!(globe.apply_scroll(0.0), None);
        assert_eq!(globe.radius(), 1.0);
        assert!(globe.apply_scroll(0.5).is_some());
        assert_eq!((globe.scale(), globe.radius()), (1.0, 2.0));
        globe.apply_scroll(-0.5);
        assert_eq!(globe.radius(), 2.0);
        assert!(globe.apply_scroll(-0.5).is_some());
        assert_eq!((globe.scale(), globe.radius()), (0.5, 1.0));
    }

    #[test]
    fn zoom_level_change_resizes_tile_geometry() {
        let mut globe = mesh(2, 2);
        let before = globe.tiles()[0].vertices()[0].position;
        assert_eq!(globe.tile_radius(), 0.5);

        assert!(globe.apply_scroll(0.5).is_some());
        globe.update_tiles();
        assert_eq!(globe.tile_radius(), 1.0);
        let after = globe.tiles()[0].vertices()[0].position;
        for axis in 0..3 {
            assert!((after[axis] - 2.0 * before[axis]).abs() < 1e-6);
        }

        globe.apply_scroll(-0.5);
        assert!(globe.apply_scroll(-0.5).is_some());
        globe.update_tiles();
        assert!(globe.tiles().iter().all(|tile| tile.radius() == 0.5));
    }

    #[test]
    fn draw_visits_every_tile_in_order() {
        let globe = mesh(2, 2);
        let mut encoder = RecordingEncoder::default();
        globe.draw(&mut encoder);
        assert_eq!(encoder.indices, vec![0, 1, 2, 3]);
        assert_eq!(
            encoder.keys,
            vec!["4-0-0_rect.png", "4-1-0_rect.png", "4-0-1_rect.png", "4-1-1_rect.png"]
        );
        assert_eq!(globe.texture_keys(), encoder.keys);
    }

    #[test]
    fn viewport_aspect_is_height_over_width() {
        let mut globe = mesh(1, 1);
        globe.set_viewport(1000, 500);
        assert_eq!(globe.aspect_ratio(), 0.5);
        globe.set_viewport(0, 300);
        assert_eq!(globe.aspect_ratio(), 300.0);
    }
}
