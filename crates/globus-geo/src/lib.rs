pub mod camera;
pub mod error;
pub mod frame;
pub mod globe;
pub mod grid;
pub mod input;
pub mod parameterization;
pub mod texture;
pub mod tile;

pub use camera::{ZoomState, ZoomTransition};
pub use error::{GeoError, GeoResult};
pub use frame::FrameCounter;
pub use globe::{GlobeMesh, GlobeOptions};
pub use grid::{ParamVertex, SegmentsInfo, SurfaceGrid, LIMIT_ANGLE};
pub use input::ScrollMailbox;
pub use texture::{CacheEntry, PreloadStats, TextureCache, TextureLoader};
pub use tile::{CameraUniform, Tile, TileAddress, TileEncoder, TileTransform, TileVertex};
