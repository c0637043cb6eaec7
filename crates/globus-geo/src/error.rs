use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("segment counts must be positive (got {u_parts}x{v_parts})")]
    InvalidSegments { u_parts: u32, v_parts: u32 },
    #[error("lattice of {points} points cannot be addressed with 16-bit indices")]
    LatticeTooLarge { points: usize },
    #[error("globe radius must be positive and finite (got {0})")]
    InvalidRadius(f64),
}

pub type GeoResult<T> = Result<T, GeoError>;
