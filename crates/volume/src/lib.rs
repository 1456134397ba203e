//! Volume Generator: seeded simplex noise baked into an RGBA8 density grid.
//!
//! # Invariants
//! - Same seed, dimensions and channel policy produce a byte-identical grid.
//! - A grid is immutable once generated.

mod error;
pub mod generator;
pub mod grid;
pub mod noise;

pub use error::VolumeError;
pub use generator::{VolumeGenerator, density_byte, generate};
pub use grid::{CHANNELS, VolumeDims, VolumeGrid};
pub use noise::{FALLBACK_SEED, NoiseSeed, Simplex3};
pub use volray_common::ChannelFillPolicy;

pub fn crate_info() -> &'static str {
    "volray-volume v0.1.0"
}
