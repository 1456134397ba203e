use crate::grid::VolumeDims;

/// Errors from volume generation.
#[derive(Debug, thiserror::Error)]
pub enum VolumeError {
    #[error("noise seed {0} out of range (expected 0..=65535)")]
    NoiseSeedInvalid(u64),
    #[error("volume dimensions must be non-zero, got {0:?}")]
    EmptyDimensions(VolumeDims),
    #[error("volume dimensions {0:?} exceed the {max} cell edge limit", max = volray_common::MAX_GRID_SIZE)]
    TooLarge(VolumeDims),
}
