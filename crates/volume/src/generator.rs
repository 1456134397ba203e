use crate::grid::{CHANNELS, VolumeDims, VolumeGrid};
use crate::noise::{NoiseSeed, Simplex3};
use crate::VolumeError;
use volray_common::{ChannelFillPolicy, EngineConfig, MAX_GRID_SIZE};

/// Grid coordinates are divided by this before sampling noise.
pub const NOISE_SCALE: f64 = 100.0;

/// Map a signed noise sample to a channel byte: scale by 256, truncate toward
/// zero, keep the low eight bits. Negative densities wrap into the upper half.
pub fn density_byte(sample: f64) -> u8 {
    (sample * 256.0) as i64 as u8
}

/// Produces the density volume once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeGenerator {
    pub seed: NoiseSeed,
    pub dims: VolumeDims,
    pub policy: ChannelFillPolicy,
}

impl Default for VolumeGenerator {
    fn default() -> Self {
        Self {
            seed: NoiseSeed::default(),
            dims: VolumeDims::default(),
            policy: ChannelFillPolicy::Uniform,
        }
    }
}

impl VolumeGenerator {
    pub fn new(seed: NoiseSeed) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Seed, grid size and channel policy from the engine config. An out-of-range
    /// seed falls back to the fixed default.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            seed: NoiseSeed::or_fallback(config.seed),
            dims: VolumeDims::cube(config.grid_size),
            policy: config.channel_fill,
        }
    }

    pub fn with_dims(mut self, dims: VolumeDims) -> Self {
        self.dims = dims;
        self
    }

    pub fn with_policy(mut self, policy: ChannelFillPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn generate(&self) -> Result<VolumeGrid, VolumeError> {
        generate(self.seed, self.dims, self.policy)
    }
}

/// Fill a grid by sampling seeded simplex noise at `cell / 100`.
pub fn generate(
    seed: NoiseSeed,
    dims: VolumeDims,
    policy: ChannelFillPolicy,
) -> Result<VolumeGrid, VolumeError> {
    if dims.is_empty() {
        return Err(VolumeError::EmptyDimensions(dims));
    }
    if dims.max_edge() > MAX_GRID_SIZE {
        return Err(VolumeError::TooLarge(dims));
    }
    let len = dims.byte_len().ok_or(VolumeError::TooLarge(dims))?;

    let noise = Simplex3::new(seed);
    let mut data = Vec::with_capacity(len);
    let mut cell: u64 = 0;
    for z in 0..dims.depth {
        for y in 0..dims.height {
            for x in 0..dims.width {
                let value = density_byte(noise.sample(
                    x as f64 / NOISE_SCALE,
                    y as f64 / NOISE_SCALE,
                    z as f64 / NOISE_SCALE,
                ));
                let red = match policy {
                    ChannelFillPolicy::Uniform => value,
                    ChannelFillPolicy::RandomRed => random_byte(seed, cell),
                };
                data.extend_from_slice(&[red, value, value, value]);
                cell += 1;
            }
        }
    }

    tracing::info!(
        seed = seed.value(),
        width = dims.width,
        height = dims.height,
        depth = dims.depth,
        ?policy,
        "generated volume"
    );
    Ok(VolumeGrid::from_raw(dims, data))
}

/// splitmix64 of the seed and cell index, reduced to one byte.
fn random_byte(seed: NoiseSeed, cell: u64) -> u8 {
    let mut x = (u64::from(seed.value()) << 48) ^ cell;
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (x ^ (x >> 31)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(s: u64) -> NoiseSeed {
        NoiseSeed::new(s).unwrap()
    }

    #[test]
    fn density_byte_truncates_and_wraps() {
        assert_eq!(density_byte(0.0), 0);
        assert_eq!(density_byte(0.5), 128);
        assert_eq!(density_byte(0.999), 255);
        assert_eq!(density_byte(1.0), 0);
        assert_eq!(density_byte(-0.5), 128);
        assert_eq!(density_byte(-0.001), 0);
        assert_eq!(density_byte(-0.1), 231);
    }

    #[test]
    fn seed_42_fixture_cells() {
        let grid = VolumeGenerator::new(seed(42)).generate().unwrap();
        assert_eq!(grid.as_bytes().len(), 128 * 128 * 128 * 4);
        assert_eq!(grid.texel(0, 0, 0), Some([0, 0, 0, 0]));
        assert_eq!(grid.texel(10, 20, 30), Some([83, 83, 83, 83]));
        assert_eq!(grid.texel(64, 64, 64), Some([60, 60, 60, 60]));
        assert_eq!(grid.texel(127, 127, 127), Some([142, 142, 142, 142]));
        assert_eq!(grid.texel(50, 3, 77), Some([221, 221, 221, 221]));
    }

    #[test]
    fn same_seed_is_byte_identical() {
        let dims = VolumeDims::cube(24);
        let a = generate(seed(9001), dims, ChannelFillPolicy::Uniform).unwrap();
        let b = generate(seed(9001), dims, ChannelFillPolicy::Uniform).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = generate(seed(9002), dims, ChannelFillPolicy::Uniform).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn random_red_keeps_density_in_gba() {
        let dims = VolumeDims::new(16, 8, 4);
        let uniform = generate(seed(5), dims, ChannelFillPolicy::Uniform).unwrap();
        let red = generate(seed(5), dims, ChannelFillPolicy::RandomRed).unwrap();
        let again = generate(seed(5), dims, ChannelFillPolicy::RandomRed).unwrap();
        assert_eq!(red, again);

        let mut red_differs = false;
        for (u, r) in uniform
            .as_bytes()
            .chunks_exact(CHANNELS)
            .zip(red.as_bytes().chunks_exact(CHANNELS))
        {
            assert_eq!(u[1..], r[1..]);
            red_differs |= u[0] != r[0];
        }
        assert!(red_differs);
    }

    #[test]
    fn non_cubic_dims_follow_layout() {
        let dims = VolumeDims::new(3, 2, 2);
        let grid = generate(seed(42), dims, ChannelFillPolicy::Uniform).unwrap();
        let firsts: Vec<u8> = grid
            .as_bytes()
            .chunks_exact(CHANNELS)
            .map(|t| t[0])
            .collect();
        assert_eq!(firsts, vec![0, 0, 0, 246, 246, 246, 10, 10, 10, 0, 0, 0]);
    }

    #[test]
    fn empty_dims_are_rejected() {
        let err = generate(seed(1), VolumeDims::new(0, 4, 4), ChannelFillPolicy::Uniform);
        assert!(matches!(err, Err(VolumeError::EmptyDimensions(_))));
    }

    #[test]
    fn oversized_dims_are_rejected_before_allocating() {
        let err = generate(seed(1), VolumeDims::cube(4_194_304), ChannelFillPolicy::Uniform);
        assert!(matches!(err, Err(VolumeError::TooLarge(_))));
        let err = generate(
            seed(1),
            VolumeDims::new(MAX_GRID_SIZE + 1, 1, 1),
            ChannelFillPolicy::Uniform,
        );
        assert!(matches!(err, Err(VolumeError::TooLarge(_))));
    }

    #[test]
    fn config_seed_out_of_range_falls_back() {
        let config = EngineConfig {
            seed: 1 << 20,
            grid_size: 8,
            ..EngineConfig::default()
        };
        let g = VolumeGenerator::from_config(&config);
        assert_eq!(g.seed.value(), crate::FALLBACK_SEED);
        assert_eq!(g.dims, VolumeDims::cube(8));
    }
}
