use sha2::{Digest, Sha256};

/// Bytes per cell: R, G, B, A.
pub const CHANNELS: usize = 4;

/// Grid extent in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VolumeDims {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl VolumeDims {
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub const fn cube(edge: u32) -> Self {
        Self::new(edge, edge, edge)
    }

    /// Number of cells, or `None` if it does not fit in `usize`.
    pub fn cell_count(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.depth as usize)
    }

    /// Size of the RGBA8 buffer for these dimensions.
    pub fn byte_len(&self) -> Option<usize> {
        self.cell_count()?.checked_mul(CHANNELS)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.depth == 0
    }

    pub fn max_edge(&self) -> u32 {
        self.width.max(self.height).max(self.depth)
    }

    /// Bytes in one row of cells, as the texture upload expects.
    pub fn bytes_per_row(&self) -> u32 {
        self.width * CHANNELS as u32
    }
}

impl Default for VolumeDims {
    fn default() -> Self {
        Self::cube(128)
    }
}

/// Immutable RGBA8 density volume, x fastest, then y, then z.
///
/// Built once by the generator; there is no mutable access afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct VolumeGrid {
    dims: VolumeDims,
    data: Vec<u8>,
}

impl std::fmt::Debug for VolumeGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeGrid")
            .field("dims", &self.dims)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl VolumeGrid {
    pub(crate) fn from_raw(dims: VolumeDims, data: Vec<u8>) -> Self {
        debug_assert_eq!(Some(data.len()), dims.byte_len());
        Self { dims, data }
    }

    pub fn dims(&self) -> VolumeDims {
        self.dims
    }

    /// Raw texel bytes in upload order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Byte offset of cell `(x, y, z)`.
    pub fn offset(&self, x: u32, y: u32, z: u32) -> usize {
        let d = self.dims;
        ((z as usize * d.height as usize + y as usize) * d.width as usize + x as usize) * CHANNELS
    }

    /// RGBA of one cell, or `None` outside the grid.
    pub fn texel(&self, x: u32, y: u32, z: u32) -> Option<[u8; 4]> {
        let d = self.dims;
        if x >= d.width || y >= d.height || z >= d.depth {
            return None;
        }
        let o = self.offset(x, y, z);
        Some([
            self.data[o],
            self.data[o + 1],
            self.data[o + 2],
            self.data[o + 3],
        ])
    }

    /// SHA-256 over the dimensions and texel bytes, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.dims.width.to_le_bytes());
        hasher.update(self.dims.height.to_le_bytes());
        hasher.update(self.dims.depth.to_le_bytes());
        hasher.update(&self.data);
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
