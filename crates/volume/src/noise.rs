use crate::VolumeError;

/// Seed used whenever a requested seed is out of range.
pub const FALLBACK_SEED: u16 = 42;

/// A validated noise seed. The permutation table is keyed by 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoiseSeed(u16);

impl NoiseSeed {
    pub fn new(seed: u64) -> Result<Self, VolumeError> {
        u16::try_from(seed)
            .map(Self)
            .map_err(|_| VolumeError::NoiseSeedInvalid(seed))
    }

    /// Like [`NoiseSeed::new`], but substitutes [`FALLBACK_SEED`] for out-of-range seeds.
    pub fn or_fallback(seed: u64) -> Self {
        Self::new(seed).unwrap_or_else(|e| {
            tracing::warn!("{e}; using fallback seed {FALLBACK_SEED}");
            Self(FALLBACK_SEED)
        })
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl Default for NoiseSeed {
    fn default() -> Self {
        Self(FALLBACK_SEED)
    }
}

#[rustfmt::skip]
const PERMUTATION: [u8; 256] = [
    151,160,137,91,90,15,131,13,201,95,96,53,194,233,7,225,140,36,103,30,69,142,
    8,99,37,240,21,10,23,190,6,148,247,120,234,75,0,26,197,62,94,252,219,203,117,
    35,11,32,57,177,33,88,237,149,56,87,174,20,125,136,171,168,68,175,74,165,71,
    134,139,48,27,166,77,146,158,231,83,111,229,122,60,211,133,230,220,105,92,41,
    55,46,245,40,244,102,143,54,65,25,63,161,1,216,80,73,209,76,132,187,208,89,
    18,169,200,196,135,130,116,188,159,86,164,100,109,198,173,186,3,64,52,217,226,
    250,124,123,5,202,38,147,118,126,255,82,85,212,207,206,59,227,47,16,58,17,182,
    189,28,42,223,183,170,213,119,248,152,2,44,154,163,70,221,153,101,155,167,43,
    172,9,129,22,39,253,19,98,108,110,79,113,224,232,178,185,112,104,218,246,97,
    228,251,34,242,193,238,210,144,12,191,179,162,241,81,51,145,235,249,14,239,
    107,49,192,214,31,181,199,106,157,184,84,204,176,115,121,50,45,127,4,150,254,
    138,236,205,93,222,114,67,29,24,72,243,141,128,195,78,66,215,61,156,180,
];

/// Edge midpoints of a cube.
#[rustfmt::skip]
const GRAD3: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0], [-1.0, 1.0, 0.0], [1.0, -1.0, 0.0], [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0], [-1.0, 0.0, 1.0], [1.0, 0.0, -1.0], [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0], [0.0, -1.0, 1.0], [0.0, 1.0, -1.0], [0.0, -1.0, -1.0],
];

const F3: f64 = 1.0 / 3.0;
const G3: f64 = 1.0 / 6.0;

/// Seeded 3D simplex noise. Output is nominally in `[-1, 1]`.
///
/// Evaluated in `f64` so a given seed reproduces the same samples bit for bit.
#[derive(Clone)]
pub struct Simplex3 {
    perm: [u8; 512],
    grad: [u8; 512],
}

impl Simplex3 {
    pub fn new(seed: NoiseSeed) -> Self {
        let mut s = seed.value();
        if s < 256 {
            s |= s << 8;
        }
        let lo = (s & 0xff) as u8;
        let hi = (s >> 8) as u8;

        let mut perm = [0u8; 512];
        let mut grad = [0u8; 512];
        for (i, p) in PERMUTATION.iter().enumerate() {
            let v = if i & 1 == 1 { p ^ lo } else { p ^ hi };
            perm[i] = v;
            perm[i + 256] = v;
            grad[i] = v % 12;
            grad[i + 256] = v % 12;
        }
        Self { perm, grad }
    }

    fn perm(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    fn corner(&self, gi: usize, x: f64, y: f64, z: f64) -> f64 {
        let t = 0.6 - x * x - y * y - z * z;
        if t < 0.0 {
            return 0.0;
        }
        let g = GRAD3[self.grad[gi] as usize];
        let t = t * t;
        t * t * (g[0] * x + g[1] * y + g[2] * z)
    }

    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        // Skew into simplex cell space.
        let s = (x + y + z) * F3;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let k = (z + s).floor();
        let t = (i + j + k) * G3;
        let x0 = x - i + t;
        let y0 = y - j + t;
        let z0 = z - k + t;

        // Which of the six tetrahedra we are in.
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - i1 as f64 + G3;
        let y1 = y0 - j1 as f64 + G3;
        let z1 = z0 - k1 as f64 + G3;
        let x2 = x0 - i2 as f64 + 2.0 * G3;
        let y2 = y0 - j2 as f64 + 2.0 * G3;
        let z2 = z0 - k2 as f64 + 2.0 * G3;
        let x3 = x0 - 1.0 + 3.0 * G3;
        let y3 = y0 - 1.0 + 3.0 * G3;
        let z3 = z0 - 1.0 + 3.0 * G3;

        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;
        let kk = (k as i64 & 255) as usize;

        let gi0 = ii + self.perm(jj + self.perm(kk));
        let gi1 = ii + i1 + self.perm(jj + j1 + self.perm(kk + k1));
        let gi2 = ii + i2 + self.perm(jj + j2 + self.perm(kk + k2));
        let gi3 = ii + 1 + self.perm(jj + 1 + self.perm(kk + 1));

        let n0 = self.corner(gi0, x0, y0, z0);
        let n1 = self.corner(gi1, x1, y1, z1);
        let n2 = self.corner(gi2, x2, y2, z2);
        let n3 = self.corner(gi3, x3, y3, z3);

        32.0 * (n0 + n1 + n2 + n3)
    }
}
