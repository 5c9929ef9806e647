//! # Hashed Value Noise
//!
//! Stateless, deterministic noise built from an integer hash.
//!
//! ## Layers
//!
//! - `hash_noise_2d` / `hash_noise_3d`: one pseudo-random value per lattice
//!   point, in `[-1, 1]`
//! - `value_noise_2d` / `value_noise_3d`: smoothstep interpolation between
//!   lattice values
//! - `fractal_value_noise_2d`: octaves of value noise, normalized by the
//!   summed amplitude so the result stays in `[-1, 1]`
//!
//! ## Determinism Guarantee
//!
//! Only integer mixing and basic IEEE-754 arithmetic are used, so given the
//! same inputs every function returns **exactly** the same bits on any
//! platform. Seams between independently generated chunks depend on this.

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Creates a seed from a signed integer (as stored in world metadata).
    #[inline]
    #[must_use]
    pub const fn from_signed(seed: i64) -> Self {
        Self(seed as u64)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., cave noise).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// Mixes a seed and three lattice coordinates into 64 well-spread bits.
#[inline]
const fn mix(seed: u64, x: i32, y: i32, z: i32) -> u64 {
    let mut v = seed
        ^ (x as i64 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (y as i64 as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9)
        ^ (z as i64 as u64).wrapping_mul(0x94D0_49BB_1331_11EB);
    v ^= v >> 30;
    v = v.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    v ^= v >> 27;
    v = v.wrapping_mul(0x94D0_49BB_1331_11EB);
    v ^ (v >> 31)
}

/// Maps the top 53 bits of a hash onto `[-1, 1)`.
#[inline]
fn to_signed_unit(hash: u64) -> f64 {
    const SCALE: f64 = 1.0 / (1u64 << 53) as f64;
    (hash >> 11) as f64 * SCALE * 2.0 - 1.0
}

/// Cubic smoothstep of `t`, clamped to `[0, 1]` first.
#[inline]
#[must_use]
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation from `a` to `b`.
#[inline]
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Floors to a lattice index.
#[inline]
fn lattice(v: f64) -> i32 {
    v.floor() as i32
}

/// Hash noise at a 2D lattice point, in `[-1, 1]`.
#[inline]
#[must_use]
pub fn hash_noise_2d(x: i32, z: i32, seed: u64) -> f64 {
    to_signed_unit(mix(seed, x, 0x3C6E_F372, z))
}

/// Hash noise at a 3D lattice point, in `[-1, 1]`.
#[inline]
#[must_use]
pub fn hash_noise_3d(x: i32, y: i32, z: i32, seed: u64) -> f64 {
    to_signed_unit(mix(seed, x, y, z))
}

/// Smoothly interpolated 2D value noise, in `[-1, 1]`.
#[must_use]
pub fn value_noise_2d(x: f64, z: f64, seed: u64) -> f64 {
    let xi = lattice(x);
    let zi = lattice(z);
    let tx = smoothstep(x - f64::from(xi));
    let tz = smoothstep(z - f64::from(zi));

    let v00 = hash_noise_2d(xi, zi, seed);
    let v10 = hash_noise_2d(xi + 1, zi, seed);
    let v01 = hash_noise_2d(xi, zi + 1, seed);
    let v11 = hash_noise_2d(xi + 1, zi + 1, seed);

    let a = lerp(v00, v10, tx);
    let b = lerp(v01, v11, tx);
    lerp(a, b, tz)
}

/// Smoothly interpolated 3D value noise, in `[-1, 1]`.
#[must_use]
pub fn value_noise_3d(x: f64, y: f64, z: f64, seed: u64) -> f64 {
    let xi = lattice(x);
    let yi = lattice(y);
    let zi = lattice(z);
    let tx = smoothstep(x - f64::from(xi));
    let ty = smoothstep(y - f64::from(yi));
    let tz = smoothstep(z - f64::from(zi));

    let mut c = [0.0f64; 8];
    let mut idx = 0;
    for oz in 0..=1 {
        for oy in 0..=1 {
            for ox in 0..=1 {
                c[idx] = hash_noise_3d(xi + ox, yi + oy, zi + oz, seed);
                idx += 1;
            }
        }
    }

    let x00 = lerp(c[0], c[1], tx);
    let x10 = lerp(c[2], c[3], tx);
    let x01 = lerp(c[4], c[5], tx);
    let x11 = lerp(c[6], c[7], tx);
    let y0 = lerp(x00, x10, ty);
    let y1 = lerp(x01, x11, ty);
    lerp(y0, y1, tz)
}

/// Generates octaved (fractal) value noise.
///
/// # Arguments
///
/// * `x`, `z` - Coordinates
/// * `octaves` - Number of noise layers (0 yields 0.0)
/// * `lacunarity` - Frequency increase per octave (typically 2.0)
/// * `persistence` - Amplitude decay per octave (typically 0.5)
///
/// # Returns
///
/// A value in the range [-1, 1].
#[must_use]
pub fn fractal_value_noise_2d(
    x: f64,
    z: f64,
    seed: u64,
    octaves: u32,
    lacunarity: f64,
    persistence: f64,
) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_amplitude = 0.0;

    for octave in 0..octaves {
        // Each octave samples its own lattice so layers don't line up.
        let octave_seed = seed.wrapping_add(u64::from(octave).wrapping_mul(0x9E37_79B9));
        total += value_noise_2d(x * frequency, z * frequency, octave_seed) * amplitude;
        max_amplitude += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    if max_amplitude > 0.0 {
        (total / max_amplitude).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// A seeded noise source, passed by value to whoever needs it.
///
/// Holds no mutable state, so one kernel can be shared freely across
/// generation threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoiseKernel {
    seed: WorldSeed,
}

impl NoiseKernel {
    /// Creates a kernel for the given seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: WorldSeed) -> Self {
        Self { seed }
    }

    /// Returns the kernel's seed.
    #[inline]
    #[must_use]
    pub const fn seed(self) -> WorldSeed {
        self.seed
    }

    /// Returns an independent kernel for a sub-purpose.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        Self {
            seed: self.seed.derive(purpose),
        }
    }

    /// See [`hash_noise_2d`].
    #[inline]
    #[must_use]
    pub fn hash_2d(self, x: i32, z: i32) -> f64 {
        hash_noise_2d(x, z, self.seed.value())
    }

    /// See [`hash_noise_3d`].
    #[inline]
    #[must_use]
    pub fn hash_3d(self, x: i32, y: i32, z: i32) -> f64 {
        hash_noise_3d(x, y, z, self.seed.value())
    }

    /// See [`value_noise_2d`].
    #[inline]
    #[must_use]
    pub fn value_2d(self, x: f64, z: f64) -> f64 {
        value_noise_2d(x, z, self.seed.value())
    }

    /// See [`value_noise_3d`].
    #[inline]
    #[must_use]
    pub fn value_3d(self, x: f64, y: f64, z: f64) -> f64 {
        value_noise_3d(x, y, z, self.seed.value())
    }

    /// See [`fractal_value_noise_2d`].
    #[inline]
    #[must_use]
    pub fn fractal_2d(self, x: f64, z: f64, octaves: u32, lacunarity: f64, persistence: f64) -> f64 {
        fractal_value_noise_2d(x, z, self.seed.value(), octaves, lacunarity, persistence)
    }
}
