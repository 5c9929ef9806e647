//! # Biome Classification
//!
//! Soft climate regions from low-frequency noise.
//!
//! Uses a single climate axis:
//! - Dry end: desert
//! - Middle: grassland (the dominant biome)
//! - Wet end: shallows, then ocean
//!
//! Membership is a **band weight** in `[0, 1]`, a smoothstep ramp across
//! `center ± half_width`, so borders fade over many blocks instead of
//! flipping on a single noise sample. Smaller "pocket" deserts come from
//! higher-frequency samples, gated off in wet climates.

use crate::noise::{smoothstep, NoiseKernel, WorldSeed};

/// Biome types in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Biome {
    /// Grass over dirt.
    Grassland = 0,
    /// Sand, gravel and dunes.
    Desert = 1,
    /// Coastal water over sand.
    Shallows = 2,
    /// Deep water with a flat floor.
    Ocean = 3,
}

impl Biome {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Grassland => "Grassland",
            Self::Desert => "Desert",
            Self::Shallows => "Shallows",
            Self::Ocean => "Ocean",
        }
    }

    /// Converts from u8.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Desert,
            2 => Self::Shallows,
            3 => Self::Ocean,
            _ => Self::Grassland,
        }
    }
}

/// Smoothstep membership of `sample` in a band.
///
/// Ramps from 0 at `center - half_width` to 1 at `center + half_width`.
/// A non-positive `half_width` degenerates to a hard step at `center`.
#[inline]
#[must_use]
pub fn band_weight(sample: f64, center: f64, half_width: f64) -> f64 {
    if half_width <= 0.0 {
        return if sample >= center { 1.0 } else { 0.0 };
    }
    smoothstep((sample - (center - half_width)) / (2.0 * half_width))
}

/// Climate weights for one world column.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClimateSample {
    /// Smoothed climate value, dry > 0 > wet.
    pub climate: f64,
    /// Desert membership in `[0, 1]`, pockets included.
    pub desert: f64,
    /// Ocean membership in `[0, 1]`.
    pub ocean: f64,
}

impl ClimateSample {
    /// Picks the dominant biome for these weights.
    #[must_use]
    pub fn biome(self) -> Biome {
        if self.ocean >= 0.6 {
            Biome::Ocean
        } else if self.ocean >= 0.3 {
            Biome::Shallows
        } else if self.desert >= 0.5 {
            Biome::Desert
        } else {
            Biome::Grassland
        }
    }
}

/// Biome classifier that determines climate weights from world coordinates.
#[derive(Clone, Copy, Debug)]
pub struct BiomeClassifier {
    /// Broad climate noise.
    climate: NoiseKernel,
    /// Medium desert pockets.
    medium_pocket: NoiseKernel,
    /// Small desert pockets.
    small_pocket: NoiseKernel,
}

impl BiomeClassifier {
    /// Scale for climate noise (smaller = broader regions).
    const CLIMATE_SCALE: f64 = 1.0 / 640.0;
    /// Distance in blocks of the four smoothing samples.
    const SMOOTHING_RADIUS: f64 = 24.0;
    /// Weight of the center sample; the four offsets share the rest.
    const CENTER_WEIGHT: f64 = 0.6;

    const DESERT_CENTER: f64 = 0.30;
    const DESERT_HALF_WIDTH: f64 = 0.12;
    const OCEAN_CENTER: f64 = 0.32;
    const OCEAN_HALF_WIDTH: f64 = 0.12;

    const MEDIUM_POCKET_SCALE: f64 = 1.0 / 180.0;
    const SMALL_POCKET_SCALE: f64 = 1.0 / 70.0;

    /// Creates a new biome classifier from a world seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        let kernel = NoiseKernel::new(seed);
        Self {
            climate: kernel.derive(1),
            medium_pocket: kernel.derive(2),
            small_pocket: kernel.derive(3),
        }
    }

    /// Unsmoothed climate value at a column, in `[-1, 1]`.
    #[must_use]
    pub fn raw_climate(&self, x: f64, z: f64) -> f64 {
        self.climate
            .fractal_2d(x * Self::CLIMATE_SCALE, z * Self::CLIMATE_SCALE, 3, 2.0, 0.5)
    }

    /// Center-heavy blend of the raw climate and four offset samples.
    #[must_use]
    pub fn blended_climate(&self, x: f64, z: f64) -> f64 {
        let r = Self::SMOOTHING_RADIUS;
        let ring = self.raw_climate(x + r, z)
            + self.raw_climate(x - r, z)
            + self.raw_climate(x, z + r)
            + self.raw_climate(x, z - r);
        let ring_weight = (1.0 - Self::CENTER_WEIGHT) / 4.0;
        self.raw_climate(x, z) * Self::CENTER_WEIGHT + ring * ring_weight
    }

    /// Computes all climate weights for a column.
    #[must_use]
    pub fn sample(&self, x: f64, z: f64) -> ClimateSample {
        let climate = self.blended_climate(x, z);
        let wetness = -climate;

        let ocean = band_weight(wetness, Self::OCEAN_CENTER, Self::OCEAN_HALF_WIDTH);
        let regional_desert = band_weight(climate, Self::DESERT_CENTER, Self::DESERT_HALF_WIDTH);

        // Pockets fade out as the climate turns wet.
        let dry_gate = (1.0 - band_weight(wetness, -0.05, 0.2)) * (1.0 - ocean);

        let medium = self.medium_pocket.fractal_2d(
            x * Self::MEDIUM_POCKET_SCALE,
            z * Self::MEDIUM_POCKET_SCALE,
            3,
            2.0,
            0.5,
        );
        let small = self.small_pocket.fractal_2d(
            x * Self::SMALL_POCKET_SCALE,
            z * Self::SMALL_POCKET_SCALE,
            2,
            2.0,
            0.5,
        );
        let medium_desert = band_weight(medium, 0.35, 0.10) * dry_gate;
        let small_desert = band_weight(small, 0.45, 0.08) * dry_gate * 0.85;

        ClimateSample {
            climate,
            desert: regional_desert.max(medium_desert).max(small_desert).clamp(0.0, 1.0),
            ocean,
        }
    }

    /// Desert membership at a column.
    #[must_use]
    pub fn desert_weight(&self, x: f64, z: f64) -> f64 {
        self.sample(x, z).desert
    }

    /// Ocean membership at a column.
    #[must_use]
    pub fn ocean_weight(&self, x: f64, z: f64) -> f64 {
        self.sample(x, z).ocean
    }

    /// Classifies the biome at world coordinates.
    #[must_use]
    pub fn classify(&self, x: f64, z: f64) -> Biome {
        self.sample(x, z).biome()
    }
}
