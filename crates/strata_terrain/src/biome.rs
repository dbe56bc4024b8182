//! # Biome Classification
//!
//! Determines terrain type from a climate sample.
//!
//! The climate model has three inputs:
//! - Height (from the layered terrain noise)
//! - Temperature (very low frequency noise)
//! - Moisture (same frequency, sampled far away from temperature)
//!
//! Classification is a fixed decision list. The first matching rule wins,
//! so the order of the checks in [`Biome::classify`] is part of the world
//! format: reordering them changes every generated world.

use crate::block::Material;
use crate::terrain::SEA_LEVEL;

/// Biome types in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Biome {
    /// Temperate woodland.
    Forest = 0,
    /// Grassland, the fallback biome.
    Plains = 1,
    /// High elevations.
    Mountains = 2,
    /// Wet lowland.
    Swamp = 3,
    /// Hot, dry land.
    Desert = 4,
    /// Anything whose surface lies below sea level.
    Underground = 5,
    /// Hot peaks.
    Volcanic = 6,
}

/// Climate values at one world column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Climate {
    /// Terrain surface height.
    pub height: f64,
    /// Temperature noise, roughly in [-1, 1].
    pub temperature: f64,
    /// Moisture noise, roughly in [-1, 1].
    pub moisture: f64,
}

impl Biome {
    /// Temperature above which high terrain turns volcanic.
    pub const VOLCANIC_MIN_TEMPERATURE: f64 = 0.7;
    /// Height above which hot terrain turns volcanic.
    pub const VOLCANIC_MIN_HEIGHT: f64 = 150.0;
    /// Height above which terrain is mountainous.
    pub const MOUNTAIN_MIN_HEIGHT: f64 = 120.0;
    /// Moisture above which low terrain is swamp.
    pub const SWAMP_MIN_MOISTURE: f64 = 0.6;
    /// Height below which wet terrain is swamp.
    pub const SWAMP_MAX_HEIGHT: f64 = 80.0;
    /// Temperature above which dry terrain is desert.
    pub const DESERT_MIN_TEMPERATURE: f64 = 0.5;
    /// Moisture below which hot terrain is desert.
    pub const DESERT_MAX_MOISTURE: f64 = 0.3;
    /// Moisture above which terrain is forest.
    pub const FOREST_MIN_MOISTURE: f64 = 0.4;
    /// Altitude above which a mountain surface is snow instead of stone.
    pub const SNOW_LINE: i32 = 140;

    /// Every biome.
    pub const ALL: [Self; 7] = [
        Self::Forest,
        Self::Plains,
        Self::Mountains,
        Self::Swamp,
        Self::Desert,
        Self::Underground,
        Self::Volcanic,
    ];

    /// Classifies a climate sample.
    ///
    /// Decision order: underground, volcanic, mountains, swamp, desert,
    /// forest, plains.
    #[must_use]
    pub fn classify(climate: &Climate) -> Self {
        let Climate {
            height,
            temperature,
            moisture,
        } = *climate;

        if height < SEA_LEVEL {
            return Self::Underground;
        }
        if temperature > Self::VOLCANIC_MIN_TEMPERATURE && height > Self::VOLCANIC_MIN_HEIGHT {
            return Self::Volcanic;
        }
        if height > Self::MOUNTAIN_MIN_HEIGHT {
            return Self::Mountains;
        }
        if moisture > Self::SWAMP_MIN_MOISTURE && height < Self::SWAMP_MAX_HEIGHT {
            return Self::Swamp;
        }
        if temperature > Self::DESERT_MIN_TEMPERATURE && moisture < Self::DESERT_MAX_MOISTURE {
            return Self::Desert;
        }
        if moisture > Self::FOREST_MIN_MOISTURE {
            return Self::Forest;
        }
        Self::Plains
    }

    /// Returns the material for the surface block of this biome at altitude `y`.
    #[must_use]
    pub const fn surface_material(self, y: i32) -> Material {
        match self {
            Self::Desert => Material::Sand,
            Self::Forest | Self::Plains | Self::Underground => Material::Grass,
            Self::Mountains => {
                if y > Self::SNOW_LINE {
                    Material::Snow
                } else {
                    Material::Stone
                }
            }
            Self::Swamp => Material::Dirt,
            Self::Volcanic => Material::Obsidian,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Forest => "forest",
            Self::Plains => "plains",
            Self::Mountains => "mountains",
            Self::Swamp => "swamp",
            Self::Desert => "desert",
            Self::Underground => "underground",
            Self::Volcanic => "volcanic",
        }
    }
}
