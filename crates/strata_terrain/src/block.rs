//! # Blocks and Materials
//!
//! The smallest addressable unit of the world: a material tag plus a light
//! value. Material ids are stable; they are written to disk as-is, so an id
//! is never reused for a different material.

use std::fmt;

/// Maximum light level a block can carry.
pub const MAX_LIGHT: u8 = 15;

/// Block material.
///
/// A closed enumeration with explicit, persisted ids. Gaps in the numbering
/// are reserved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Material {
    /// Empty space.
    #[default]
    Air = 0,
    /// Stone.
    Stone = 1,
    /// Grass-topped soil.
    Grass = 2,
    /// Dirt.
    Dirt = 3,
    /// Wood log.
    Wood = 4,
    /// Leaves.
    Leaves = 5,
    /// Indestructible floor at y = 0.
    Bedrock = 7,
    /// Volcanic glass.
    Obsidian = 10,
    /// Sand.
    Sand = 12,
    /// Iron ore.
    IronOre = 13,
    /// Diamond ore.
    DiamondOre = 14,
    /// Gold ore.
    GoldOre = 15,
    /// Snow.
    Snow = 16,
    /// Water.
    Water = 17,
    /// Gravel.
    Gravel = 18,
    /// Lava.
    Lava = 19,
    /// Glass.
    Glass = 20,
    /// Coal ore.
    CoalOre = 21,
}

impl Material {
    /// Every material, in id order.
    pub const ALL: [Self; 18] = [
        Self::Air,
        Self::Stone,
        Self::Grass,
        Self::Dirt,
        Self::Wood,
        Self::Leaves,
        Self::Bedrock,
        Self::Obsidian,
        Self::Sand,
        Self::IronOre,
        Self::DiamondOre,
        Self::GoldOre,
        Self::Snow,
        Self::Water,
        Self::Gravel,
        Self::Lava,
        Self::Glass,
        Self::CoalOre,
    ];

    /// Returns the persisted id of this material.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Converts a persisted id back into a material.
    ///
    /// Returns `None` for ids outside the enumeration.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => Self::Air,
            1 => Self::Stone,
            2 => Self::Grass,
            3 => Self::Dirt,
            4 => Self::Wood,
            5 => Self::Leaves,
            7 => Self::Bedrock,
            10 => Self::Obsidian,
            12 => Self::Sand,
            13 => Self::IronOre,
            14 => Self::DiamondOre,
            15 => Self::GoldOre,
            16 => Self::Snow,
            17 => Self::Water,
            18 => Self::Gravel,
            19 => Self::Lava,
            20 => Self::Glass,
            21 => Self::CoalOre,
            _ => return None,
        })
    }

    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Air => "air",
            Self::Stone => "stone",
            Self::Grass => "grass",
            Self::Dirt => "dirt",
            Self::Wood => "wood",
            Self::Leaves => "leaves",
            Self::Bedrock => "bedrock",
            Self::Obsidian => "obsidian",
            Self::Sand => "sand",
            Self::IronOre => "iron_ore",
            Self::DiamondOre => "diamond_ore",
            Self::GoldOre => "gold_ore",
            Self::Snow => "snow",
            Self::Water => "water",
            Self::Gravel => "gravel",
            Self::Lava => "lava",
            Self::Glass => "glass",
            Self::CoalOre => "coal_ore",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single block in the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Block {
    material: Material,
    light: u8,
}

impl Block {
    /// Air block (empty, unlit).
    pub const AIR: Self = Self {
        material: Material::Air,
        light: 0,
    };

    /// Creates an unlit block of the given material.
    #[inline]
    #[must_use]
    pub const fn new(material: Material) -> Self {
        Self { material, light: 0 }
    }

    /// Creates a block with a light value.
    ///
    /// # Panics
    ///
    /// Panics if `light` exceeds [`MAX_LIGHT`].
    #[inline]
    #[must_use]
    pub fn with_light(material: Material, light: u8) -> Self {
        assert!(
            light <= MAX_LIGHT,
            "light level {light} exceeds maximum {MAX_LIGHT}"
        );
        Self { material, light }
    }

    /// Returns the material.
    #[inline]
    #[must_use]
    pub const fn material(self) -> Material {
        self.material
    }

    /// Returns the light level (0..=15).
    #[inline]
    #[must_use]
    pub const fn light(self) -> u8 {
        self.light
    }

    /// Replaces the material, keeping the light level.
    #[inline]
    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    /// Returns true if this is an air block.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        matches!(self.material, Material::Air)
    }

    /// Returns true if the block obstructs movement.
    #[inline]
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !matches!(self.material, Material::Air | Material::Water)
    }

    /// Returns true if light and sight pass through the block.
    #[inline]
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        matches!(
            self.material,
            Material::Air | Material::Water | Material::Glass | Material::Leaves
        )
    }
}

impl From<Material> for Block {
    fn from(material: Material) -> Self {
        Self::new(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_ids_roundtrip() {
        for material in Material::ALL {
            assert_eq!(Material::from_id(material.id()), Some(material));
        }
    }

    #[test]
    fn test_unknown_ids_rejected() {
        let known: Vec<u8> = Material::ALL.iter().map(|m| m.id()).collect();
        for id in 0..=u8::MAX {
            if !known.contains(&id) {
                assert_eq!(Material::from_id(id), None, "id {id} should be unknown");
            }
        }
    }

    #[test]
    fn test_classification() {
        assert!(!Block::AIR.is_solid());
        assert!(Block::AIR.is_transparent());
        assert!(!Block::new(Material::Water).is_solid());
        assert!(Block::new(Material::Water).is_transparent());
        assert!(Block::new(Material::Leaves).is_solid());
        assert!(Block::new(Material::Leaves).is_transparent());
        assert!(Block::new(Material::Glass).is_transparent());
        assert!(Block::new(Material::Stone).is_solid());
        assert!(!Block::new(Material::Stone).is_transparent());
    }

    #[test]
    fn test_light_bounds() {
        let lit = Block::with_light(Material::Lava, MAX_LIGHT);
        assert_eq!(lit.light(), 15);
        assert_eq!(lit.material(), Material::Lava);
    }

    #[test]
    #[should_panic(expected = "exceeds maximum")]
    fn test_light_overflow_panics() {
        let _ = Block::with_light(Material::Stone, 16);
    }

    #[test]
    fn test_set_material_keeps_light() {
        let mut block = Block::with_light(Material::Air, 9);
        block.set_material(Material::Glass);
        assert_eq!(block.light(), 9);
        assert_eq!(block.material(), Material::Glass);
    }
}
