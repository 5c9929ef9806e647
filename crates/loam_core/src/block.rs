//! # Block Types
//!
//! Every voxel stores a 1-byte block id. The ids below are the ones the
//! generator produces; gameplay may write any other value.

use bytemuck::{Pod, Zeroable};

/// Liquid level of a full (source) water voxel.
pub const LIQUID_FULL: u8 = 8;

/// A single block id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Block(pub u8);

impl Block {
    /// Air block (empty). Also the out-of-range sentinel.
    pub const AIR: Self = Self(0);
    /// Stone block.
    pub const STONE: Self = Self(1);
    /// Dirt block.
    pub const DIRT: Self = Self(2);
    /// Grass block.
    pub const GRASS: Self = Self(3);
    /// Sand block.
    pub const SAND: Self = Self(4);
    /// Gravel block.
    pub const GRAVEL: Self = Self(5);
    /// Water block.
    pub const WATER: Self = Self(6);
    /// Impassable world-floor block.
    pub const BEDROCK: Self = Self(7);

    /// Creates a block with the given id.
    #[inline]
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self.0
    }

    /// Returns true if this is an air block.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.0 == Self::AIR.0
    }

    /// Returns true for the world-floor block.
    #[inline]
    #[must_use]
    pub const fn is_boundary(self) -> bool {
        self.0 == Self::BEDROCK.0
    }

    /// Returns true if this block is a liquid.
    #[inline]
    #[must_use]
    pub const fn is_liquid(self) -> bool {
        self.0 == Self::WATER.0
    }

    /// Returns true if the block is neither air nor liquid.
    #[inline]
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !self.is_air() && !self.is_liquid()
    }

    /// Human-readable name, `"unknown"` for ids the generator never emits.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.0 {
            0 => "air",
            1 => "stone",
            2 => "dirt",
            3 => "grass",
            4 => "sand",
            5 => "gravel",
            6 => "water",
            7 => "bedrock",
            _ => "unknown",
        }
    }
}

impl From<u8> for Block {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl From<Block> for u8 {
    fn from(block: Block) -> Self {
        block.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_classification() {
        assert!(Block::AIR.is_air());
        assert!(!Block::AIR.is_solid());
        assert!(Block::WATER.is_liquid());
        assert!(!Block::WATER.is_solid());
        assert!(Block::BEDROCK.is_boundary());
        assert!(Block::BEDROCK.is_solid());
        assert!(Block::new(200).is_solid());
        assert_eq!(Block::new(200).name(), "unknown");
    }

    #[test]
    fn test_block_bytes_are_ids() {
        let blocks = [Block::STONE, Block::AIR, Block::SAND];
        let bytes: &[u8] = bytemuck::cast_slice(&blocks);
        assert_eq!(bytes, &[1, 0, 4]);
    }
}
