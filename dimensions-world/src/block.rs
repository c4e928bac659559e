use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Domain assumed when a code is written without one ("stone" -> "minecraft:stone").
pub const DEFAULT_DOMAIN: &str = "minecraft";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl Add for BlockPos {
    type Output = BlockPos;

    fn add(self, rhs: BlockPos) -> BlockPos {
        self.offset(rhs.x, rhs.y, rhs.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Numeric id of a registered block. 0 is always air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl BlockId {
    pub const AIR: BlockId = BlockId(0);
}

/// A namespaced block code such as `minecraft:stone`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockCode {
    domain: String,
    path: String,
}

impl BlockCode {
    pub fn new(domain: &str, path: &str) -> Self {
        Self { domain: domain.to_string(), path: path.to_string() }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let (domain, path) = match text.split_once(':') {
            Some((domain, path)) => (domain, path),
            None => (DEFAULT_DOMAIN, text),
        };
        if domain.is_empty() || path.is_empty() {
            bail!("Malformed block code {:?}", text);
        }
        if path.contains(':') {
            bail!("Block code {:?} has more than one domain separator", text);
        }
        Ok(Self::new(domain, path))
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl FromStr for BlockCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for BlockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub code: BlockCode,
}

impl Block {
    pub fn air() -> Self {
        Self { id: BlockId::AIR, code: BlockCode::new(DEFAULT_DOMAIN, "air") }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_domain() {
        let code = BlockCode::parse("stone").expect("Should parse");
        assert_eq!(code.domain(), "minecraft");
        assert_eq!(code.path(), "stone");
        assert_eq!(code.to_string(), "minecraft:stone");
    }

    #[test]
    fn test_parse_explicit_domain() {
        let code: BlockCode = "game:log-oak-ud".parse().expect("Should parse");
        assert_eq!(code.domain(), "game");
        assert_eq!(code.path(), "log-oak-ud");
    }

    #[test]
    fn test_parse_malformed() {
        assert!(BlockCode::parse("").is_err());
        assert!(BlockCode::parse(":stone").is_err());
        assert!(BlockCode::parse("minecraft:").is_err());
        assert!(BlockCode::parse("a:b:c").is_err());
    }

    #[test]
    fn test_pos_add() {
        let pos = BlockPos::new(1, 2, 3) + BlockPos::new(-1, 10, 0);
        assert_eq!(pos, BlockPos::new(0, 12, 3));
    }
}
