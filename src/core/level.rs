//! Level definitions and the per-logger level bit table
//!
//! Every level owns exactly one bit. The eight standard levels occupy
//! `0x01..=0x80`; custom levels registered on a [`LevelTable`] take the next
//! free power of two above the current maximum.

use super::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};
use std::str::FromStr;

/// Maximum number of distinct levels a single table can hold
pub const MAX_LEVELS: usize = u64::BITS as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Level {
    /// All standard levels, lowest bit first
    pub const ALL: [Level; 8] = [
        Level::Debug,
        Level::Info,
        Level::Notice,
        Level::Warning,
        Level::Error,
        Level::Critical,
        Level::Alert,
        Level::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Notice => "notice",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Critical => "critical",
            Level::Alert => "alert",
            Level::Emergency => "emergency",
        }
    }

    #[inline]
    pub fn id(self) -> LevelId {
        LevelId(1 << self as u32)
    }

    #[inline]
    pub fn mask(self) -> LevelMask {
        LevelMask(self.id().0)
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Level::Debug => BrightBlack,
            Level::Info => Green,
            Level::Notice => Cyan,
            Level::Warning => Yellow,
            Level::Error => Red,
            Level::Critical => BrightRed,
            Level::Alert => Magenta,
            Level::Emergency => BrightMagenta,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "notice" => Ok(Level::Notice),
            "warning" | "warn" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "critical" => Ok(Level::Critical),
            "alert" => Ok(Level::Alert),
            "emergency" => Ok(Level::Emergency),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Opaque handle for a single level bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelId(u64);

impl LevelId {
    #[inline]
    pub fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn mask(self) -> LevelMask {
        LevelMask(self.0)
    }

    /// Bit position, `0` for `debug`
    #[inline]
    fn position(self) -> usize {
        self.0.trailing_zeros() as usize
    }
}

impl From<Level> for LevelId {
    fn from(level: Level) -> Self {
        level.id()
    }
}

/// Bitwise OR of level bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelMask(u64);

impl LevelMask {
    pub const NONE: LevelMask = LevelMask(0);
    /// The eight standard levels
    pub const STANDARD: LevelMask = LevelMask(0xff);
    /// Every bit, custom levels included
    pub const ALL: LevelMask = LevelMask(u64::MAX);

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        LevelMask(bits)
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if the level's bit is set in this mask
    #[inline]
    pub fn matches(self, level: LevelId) -> bool {
        self.0 & level.0 != 0
    }

    /// True if every bit of `other` is set in this mask
    #[inline]
    pub fn contains(self, other: LevelMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for LevelMask {
    type Output = LevelMask;

    fn bitor(self, rhs: LevelMask) -> LevelMask {
        LevelMask(self.0 | rhs.0)
    }
}

impl BitOr<Level> for LevelMask {
    type Output = LevelMask;

    fn bitor(self, rhs: Level) -> LevelMask {
        self | rhs.mask()
    }
}

impl BitOr for Level {
    type Output = LevelMask;

    fn bitor(self, rhs: Level) -> LevelMask {
        self.mask() | rhs.mask()
    }
}

impl BitOrAssign for LevelMask {
    fn bitor_assign(&mut self, rhs: LevelMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for LevelMask {
    type Output = LevelMask;

    fn bitand(self, rhs: LevelMask) -> LevelMask {
        LevelMask(self.0 & rhs.0)
    }
}

impl Not for LevelMask {
    type Output = LevelMask;

    fn not(self) -> LevelMask {
        LevelMask(!self.0)
    }
}

impl From<Level> for LevelMask {
    fn from(level: Level) -> Self {
        level.mask()
    }
}

impl From<LevelId> for LevelMask {
    fn from(id: LevelId) -> Self {
        id.mask()
    }
}

/// A level argument: either a name to resolve or an already resolved handle
#[derive(Debug, Clone, Copy)]
pub enum LevelKey<'a> {
    Name(&'a str),
    Id(LevelId),
}

impl<'a> From<&'a str> for LevelKey<'a> {
    fn from(name: &'a str) -> Self {
        LevelKey::Name(name)
    }
}

impl<'a> From<&'a String> for LevelKey<'a> {
    fn from(name: &'a String) -> Self {
        LevelKey::Name(name.as_str())
    }
}

impl From<Level> for LevelKey<'_> {
    fn from(level: Level) -> Self {
        LevelKey::Id(level.id())
    }
}

impl From<LevelId> for LevelKey<'_> {
    fn from(id: LevelId) -> Self {
        LevelKey::Id(id)
    }
}

impl fmt::Display for LevelKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelKey::Name(name) => f.write_str(name),
            LevelKey::Id(id) => write!(f, "{:#x}", id.bits()),
        }
    }
}

/// Name <-> bit registry owned by one logger
#[derive(Debug, Clone)]
pub struct LevelTable {
    /// Indexed by bit position
    names: Vec<String>,
    index: HashMap<String, LevelId>,
}

impl LevelTable {
    /// Table seeded with the eight standard levels
    pub fn new() -> Self {
        let mut table = Self {
            names: Vec::with_capacity(Level::ALL.len()),
            index: HashMap::with_capacity(Level::ALL.len()),
        };
        for level in Level::ALL {
            table.names.push(level.as_str().to_string());
            table.index.insert(level.as_str().to_string(), level.id());
        }
        table
    }

    /// Look up the bit for a level name (case-insensitive)
    pub fn resolve(&self, name: &str) -> Option<LevelId> {
        if let Some(id) = self.index.get(name) {
            return Some(*id);
        }
        self.index.get(&name.to_lowercase()).copied()
    }

    /// Look up the name registered for a bit
    pub fn name(&self, id: LevelId) -> Option<&str> {
        if id.0.count_ones() != 1 {
            return None;
        }
        self.names.get(id.position()).map(String::as_str)
    }

    /// Resolve a name or validate a handle against this table
    pub fn resolve_key(&self, key: LevelKey<'_>) -> Option<LevelId> {
        match key {
            LevelKey::Name(name) => self.resolve(name),
            LevelKey::Id(id) => self.name(id).map(|_| id),
        }
    }

    /// Register a new level above the current maximum
    pub fn extend(&mut self, name: &str) -> Result<LevelId> {
        let name = name.to_lowercase();
        if name.is_empty() {
            return Err(LoggerError::config("LevelTable", "level name must not be empty"));
        }
        if self.index.contains_key(&name) {
            return Err(LoggerError::config(
                "LevelTable",
                format!("level '{}' is already defined", name),
            ));
        }
        if self.names.len() >= MAX_LEVELS {
            return Err(LoggerError::config(
                "LevelTable",
                format!("cannot register more than {} levels", MAX_LEVELS),
            ));
        }

        let id = LevelId(1u64 << self.names.len());
        self.names.push(name.clone());
        self.index.insert(name, id);
        Ok(id)
    }

    /// OR together the bits of every resolvable name; unknown names are skipped
    pub fn levels<I, S>(&self, names: I) -> LevelMask
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| self.resolve(name.as_ref()))
            .fold(LevelMask::NONE, |mask, id| mask | id.mask())
    }

    /// Mask of every level registered in this table
    pub fn all(&self) -> LevelMask {
        match self.names.len() {
            MAX_LEVELS => LevelMask::ALL,
            n => LevelMask((1u64 << n) - 1),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Registered levels in bit order
    pub fn iter(&self) -> impl Iterator<Item = (LevelId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(pos, name)| (LevelId(1u64 << pos), name.as_str()))
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::new()
    }
}
