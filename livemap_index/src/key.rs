// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The quad-key cell address.

use core::fmt;
use core::str::FromStr;

use kurbo::Rect;

/// Deepest level a [`CellKey`] can address.
pub const MAX_LEVEL: u8 = 31;

/// One quadrant of a cell, in quad-key digit order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quadrant {
    /// Digit `0`.
    TopLeft = 0,
    /// Digit `1`.
    TopRight = 1,
    /// Digit `2`.
    BottomLeft = 2,
    /// Digit `3`.
    BottomRight = 3,
}

impl Quadrant {
    /// All quadrants in digit order.
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// The quadrant for a digit in `0..4`.
    pub const fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(Self::TopLeft),
            1 => Some(Self::TopRight),
            2 => Some(Self::BottomLeft),
            3 => Some(Self::BottomRight),
            _ => None,
        }
    }

    /// The quad-key digit of this quadrant.
    pub const fn digit(self) -> u8 {
        self as u8
    }

    const fn is_right(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight)
    }

    const fn is_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomRight)
    }
}

/// Error returned when a digit string is not a valid quad-key.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseCellKeyError {
    /// A character other than `0`..`3` was found.
    #[error("invalid quad-key digit {digit:?} at position {position}")]
    InvalidDigit {
        /// The offending character.
        digit: char,
        /// Its position in the input.
        position: usize,
    },
    /// The key is deeper than [`MAX_LEVEL`].
    #[error("quad-key of length {0} exceeds the maximum level {MAX_LEVEL}")]
    TooDeep(usize),
}

/// Address of one cell of the map quadtree.
///
/// A key is a path of quadrant digits from the root; its length is the zoom
/// level of the cell. Keys are small `Copy` values: the digits are packed two
/// bits each, most significant first, so the derived ordering is the
/// lexicographic path order (`"1" < "10" < "1233" < "2"`). In that order every
/// cell is immediately followed by all of its descendants.
///
/// ```rust
/// use livemap_index::CellKey;
///
/// let key: CellKey = "1221".parse().unwrap();
/// assert_eq!(key.level(), 4);
/// assert_eq!(key.parent().unwrap().to_string(), "122");
/// assert!("12".parse::<CellKey>().unwrap().is_ancestor_of(key));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CellKey {
    bits: u64,
    level: u8,
}

impl CellKey {
    /// The root cell covering the whole map.
    pub const ROOT: Self = Self { bits: 0, level: 0 };

    const fn shift(position: u8) -> u32 {
        2 * (MAX_LEVEL - 1 - position) as u32
    }

    /// Build a key from a slice of digits in `0..4`.
    pub fn from_digits(digits: &[u8]) -> Result<Self, ParseCellKeyError> {
        if digits.len() > MAX_LEVEL as usize {
            return Err(ParseCellKeyError::TooDeep(digits.len()));
        }
        let mut key = Self::ROOT;
        for (position, &digit) in digits.iter().enumerate() {
            let Some(quadrant) = Quadrant::from_digit(digit) else {
                return Err(ParseCellKeyError::InvalidDigit {
                    digit: char::from(b'0'.wrapping_add(digit)),
                    position,
                });
            };
            key = key.push(quadrant);
        }
        Ok(key)
    }

    /// Key of the cell at tile column `x`, row `y` on the given level.
    ///
    /// Coordinates outside `0..2^level` are masked to that range.
    pub fn from_tile(x: u32, y: u32, level: u8) -> Self {
        debug_assert!(level <= MAX_LEVEL, "level {level} exceeds MAX_LEVEL");
        let level = level.min(MAX_LEVEL);
        let mut key = Self::ROOT;
        for i in (0..level).rev() {
            let right = (x >> i) & 1 == 1;
            let bottom = (y >> i) & 1 == 1;
            let quadrant = match (right, bottom) {
                (false, false) => Quadrant::TopLeft,
                (true, false) => Quadrant::TopRight,
                (false, true) => Quadrant::BottomLeft,
                (true, true) => Quadrant::BottomRight,
            };
            key = key.push(quadrant);
        }
        key
    }

    /// Tile column and row of this cell on its level.
    pub fn tile(self) -> (u32, u32) {
        let mut x = 0_u32;
        let mut y = 0_u32;
        for quadrant in self.quadrants() {
            x = (x << 1) | u32::from(quadrant.is_right());
            y = (y << 1) | u32::from(quadrant.is_bottom());
        }
        (x, y)
    }

    /// Zoom level of the cell (number of digits).
    pub const fn level(self) -> u8 {
        self.level
    }

    /// Number of digits, same as [`level`](Self::level).
    pub const fn len(self) -> usize {
        self.level as usize
    }

    /// Whether this is the root key.
    pub const fn is_empty(self) -> bool {
        self.level == 0
    }

    /// The digit at `position`, if the key is that long.
    pub const fn digit(self, position: usize) -> Option<u8> {
        if position >= self.level as usize {
            return None;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "position is below MAX_LEVEL here."
        )]
        let shift = Self::shift(position as u8);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "a two-bit digit always fits in u8."
        )]
        Some(((self.bits >> shift) & 0b11) as u8)
    }

    /// Iterate over the quadrants along the path from the root.
    pub fn quadrants(self) -> impl Iterator<Item = Quadrant> {
        (0..self.len()).filter_map(move |i| self.digit(i).and_then(Quadrant::from_digit))
    }

    const fn push(self, quadrant: Quadrant) -> Self {
        Self {
            bits: self.bits | ((quadrant as u64) << Self::shift(self.level)),
            level: self.level + 1,
        }
    }

    /// The child cell in `quadrant`, or `None` at [`MAX_LEVEL`].
    pub const fn child(self, quadrant: Quadrant) -> Option<Self> {
        if self.level >= MAX_LEVEL {
            return None;
        }
        Some(self.push(quadrant))
    }

    /// The four children in digit order, or `None` at [`MAX_LEVEL`].
    pub fn children(self) -> Option<[Self; 4]> {
        if self.level >= MAX_LEVEL {
            return None;
        }
        Some(Quadrant::ALL.map(|q| self.push(q)))
    }

    /// The enclosing cell one level up, or `None` for the root.
    pub const fn parent(self) -> Option<Self> {
        if self.level == 0 {
            return None;
        }
        Some(self.truncate(self.level - 1))
    }

    const fn truncate(self, level: u8) -> Self {
        if level == 0 {
            return Self::ROOT;
        }
        let keep = 2 * level as u32;
        let mask = !((1_u64 << (2 * MAX_LEVEL as u32 - keep)) - 1);
        Self {
            bits: self.bits & mask,
            level,
        }
    }

    /// The ancestor (or self) at `level`, or `None` if `level` is deeper than this key.
    pub const fn ancestor_at(self, level: u8) -> Option<Self> {
        if level > self.level {
            return None;
        }
        Some(self.truncate(level))
    }

    /// Whether `self` strictly contains `other`.
    pub const fn is_ancestor_of(self, other: Self) -> bool {
        self.level < other.level && other.truncate(self.level).bits == self.bits
    }

    /// Whether `other` strictly contains `self`.
    pub const fn is_descendant_of(self, other: Self) -> bool {
        other.is_ancestor_of(self)
    }

    /// Whether `other` is `self` or one of its descendants.
    pub const fn contains(self, other: Self) -> bool {
        self.level <= other.level && other.truncate(self.level).bits == self.bits
    }

    /// The path of `self` below `ancestor`.
    ///
    /// Returns `None` when `ancestor` does not contain `self`. The key of a
    /// cell relative to itself is the root.
    pub const fn relative_to(self, ancestor: Self) -> Option<Self> {
        if !ancestor.contains(self) {
            return None;
        }
        let bits = if ancestor.level == 0 {
            self.bits
        } else {
            (self.bits << (2 * ancestor.level as u32)) & ((1_u64 << (2 * MAX_LEVEL as u32)) - 1)
        };
        Some(Self {
            bits,
            level: self.level - ancestor.level,
        })
    }

    /// Append the path `sub` below `self`, or `None` if the result would be too deep.
    pub const fn join(self, sub: Self) -> Option<Self> {
        if self.level as u32 + sub.level as u32 > MAX_LEVEL as u32 {
            return None;
        }
        Some(Self {
            bits: self.bits | (sub.bits >> (2 * self.level as u32)),
            level: self.level + sub.level,
        })
    }

    /// The rectangle this cell covers when the root covers `map_rect`.
    ///
    /// Each digit quarters the current rectangle; `0` keeps the top-left
    /// quadrant (smallest `x` and `y`).
    pub fn compute_rect(self, map_rect: Rect) -> Rect {
        let mut rect = map_rect;
        for quadrant in self.quadrants() {
            let half_w = rect.width() * 0.5;
            let half_h = rect.height() * 0.5;
            let x0 = if quadrant.is_right() {
                rect.x0 + half_w
            } else {
                rect.x0
            };
            let y0 = if quadrant.is_bottom() {
                rect.y0 + half_h
            } else {
                rect.y0
            };
            rect = Rect::new(x0, y0, x0 + half_w, y0 + half_h);
        }
        rect
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for quadrant in self.quadrants() {
            fmt::Write::write_char(f, char::from(b'0' + quadrant.digit()))?;
        }
        Ok(())
    }
}

impl fmt::Debug for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellKey(\"{self}\")")
    }
}

impl FromStr for CellKey {
    type Err = ParseCellKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let len = s.chars().count();
        if len > MAX_LEVEL as usize {
            return Err(ParseCellKeyError::TooDeep(len));
        }
        let mut key = Self::ROOT;
        for (position, digit) in s.chars().enumerate() {
            let quadrant = digit
                .to_digit(4)
                .and_then(|d| u8::try_from(d).ok())
                .and_then(Quadrant::from_digit)
                .ok_or(ParseCellKeyError::InvalidDigit { digit, position })?;
            key = key.push(quadrant);
        }
        Ok(key)
    }
}
