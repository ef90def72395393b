//! Numeric `min..max` ranges.
//!
//! Accepted forms are `N` (exactly N), `N..` (at least N), `..N` (at most N)
//! and `N..M`. Both ends are inclusive.

use crate::error::{CommandSyntaxError, ErrorKind, SyntaxResult};
use crate::reader::StringReader;
use std::fmt;
use std::str::FromStr;

/// A number type usable as a range bound.
pub trait BoundValue: Copy + PartialOrd + fmt::Debug + fmt::Display + FromStr {
    /// Type used for the precomputed squared bounds.
    type Squared: Copy + PartialOrd + fmt::Debug;

    /// Whether a single `.` is part of the number rather than an error.
    const FLOATING_POINT: bool;

    fn square(self) -> Self::Squared;

    fn invalid(token: String) -> ErrorKind;
}

impl BoundValue for i32 {
    type Squared = i64;
    const FLOATING_POINT: bool = false;

    fn square(self) -> i64 {
        let value = self as i64;
        value * value
    }

    fn invalid(token: String) -> ErrorKind {
        ErrorKind::InvalidInt(token)
    }
}

impl BoundValue for f64 {
    type Squared = f64;
    const FLOATING_POINT: bool = true;

    fn square(self) -> f64 {
        self * self
    }

    fn invalid(token: String) -> ErrorKind {
        ErrorKind::InvalidDouble(token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxBounds<T: BoundValue> {
    min: Option<T>,
    max: Option<T>,
    min_sq: Option<T::Squared>,
    max_sq: Option<T::Squared>,
}

pub type IntBounds = MinMaxBounds<i32>;
pub type DoubleBounds = MinMaxBounds<f64>;

impl<T: BoundValue> MinMaxBounds<T> {
    fn new(min: Option<T>, max: Option<T>) -> Self {
        Self {
            min,
            max,
            min_sq: min.map(T::square),
            max_sq: max.map(T::square),
        }
    }

    pub fn any() -> Self {
        Self::new(None, None)
    }

    pub fn exactly(value: T) -> Self {
        Self::new(Some(value), Some(value))
    }

    pub fn between(min: T, max: T) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub fn at_least(min: T) -> Self {
        Self::new(Some(min), None)
    }

    pub fn at_most(max: T) -> Self {
        Self::new(None, Some(max))
    }

    pub fn min(&self) -> Option<T> {
        self.min
    }

    pub fn max(&self) -> Option<T> {
        self.max
    }

    pub fn is_any(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn matches(&self, value: T) -> bool {
        self.min.is_none_or(|min| min <= value) && self.max.is_none_or(|max| value <= max)
    }

    /// Matches an already squared value (e.g. a squared distance) against
    /// the squared bounds.
    pub fn matches_sqr(&self, value: T::Squared) -> bool {
        self.min_sq.is_none_or(|min| min <= value) && self.max_sq.is_none_or(|max| value <= max)
    }

    pub fn from_reader(reader: &mut StringReader) -> SyntaxResult<Self> {
        Self::from_reader_with(reader, |value| value)
    }

    /// Like [`Self::from_reader`], passing every parsed bound through `format`
    /// before the range is checked.
    pub fn from_reader_with(
        reader: &mut StringReader,
        format: impl Fn(T) -> T,
    ) -> SyntaxResult<Self> {
        let start = reader.cursor();
        let (min, max) = read_range(reader, T::FLOATING_POINT, &format, T::invalid)?;
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                reader.set_cursor(start);
                return Err(ErrorKind::BoundsSwapped.create_with_context(reader));
            }
        }
        Ok(Self::new(min, max))
    }
}

impl<T: BoundValue> Default for MinMaxBounds<T> {
    fn default() -> Self {
        Self::any()
    }
}

impl<T: BoundValue> fmt::Display for MinMaxBounds<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => write!(f, "{min}"),
            (Some(min), Some(max)) => write!(f, "{min}..{max}"),
            (Some(min), None) => write!(f, "{min}.."),
            (None, Some(max)) => write!(f, "..{max}"),
            (None, None) => f.write_str(".."),
        }
    }
}

impl<T: BoundValue> FromStr for MinMaxBounds<T> {
    type Err = CommandSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut reader = StringReader::new(s);
        let bounds = Self::from_reader(&mut reader)?;
        if reader.can_read() {
            return Err(ErrorKind::ExpectedArgumentSeparator.create_with_context(&reader));
        }
        Ok(bounds)
    }
}

/// Single precision range without squared caches, used where values are
/// snapped or rounded by the caller (rotations, scores).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WrappedMinMaxBounds {
    min: Option<f32>,
    max: Option<f32>,
}

impl WrappedMinMaxBounds {
    pub const ANY: Self = Self {
        min: None,
        max: None,
    };

    pub fn exactly(value: f32) -> Self {
        Self {
            min: Some(value),
            max: Some(value),
        }
    }

    pub fn between(min: f32, max: f32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn min(&self) -> Option<f32> {
        self.min
    }

    pub fn max(&self) -> Option<f32> {
        self.max
    }

    pub fn is_any(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn matches(&self, value: f32) -> bool {
        self.min.is_none_or(|min| min <= value) && self.max.is_none_or(|max| value <= max)
    }

    pub fn from_reader(
        reader: &mut StringReader,
        floating_point: bool,
        format: impl Fn(f32) -> f32,
    ) -> SyntaxResult<Self> {
        let invalid: fn(String) -> ErrorKind = if floating_point {
            ErrorKind::InvalidFloat
        } else {
            ErrorKind::InvalidInt
        };
        let start = reader.cursor();
        let (min, max) = read_range(reader, floating_point, &format, invalid)?;
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                reader.set_cursor(start);
                return Err(ErrorKind::BoundsSwapped.create_with_context(reader));
            }
        }
        Ok(Self { min, max })
    }
}

fn read_range<T: FromStr + Copy>(
    reader: &mut StringReader,
    floating_point: bool,
    format: &impl Fn(T) -> T,
    invalid: fn(String) -> ErrorKind,
) -> SyntaxResult<(Option<T>, Option<T>)> {
    if !reader.can_read() {
        return Err(ErrorKind::BoundsEmpty.create_with_context(reader));
    }
    let start = reader.cursor();
    let min = read_bound(reader, floating_point, format, invalid)?;
    let max = if reader.peek() == Some('.') && reader.peek_at(1) == Some('.') {
        reader.skip();
        reader.skip();
        read_bound(reader, floating_point, format, invalid)?
    } else {
        if !floating_point && reader.peek() == Some('.') {
            reader.set_cursor(start);
            return Err(ErrorKind::BoundsIntsOnly.create_with_context(reader));
        }
        min
    };
    if min.is_none() && max.is_none() {
        reader.set_cursor(start);
        return Err(ErrorKind::BoundsEmpty.create_with_context(reader));
    }
    Ok((min, max))
}

fn read_bound<T: FromStr>(
    reader: &mut StringReader,
    floating_point: bool,
    format: &impl Fn(T) -> T,
    invalid: fn(String) -> ErrorKind,
) -> SyntaxResult<Option<T>> {
    let start = reader.cursor();
    let token = reader.read_number_token(floating_point);
    if token.is_empty() {
        return Ok(None);
    }
    match token.parse() {
        Ok(value) => Ok(Some(format(value))),
        Err(_) => {
            reader.set_cursor(start);
            Err(invalid(token).create_with_context(reader))
        }
    }
}
