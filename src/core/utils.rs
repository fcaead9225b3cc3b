//! Utility types and traits.

use core::fmt;

/// Represents a type with reserved value.
///
/// Intrusive links store their neighbours as [`PackedOption`]s, so every
/// pointer that can be linked must reserve one value for "no neighbour".
pub trait Reserved {
    /// Create an invalid/reserved value.
    fn reserved() -> Self;

    /// Check if the value is reserved.
    fn is_reserved(&self) -> bool;
}

/// A wrapper of [`Reserved`] types.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedOption<T: Reserved>(T);

impl<T: Reserved> Default for PackedOption<T> {
    fn default() -> Self { Self(T::reserved()) }
}

impl<T: Reserved> PackedOption<T> {
    /// Create a new non-reserved value.
    ///
    /// # Panics
    ///
    /// Panics if the value is reserved.
    pub fn some(value: T) -> Self {
        assert!(
            !value.is_reserved(),
            "called `PackedOption::some()` with a reserved value"
        );
        Self(value)
    }

    /// Create a new reserved value.
    pub fn none() -> Self { Self::default() }

    /// Returns `true` if the option is a reserved value.
    #[must_use]
    pub fn is_none(&self) -> bool { self.0.is_reserved() }

    /// Returns `true` if the option is not a reserved value.
    #[must_use]
    pub fn is_some(&self) -> bool { !self.is_none() }

    /// Expand the packed option into an option.
    #[must_use]
    pub fn unpack(self) -> Option<T> {
        if self.0.is_reserved() {
            None
        } else {
            Some(self.0)
        }
    }
}

impl<T: Reserved> From<Option<T>> for PackedOption<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::some(value),
            None => Self::none(),
        }
    }
}

impl<T: Reserved> From<PackedOption<T>> for Option<T> {
    fn from(value: PackedOption<T>) -> Self { value.unpack() }
}

impl<T> fmt::Debug for PackedOption<T>
where
    T: Reserved + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_some() {
            write!(f, "Some({:?})", self.0)
        } else {
            write!(f, "None")
        }
    }
}
