//! Shared property cells for Horizon Tags.
//!
//! A [`Property<T>`] holds a value that several collaborators read and that
//! one of them occasionally replaces, such as a widget's resolved options.
//!
//! # Example
//!
//! ```
//! use horizon_tags_core::Property;
//!
//! let limit = Property::new(10);
//! limit.update(|n| *n += 5);
//! assert_eq!(limit.with(|n| *n * 2), 30);
//! limit.set_silent(20);
//! assert_eq!(limit.get(), 20);
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A value with interior mutability, shared between handles.
///
/// `Property<T>` uses a `RwLock` internally and is `Send + Sync` when `T` is.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Mutate the value in place.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut self.value.write())
    }

    /// Set the value unconditionally.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &*self.value.read())
            .finish()
    }
}

static_assertions::assert_impl_all!(Property<String>: Send, Sync);
