//! # Memo Slots
//!
//! Each embedding caches its materialized document(s) in one slot owned by
//! the host instance. The slot is populated lazily by the reader and
//! overwritten by the writer; nothing else touches it.
//!
//! Slots use `RefCell` and are therefore `!Sync`. A host shared across
//! threads needs external synchronization.

use std::cell::RefCell;
use std::fmt;

/// A lazily populated, explicitly replaced cache cell.
pub struct MemoSlot<T> {
    cell: RefCell<Option<T>>,
}

impl<T> Default for MemoSlot<T> {
    fn default() -> Self {
        Self {
            cell: RefCell::new(None),
        }
    }
}

/// Cloning a host yields a new instance; its cache starts empty.
impl<T> Clone for MemoSlot<T> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<T> fmt::Debug for MemoSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoSlot")
            .field("populated", &self.is_populated())
            .finish()
    }
}

impl<T> MemoSlot<T> {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a value is cached.
    pub fn is_populated(&self) -> bool {
        self.cell.borrow().is_some()
    }

    /// Replace the cached value.
    pub fn replace(&self, value: T) {
        *self.cell.borrow_mut() = Some(value);
    }

    /// Drop the cached value.
    pub fn clear(&self) {
        self.cell.borrow_mut().take();
    }
}

impl<T: Clone> MemoSlot<T> {
    /// The cached value, if any.
    pub fn get(&self) -> Option<T> {
        self.cell.borrow().clone()
    }

    /// The cached value, computing and caching it with `init` on a miss.
    ///
    /// A failed `init` leaves the slot empty. `init` runs without the slot
    /// borrowed, so it may read the host again.
    pub fn get_or_try_init<E>(&self, init: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        if let Some(value) = self.cell.borrow().as_ref() {
            return Ok(value.clone());
        }
        let value = init()?;
        *self.cell.borrow_mut() = Some(value.clone());
        Ok(value)
    }
}
