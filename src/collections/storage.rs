//! Storage utilities.
//!
//! Every entity of the IR (values, instructions, blocks and functions) lives in
//! a [BaseArena] owned by the IR context, and is referred to by a small `Copy`
//! handle. Handles never own the data, so cyclic structures like the
//! block/instruction lists or the def-use edges can be expressed without
//! reference counting.
//!
//! - [ArenaPtr]: a handle that can be dereferenced in its arena.
//! - [ArenaDeref]: an arena that can dereference a handle.
//! - [ArenaAlloc]: an arena that can allocate new entries.
//!
//! Entries are never released: a compilation unit is small and short-lived,
//! and the whole context is dropped at once.
//!
//! # Examples
//!
//! ```rust
//! use flowc::collections::storage::*;
//!
//! struct Slot {
//!     name: &'static str,
//!     this: BaseArenaPtr<Slot>,
//! }
//!
//! let mut arena = BaseArena::default();
//!
//! let a = arena.alloc_with(|this| Slot { name: "a", this });
//! let b = arena.alloc_with(|this| Slot { name: "b", this });
//!
//! assert_ne!(a, b);
//! assert_eq!(arena.try_deref(a).unwrap().this, a);
//! assert_eq!(arena.try_deref(b).unwrap().name, "b");
//! ```
//!
//! A container holding several arenas implements the traits per entity with
//! [impl_arena](crate::impl_arena), so `ptr.deref(&ctx)` picks the right arena
//! from the type of the handle.

use std::{fmt, hash::Hash, marker::PhantomData};

/// Indicates that the type can be used to dereference an arena pointer.
pub trait ArenaDeref<T, Ptr>
where
    Ptr: ArenaPtr<T = T, A = Self>,
{
    /// Try to dereference a pointer.
    ///
    /// # Returns
    ///
    /// - `Some(&T)` if the pointer refers to an allocated entry.
    /// - `None` if the pointer is out of bounds.
    fn try_deref(&self, ptr: Ptr) -> Option<&T>;

    /// Try to dereference a pointer mutably.
    fn try_deref_mut(&mut self, ptr: Ptr) -> Option<&mut T>;
}

/// Indicates that the type can be used to allocate values in the arena.
pub trait ArenaAlloc<T, Ptr>: ArenaDeref<T, Ptr>
where
    Ptr: ArenaPtr<T = T, A = Self>,
{
    /// Allocate a value with a closure accepting the reserved pointer.
    ///
    /// The closure receives the handle of the entry being built.
    fn alloc_with<F>(&mut self, f: F) -> Ptr
    where
        F: FnOnce(Ptr) -> T;

    /// Allocate a value in the arena.
    fn alloc(&mut self, val: T) -> Ptr { self.alloc_with(|_| val) }
}

/// The pointer-like trait that can be used to deref and get the value from the
/// corresponding [ArenaDeref] type.
pub trait ArenaPtr: Copy + Sized + Eq {
    /// The type of dereferenced value.
    type T;

    /// The type of the corresponding arena.
    type A: ArenaDeref<Self::T, Self>;

    fn try_deref(self, arena: &Self::A) -> Option<&Self::T>;

    fn try_deref_mut(self, arena: &mut Self::A) -> Option<&mut Self::T>;

    /// Dereference the pointer.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is dangling.
    fn deref(self, arena: &Self::A) -> &Self::T {
        self.try_deref(arena).expect("the arena pointer is invalid")
    }

    /// Dereference the pointer mutably.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is dangling.
    fn deref_mut(self, arena: &mut Self::A) -> &mut Self::T {
        self.try_deref_mut(arena)
            .expect("the arena pointer is invalid")
    }
}

/// A handle to an object in a [BaseArena].
pub struct BaseArenaPtr<T> {
    id: usize,
    _marker: PhantomData<T>,
}

impl<T> fmt::Debug for BaseArenaPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BaseArenaPtr({})", self.id)
    }
}

impl<T> PartialEq for BaseArenaPtr<T> {
    fn eq(&self, other: &Self) -> bool { self.id == other.id }
}

impl<T> Eq for BaseArenaPtr<T> {}

impl<T> Hash for BaseArenaPtr<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) { self.id.hash(state); }
}

impl<T> From<usize> for BaseArenaPtr<T> {
    fn from(id: usize) -> Self {
        BaseArenaPtr {
            id,
            _marker: PhantomData,
        }
    }
}

#[allow(clippy::non_canonical_clone_impl)]
impl<T> Clone for BaseArenaPtr<T> {
    fn clone(&self) -> Self {
        // `T` is not required to be `Clone`.
        BaseArenaPtr {
            id: self.id,
            _marker: PhantomData,
        }
    }
}

impl<T> Copy for BaseArenaPtr<T> {}

impl<T> BaseArenaPtr<T> {
    /// The index of the object in the arena.
    pub fn id(self) -> usize { self.id }
}

impl<T> ArenaPtr for BaseArenaPtr<T> {
    type A = BaseArena<T>;
    type T = T;

    fn try_deref(self, arena: &BaseArena<T>) -> Option<&T> { arena.try_deref(self) }

    fn try_deref_mut(self, arena: &mut BaseArena<T>) -> Option<&mut T> { arena.try_deref_mut(self) }
}

/// A simple append-only arena backed by a vector.
pub struct BaseArena<T> {
    pool: Vec<T>,
}

impl<T> Default for BaseArena<T> {
    fn default() -> Self { BaseArena { pool: Vec::new() } }
}

impl<T> ArenaAlloc<T, BaseArenaPtr<T>> for BaseArena<T> {
    fn alloc_with<F>(&mut self, f: F) -> BaseArenaPtr<T>
    where
        F: FnOnce(BaseArenaPtr<T>) -> T,
    {
        let ptr = BaseArenaPtr::from(self.pool.len());
        let val = f(ptr);
        self.pool.push(val);
        ptr
    }
}

impl<T> ArenaDeref<T, BaseArenaPtr<T>> for BaseArena<T> {
    fn try_deref(&self, ptr: BaseArenaPtr<T>) -> Option<&T> { self.pool.get(ptr.id()) }

    fn try_deref_mut(&mut self, ptr: BaseArenaPtr<T>) -> Option<&mut T> {
        self.pool.get_mut(ptr.id())
    }
}

/// Implement the arena traits for a handle stored in a field of a container.
#[macro_export]
macro_rules! impl_arena {
    ($arena:ty, $value:ty, $ptr:path, $field:ident) => {
        impl $crate::collections::storage::ArenaPtr for $ptr {
            type A = $arena;
            type T = $value;

            fn try_deref(self, arena: &Self::A) -> Option<&Self::T> {
                $crate::collections::storage::ArenaDeref::try_deref(arena, self)
            }

            fn try_deref_mut(self, arena: &mut Self::A) -> Option<&mut Self::T> {
                $crate::collections::storage::ArenaDeref::try_deref_mut(arena, self)
            }
        }

        impl $crate::collections::storage::ArenaAlloc<$value, $ptr> for $arena {
            fn alloc_with<F>(&mut self, f: F) -> $ptr
            where
                F: FnOnce($ptr) -> $value,
            {
                $ptr($crate::collections::storage::ArenaAlloc::alloc_with(
                    &mut self.$field,
                    |ptr| f($ptr(ptr)),
                ))
            }
        }

        impl $crate::collections::storage::ArenaDeref<$value, $ptr> for $arena {
            fn try_deref(&self, ptr: $ptr) -> Option<&$value> {
                $crate::collections::storage::ArenaDeref::try_deref(&self.$field, ptr.0)
            }

            fn try_deref_mut(&mut self, ptr: $ptr) -> Option<&mut $value> {
                $crate::collections::storage::ArenaDeref::try_deref_mut(&mut self.$field, ptr.0)
            }
        }
    };
}
