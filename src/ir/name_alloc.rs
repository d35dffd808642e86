use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::collections::storage::ArenaPtr;

/// Bidirectional name table for values or blocks.
///
/// Names only matter for the textual dump, so they are allocated lazily.
pub struct NameAlloc<T>
where
    T: ArenaPtr + Hash,
{
    name_to_ptr: FxHashMap<String, T>,
    ptr_to_name: FxHashMap<T, String>,
    /// Next suffix for each prefix.
    counters: FxHashMap<String, usize>,
}

impl<T> Default for NameAlloc<T>
where
    T: ArenaPtr + Hash,
{
    fn default() -> Self {
        Self {
            name_to_ptr: FxHashMap::default(),
            ptr_to_name: FxHashMap::default(),
            counters: FxHashMap::default(),
        }
    }
}

impl<T> NameAlloc<T>
where
    T: ArenaPtr + Hash,
{
    pub(super) fn get_name(&self, ptr: T) -> Option<&String> { self.ptr_to_name.get(&ptr) }

    pub(super) fn get_ptr(&self, name: &str) -> Option<T> { self.name_to_ptr.get(name).copied() }

    /// Assign an exact name.
    ///
    /// # Panics
    ///
    /// - Panics if the name is empty or already taken.
    /// - Panics if the pointer already has a name.
    pub(super) fn assign_name(&mut self, ptr: T, name: impl Into<String>) {
        let name = name.into();
        if name.is_empty() {
            panic!("name cannot be empty");
        }
        if self.name_to_ptr.contains_key(&name) {
            panic!("name {:?} is already assigned", name);
        }
        if self.ptr_to_name.contains_key(&ptr) {
            panic!("pointer is already assigned a name");
        }
        self.name_to_ptr.insert(name.clone(), ptr);
        self.ptr_to_name.insert(ptr, name);
    }

    /// Allocate `<prefix><n>` with the smallest free `n` for this prefix.
    ///
    /// # Panics
    ///
    /// Panics if the pointer already has a name.
    pub(super) fn alloc_name(&mut self, ptr: T, prefix: impl Into<String>) -> &String {
        let prefix = prefix.into();
        let counter = self.counters.entry(prefix.clone()).or_insert(0);
        let name = loop {
            let name = format!("{}{}", prefix, counter);
            *counter += 1;
            if !self.name_to_ptr.contains_key(&name) {
                break name;
            }
        };
        self.assign_name(ptr, name);
        &self.ptr_to_name[&ptr]
    }
}
