//! # Collection of Basic Data Structures
//!
//! - `storage`: Arena-based storage for the linked data structures of the IR.
//! - `linked_list`: Intrusive linked lists on top of the arenas.

pub mod linked_list;
pub mod storage;
