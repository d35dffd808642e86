//! # General Utilities
//!
//! Control flow graph abstractions shared by the verifier and the reference
//! interpreter. They are written against the [CfgNode]/[CfgRegion] traits so
//! the algorithms can be tested on hand-made graphs.

pub mod cfg;
pub mod dfs;
pub mod dominance;

pub use cfg::{CfgInfo, CfgNode, CfgRegion};
pub use dominance::Dominance;
