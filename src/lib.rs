#![forbid(unsafe_code)]
#![warn(clippy::wildcard_enum_match_arm)]

pub mod codegen;
pub mod collections;
pub mod frontend;
pub mod ir;
pub mod utils;
