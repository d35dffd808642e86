//! # Frontend
//!
//! There is no parser: programs are handed over as an already-decided
//! sequence of statements ([ast]), and [irgen] lowers them into the IR.
//! The build context can also be driven operation by operation, which is how
//! the tests exercise it.

pub mod ast;
pub mod irgen;

pub use ast::{Expr, Program, RetKind, Stmt};
pub use irgen::{IfElseBlocks, IrGen, IrGenContext, IrGenError, IrGenResult};
