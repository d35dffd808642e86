//! # The Intermediate Representation
//!
//! A control flow graph IR in SSA form over a single numeric type. Every
//! entity is allocated in the arenas of [Context] and referred to by a `Copy`
//! handle.

mod block;
mod context;
mod func;
mod inst;
mod name_alloc;
mod ty;
mod value;

pub mod exec;
pub mod verify;

pub use block::{Block, BlockData};
pub use context::{Context, TargetInfo};
pub use func::{Func, FuncData};
pub use inst::{CastOp, FBinaryOp, FCmpCond, FloatConstant, Inst, InstData, InstKind};
pub use ty::{Signature, Ty};
pub use value::{Value, ValueData};
