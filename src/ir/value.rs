//! # Values in IR
//!
//! A value is the single result of an instruction. Values are never mutated
//! after creation, source-level variables live in stack slots instead.

use core::fmt;

use super::{Context, Inst, Ty};
use crate::{
    collections::storage::{ArenaPtr, BaseArenaPtr},
    impl_arena,
};

pub struct ValueData {
    ty: Ty,
    /// The defining instruction.
    def: Inst,
}

impl ValueData {
    pub(super) fn new_inst_result(ty: Ty, def: Inst) -> Self { Self { ty, def } }
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
pub struct Value(BaseArenaPtr<ValueData>);

impl_arena!(Context, ValueData, Value, values);

impl Value {
    pub fn ty(self, ctx: &Context) -> Ty { self.deref(ctx).ty }

    /// The instruction producing this value.
    pub fn def_inst(self, ctx: &Context) -> Inst { self.deref(ctx).def }

    pub fn id(self) -> usize { self.0.id() }

    /// Assign an exact name for the value.
    ///
    /// # Panics
    ///
    /// Panics if the name is taken or the value is already named.
    pub fn assign_name(self, ctx: &mut Context, name: impl Into<String>) {
        ctx.value_name_alloc.assign_name(self, name);
    }

    /// Allocate a unique `<prefix><n>` name for the value.
    pub fn alloc_name(self, ctx: &mut Context, prefix: impl Into<String>) -> &String {
        ctx.value_name_alloc.alloc_name(self, prefix)
    }

    pub fn name(self, ctx: &Context) -> Option<&String> { ctx.value_name_alloc.get_name(self) }

    pub fn name_or_alloc(self, ctx: &mut Context, prefix: impl Into<String>) -> &String {
        if ctx.value_name_alloc.get_name(self).is_none() {
            ctx.value_name_alloc.alloc_name(self, prefix);
        }
        ctx.value_name_alloc
            .get_name(self)
            .expect("value name just allocated")
    }

    pub fn display(self, ctx: &Context) -> DisplayValue<'_> { DisplayValue { ctx, value: self } }
}

/// `%name`, or `%<id>` for values that were never named.
pub struct DisplayValue<'a> {
    ctx: &'a Context,
    value: Value,
}

impl fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.name(self.ctx) {
            Some(name) => write!(f, "%{}", name),
            None => write!(f, "%{}", self.value.id()),
        }
    }
}
