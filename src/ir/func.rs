use std::fmt;

use super::{Block, Context, Signature};
use crate::{
    collections::{
        linked_list::LinkedListContainerPtr,
        storage::{ArenaAlloc, ArenaPtr, BaseArenaPtr},
    },
    impl_arena,
    utils::cfg::CfgRegion,
};

/// The data of a function.
///
/// No separate data flow graph is kept, everything is stored in [Context].
/// The block layout is an intrusive linked list, the first block is the entry.
pub struct FuncData {
    name: String,
    sig: Signature,
    /// The head block of the function, also the entry block in control flow.
    head: Option<Block>,
    /// The tail block of the function, not necessarily the exit block in
    /// control flow.
    tail: Option<Block>,
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
pub struct Func(BaseArenaPtr<FuncData>);

impl_arena!(Context, FuncData, Func, funcs);

impl Func {
    /// Create a function without blocks and register its symbol.
    ///
    /// # Panics
    ///
    /// Panics if the symbol already exists.
    pub fn new(ctx: &mut Context, name: impl Into<String>, sig: Signature) -> Func {
        let name = name.into();
        let func = ctx.alloc(FuncData {
            name: name.clone(),
            sig,
            head: None,
            tail: None,
        });
        ctx.insert_func(name, func);
        func
    }

    pub fn name(self, ctx: &Context) -> &str { &self.deref(ctx).name }

    pub fn sig(self, ctx: &Context) -> &Signature { &self.deref(ctx).sig }

    /// The entry block, `None` for an empty function.
    pub fn entry(self, ctx: &Context) -> Option<Block> { self.head(ctx) }

    pub fn display(self, ctx: &Context) -> DisplayFunc<'_> { DisplayFunc { ctx, func: self } }
}

impl CfgRegion for Func {
    type Node = Block;

    fn entry_node(self, ctx: &Context) -> Block {
        self.entry(ctx).expect("entry block of function not found")
    }
}

impl LinkedListContainerPtr<Block> for Func {
    fn head(self, ctx: &Context) -> Option<Block> { self.deref(ctx).head }

    fn tail(self, ctx: &Context) -> Option<Block> { self.deref(ctx).tail }

    fn set_head(self, ctx: &mut Context, head: Option<Block>) { self.deref_mut(ctx).head = head; }

    fn set_tail(self, ctx: &mut Context, tail: Option<Block>) { self.deref_mut(ctx).tail = tail; }
}

pub struct DisplayFunc<'a> {
    ctx: &'a Context,
    func: Func,
}

impl fmt::Display for DisplayFunc<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "func @{}{} {{",
            self.func.name(self.ctx),
            self.func.sig(self.ctx)
        )?;

        for block in self.func.iter(self.ctx) {
            write!(f, "{}", block.display(self.ctx))?;
        }

        write!(f, "}}")
    }
}
