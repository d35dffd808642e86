use core::fmt;

use super::{Context, Func, Inst};
use crate::{
    collections::{
        linked_list::{LinkedListContainerPtr, LinkedListNodePtr},
        storage::{ArenaAlloc, ArenaPtr, BaseArenaPtr},
    },
    impl_arena,
    utils::cfg::CfgNode,
};

/// The data of a block.
pub struct BlockData {
    /// The first instruction of the block.
    head: Option<Inst>,
    /// The last instruction of the block.
    tail: Option<Inst>,
    /// The next block in the function layout.
    next: Option<Block>,
    /// The previous block in the function layout.
    prev: Option<Block>,
    /// The function the block is attached to, `None` while detached.
    parent: Option<Func>,
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
pub struct Block(BaseArenaPtr<BlockData>);

impl_arena!(Context, BlockData, Block, blocks);

impl Block {
    /// Create a new detached block.
    ///
    /// The block can be used as a branch target right away, it becomes part of
    /// a function's layout once pushed into it.
    pub fn new(ctx: &mut Context) -> Block {
        ctx.alloc(BlockData {
            head: None,
            tail: None,
            next: None,
            prev: None,
            parent: None,
        })
    }

    pub fn is_attached(self, ctx: &Context) -> bool { self.container(ctx).is_some() }

    /// The terminator of the block, i.e. the tail if it is a terminator.
    pub fn terminator(self, ctx: &Context) -> Option<Inst> {
        self.tail(ctx).filter(|inst| inst.is_terminator(ctx))
    }

    /// Assign an exact name for the block.
    ///
    /// # Panics
    ///
    /// - Panics if the name is already assigned to another block.
    /// - Panics if the name is empty.
    /// - Panics if this block is already assigned a name.
    pub fn assign_name(self, ctx: &mut Context, name: impl Into<String>) {
        ctx.block_name_alloc.assign_name(self, name);
    }

    /// Allocate a unique `<prefix><n>` name for the block.
    pub fn alloc_name(self, ctx: &mut Context, prefix: impl Into<String>) -> &String {
        ctx.block_name_alloc.alloc_name(self, prefix)
    }

    pub fn name(self, ctx: &Context) -> Option<&String> { ctx.block_name_alloc.get_name(self) }

    pub fn name_or_alloc(self, ctx: &mut Context, prefix: impl Into<String>) -> &String {
        if ctx.block_name_alloc.get_name(self).is_none() {
            ctx.block_name_alloc.alloc_name(self, prefix);
        }
        ctx.block_name_alloc
            .get_name(self)
            .expect("block name just allocated")
    }

    pub fn id(self) -> usize { self.0.id() }

    /// `^name`, as used by branch instructions.
    pub fn label(self, ctx: &Context) -> DisplayLabel<'_> { DisplayLabel { ctx, block: self } }

    /// The block with its instructions.
    pub fn display(self, ctx: &Context) -> DisplayBlock<'_> { DisplayBlock { ctx, block: self } }
}

impl CfgNode for Block {
    type Region = Func;

    fn succs(self, ctx: &Context) -> Vec<Block> {
        // unterminated blocks are reported by the verifier, not here
        self.terminator(ctx)
            .map(|inst| inst.succ_blocks(ctx).to_vec())
            .unwrap_or_default()
    }
}

pub struct DisplayLabel<'a> {
    ctx: &'a Context,
    block: Block,
}

impl fmt::Display for DisplayLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.block.name(self.ctx) {
            Some(name) => write!(f, "^{}", name),
            None => write!(f, "^{}", self.block.id()),
        }
    }
}

pub struct DisplayBlock<'a> {
    ctx: &'a Context,
    block: Block,
}

impl fmt::Display for DisplayBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.block.label(self.ctx))?;
        for inst in self.block.iter(self.ctx) {
            writeln!(f, "    {}", inst.display(self.ctx))?;
        }
        Ok(())
    }
}

impl LinkedListContainerPtr<Inst> for Block {
    fn head(self, ctx: &Context) -> Option<Inst> { self.deref(ctx).head }

    fn tail(self, ctx: &Context) -> Option<Inst> { self.deref(ctx).tail }

    fn set_head(self, ctx: &mut Context, head: Option<Inst>) { self.deref_mut(ctx).head = head; }

    fn set_tail(self, ctx: &mut Context, tail: Option<Inst>) { self.deref_mut(ctx).tail = tail; }
}

impl LinkedListNodePtr for Block {
    type ContainerPtr = Func;

    fn next(self, ctx: &Context) -> Option<Block> { self.deref(ctx).next }

    fn prev(self, ctx: &Context) -> Option<Block> { self.deref(ctx).prev }

    fn set_next(self, ctx: &mut Context, next: Option<Block>) { self.deref_mut(ctx).next = next; }

    fn set_prev(self, ctx: &mut Context, prev: Option<Block>) { self.deref_mut(ctx).prev = prev; }

    fn container(self, ctx: &Context) -> Option<Func> { self.deref(ctx).parent }

    fn set_container(self, ctx: &mut Context, container: Option<Func>) {
        self.deref_mut(ctx).parent = container;
    }
}
