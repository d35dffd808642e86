//! Structured control flow.

use log::trace;

use super::{IrGenContext, IrGenResult};
use crate::ir::{Block, FBinaryOp, FCmpCond, Inst, Value};

/// The blocks of one lowered if/else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfElseBlocks {
    pub then_block: Block,
    pub else_block: Block,
    pub merge_block: Block,
}

impl IrGenContext {
    /// Lower `if (cond) { then_body } else { else_body }`.
    ///
    /// ```text
    ///          cursor
    ///  br (cond != 0.0), ^then, ^else
    ///        /          \
    ///    ^then          ^else
    ///  jump ^merge    jump ^merge
    ///        \          /
    ///          ^merge  <- cursor afterwards
    /// ```
    ///
    /// The then block is attached right away, the else block after the then
    /// body and the merge block after the else body, so the layout follows
    /// the source order.
    ///
    /// A failed condition creates no blocks at all. A failed body still gets
    /// its branch to the merge block, so the function stays well formed, and
    /// the first body error is returned once the cursor is at the merge block.
    pub fn if_else<T, E>(
        &mut self,
        cond: IrGenResult<Value>,
        then_body: T,
        else_body: E,
    ) -> IrGenResult<IfElseBlocks>
    where
        T: FnOnce(&mut Self) -> IrGenResult<()>,
        E: FnOnce(&mut Self) -> IrGenResult<()>,
    {
        let cond = cond?;
        self.expect_float(cond)?;

        let zero = self.constant(0.0)?;
        let cmp = Inst::fbinary(
            &mut self.ctx,
            FBinaryOp::Cmp(FCmpCond::ONe),
            cond,
            zero,
        );
        self.append(cmp)?;
        let decision = cmp.result(&self.ctx, 0);

        let then_block = self.create_block("then")?;
        self.attach(then_block)?;
        let else_block = self.create_block("else")?;
        let merge_block = self.create_block("merge")?;

        let br = Inst::br(&mut self.ctx, decision, then_block, else_block);
        self.append(br)?;

        trace!("if/else: building {}", then_block.label(&self.ctx));
        self.switch_to(then_block);
        let then_result = then_body(self);
        self.jump_to(merge_block)?;
        self.attach(else_block)?;

        trace!("if/else: building {}", else_block.label(&self.ctx));
        self.switch_to(else_block);
        let else_result = else_body(self);
        self.jump_to(merge_block)?;
        self.attach(merge_block)?;

        self.switch_to(merge_block);

        then_result.and(else_result)?;

        Ok(IfElseBlocks {
            then_block,
            else_block,
            merge_block,
        })
    }

    /// Branch from the cursor to `target`, unless the block under the cursor
    /// is already terminated.
    fn jump_to(&mut self, target: Block) -> IrGenResult<()> {
        if let Some(block) = self.curr_block {
            if block.terminator(&self.ctx).is_some() {
                return Ok(());
            }
        }
        let jump = Inst::jump(&mut self.ctx, target);
        self.append(jump)
    }
}
