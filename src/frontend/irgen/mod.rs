//! # IR Generation
//!
//! [IrGenContext] is the build context threaded through every lowering step:
//! the module under construction, the function being built, the insertion
//! cursor and the variable symbol table. It is exclusively owned, so there is
//! no hidden global builder state.
//!
//! Local failures are plain [IrGenError]s. Operations that compose values
//! accept the [IrGenResult] of their operands, so a failure propagates
//! through them without emitting anything.

mod control;
mod expr;
mod storage;

use log::{debug, error, trace};
use rustc_hash::FxHashMap;
use thiserror::Error;

pub use self::control::IfElseBlocks;
use super::ast::{Expr, Program, RetKind, Stmt};
use crate::{
    collections::linked_list::LinkedListContainerPtr,
    ir::{
        self,
        verify::{Verify, VerifyError},
        Block,
        Func,
        Inst,
        Signature,
        Ty,
        Value,
    },
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IrGenError {
    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("expected an f64 operand, found {0}")]
    ExpectedFloat(Ty),

    #[error("no function is being built")]
    NoFunction,

    #[error("symbol @{0} is already defined")]
    DuplicateSymbol(String),

    #[error("block {0} is already attached")]
    BlockAlreadyAttached(String),

    #[error("block {0} was created but never attached")]
    UnattachedBlock(String),

    #[error("return type mismatch: expected {expected}, found {found}")]
    ReturnTypeMismatch { expected: Ty, found: Ty },

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

pub type IrGenResult<T> = Result<T, IrGenError>;

pub struct IrGenContext {
    ctx: ir::Context,

    curr_func: Option<Func>,
    /// The insertion cursor.
    curr_block: Option<Block>,

    /// Variable name to its stack slot, scoped to the current function.
    symtable: FxHashMap<String, Value>,
    /// Blocks created by [create_block](Self::create_block) and not attached
    /// yet.
    pending_blocks: Vec<Block>,
}

impl IrGenContext {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            ctx: ir::Context::new(module_name),
            curr_func: None,
            curr_block: None,
            symtable: FxHashMap::default(),
            pending_blocks: Vec::new(),
        }
    }

    /// The module built so far.
    pub fn ctx(&self) -> &ir::Context { &self.ctx }

    pub fn curr_func(&self) -> Option<Func> { self.curr_func }

    pub fn curr_block(&self) -> Option<Block> { self.curr_block }

    /// Start a new function without parameters.
    ///
    /// The entry block is created, attached and becomes the cursor. The symbol
    /// table is reset.
    pub fn begin_func(&mut self, name: &str, ret: RetKind) -> IrGenResult<Func> {
        if self.ctx.lookup_func(name).is_some() {
            error!("Duplicate function: {}", name);
            return Err(IrGenError::DuplicateSymbol(name.to_string()));
        }

        let ret = match ret {
            RetKind::F64 => vec![Ty::float64()],
            RetKind::Void => vec![],
        };
        let func = Func::new(&mut self.ctx, name, Signature::new(vec![], ret));

        let entry = Block::new(&mut self.ctx);
        if self.ctx.lookup_block("entry").is_none() {
            entry.assign_name(&mut self.ctx, "entry");
        } else {
            entry.alloc_name(&mut self.ctx, "entry");
        }
        func.push_back(&mut self.ctx, entry);

        self.curr_func = Some(func);
        self.curr_block = Some(entry);
        self.symtable.clear();
        self.pending_blocks.clear();

        debug!("begin function @{}", name);
        Ok(func)
    }

    /// Create a detached block.
    ///
    /// The block can be a branch target right away, but it has to be
    /// [attach](Self::attach)ed before the function is finished.
    pub fn create_block(&mut self, prefix: &str) -> IrGenResult<Block> {
        self.curr_func.ok_or(IrGenError::NoFunction)?;

        let block = Block::new(&mut self.ctx);
        block.alloc_name(&mut self.ctx, prefix);
        self.pending_blocks.push(block);

        debug!("create block {}", block.label(&self.ctx));
        Ok(block)
    }

    /// Append a block to the layout of the current function.
    pub fn attach(&mut self, block: Block) -> IrGenResult<()> {
        let func = self.curr_func.ok_or(IrGenError::NoFunction)?;

        if block.is_attached(&self.ctx) {
            return Err(IrGenError::BlockAlreadyAttached(
                block.label(&self.ctx).to_string(),
            ));
        }

        self.pending_blocks.retain(|&pending| pending != block);
        func.push_back(&mut self.ctx, block);

        trace!("attach block {}", block.label(&self.ctx));
        Ok(())
    }

    /// Move the insertion cursor to the end of `block`.
    pub fn switch_to(&mut self, block: Block) { self.curr_block = Some(block); }

    /// Append an instruction at the cursor.
    fn append(&mut self, inst: Inst) -> IrGenResult<()> {
        let block = self.curr_block.ok_or(IrGenError::NoFunction)?;
        block.push_back(&mut self.ctx, inst);
        Ok(())
    }

    /// Return from the current function.
    pub fn ret(&mut self, value: Option<IrGenResult<Value>>) -> IrGenResult<Inst> {
        let func = self.curr_func.ok_or(IrGenError::NoFunction)?;
        let value = value.transpose()?;

        let expected = func.sig(&self.ctx).ret_ty();
        let found = value.map_or(Ty::void(), |val| val.ty(&self.ctx));
        if expected != found {
            return Err(IrGenError::ReturnTypeMismatch { expected, found });
        }

        let inst = Inst::ret(&mut self.ctx, value);
        self.append(inst)?;
        Ok(inst)
    }

    /// Close the current function and verify it.
    ///
    /// Verification errors are logged and returned, the function stays in the
    /// module so that it can still be printed.
    pub fn finish_func(&mut self) -> IrGenResult<Func> {
        let func = self.curr_func.ok_or(IrGenError::NoFunction)?;

        if let Some(block) = self.pending_blocks.first() {
            let label = block.label(&self.ctx).to_string();
            error!("Unattached block {} in @{}", label, func.name(&self.ctx));
            return Err(IrGenError::UnattachedBlock(label));
        }

        if let Err(err) = func.verify(&self.ctx) {
            error!("Verification failed: {}", err);
            return Err(err.into());
        }

        self.curr_func = None;
        self.curr_block = None;
        self.symtable.clear();

        debug!("finish function @{}", func.name(&self.ctx));
        Ok(func)
    }

    /// Finish the irgen process and return the module.
    pub fn finish(self) -> ir::Context { self.ctx }
}

pub trait IrGen {
    type Output;

    fn irgen(&self, irgen: &mut IrGenContext) -> IrGenResult<Self::Output>;
}

impl IrGen for Expr {
    type Output = Value;

    fn irgen(&self, irgen: &mut IrGenContext) -> IrGenResult<Value> {
        match self {
            Expr::Num(value) => irgen.constant(*value),
            Expr::Var(name) => irgen.read(name),
            Expr::Binary(lhs, op, rhs) => {
                // a failed lhs stops before the rhs emits anything
                let lhs = lhs.irgen(irgen)?;
                let rhs = rhs.irgen(irgen);
                irgen.binary_op(Ok(lhs), rhs, op)
            }
        }
    }
}

fn irgen_body(body: &[Stmt], irgen: &mut IrGenContext) -> IrGenResult<()> {
    for stmt in body {
        stmt.irgen(irgen)?;
    }
    Ok(())
}

impl IrGen for Stmt {
    type Output = ();

    fn irgen(&self, irgen: &mut IrGenContext) -> IrGenResult<()> {
        match self {
            Stmt::Assign(name, expr) => {
                let value = expr.irgen(irgen);
                irgen.assign(name, value)?;
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                let cond = cond.irgen(irgen);
                irgen.if_else(
                    cond,
                    |irgen| irgen_body(then_body, irgen),
                    |irgen| irgen_body(else_body, irgen),
                )?;
            }
            Stmt::Return(expr) => {
                let value = expr.as_ref().map(|expr| expr.irgen(irgen));
                irgen.ret(value)?;
            }
        }
        Ok(())
    }
}

impl IrGen for Program {
    type Output = Func;

    fn irgen(&self, irgen: &mut IrGenContext) -> IrGenResult<Func> {
        irgen.begin_func(&self.name, self.ret)?;
        irgen_body(&self.body, irgen)?;
        irgen.finish_func()
    }
}
