//! Structural verification of functions.
//!
//! - every attached block ends with exactly one terminator, and it is last
//! - branch targets are attached to the same function
//! - the entry block is never a branch target
//! - every operand is defined before its use on every path (dominance)
//! - operands have the expected types, returns match the signature

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::{Block, CastOp, Context, Func, Inst, InstKind, Ty};
use crate::{
    collections::linked_list::{LinkedListContainerPtr, LinkedListNodePtr},
    utils::{cfg::CfgRegion, dominance::Dominance},
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("function @{0} has no blocks")]
    EmptyFunction(String),

    #[error("block {block} in @{func} does not end with a terminator")]
    MissingTerminator { func: String, block: String },

    #[error("block {block} in @{func} has a terminator before its end")]
    TerminatorNotLast { func: String, block: String },

    #[error("entry block of @{0} is a branch target")]
    EntryHasPredecessors(String),

    #[error("block {block} in @{func} branches to detached block {target}")]
    DetachedSuccessor {
        func: String,
        block: String,
        target: String,
    },

    #[error("{value} is used in block {block} of @{func} before it is defined")]
    UseBeforeDef {
        func: String,
        block: String,
        value: String,
    },

    #[error("ill-typed operands in @{func}: {inst}")]
    OperandType { func: String, inst: String },
}

pub trait Verify {
    type Error;

    fn verify(&self, ctx: &Context) -> Result<(), Self::Error>;
}

impl Verify for Func {
    type Error = VerifyError;

    fn verify(&self, ctx: &Context) -> Result<(), VerifyError> {
        let func = *self;
        let func_name = || func.name(ctx).to_string();
        let label = |block: Block| block.label(ctx).to_string();

        let entry = func
            .entry(ctx)
            .ok_or_else(|| VerifyError::EmptyFunction(func_name()))?;

        for block in func.iter(ctx) {
            let tail = block.tail(ctx);
            if tail.map_or(true, |inst| !inst.is_terminator(ctx)) {
                return Err(VerifyError::MissingTerminator {
                    func: func_name(),
                    block: label(block),
                });
            }

            for inst in block.iter(ctx) {
                if inst.is_terminator(ctx) && Some(inst) != tail {
                    return Err(VerifyError::TerminatorNotLast {
                        func: func_name(),
                        block: label(block),
                    });
                }
            }

            for &succ in block.terminator(ctx).into_iter().flat_map(|t| t.succ_blocks(ctx)) {
                if succ.container(ctx) != Some(func) {
                    return Err(VerifyError::DetachedSuccessor {
                        func: func_name(),
                        block: label(block),
                        target: label(succ),
                    });
                }
                if succ == entry {
                    return Err(VerifyError::EntryHasPredecessors(func_name()));
                }
            }

            for inst in block.iter(ctx) {
                verify_operand_types(ctx, func, inst)?;
            }
        }

        verify_dominance(ctx, func)
    }
}

fn verify_operand_types(ctx: &Context, func: Func, inst: Inst) -> Result<(), VerifyError> {
    let operands = inst.operands(ctx);
    let well_typed = match inst.kind(ctx) {
        InstKind::FConst(_) | InstKind::StackSlot(_) | InstKind::Jump => operands.is_empty(),
        InstKind::FBinary(_) => operands.iter().all(|val| val.ty(ctx).is_float()),
        InstKind::Cast(CastOp::UiToFp) => operands[0].ty(ctx).is_integer(),
        InstKind::Load => operands[0].ty(ctx).is_ptr(),
        InstKind::Store => operands[1].ty(ctx).is_ptr() && !operands[0].ty(ctx).is_ptr(),
        InstKind::Br => operands[0].ty(ctx) == Ty::bool(),
        InstKind::Ret => {
            let expected = func.sig(ctx).ret_ty();
            match operands {
                [] => expected.is_void(),
                [val] => val.ty(ctx) == expected,
                _ => false,
            }
        }
    };
    if well_typed {
        Ok(())
    } else {
        Err(VerifyError::OperandType {
            func: func.name(ctx).to_string(),
            inst: inst.display(ctx).to_string(),
        })
    }
}

fn verify_dominance(ctx: &Context, func: Func) -> Result<(), VerifyError> {
    let cfg = func.cfg_info(ctx);
    let dom = Dominance::new(ctx, &cfg);

    // position of every instruction inside its block
    let mut positions: FxHashMap<Inst, usize> = FxHashMap::default();
    for block in func.iter(ctx) {
        for (pos, inst) in block.iter(ctx).enumerate() {
            positions.insert(inst, pos);
        }
    }

    for block in func.iter(ctx) {
        if !cfg.is_reachable(block) {
            continue;
        }
        for inst in block.iter(ctx) {
            for &operand in inst.operands(ctx) {
                let def = operand.def_inst(ctx);
                let defined_before = match def.container(ctx) {
                    Some(def_block) if def_block.container(ctx) == Some(func) => {
                        if def_block == block {
                            positions[&def] < positions[&inst]
                        } else {
                            dom.dominates(def_block, block)
                        }
                    }
                    Some(_) | None => false,
                };
                if !defined_before {
                    return Err(VerifyError::UseBeforeDef {
                        func: func.name(ctx).to_string(),
                        block: block.label(ctx).to_string(),
                        value: operand.display(ctx).to_string(),
                    });
                }
            }
        }
    }

    Ok(())
}

/// Verify all the functions of a module, stopping at the first error.
pub fn verify_module(ctx: &Context) -> Result<(), VerifyError> {
    for func in ctx.funcs() {
        func.verify(ctx)?;
    }
    Ok(())
}
