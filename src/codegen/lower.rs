//! Lowering of verified IR functions to Cranelift IR.
//!
//! Stack slots become explicit Cranelift stack slots, so loads and stores
//! are `stack_load`/`stack_store` and no pointer ever escapes into a register.

use cranelift_codegen::ir::{
    self as clir,
    condcodes::FloatCC,
    types,
    AbiParam,
    InstBuilder,
    StackSlotData,
    StackSlotKind,
};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use rustc_hash::FxHashMap;

use super::EmitError;
use crate::{
    collections::linked_list::LinkedListContainerPtr,
    ir::{Block, CastOp, Context, FBinaryOp, FCmpCond, Func, Inst, InstKind, Signature, Ty, Value},
    utils::{CfgRegion, Dominance},
};

/// Stack slots are 8-byte aligned.
const SLOT_ALIGN_SHIFT: u8 = 3;

fn lower_ty(ty: Ty, pointer_ty: clir::Type) -> Result<clir::Type, EmitError> {
    match ty {
        Ty::Float64 => Ok(types::F64),
        Ty::Int(1..=8) => Ok(types::I8),
        Ty::Ptr => Ok(pointer_ty),
        Ty::Void | Ty::Int(_) => Err(EmitError::Lower(format!("no machine type for {}", ty))),
    }
}

fn lower_cond(cond: FCmpCond) -> FloatCC {
    match cond {
        FCmpCond::OLt => FloatCC::LessThan,
        FCmpCond::ONe => FloatCC::OrderedNotEqual,
    }
}

/// Fill `clsig` with the parameters and returns of `sig`.
pub(super) fn lower_sig(
    sig: &Signature,
    clsig: &mut clir::Signature,
    pointer_ty: clir::Type,
) -> Result<(), EmitError> {
    for &param in sig.params.iter() {
        clsig.params.push(AbiParam::new(lower_ty(param, pointer_ty)?));
    }
    for &ret in sig.ret.iter() {
        clsig.returns.push(AbiParam::new(lower_ty(ret, pointer_ty)?));
    }
    Ok(())
}

struct FuncLowering<'a, 'b> {
    ctx: &'a Context,
    builder: FunctionBuilder<'b>,
    pointer_ty: clir::Type,

    blocks: FxHashMap<Block, clir::Block>,
    values: FxHashMap<Value, clir::Value>,
    slots: FxHashMap<Value, clir::StackSlot>,
}

/// Lower the body of `func` into `clfunc`, whose signature is already set.
pub(super) fn lower_func(
    ctx: &Context,
    func: Func,
    clfunc: &mut clir::Function,
    fb_ctx: &mut FunctionBuilderContext,
    pointer_ty: clir::Type,
) -> Result<(), EmitError> {
    let mut lowering = FuncLowering {
        ctx,
        builder: FunctionBuilder::new(clfunc, fb_ctx),
        pointer_ty,
        blocks: FxHashMap::default(),
        values: FxHashMap::default(),
        slots: FxHashMap::default(),
    };

    // reverse postorder visits every definition before its uses, and skips
    // unreachable blocks, which have nothing to emit
    let cfg = func.cfg_info(ctx);
    let dom = Dominance::new(ctx, &cfg);
    let order = dom.rpo().to_vec();

    for &block in order.iter() {
        let clblock = lowering.builder.create_block();
        lowering.blocks.insert(block, clblock);
    }

    for &block in order.iter() {
        let clblock = lowering.blocks[&block];
        lowering.builder.switch_to_block(clblock);
        for inst in block.iter(ctx) {
            lowering.lower_inst(inst)?;
        }
    }

    lowering.builder.seal_all_blocks();
    lowering.builder.finalize();
    Ok(())
}

impl FuncLowering<'_, '_> {
    fn value(&self, value: Value) -> Result<clir::Value, EmitError> {
        self.values.get(&value).copied().ok_or_else(|| {
            EmitError::Lower(format!("{} is not lowered yet", value.display(self.ctx)))
        })
    }

    fn slot(&self, ptr: Value) -> Result<clir::StackSlot, EmitError> {
        self.slots.get(&ptr).copied().ok_or_else(|| {
            EmitError::Lower(format!(
                "{} is not a stack slot",
                ptr.display(self.ctx)
            ))
        })
    }

    fn block(&self, block: Block) -> Result<clir::Block, EmitError> {
        self.blocks.get(&block).copied().ok_or_else(|| {
            EmitError::Lower(format!("{} is unreachable", block.label(self.ctx)))
        })
    }

    fn lower_inst(&mut self, inst: Inst) -> Result<(), EmitError> {
        let ctx = self.ctx;
        let operands = inst.operands(ctx);

        let result = match inst.kind(ctx) {
            InstKind::FConst(constant) => self.builder.ins().f64const(constant.value()),
            InstKind::StackSlot(size) => {
                let slot = self.builder.create_sized_stack_slot(StackSlotData::new(
                    StackSlotKind::ExplicitSlot,
                    *size,
                    SLOT_ALIGN_SHIFT,
                ));
                self.slots.insert(inst.result(ctx, 0), slot);
                return Ok(());
            }
            InstKind::FBinary(op) => {
                let lhs = self.value(operands[0])?;
                let rhs = self.value(operands[1])?;
                match op {
                    FBinaryOp::Add => self.builder.ins().fadd(lhs, rhs),
                    FBinaryOp::Sub => self.builder.ins().fsub(lhs, rhs),
                    FBinaryOp::Mul => self.builder.ins().fmul(lhs, rhs),
                    FBinaryOp::Div => self.builder.ins().fdiv(lhs, rhs),
                    FBinaryOp::Cmp(cond) => self.builder.ins().fcmp(lower_cond(*cond), lhs, rhs),
                }
            }
            InstKind::Cast(CastOp::UiToFp) => {
                let val = self.value(operands[0])?;
                let wide = self.builder.ins().uextend(types::I64, val);
                self.builder.ins().fcvt_from_uint(types::F64, wide)
            }
            InstKind::Load => {
                let slot = self.slot(operands[0])?;
                let ty = lower_ty(inst.result(ctx, 0).ty(ctx), self.pointer_ty)?;
                self.builder.ins().stack_load(ty, slot, 0)
            }
            InstKind::Store => {
                let val = self.value(operands[0])?;
                let slot = self.slot(operands[1])?;
                self.builder.ins().stack_store(val, slot, 0);
                return Ok(());
            }
            InstKind::Jump => {
                let target = self.block(inst.succ_blocks(ctx)[0])?;
                self.builder.ins().jump(target, &[]);
                return Ok(());
            }
            InstKind::Br => {
                let cond = self.value(operands[0])?;
                let succs = inst.succ_blocks(ctx);
                let then_block = self.block(succs[0])?;
                let else_block = self.block(succs[1])?;
                self.builder
                    .ins()
                    .brif(cond, then_block, &[], else_block, &[]);
                return Ok(());
            }
            InstKind::Ret => {
                let vals = operands
                    .iter()
                    .map(|&val| self.value(val))
                    .collect::<Result<Vec<_>, _>>()?;
                self.builder.ins().return_(&vals);
                return Ok(());
            }
        };

        self.values.insert(inst.result(ctx, 0), result);
        Ok(())
    }
}
