use core::fmt;

use super::{value::ValueData, Block, Context, Ty, Value};
use crate::{
    collections::{
        linked_list::LinkedListNodePtr,
        storage::{ArenaAlloc, ArenaPtr, BaseArenaPtr},
    },
    impl_arena,
};

/// The floating-point comparison condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FCmpCond {
    /// Ordered and less than.
    OLt,
    /// Ordered and not equal.
    ONe,
}

impl fmt::Display for FCmpCond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OLt => write!(f, "olt"),
            Self::ONe => write!(f, "one"),
        }
    }
}

/// Floating-point binary operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Comparison, the result is `i1`.
    Cmp(FCmpCond),
}

impl fmt::Display for FBinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "fadd"),
            Self::Sub => write!(f, "fsub"),
            Self::Mul => write!(f, "fmul"),
            Self::Div => write!(f, "fdiv"),
            Self::Cmp(cond) => write!(f, "fcmp.{}", cond),
        }
    }
}

/// Cast operation.
///
/// The destination type is the type of the result value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastOp {
    /// Unsigned integer to float, used to widen comparison outcomes.
    UiToFp,
}

impl fmt::Display for CastOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UiToFp => write!(f, "uitofp"),
        }
    }
}

/// A 64-bit float constant, stored as raw bits so instruction kinds can be
/// compared and hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatConstant(u64);

impl FloatConstant {
    pub fn value(self) -> f64 { f64::from_bits(self.0) }
}

impl From<f64> for FloatConstant {
    fn from(value: f64) -> Self { Self(value.to_bits()) }
}

impl fmt::Display for FloatConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:?}", self.value()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstKind {
    /// Create a new value from a constant.
    ///
    /// Using an individual constant creation instruction is similar to MLIR and
    /// Cranelift IR.
    FConst(FloatConstant),
    /// Reserve a stack slot of the given size in bytes, the result is a
    /// pointer.
    StackSlot(u32),
    FBinary(FBinaryOp),
    Cast(CastOp),
    /// Load instruction, the loaded type is the type of the result.
    Load,
    /// `store value, address`.
    Store,
    /// Unconditional branch.
    Jump,
    /// Conditional branch on an `i1`, successors are `[then, else]`.
    Br,
    Ret,
}

pub struct InstData {
    results: Vec<Value>,
    kind: InstKind,
    operands: Vec<Value>,
    successors: Vec<Block>,

    next: Option<Inst>,
    prev: Option<Inst>,
    parent: Option<Block>,
}

#[derive(Debug, Hash, Clone, Copy, PartialEq, Eq)]
pub struct Inst(BaseArenaPtr<InstData>);

impl_arena!(Context, InstData, Inst, insts);

impl Inst {
    /// Create an instruction directly.
    ///
    /// This is a low-level function, the typed constructors below check the
    /// operands first.
    fn new(
        ctx: &mut Context,
        kind: InstKind,
        result_tys: Vec<Ty>,
        operands: Vec<Value>,
        successors: Vec<Block>,
    ) -> Inst {
        let inst = ctx.alloc(InstData {
            results: Vec::new(),
            kind,
            operands,
            successors,
            next: None,
            prev: None,
            parent: None,
        });

        for ty in result_tys {
            if ty.is_void() {
                panic!("instruction results must not be void");
            }
            let value = ctx.alloc(ValueData::new_inst_result(ty, inst));
            inst.deref_mut(ctx).results.push(value);
        }

        inst
    }

    pub fn fconst(ctx: &mut Context, constant: impl Into<FloatConstant>) -> Inst {
        Self::new(
            ctx,
            InstKind::FConst(constant.into()),
            vec![Ty::float64()],
            vec![],
            vec![],
        )
    }

    pub fn stack_slot(ctx: &mut Context, size: u32) -> Inst {
        Self::new(
            ctx,
            InstKind::StackSlot(size),
            vec![Ty::ptr()],
            vec![],
            vec![],
        )
    }

    pub fn fbinary(ctx: &mut Context, op: FBinaryOp, lhs: Value, rhs: Value) -> Inst {
        if !lhs.ty(ctx).is_float() || !rhs.ty(ctx).is_float() {
            panic!(
                "lhs and rhs must be float types, got {} and {}",
                lhs.ty(ctx),
                rhs.ty(ctx)
            );
        }

        let ty = match op {
            FBinaryOp::Add | FBinaryOp::Sub | FBinaryOp::Mul | FBinaryOp::Div => lhs.ty(ctx),
            FBinaryOp::Cmp(_) => Ty::bool(),
        };

        Self::new(ctx, InstKind::FBinary(op), vec![ty], vec![lhs, rhs], vec![])
    }

    pub fn cast(ctx: &mut Context, op: CastOp, val: Value, ty: Ty) -> Inst {
        match op {
            CastOp::UiToFp => {
                if !val.ty(ctx).is_integer() || !ty.is_float() {
                    panic!("uitofp only supports integer to float");
                }
            }
        }

        Self::new(ctx, InstKind::Cast(op), vec![ty], vec![val], vec![])
    }

    pub fn load(ctx: &mut Context, ty: Ty, ptr: Value) -> Inst {
        if !ptr.ty(ctx).is_ptr() {
            panic!("load address must be a pointer");
        }
        Self::new(ctx, InstKind::Load, vec![ty], vec![ptr], vec![])
    }

    pub fn store(ctx: &mut Context, val: Value, ptr: Value) -> Inst {
        if !ptr.ty(ctx).is_ptr() {
            panic!("store address must be a pointer");
        }
        Self::new(ctx, InstKind::Store, vec![], vec![val, ptr], vec![])
    }

    pub fn jump(ctx: &mut Context, target: Block) -> Inst {
        Self::new(ctx, InstKind::Jump, vec![], vec![], vec![target])
    }

    pub fn br(ctx: &mut Context, cond: Value, then_block: Block, else_block: Block) -> Inst {
        if cond.ty(ctx) != Ty::bool() {
            panic!("condition must be an i1 type");
        }
        Self::new(
            ctx,
            InstKind::Br,
            vec![],
            vec![cond],
            vec![then_block, else_block],
        )
    }

    pub fn ret(ctx: &mut Context, val: Option<Value>) -> Inst {
        Self::new(ctx, InstKind::Ret, vec![], val.into_iter().collect(), vec![])
    }

    pub fn kind(self, ctx: &Context) -> &InstKind { &self.deref(ctx).kind }

    pub fn results(self, ctx: &Context) -> &[Value] { &self.deref(ctx).results }

    /// The `idx`-th result.
    ///
    /// # Panics
    ///
    /// Panics if the instruction has no such result.
    pub fn result(self, ctx: &Context, idx: usize) -> Value { self.deref(ctx).results[idx] }

    pub fn operands(self, ctx: &Context) -> &[Value] { &self.deref(ctx).operands }

    pub fn succ_blocks(self, ctx: &Context) -> &[Block] { &self.deref(ctx).successors }

    pub fn is_terminator(self, ctx: &Context) -> bool {
        matches!(
            self.deref(ctx).kind,
            InstKind::Jump | InstKind::Br | InstKind::Ret
        )
    }

    pub fn id(self) -> usize { self.0.id() }

    pub fn display(self, ctx: &Context) -> DisplayInst<'_> {
        DisplayInst {
            ctx,
            data: self.deref(ctx),
        }
    }
}

impl LinkedListNodePtr for Inst {
    type ContainerPtr = Block;

    fn next(self, ctx: &Context) -> Option<Inst> { self.deref(ctx).next }

    fn prev(self, ctx: &Context) -> Option<Inst> { self.deref(ctx).prev }

    fn set_next(self, ctx: &mut Context, next: Option<Inst>) { self.deref_mut(ctx).next = next; }

    fn set_prev(self, ctx: &mut Context, prev: Option<Inst>) { self.deref_mut(ctx).prev = prev; }

    fn container(self, ctx: &Context) -> Option<Block> { self.deref(ctx).parent }

    fn set_container(self, ctx: &mut Context, container: Option<Block>) {
        self.deref_mut(ctx).parent = container;
    }
}

pub struct DisplayInst<'a> {
    ctx: &'a Context,
    data: &'a InstData,
}

impl fmt::Display for DisplayInst<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use InstKind as Ik;

        let ctx = self.ctx;
        let operands = &self.data.operands;
        let successors = &self.data.successors;

        // %v1 = ...
        for (i, result) in self.data.results.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", result.display(ctx))?;
        }
        if !self.data.results.is_empty() {
            write!(f, " = ")?;
        }

        match &self.data.kind {
            Ik::FConst(constant) => write!(f, "fconst {}", constant)?,
            Ik::StackSlot(size) => write!(f, "stack_slot {}", size)?,
            Ik::FBinary(op) => write!(
                f,
                "{} {}, {}",
                op,
                operands[0].display(ctx),
                operands[1].display(ctx)
            )?,
            Ik::Cast(op) => write!(f, "{} {}", op, operands[0].display(ctx))?,
            Ik::Load => write!(f, "load {}", operands[0].display(ctx))?,
            Ik::Store => write!(
                f,
                "store {}, {}",
                operands[0].display(ctx),
                operands[1].display(ctx)
            )?,
            Ik::Jump => write!(f, "jump {}", successors[0].label(ctx))?,
            Ik::Br => write!(
                f,
                "br {}, {}, {}",
                operands[0].display(ctx),
                successors[0].label(ctx),
                successors[1].label(ctx)
            )?,
            Ik::Ret => match operands.first() {
                Some(val) => write!(f, "ret {}", val.display(ctx))?,
                None => write!(f, "ret void")?,
            },
        }

        if let Some(result) = self.data.results.first() {
            write!(f, " : {}", result.ty(ctx))?;
        }

        Ok(())
    }
}
