//! # Reference Interpreter
//!
//! Executes a function of the IR directly, to observe the values a program
//! computes without going through the native code generator.
//!
//! Every value lives in a 64-bit virtual register, and stack slots are carved
//! out of one little-endian byte array. Addresses are offsets into that array
//! plus [STACK_BASE], so a zero or garbage pointer is reported instead of
//! silently aliasing the first slot.

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::{Block, CastOp, Context, FBinaryOp, FCmpCond, Func, Inst, InstKind, Value};
use crate::collections::linked_list::LinkedListContainerPtr;

/// The address of the first byte of the stack.
pub const STACK_BASE: u64 = 0x1000;

/// The default bound on executed instructions.
pub const DEFAULT_STEP_LIMIT: usize = 1 << 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("function @{0} not found")]
    UnknownFunction(String),

    #[error("control reached the end of {0} without a terminator")]
    FallThrough(String),

    #[error("value {0} is used before it is computed")]
    UndefinedValue(String),

    #[error("invalid address {0:#x}")]
    InvalidAddress(u64),

    #[error("execution did not finish within {0} steps")]
    StepLimit(usize),
}

pub type ExecResult<T> = Result<T, ExecError>;

/// A 64-bit virtual register.
///
/// Floats are kept as their IEEE 754 bits, `i1` as 0 or 1, pointers as
/// addresses.
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct VReg(u64);

impl VReg {
    pub fn from_double(f: f64) -> Self { Self(f.to_bits()) }

    pub fn to_double(self) -> f64 { f64::from_bits(self.0) }

    pub fn from_bool(b: bool) -> Self { Self(b as u64) }

    pub fn to_bool(self) -> bool { self.0 & 1 != 0 }

    pub fn to_le_bytes(self) -> [u8; 8] { self.0.to_le_bytes() }

    pub fn from_le_bytes(bytes: [u8; 8]) -> Self { Self(u64::from_le_bytes(bytes)) }
}

/// The observable result of running a function.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecOutcome {
    /// The returned value, `None` for a `void` return.
    pub ret: Option<f64>,
    /// The final contents of every stack slot, keyed by the slot address value.
    pub slots: FxHashMap<Value, f64>,
    /// Number of instructions executed.
    pub steps: usize,
}

impl ExecOutcome {
    pub fn slot(&self, slot: Value) -> Option<f64> { self.slots.get(&slot).copied() }
}

enum Control {
    Next,
    Jump(Block),
    Return(Option<VReg>),
}

pub struct Interpreter<'a> {
    ctx: &'a Context,
    /// The stack memory.
    stack: Vec<u8>,
    /// Slots in allocation order, with their addresses.
    slots: Vec<(Value, u64)>,
    vregs: FxHashMap<Value, VReg>,
    step_limit: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
            stack: Vec::new(),
            slots: Vec::new(),
            vregs: FxHashMap::default(),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    /// Run the named function from its entry block until it returns.
    pub fn run(mut self, name: &str) -> ExecResult<ExecOutcome> {
        let func = self
            .ctx
            .lookup_func(name)
            .ok_or_else(|| ExecError::UnknownFunction(name.to_string()))?;

        let (ret, steps) = self.run_func(func)?;

        let mut slots = FxHashMap::default();
        for &(slot, addr) in self.slots.iter() {
            let bytes = self.read_memory(addr, 8)?;
            slots.insert(slot, VReg::from_le_bytes(bytes).to_double());
        }

        Ok(ExecOutcome {
            ret: ret.map(VReg::to_double),
            slots,
            steps,
        })
    }

    fn run_func(&mut self, func: Func) -> ExecResult<(Option<VReg>, usize)> {
        let ctx = self.ctx;
        let mut curr_block = func
            .entry(ctx)
            .ok_or_else(|| ExecError::FallThrough(format!("@{}", func.name(ctx))))?;
        let mut steps = 0;

        loop {
            let mut next_block = None;
            for inst in curr_block.iter(ctx) {
                steps += 1;
                if steps > self.step_limit {
                    return Err(ExecError::StepLimit(self.step_limit));
                }

                match self.step(inst)? {
                    Control::Next => {}
                    Control::Jump(block) => {
                        next_block = Some(block);
                        break;
                    }
                    Control::Return(val) => return Ok((val, steps)),
                }
            }

            curr_block = next_block
                .ok_or_else(|| ExecError::FallThrough(curr_block.label(ctx).to_string()))?;
        }
    }

    fn step(&mut self, inst: Inst) -> ExecResult<Control> {
        let ctx = self.ctx;
        let operands = inst.operands(ctx);

        let result = match inst.kind(ctx) {
            InstKind::FConst(constant) => VReg::from_double(constant.value()),
            InstKind::StackSlot(size) => {
                let addr = self.alloc_stack(*size as usize);
                self.slots.push((inst.result(ctx, 0), addr));
                VReg(addr)
            }
            InstKind::FBinary(op) => {
                let lhs = self.read_vreg(operands[0])?.to_double();
                let rhs = self.read_vreg(operands[1])?.to_double();
                match op {
                    FBinaryOp::Add => VReg::from_double(lhs + rhs),
                    FBinaryOp::Sub => VReg::from_double(lhs - rhs),
                    FBinaryOp::Mul => VReg::from_double(lhs * rhs),
                    FBinaryOp::Div => VReg::from_double(lhs / rhs),
                    // ordered predicates are false when either side is NaN,
                    // which is exactly what the Rust operators do for `<`
                    FBinaryOp::Cmp(FCmpCond::OLt) => VReg::from_bool(lhs < rhs),
                    FBinaryOp::Cmp(FCmpCond::ONe) => {
                        VReg::from_bool(lhs != rhs && !lhs.is_nan() && !rhs.is_nan())
                    }
                }
            }
            InstKind::Cast(CastOp::UiToFp) => {
                let val = self.read_vreg(operands[0])?;
                VReg::from_double(val.0 as f64)
            }
            InstKind::Load => {
                let addr = self.read_vreg(operands[0])?.0;
                let bytes = self.read_memory(addr, 8)?;
                VReg::from_le_bytes(bytes)
            }
            InstKind::Store => {
                let val = self.read_vreg(operands[0])?;
                let addr = self.read_vreg(operands[1])?.0;
                self.write_memory(addr, &val.to_le_bytes())?;
                return Ok(Control::Next);
            }
            InstKind::Jump => return Ok(Control::Jump(inst.succ_blocks(ctx)[0])),
            InstKind::Br => {
                let cond = self.read_vreg(operands[0])?.to_bool();
                let succs = inst.succ_blocks(ctx);
                let target = if cond { succs[0] } else { succs[1] };
                return Ok(Control::Jump(target));
            }
            InstKind::Ret => {
                let val = match operands.first() {
                    Some(val) => Some(self.read_vreg(*val)?),
                    None => None,
                };
                return Ok(Control::Return(val));
            }
        };

        self.vregs.insert(inst.result(ctx, 0), result);
        Ok(Control::Next)
    }

    fn read_vreg(&self, value: Value) -> ExecResult<VReg> {
        self.vregs
            .get(&value)
            .copied()
            .ok_or_else(|| ExecError::UndefinedValue(value.display(self.ctx).to_string()))
    }

    /// Allocate zeroed stack memory, 8-byte aligned.
    fn alloc_stack(&mut self, size: usize) -> u64 {
        let offset = self.stack.len().next_multiple_of(8);
        self.stack.resize(offset + size.max(8), 0);
        STACK_BASE + offset as u64
    }

    fn range(&self, addr: u64, size: usize) -> ExecResult<std::ops::Range<usize>> {
        let offset = addr
            .checked_sub(STACK_BASE)
            .ok_or(ExecError::InvalidAddress(addr))? as usize;
        let end = offset + size;
        if end > self.stack.len() {
            return Err(ExecError::InvalidAddress(addr));
        }
        Ok(offset..end)
    }

    fn read_memory(&self, addr: u64, size: usize) -> ExecResult<[u8; 8]> {
        let range = self.range(addr, size)?;
        let mut bytes = [0u8; 8];
        bytes[..size].copy_from_slice(&self.stack[range]);
        Ok(bytes)
    }

    fn write_memory(&mut self, addr: u64, data: &[u8]) -> ExecResult<()> {
        let range = self.range(addr, data.len())?;
        self.stack[range].copy_from_slice(data);
        Ok(())
    }
}

/// Run `name` in `ctx` with the default step limit.
pub fn run(ctx: &Context, name: &str) -> ExecResult<ExecOutcome> { Interpreter::new(ctx).run(name) }
