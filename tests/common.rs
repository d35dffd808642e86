#![allow(dead_code)]

use flowc::{
    collections::{
        linked_list::LinkedListContainerPtr,
        storage::{ArenaAlloc, ArenaPtr, BaseArena, BaseArenaPtr},
    },
    frontend::{IrGenContext, IrGenResult, RetKind},
    impl_arena,
    ir::{Context, Func, InstKind},
    utils::cfg::{CfgNode, CfgRegion},
};

#[derive(Default)]
pub struct CfgContext {
    blocks: BaseArena<CfgBlockData>,
    funcs: BaseArena<CfgFuncData>,
}

pub struct CfgBlockData {
    succs: Vec<CfgBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CfgBlock(BaseArenaPtr<CfgBlockData>);

impl_arena!(CfgContext, CfgBlockData, CfgBlock, blocks);

pub struct CfgFuncData {
    entry: CfgBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CfgFunc(BaseArenaPtr<CfgFuncData>);

impl_arena!(CfgContext, CfgFuncData, CfgFunc, funcs);

impl CfgNode for CfgBlock {
    type Region = CfgFunc;

    fn succs(self, arena: &Self::A) -> Vec<Self> { self.deref(arena).succs.clone() }
}

impl CfgRegion for CfgFunc {
    type Node = CfgBlock;

    fn entry_node(self, arena: &Self::A) -> Self::Node { self.deref(arena).entry }
}

impl CfgFunc {
    pub fn new(arena: &mut CfgContext, entry: CfgBlock) -> Self {
        arena.alloc(CfgFuncData { entry })
    }
}

impl CfgBlock {
    pub fn new(arena: &mut CfgContext) -> Self { arena.alloc(CfgBlockData { succs: Vec::new() }) }

    pub fn add_succ(self, arena: &mut CfgContext, succ: CfgBlock) {
        self.deref_mut(arena).succs.push(succ);
    }
}

/// Count the instructions of `func` whose kind satisfies `pred`.
pub fn count_insts(ctx: &Context, func: Func, pred: impl Fn(&InstKind) -> bool) -> usize {
    func.iter(ctx)
        .flat_map(|block| block.iter(ctx))
        .filter(|inst| pred(inst.kind(ctx)))
        .count()
}

/// `a = (8.0 + (4.0 * 2.0))`
pub fn build_scenario_a(irgen: &mut IrGenContext) -> IrGenResult<()> {
    let c8 = irgen.constant(8.0);
    let c4 = irgen.constant(4.0);
    let c2 = irgen.constant(2.0);
    let mul = irgen.binary_op(c4, c2, "*");
    let add = irgen.binary_op(c8, mul, "+");
    irgen.assign("a", add)?;
    Ok(())
}

/// `b = a / 4.0`
pub fn build_scenario_b(irgen: &mut IrGenContext) -> IrGenResult<()> {
    let a = irgen.read("a");
    let c4 = irgen.constant(4.0);
    let div = irgen.binary_op(a, c4, "/");
    irgen.assign("b", div)?;
    Ok(())
}

/// `b = <b>; if (b < 8.0) { c = a * b } else { c = a + b }; return c`
pub fn build_scenario_c(irgen: &mut IrGenContext, b: f64) -> IrGenResult<()> {
    let value = irgen.constant(b);
    irgen.assign("b", value)?;

    let lhs = irgen.read("b");
    let rhs = irgen.constant(8.0);
    let cond = irgen.binary_op(lhs, rhs, "<");

    irgen.if_else(
        cond,
        |irgen| {
            let a = irgen.read("a");
            let b = irgen.read("b");
            let mul = irgen.binary_op(a, b, "*");
            irgen.assign("c", mul).map(|_| ())
        },
        |irgen| {
            let a = irgen.read("a");
            let b = irgen.read("b");
            let add = irgen.binary_op(a, b, "+");
            irgen.assign("c", add).map(|_| ())
        },
    )?;

    let c = irgen.read("c");
    irgen.ret(Some(c))?;
    Ok(())
}

/// Scenarios A, B and C as one function `@main`.
pub fn build_demo(b: f64) -> (IrGenContext, Func) {
    let mut irgen = IrGenContext::new("test");
    irgen.begin_func("main", RetKind::F64).unwrap();
    build_scenario_a(&mut irgen).unwrap();
    build_scenario_b(&mut irgen).unwrap();
    build_scenario_c(&mut irgen, b).unwrap();
    let func = irgen.finish_func().unwrap();
    (irgen, func)
}
