use common::{build_demo, build_scenario_a, build_scenario_b, count_insts};
use flowc::{
    collections::linked_list::{LinkedListContainerPtr, LinkedListNodePtr},
    frontend::{Expr, IrGen, IrGenContext, IrGenError, Program, RetKind},
    ir::{exec, verify::VerifyError, CastOp, FBinaryOp, FCmpCond, InstKind, Ty},
};

mod common;

#[test]
fn test_scenario_a() {
    let mut irgen = IrGenContext::new("test");
    let func = irgen.begin_func("main", RetKind::F64).unwrap();
    build_scenario_a(&mut irgen).unwrap();

    let a = irgen.slot("a").unwrap();
    let value = irgen.read("a");
    irgen.ret(Some(value)).unwrap();
    irgen.finish_func().unwrap();

    let ctx = irgen.finish();
    let mul = count_insts(&ctx, func, |kind| {
        matches!(kind, InstKind::FBinary(FBinaryOp::Mul))
    });
    let add = count_insts(&ctx, func, |kind| {
        matches!(kind, InstKind::FBinary(FBinaryOp::Add))
    });
    let store = count_insts(&ctx, func, |kind| matches!(kind, InstKind::Store));
    assert_eq!((mul, add, store), (1, 1, 1));

    let outcome = exec::run(&ctx, "main").unwrap();
    assert_eq!(outcome.ret, Some(16.0));
    assert_eq!(outcome.slot(a), Some(16.0));
}

#[test]
fn test_scenario_b() {
    let mut irgen = IrGenContext::new("test");
    let func = irgen.begin_func("main", RetKind::F64).unwrap();
    build_scenario_a(&mut irgen).unwrap();
    build_scenario_b(&mut irgen).unwrap();

    let b = irgen.slot("b").unwrap();
    let value = irgen.read("b");
    irgen.ret(Some(value)).unwrap();
    irgen.finish_func().unwrap();

    let ctx = irgen.finish();
    let div = count_insts(&ctx, func, |kind| {
        matches!(kind, InstKind::FBinary(FBinaryOp::Div))
    });
    let slots = count_insts(&ctx, func, |kind| matches!(kind, InstKind::StackSlot(_)));
    assert_eq!(div, 1);
    assert_eq!(slots, 2);

    let outcome = exec::run(&ctx, "main").unwrap();
    assert_eq!(outcome.ret, Some(4.0));
    assert_eq!(outcome.slot(b), Some(4.0));
}

#[test]
fn test_scenario_c_then_branch() {
    let (irgen, func) = build_demo(4.0);
    let c = irgen.slot("c");
    assert!(c.is_none(), "the symbol table is reset once the function is finished");

    let ctx = irgen.finish();
    let outcome = exec::run(&ctx, "main").unwrap();
    // a = 16, b = 4, c = a * b
    assert_eq!(outcome.ret, Some(64.0));

    let cmp = count_insts(&ctx, func, |kind| {
        matches!(kind, InstKind::FBinary(FBinaryOp::Cmp(FCmpCond::OLt)))
    });
    let widen = count_insts(&ctx, func, |kind| {
        matches!(kind, InstKind::Cast(CastOp::UiToFp))
    });
    let decision = count_insts(&ctx, func, |kind| {
        matches!(kind, InstKind::FBinary(FBinaryOp::Cmp(FCmpCond::ONe)))
    });
    assert_eq!((cmp, widen, decision), (1, 1, 1));
}

#[test]
fn test_scenario_c_else_branch() {
    let (irgen, _) = build_demo(10.0);
    let ctx = irgen.finish();
    let outcome = exec::run(&ctx, "main").unwrap();
    // a = 16, b = 10, c = a + b
    assert_eq!(outcome.ret, Some(26.0));
}

#[test]
fn test_slot_singularity() {
    let mut irgen = IrGenContext::new("test");
    let func = irgen.begin_func("main", RetKind::F64).unwrap();
    build_scenario_a(&mut irgen).unwrap();

    let a = irgen.read("a");
    let ten = irgen.constant(10.0);
    let cond = irgen.binary_op(a, ten, "<");
    irgen
        .if_else(
            cond,
            |irgen| {
                let one = irgen.constant(1.0);
                irgen.assign("x", one).map(|_| ())
            },
            |irgen| {
                let two = irgen.constant(2.0);
                irgen.assign("x", two).map(|_| ())
            },
        )
        .unwrap();

    let x = irgen.slot("x").unwrap();
    let value = irgen.read("x");
    irgen.ret(Some(value)).unwrap();
    irgen.finish_func().unwrap();

    let ctx = irgen.finish();
    // one slot for `a`, one for `x`
    let slots = count_insts(&ctx, func, |kind| matches!(kind, InstKind::StackSlot(_)));
    assert_eq!(slots, 2);
    assert_eq!(ctx.lookup_value("x.addr"), Some(x));

    // the slot is at the front of the entry block, although the first
    // assignment happened inside a branch
    let entry = func.entry(&ctx).unwrap();
    assert_eq!(x.def_inst(&ctx).container(&ctx), Some(entry));
    assert_eq!(entry.head(&ctx), Some(x.def_inst(&ctx)));

    // 16 < 10 is false, the else branch wrote the slot
    let outcome = exec::run(&ctx, "main").unwrap();
    assert_eq!(outcome.ret, Some(2.0));
    assert_eq!(outcome.slot(x), Some(2.0));
}

#[test]
fn test_failure_propagation() {
    let mut irgen = IrGenContext::new("test");
    irgen.begin_func("main", RetKind::Void).unwrap();

    let one = irgen.constant(1.0).unwrap();
    let block = irgen.curr_block().unwrap();
    let before = block.iter(irgen.ctx()).count();

    let failed = Err(IrGenError::UnknownVariable("y".to_string()));
    let result = irgen.binary_op(failed.clone(), Ok(one), "+");
    assert_eq!(result, failed);
    let result = irgen.binary_op(Ok(one), failed.clone(), "+");
    assert_eq!(result, failed);

    assert_eq!(block.iter(irgen.ctx()).count(), before);
}

#[test]
fn test_failed_lhs_skips_rhs() {
    let mut irgen = IrGenContext::new("test");
    irgen.begin_func("main", RetKind::Void).unwrap();

    let block = irgen.curr_block().unwrap();
    let before = block.iter(irgen.ctx()).count();

    let expr = Expr::binary(
        Expr::var("missing"),
        "+",
        Expr::binary(Expr::num(1.0), "*", Expr::num(2.0)),
    );
    let result = expr.irgen(&mut irgen);
    assert_eq!(
        result,
        Err(IrGenError::UnknownVariable("missing".to_string()))
    );
    assert_eq!(block.iter(irgen.ctx()).count(), before);
}

#[test]
fn test_invalid_operator() {
    let mut irgen = IrGenContext::new("test");
    irgen.begin_func("main", RetKind::Void).unwrap();

    let lhs = irgen.constant(1.0);
    let rhs = irgen.constant(2.0);
    let block = irgen.curr_block().unwrap();
    let before = block.iter(irgen.ctx()).count();

    let result = irgen.binary_op(lhs, rhs, "%");
    assert_eq!(result, Err(IrGenError::InvalidOperator("%".to_string())));
    assert_eq!(block.iter(irgen.ctx()).count(), before);

    // the failure keeps propagating through assignments
    assert!(irgen.assign("z", result).is_err());
    assert_eq!(irgen.slot("z"), None);
}

#[test]
fn test_unknown_variable() {
    let mut irgen = IrGenContext::new("test");
    irgen.begin_func("main", RetKind::Void).unwrap();
    build_scenario_a(&mut irgen).unwrap();

    let a = irgen.slot("a");
    let block = irgen.curr_block().unwrap();
    let before = block.iter(irgen.ctx()).count();

    let result = irgen.read("never_assigned");
    assert_eq!(
        result,
        Err(IrGenError::UnknownVariable("never_assigned".to_string()))
    );
    assert_eq!(irgen.slot("never_assigned"), None);
    assert_eq!(irgen.slot("a"), a);
    assert_eq!(block.iter(irgen.ctx()).count(), before);
}

#[test]
fn test_if_else_terminators() {
    let mut irgen = IrGenContext::new("test");
    let func = irgen.begin_func("main", RetKind::F64).unwrap();

    let one = irgen.constant(1.0);
    let blocks = irgen
        .if_else(
            one,
            |irgen| {
                let v = irgen.constant(3.0);
                irgen.assign("x", v).map(|_| ())
            },
            |irgen| {
                let v = irgen.constant(4.0);
                irgen.assign("x", v).map(|_| ())
            },
        )
        .unwrap();
    assert_eq!(irgen.curr_block(), Some(blocks.merge_block));

    let x = irgen.read("x");
    let ret = irgen.ret(Some(x)).unwrap();
    irgen.finish_func().unwrap();

    let ctx = irgen.finish();
    for block in [blocks.then_block, blocks.else_block] {
        let terminators: Vec<_> = block
            .iter(&ctx)
            .filter(|inst| inst.is_terminator(&ctx))
            .collect();
        assert_eq!(terminators.len(), 1);
        assert_eq!(block.tail(&ctx), Some(terminators[0]));
        assert!(matches!(terminators[0].kind(&ctx), InstKind::Jump));
        assert_eq!(terminators[0].succ_blocks(&ctx), &[blocks.merge_block]);
    }

    // then, else and merge follow the entry in source order
    let layout: Vec<_> = func.iter(&ctx).collect();
    assert_eq!(
        layout[1..],
        [blocks.then_block, blocks.else_block, blocks.merge_block]
    );
    assert_eq!(func.tail(&ctx).and_then(|block| block.tail(&ctx)), Some(ret));

    let outcome = exec::run(&ctx, "main").unwrap();
    assert_eq!(outcome.ret, Some(3.0));
}

#[test]
fn test_if_else_failed_condition() {
    let mut irgen = IrGenContext::new("test");
    let func = irgen.begin_func("main", RetKind::Void).unwrap();

    let cond = irgen.read("missing");
    let result = irgen.if_else(cond, |_| Ok(()), |_| Ok(()));
    assert_eq!(
        result,
        Err(IrGenError::UnknownVariable("missing".to_string()))
    );

    // no blocks were created, the function can still be closed
    assert_eq!(func.iter(irgen.ctx()).count(), 1);
    irgen.ret(None).unwrap();
    irgen.finish_func().unwrap();
}

#[test]
fn test_if_else_failed_body() {
    let mut irgen = IrGenContext::new("test");
    let func = irgen.begin_func("main", RetKind::F64).unwrap();

    let one = irgen.constant(1.0);
    let result = irgen.if_else(
        one,
        |irgen| {
            let v = irgen.read("nope");
            irgen.assign("c", v).map(|_| ())
        },
        |irgen| {
            let v = irgen.constant(5.0);
            irgen.assign("c", v).map(|_| ())
        },
    );
    assert_eq!(result, Err(IrGenError::UnknownVariable("nope".to_string())));

    // both arms are terminated and attached, the cursor is at the merge block
    assert_eq!(func.iter(irgen.ctx()).count(), 4);
    let merge = func.tail(irgen.ctx()).unwrap();
    assert_eq!(irgen.curr_block(), Some(merge));

    let c = irgen.read("c");
    irgen.ret(Some(c)).unwrap();
    irgen.finish_func().unwrap();
}

#[test]
fn test_block_attach_twice() {
    let mut irgen = IrGenContext::new("test");
    irgen.begin_func("main", RetKind::Void).unwrap();

    let block = irgen.create_block("bb").unwrap();
    irgen.attach(block).unwrap();
    assert_eq!(
        irgen.attach(block),
        Err(IrGenError::BlockAlreadyAttached("^bb0".to_string()))
    );

    let entry = irgen.curr_block().unwrap();
    assert!(matches!(
        irgen.attach(entry),
        Err(IrGenError::BlockAlreadyAttached(_))
    ));
}

#[test]
fn test_unattached_block() {
    let mut irgen = IrGenContext::new("test");
    irgen.begin_func("main", RetKind::Void).unwrap();

    let _detached = irgen.create_block("bb").unwrap();
    irgen.ret(None).unwrap();
    assert_eq!(
        irgen.finish_func(),
        Err(IrGenError::UnattachedBlock("^bb0".to_string()))
    );
}

#[test]
fn test_finish_unterminated() {
    let mut irgen = IrGenContext::new("test");
    irgen.begin_func("main", RetKind::F64).unwrap();
    build_scenario_a(&mut irgen).unwrap();

    assert!(matches!(
        irgen.finish_func(),
        Err(IrGenError::Verify(VerifyError::MissingTerminator { .. }))
    ));
}

#[test]
fn test_return_mismatch() {
    let mut irgen = IrGenContext::new("test");
    irgen.begin_func("main", RetKind::Void).unwrap();

    let one = irgen.constant(1.0);
    assert_eq!(
        irgen.ret(Some(one)),
        Err(IrGenError::ReturnTypeMismatch {
            expected: Ty::void(),
            found: Ty::float64(),
        })
    );
}

#[test]
fn test_no_function() {
    let mut irgen = IrGenContext::new("test");
    assert_eq!(irgen.constant(1.0), Err(IrGenError::NoFunction));
    assert_eq!(irgen.read("a"), Err(IrGenError::UnknownVariable("a".to_string())));
    assert_eq!(irgen.finish_func(), Err(IrGenError::NoFunction));
}

#[test]
fn test_duplicate_function() {
    let mut irgen = IrGenContext::new("test");
    irgen.begin_func("main", RetKind::Void).unwrap();
    irgen.ret(None).unwrap();
    irgen.finish_func().unwrap();

    assert_eq!(
        irgen.begin_func("main", RetKind::Void),
        Err(IrGenError::DuplicateSymbol("main".to_string()))
    );
}

#[test]
fn test_program_demo() {
    let mut irgen = IrGenContext::new("demo");
    let func = Program::demo(4.0, RetKind::F64).irgen(&mut irgen).unwrap();

    let mut ctx = irgen.finish();
    assert_eq!(ctx.lookup_func("main"), Some(func));
    assert_eq!(exec::run(&ctx, "main").unwrap().ret, Some(64.0));

    ctx.alloc_all_names();
    let text = ctx.display().to_string();

    assert!(text.contains("func @main() -> f64 {"));
    assert!(text.contains("%a.addr = stack_slot 8 : ptr"));
    assert!(text.contains("fconst 8.0 : f64"));
    assert!(text.contains("fcmp.olt"));
    assert!(text.contains("uitofp"));
    assert!(text.contains("fcmp.one"));
    assert!(text.contains("^then0, ^else0"));
    assert!(text.contains("jump ^merge0"));

    let pos = |label: &str| text.find(label).unwrap();
    assert!(pos("^entry:") < pos("^then0:"));
    assert!(pos("^then0:") < pos("^else0:"));
    assert!(pos("^else0:") < pos("^merge0:"));
}

#[test]
fn test_program_demo_void() {
    let mut irgen = IrGenContext::new("demo");
    Program::demo(10.0, RetKind::Void)
        .irgen(&mut irgen)
        .unwrap();
    let ctx = irgen.finish();

    let outcome = exec::run(&ctx, "main").unwrap();
    assert_eq!(outcome.ret, None);
    // c = a + b
    assert!(outcome.slots.values().any(|&value| value == 26.0));
}

#[test]
fn test_two_functions_share_variable_names() {
    let mut irgen = IrGenContext::new("test");
    for name in ["f", "g"] {
        irgen.begin_func(name, RetKind::F64).unwrap();
        build_scenario_a(&mut irgen).unwrap();
        let a = irgen.read("a");
        irgen.ret(Some(a)).unwrap();
        irgen.finish_func().unwrap();
    }

    let ctx = irgen.finish();
    assert_eq!(ctx.funcs().len(), 2);
    assert!(ctx.lookup_value("a.addr").is_some());
    assert_eq!(exec::run(&ctx, "g").unwrap().ret, Some(16.0));
}
