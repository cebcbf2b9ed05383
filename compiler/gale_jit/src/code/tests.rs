use super::*;
use pretty_assertions::assert_eq;

fn reg(id: u32, kind: Kind) -> SoftReg {
    SoftReg::new(SoftRegId::new(id), kind)
}

fn r(id: u32) -> AsmCode {
    AsmCode::Reg(SoftRegId::new(id))
}

#[test]
fn op1_appends_op_source_and_destination() {
    let mut code = Code::new();
    code.op1(Op1::Neg, &reg(0, Kind::Int64).into(), reg(1, Kind::Int64))
        .unwrap();
    assert_eq!(code.tokens(), &[AsmCode::Op1(Op1::Neg), r(0), r(1)]);
}

#[test]
fn op2_encodes_constants_in_place() {
    let mut code = Code::new();
    let seven = Const::int(7, Kind::Int);
    code.op2(Op2::Add, &reg(0, Kind::Int).into(), &seven.into(), reg(2, Kind::Int))
        .unwrap();
    assert_eq!(
        code.tokens(),
        &[AsmCode::Op2(Op2::Add), r(0), AsmCode::Const(seven), r(2)]
    );
}

#[test]
fn nop_is_never_emitted() {
    let mut code = Code::new();
    let r0: Expr = reg(0, Kind::Int).into();
    code.inst1(Inst1::Nop, &r0).unwrap();
    assert!(code.is_empty());
    code.inst1(Inst1::Inc, &r0).unwrap();
    assert_eq!(code.tokens(), &[AsmCode::Inst1(Inst1::Inc), r(0)]);
}

#[test]
fn self_assignment_is_elided() {
    let mut code = Code::new();
    let r0: Expr = reg(0, Kind::Int).into();
    let r1: Expr = reg(1, Kind::Int).into();

    code.inst2(Inst2::Assign, &r0, &r0).unwrap();
    assert!(code.is_empty());

    // Only plain assignment is elided: `r0 += r0` doubles r0.
    code.inst2(Inst2::AddAssign, &r0, &r0).unwrap();
    code.inst2(Inst2::Assign, &r1, &r0).unwrap();
    assert_eq!(
        code.tokens(),
        &[
            AsmCode::Inst2(Inst2::AddAssign),
            r(0),
            r(0),
            AsmCode::Inst2(Inst2::Assign),
            r(1),
            r(0),
        ]
    );
}

#[test]
fn equal_constants_encode_equal() {
    let mut code = Code::new();
    let one: Expr = Const::int(1, Kind::Int).into();
    code.inst2(Inst2::Assign, &one, &one).unwrap();
    assert!(code.is_empty());
}

#[test]
fn unlowered_operands_are_rejected_without_emitting() {
    let mut code = Code::new();
    let r0: Expr = reg(0, Kind::Int64).into();
    code.inst1(Inst1::Zero, &r0).unwrap();
    let before = code.clone();

    let sum = Expr::binary(Op2::Add, r0.clone(), Const::int(1, Kind::Int64).into());
    let err = code.op1(Op1::Neg, &sum, reg(1, Kind::Int64)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot assemble (add r0 1:int64): must be compiled first"
    );
    assert!(matches!(
        code.op2(Op2::Mul, &r0, &sum, reg(1, Kind::Int64)),
        Err(JitError::NotLowered { .. })
    ));
    assert!(matches!(
        code.inst2(Inst2::Assign, &r0, &Expr::unary(Op1::Neg, r0.clone())),
        Err(JitError::NotLowered { .. })
    ));
    assert_eq!(code, before);
}

#[test]
fn soft_reg_records_lifecycle_tokens() {
    let mut code = Code::new();
    let allocated = code.soft_reg(RegOp::Alloc, SoftRegId::new(3), Kind::Uint8);
    assert_eq!(allocated, reg(3, Kind::Uint8));
    code.soft_reg(RegOp::Free, allocated.id(), allocated.kind());
    assert_eq!(
        code.tokens(),
        &[
            AsmCode::RegOp(RegOp::Alloc),
            r(3),
            AsmCode::Kind(Kind::Uint8),
            AsmCode::RegOp(RegOp::Free),
            r(3),
            AsmCode::Kind(Kind::Uint8),
        ]
    );
}

#[test]
fn decode_replays_the_stream() {
    let mut code = Code::new();
    let r0 = code.soft_reg(RegOp::Alloc, SoftRegId::new(0), Kind::Int);
    let two = Const::int(2, Kind::Int);
    code.op2(Op2::Mul, &r0.into(), &two.into(), r0)
        .unwrap()
        .inst1(Inst1::Dec, &r0.into())
        .unwrap();
    code.soft_reg(RegOp::Free, r0.id(), r0.kind());

    assert_eq!(
        code.decode().unwrap(),
        vec![
            Instr::Alloc(r0),
            Instr::Op2 {
                op: Op2::Mul,
                a: Operand::Reg(r0.id()),
                b: Operand::Const(two),
                dst: r0.id(),
            },
            Instr::Inst1 {
                inst: Inst1::Dec,
                dst: Operand::Reg(r0.id()),
            },
            Instr::Free(r0),
        ]
    );
    assert_eq!(
        code.to_string(),
        "alloc r0:int\nmul r0, 2:int -> r0\ndec r0\nfree r0:int\n"
    );
}

#[test]
fn decode_rejects_truncated_streams() {
    let code = Code {
        tokens: vec![AsmCode::Op2(Op2::Add), r(0), r(1)],
    };
    assert_eq!(code.decode(), Err(JitError::Malformed { at: 3 }));

    let stray = Code {
        tokens: vec![AsmCode::Kind(Kind::Int)],
    };
    assert_eq!(stray.decode(), Err(JitError::Malformed { at: 0 }));
}
