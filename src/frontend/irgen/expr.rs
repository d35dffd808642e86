//! Constants and binary operations.

use log::{debug, error};

use super::{IrGenContext, IrGenError, IrGenResult};
use crate::ir::{CastOp, FBinaryOp, FCmpCond, Inst, Ty, Value};

impl IrGenContext {
    /// Materialize a constant at the cursor.
    pub fn constant(&mut self, value: f64) -> IrGenResult<Value> {
        let inst = Inst::fconst(&mut self.ctx, value);
        self.append(inst)?;
        Ok(inst.result(&self.ctx, 0))
    }

    /// Lower `lhs op rhs`.
    ///
    /// `+`, `-`, `*` and `/` produce an `f64`. `<` compares and then widens
    /// the `i1` outcome to `f64`, so it appends two instructions. A failed
    /// operand is returned as is, and nothing is appended.
    pub fn binary_op(
        &mut self,
        lhs: IrGenResult<Value>,
        rhs: IrGenResult<Value>,
        op: &str,
    ) -> IrGenResult<Value> {
        let (lhs, rhs) = match (lhs, rhs) {
            (Ok(lhs), Ok(rhs)) => (lhs, rhs),
            (Err(err), _) | (_, Err(err)) => {
                debug!("skip `{}` with a failed operand: {}", op, err);
                return Err(err);
            }
        };

        let op = match op {
            "+" => FBinaryOp::Add,
            "-" => FBinaryOp::Sub,
            "*" => FBinaryOp::Mul,
            "/" => FBinaryOp::Div,
            "<" => FBinaryOp::Cmp(FCmpCond::OLt),
            _ => {
                error!("Invalid operator: {}", op);
                return Err(IrGenError::InvalidOperator(op.to_string()));
            }
        };

        self.expect_float(lhs)?;
        self.expect_float(rhs)?;

        let inst = Inst::fbinary(&mut self.ctx, op, lhs, rhs);
        self.append(inst)?;
        let result = inst.result(&self.ctx, 0);

        if let FBinaryOp::Cmp(_) = op {
            let cast = Inst::cast(&mut self.ctx, CastOp::UiToFp, result, Ty::float64());
            self.append(cast)?;
            return Ok(cast.result(&self.ctx, 0));
        }

        Ok(result)
    }

    pub(super) fn expect_float(&self, value: Value) -> IrGenResult<()> {
        let ty = value.ty(&self.ctx);
        if ty.is_float() {
            Ok(())
        } else {
            Err(IrGenError::ExpectedFloat(ty))
        }
    }
}
