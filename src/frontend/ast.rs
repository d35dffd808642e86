use std::fmt;

/// The return type of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetKind {
    F64,
    Void,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var(String),
    /// `lhs op rhs`, the operator is kept as written so that unknown symbols
    /// are reported by the lowering.
    Binary(Box<Expr>, String, Box<Expr>),
}

impl Expr {
    pub fn num(value: f64) -> Self { Self::Num(value) }

    pub fn var(name: impl Into<String>) -> Self { Self::Var(name.into()) }

    pub fn binary(lhs: Expr, op: impl Into<String>, rhs: Expr) -> Self {
        Self::Binary(Box::new(lhs), op.into(), Box::new(rhs))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign(String, Expr),
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    Return(Option<Expr>),
}

impl Stmt {
    pub fn assign(name: impl Into<String>, expr: Expr) -> Self { Self::Assign(name.into(), expr) }
}

/// A program is a single function without parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: String,
    pub ret: RetKind,
    pub body: Vec<Stmt>,
}

impl Program {
    /// The fixed demonstration program.
    ///
    /// ```text
    /// a = 8.0 + 4.0 * 2.0
    /// b = a / 4.0
    /// b = <b>
    /// if (b < 8.0) { c = a * b } else { c = a + b }
    /// return c
    /// ```
    ///
    /// With [RetKind::Void] the final statement is a bare `return`.
    pub fn demo(b: f64, ret: RetKind) -> Self {
        let body = vec![
            Stmt::assign(
                "a",
                Expr::binary(
                    Expr::num(8.0),
                    "+",
                    Expr::binary(Expr::num(4.0), "*", Expr::num(2.0)),
                ),
            ),
            Stmt::assign("b", Expr::binary(Expr::var("a"), "/", Expr::num(4.0))),
            Stmt::assign("b", Expr::num(b)),
            Stmt::If {
                cond: Expr::binary(Expr::var("b"), "<", Expr::num(8.0)),
                then_body: vec![Stmt::assign(
                    "c",
                    Expr::binary(Expr::var("a"), "*", Expr::var("b")),
                )],
                else_body: vec![Stmt::assign(
                    "c",
                    Expr::binary(Expr::var("a"), "+", Expr::var("b")),
                )],
            },
            Stmt::Return(match ret {
                RetKind::F64 => Some(Expr::var("c")),
                RetKind::Void => None,
            }),
        ];

        Self {
            name: "main".to_string(),
            ret,
            body,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(value) => write!(f, "{:?}", value),
            Self::Var(name) => write!(f, "{}", name),
            Self::Binary(lhs, op, rhs) => write!(f, "({} {} {})", lhs, op, rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_display() {
        let expr = Expr::binary(
            Expr::num(8.0),
            "+",
            Expr::binary(Expr::num(4.0), "*", Expr::var("x")),
        );
        assert_eq!(expr.to_string(), "(8.0 + (4.0 * x))");
    }

    #[test]
    fn test_demo_ret_kind() {
        let program = Program::demo(4.0, RetKind::Void);
        assert_eq!(program.body.last(), Some(&Stmt::Return(None)));

        let program = Program::demo(10.0, RetKind::F64);
        assert_eq!(program.body[2], Stmt::assign("b", Expr::num(10.0)));
        assert_eq!(
            program.body.last(),
            Some(&Stmt::Return(Some(Expr::var("c"))))
        );
    }
}
