use chumsky::prelude::*;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Num(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScaleError {
    #[error("'{input}' is not a valid scale expression: {reason}")]
    Syntax { input: String, reason: String },
    #[error("scale '{input}' evaluates to {value}, expected a positive number")]
    NotPositive { input: String, value: f64 },
}

impl Expr {
    pub fn eval(&self) -> f64 {
        match self {
            Expr::Num(value) => *value,
            Expr::Binary { op, lhs, rhs } => {
                let (lhs, rhs) = (lhs.eval(), rhs.eval());
                match op {
                    BinOp::Add => lhs + rhs,
                    BinOp::Sub => lhs - rhs,
                    BinOp::Mul => lhs * rhs,
                    BinOp::Div => lhs / rhs,
                }
            }
        }
    }
}

pub fn parse_expr(str_expr: &str) -> Result<Expr, ScaleError> {
    let parser = expr().then_ignore(end());

    parser.parse(str_expr).into_result().map_err(|errs| {
        let reason = errs
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        ScaleError::Syntax {
            input: str_expr.to_string(),
            reason,
        }
    })
}

/// Parses and evaluates a stat scale factor such as `1000` or `1000 * (1.0 / 6.0)`.
pub fn parse_scale(str_expr: &str) -> Result<f64, ScaleError> {
    let value = parse_expr(str_expr)?.eval();

    if !value.is_finite() || value <= 0.0 {
        return Err(ScaleError::NotPositive {
            input: str_expr.to_string(),
            value,
        });
    }

    Ok(value)
}

type Extra<'src> = extra::Err<Rich<'src, char>>;

fn num<'src>() -> impl Parser<'src, &'src str, Expr, Extra<'src>> {
    text::int(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .from_str()
        .unwrapped()
        .map(Expr::Num)
}

fn expr<'src>() -> impl Parser<'src, &'src str, Expr, Extra<'src>> {
    recursive(|expr| {
        let atom = num()
            .or(expr.delimited_by(just("("), just(")")))
            .padded()
            .boxed();

        let product_op = just("*")
            .padded()
            .to(BinOp::Mul)
            .or(just("/").padded().to(BinOp::Div));
        let product = atom
            .clone()
            .foldl(product_op.then(atom).repeated(), |lhs, (op, rhs)| {
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            });

        let sum_op = just("+")
            .padded()
            .to(BinOp::Add)
            .or(just("-").padded().to(BinOp::Sub));

        product
            .clone()
            .foldl(sum_op.then(product).repeated(), |lhs, (op, rhs)| {
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integer() {
        assert_eq!(parse_scale("1000"), Ok(1000.0));
        assert_eq!(parse_scale(" 2 "), Ok(2.0));
    }

    #[test]
    fn fractional_expression() {
        let value = parse_scale("1000 * (1.0 / 6.0)").unwrap();
        assert!((value - 1000.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn operator_precedence() {
        assert_eq!(parse_scale("1 + 2 * 3"), Ok(7.0));
        assert_eq!(parse_scale("(1 + 2) * 3"), Ok(9.0));
        assert_eq!(parse_scale("10 - 4 - 3"), Ok(3.0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_scale("abc"), Err(ScaleError::Syntax { .. })));
        assert!(matches!(parse_scale(""), Err(ScaleError::Syntax { .. })));
        assert!(matches!(parse_scale("2 *"), Err(ScaleError::Syntax { .. })));
    }

    #[test]
    fn rejects_non_positive() {
        assert!(matches!(parse_scale("0"), Err(ScaleError::NotPositive { .. })));
        assert!(matches!(parse_scale("1 - 2"), Err(ScaleError::NotPositive { .. })));
        assert!(matches!(parse_scale("1 / 0"), Err(ScaleError::NotPositive { .. })));
    }
}
