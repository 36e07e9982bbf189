//! Expression parsing and compilation for coefficient functionals
//!
//! Expressions are parsed once into an [`Expression`] tree and then compiled
//! into a [`CompiledExpression`] in which every variable has been replaced by
//! the index of its slot in a flat value array. Evaluating the compiled form
//! is a plain tree walk without name lookups or allocation.
//!
//! The grammar (whitespace-insensitive):
//!
//! ```text
//! expr     := term (('+' | '-') term)*
//! term     := unary (('*' | '/') unary)*
//! unary    := ('-' | '+') unary | power
//! power    := primary ('^' unary)?
//! primary  := number | call | variable | '(' expr ')'
//! variable := ident ('[' digits ']')?
//! call     := ident '(' (expr (',' expr)*)? ')'
//! ```
//!
//! `+ - * /` are left associative, `^` is right associative and binds tighter
//! than unary minus, so `-2^2 == -4`.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
    combinator::{map, map_res, opt, recognize},
    multi::{many0, separated_list0},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated},
    error::{Error as NomError, ErrorKind},
    IResult, Parser,
};
use std::f64::consts::{E, PI};
use thiserror::Error;

/// Error that can occur during expression parsing or compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
}

/// Result type for expression handling
type ExprResult<T> = Result<T, ExpressionError>;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant number
    Number(f64),

    /// Variable reference, including an index suffix such as `mu[1]`
    Variable(String),

    /// Unary operations
    Unary(UnaryOp, Box<Expression>),

    /// Binary operations
    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// Function call
    Function(String, Vec<Expression>),
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    /// Addition (+)
    Add,

    /// Subtraction (-)
    Sub,

    /// Multiplication (*)
    Mul,

    /// Division (/)
    Div,

    /// Power (^)
    Pow,
}

impl BinaryOp {
    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
            Self::Pow => lhs.powf(rhs),
        }
    }
}

impl Expression {
    /// Parse an expression from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use affine_decomp::parameters::expression::{BinaryOp, Expression};
    ///
    /// let expr = Expression::parse("8 - 3 - 2").unwrap();
    /// match expr {
    ///     Expression::Binary(BinaryOp::Sub, lhs, _) => {
    ///         assert!(matches!(*lhs, Expression::Binary(BinaryOp::Sub, _, _)))
    ///     }
    ///     _ => panic!("expected a subtraction"),
    /// }
    /// ```
    pub fn parse(input: &str) -> ExprResult<Self> {
        match terminated(|i| expr(i, 0), ws).parse(input) {
            Ok(("", expr)) => Ok(expr),
            Ok((remainder, _)) => Err(ExpressionError::ParseError {
                message: format!("Unexpected trailing characters: '{}'", remainder),
            }),
            Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => {
                Err(ExpressionError::ParseError {
                    message: "expression nested too deeply".to_string(),
                })
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: format!("{}", e),
            }),
        }
    }

    /// Resolve every variable to a slot and every function to its
    /// implementation.
    ///
    /// `resolve` maps a variable name to its slot index. The names `pi` and `e`
    /// fall back to the mathematical constants when `resolve` does not know them.
    ///
    /// # Errors
    ///
    /// * `UndefinedVariable` for a name that is neither resolvable nor a constant
    /// * `UndefinedFunction` for an unknown function name
    /// * `InvalidOperation` for a call with the wrong number of arguments
    pub fn compile<F>(&self, resolve: F) -> ExprResult<CompiledExpression>
    where
        F: Fn(&str) -> Option<usize>,
    {
        let mut required_slots = 0;
        let root = self.lower(&resolve, &mut required_slots)?;
        Ok(CompiledExpression {
            root,
            required_slots,
        })
    }

    fn lower<F>(&self, resolve: &F, required_slots: &mut usize) -> ExprResult<Node>
    where
        F: Fn(&str) -> Option<usize>,
    {
        let node = match self {
            Self::Number(n) => Node::Const(*n),

            Self::Variable(name) => match (resolve(name), name.as_str()) {
                (Some(slot), _) => {
                    *required_slots = (*required_slots).max(slot + 1);
                    Node::Slot(slot)
                }
                (None, "pi") => Node::Const(PI),
                (None, "e") => Node::Const(E),
                (None, _) => {
                    return Err(ExpressionError::UndefinedVariable { name: name.clone() })
                }
            },

            Self::Unary(UnaryOp::Neg, expr) => {
                Node::Neg(Box::new(expr.lower(resolve, required_slots)?))
            }

            Self::Binary(op, left, right) => Node::Binary(
                *op,
                Box::new(left.lower(resolve, required_slots)?),
                Box::new(right.lower(resolve, required_slots)?),
            ),

            Self::Function(name, args) => {
                let mut lowered = Vec::with_capacity(args.len());
                for arg in args {
                    lowered.push(arg.lower(resolve, required_slots)?);
                }
                Node::call(name, lowered)?
            }
        };
        Ok(node)
    }

    /// Find all variable names used in the expression, sorted and deduplicated
    ///
    /// Constant names such as `pi` are reported too; whether they are variables
    /// is only decided by [`Expression::compile`].
    pub fn variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    /// Number of nodes on the longest root-to-leaf path.
    fn height(&self) -> usize {
        match self {
            Self::Number(_) | Self::Variable(_) => 1,
            Self::Unary(_, expr) => expr.height() + 1,
            Self::Binary(_, left, right) => left.height().max(right.height()) + 1,
            Self::Function(_, args) => args.iter().map(Self::height).max().unwrap_or(0) + 1,
        }
    }

    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Self::Number(_) => {}
            Self::Variable(name) => vars.push(name.clone()),
            Self::Unary(_, expr) => expr.collect_variables(vars),
            Self::Binary(_, left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }
            Self::Function(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
        }
    }
}

/// An expression with all names resolved, ready for repeated evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    root: Node,
    required_slots: usize,
}

impl CompiledExpression {
    /// Minimum length of the slot array passed to [`CompiledExpression::evaluate`].
    pub fn required_slots(&self) -> usize {
        self.required_slots
    }

    /// Evaluate against the slot values.
    ///
    /// Arithmetic follows IEEE semantics: division by zero yields an infinity
    /// and domain errors yield NaN.
    pub fn evaluate(&self, slots: &[f64]) -> ExprResult<f64> {
        if slots.len() < self.required_slots {
            return Err(ExpressionError::InvalidOperation {
                message: format!(
                    "expression needs {} values, got {}",
                    self.required_slots,
                    slots.len()
                ),
            });
        }
        Ok(self.root.eval(slots))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Const(f64),
    Slot(usize),
    Neg(Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    Call1(Func1, Box<Node>),
    Call2(Func2, Box<Node>, Box<Node>),
    Extremum(Extremum, Vec<Node>),
}

impl Node {
    fn call(name: &str, mut args: Vec<Node>) -> ExprResult<Self> {
        let arity_error = |expected: &str, got: usize| ExpressionError::InvalidOperation {
            message: format!("{}() requires {}, got {}", name, expected, got),
        };

        if let Some(func) = Func1::lookup(name) {
            if args.len() != 1 {
                return Err(arity_error("1 argument", args.len()));
            }
            let arg = args.remove(0);
            return Ok(Self::Call1(func, Box::new(arg)));
        }
        if let Some(func) = Func2::lookup(name) {
            if args.len() != 2 {
                return Err(arity_error("2 arguments", args.len()));
            }
            let rhs = args.remove(1);
            let lhs = args.remove(0);
            return Ok(Self::Call2(func, Box::new(lhs), Box::new(rhs)));
        }
        let extremum = match name {
            "min" => Extremum::Min,
            "max" => Extremum::Max,
            _ => {
                return Err(ExpressionError::UndefinedFunction {
                    name: name.to_string(),
                })
            }
        };
        if args.len() < 2 {
            return Err(arity_error("at least 2 arguments", args.len()));
        }
        Ok(Self::Extremum(extremum, args))
    }

    fn eval(&self, slots: &[f64]) -> f64 {
        match self {
            Self::Const(v) => *v,
            Self::Slot(i) => slots[*i],
            Self::Neg(arg) => -arg.eval(slots),
            Self::Binary(op, lhs, rhs) => op.apply(lhs.eval(slots), rhs.eval(slots)),
            Self::Call1(func, arg) => func.apply(arg.eval(slots)),
            Self::Call2(func, lhs, rhs) => func.apply(lhs.eval(slots), rhs.eval(slots)),
            Self::Extremum(Extremum::Min, args) => args
                .iter()
                .map(|arg| arg.eval(slots))
                .fold(f64::INFINITY, f64::min),
            Self::Extremum(Extremum::Max, args) => args
                .iter()
                .map(|arg| arg.eval(slots))
                .fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Func1 {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log10,
    Log2,
    Sqrt,
    Abs,
    Floor,
    Ceil,
}

impl Func1 {
    fn lookup(name: &str) -> Option<Self> {
        let func = match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "exp" => Self::Exp,
            "log" | "ln" => Self::Ln,
            "log10" => Self::Log10,
            "log2" => Self::Log2,
            "sqrt" => Self::Sqrt,
            "abs" => Self::Abs,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            _ => return None,
        };
        Some(func)
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Asin => x.asin(),
            Self::Acos => x.acos(),
            Self::Atan => x.atan(),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Tanh => x.tanh(),
            Self::Exp => x.exp(),
            Self::Ln => x.ln(),
            Self::Log10 => x.log10(),
            Self::Log2 => x.log2(),
            Self::Sqrt => x.sqrt(),
            Self::Abs => x.abs(),
            Self::Floor => x.floor(),
            Self::Ceil => x.ceil(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Func2 {
    Pow,
    Atan2,
}

impl Func2 {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "pow" => Some(Self::Pow),
            "atan2" => Some(Self::Atan2),
            _ => None,
        }
    }

    fn apply(self, x: f64, y: f64) -> f64 {
        match self {
            Self::Pow => x.powf(y),
            Self::Atan2 => x.atan2(y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Extremum {
    Min,
    Max,
}

// Parser functions using nom. Every parser returns the default error type so
// the combinators built from them infer without annotations. The recursive
// parsers carry the current nesting depth.

/// Deepest nesting of parentheses, calls, signs and exponents accepted by the parser
const MAX_NESTING: usize = 64;

/// Greatest height of a parsed tree; bounds the chains built by `+ - * /`
const MAX_HEIGHT: usize = 512;

fn too_deep(input: &str) -> nom::Err<NomError<&str>> {
    nom::Err::Failure(NomError::new(input, ErrorKind::TooLarge))
}

fn ws(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

/// Parse a single punctuation character, skipping leading whitespace
fn symbol<'a>(c: char) -> impl FnMut(&'a str) -> IResult<&'a str, char> {
    move |input: &'a str| preceded(multispace0, char(c)).parse(input)
}

/// Parse an identifier (variable or function name)
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn float_literal(input: &str) -> IResult<&str, &str> {
    recognize_float(input)
}

/// Parse an unsigned number; signs are handled by `unary`
fn number(input: &str) -> IResult<&str, Expression> {
    map(
        map_res(float_literal, |text: &str| text.parse::<f64>()),
        Expression::Number,
    )
    .parse(input)
}

/// Parse a variable reference such as `mu` or `mu[2]`
fn variable(input: &str) -> IResult<&str, Expression> {
    map(
        recognize(pair(
            identifier,
            opt(delimited(char('['), digit1, char(']'))),
        )),
        |name: &str| Expression::Variable(name.to_string()),
    )
    .parse(input)
}

/// Parse a function call with zero or more comma-separated arguments
fn call<'a>(input: &'a str, depth: usize) -> IResult<&'a str, Expression> {
    let (input, name) = identifier(input)?;
    let (input, args) = delimited(
        symbol('('),
        separated_list0(symbol(','), |i: &'a str| expr(i, depth + 1)),
        symbol(')'),
    )
    .parse(input)?;
    Ok((input, Expression::Function(name.to_string(), args)))
}

/// Parse a parenthesized expression
fn parens<'a>(input: &'a str, depth: usize) -> IResult<&'a str, Expression> {
    delimited(symbol('('), |i: &'a str| expr(i, depth + 1), symbol(')')).parse(input)
}

/// Parse a primary expression (number, function call, variable, or parenthesized expression)
fn primary<'a>(input: &'a str, depth: usize) -> IResult<&'a str, Expression> {
    let (input, _) = ws(input)?;
    alt((
        number,
        |i: &'a str| call(i, depth),
        variable,
        |i: &'a str| parens(i, depth),
    ))
    .parse(input)
}

/// Parse a power expression; the exponent may carry its own sign
fn power<'a>(input: &'a str, depth: usize) -> IResult<&'a str, Expression> {
    let (input, base) = primary(input, depth)?;
    let (input, exponent) = opt(preceded(symbol('^'), |i: &'a str| unary(i, depth + 1))).parse(input)?;
    let expr = match exponent {
        Some(exponent) => Expression::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)),
        None => base,
    };
    Ok((input, expr))
}

/// Parse a signed expression (-expr, +expr)
///
/// Every recursive path passes through here, so this is where the nesting
/// limit is enforced.
fn unary<'a>(input: &'a str, depth: usize) -> IResult<&'a str, Expression> {
    if depth > MAX_NESTING {
        return Err(too_deep(input));
    }
    alt((
        map(
            preceded(symbol('-'), |i: &'a str| unary(i, depth + 1)),
            |expr: Expression| Expression::Unary(UnaryOp::Neg, Box::new(expr)),
        ),
        preceded(symbol('+'), |i: &'a str| unary(i, depth + 1)),
        |i: &'a str| power(i, depth),
    ))
    .parse(input)
}

/// Fold `first (op operand)*` into a left-deep tree no higher than [`MAX_HEIGHT`].
fn fold_left<'a>(
    input: &'a str,
    first: Expression,
    rest: Vec<(BinaryOp, Expression)>,
) -> IResult<&'a str, Expression> {
    let mut height = first.height();
    let mut expr = first;
    for (op, rhs) in rest {
        height = height.max(rhs.height()) + 1;
        if height > MAX_HEIGHT {
            return Err(too_deep(input));
        }
        expr = Expression::Binary(op, Box::new(expr), Box::new(rhs));
    }
    Ok((input, expr))
}

/// Parse a multiplicative expression (expr * expr, expr / expr)
fn term<'a>(input: &'a str, depth: usize) -> IResult<&'a str, Expression> {
    let (input, first) = unary(input, depth)?;
    let (input, rest) = many0(pair(
        alt((
            map(symbol('*'), |_| BinaryOp::Mul),
            map(symbol('/'), |_| BinaryOp::Div),
        )),
        |i: &'a str| unary(i, depth),
    ))
    .parse(input)?;
    fold_left(input, first, rest)
}

/// Parse an additive expression (expr + expr, expr - expr)
fn expr<'a>(input: &'a str, depth: usize) -> IResult<&'a str, Expression> {
    let (input, first) = term(input, depth)?;
    let (input, rest) = many0(pair(
        alt((
            map(symbol('+'), |_| BinaryOp::Add),
            map(symbol('-'), |_| BinaryOp::Sub),
        )),
        |i: &'a str| term(i, depth),
    ))
    .parse(input)?;
    fold_left(input, first, rest)
}
