use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Variable(String),
    Literal(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    Compare(CompareOp),
    In,
    NotIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Operator { op: Op, lhs: Value, rhs: Value },
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Variable(var) => write!(f, "{}", var),
            Value::Literal(literal) => {
                if literal.contains('"') {
                    write!(f, "'{}'", literal)
                } else {
                    write!(f, "\"{}\"", literal)
                }
            }
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Compare(compare_op) => write!(f, "{}", compare_op),
            Op::In => write!(f, "in"),
            Op::NotIn => write!(f, "not in"),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 'and' binds tighter than 'or', so the only parentheses we ever need
        // are around an 'or' that sits inside an 'and'. Everything else is left
        // bare, which keeps render -> parse -> render stable.
        fn and_operand(e: &Expr, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match e {
                Expr::Or(..) => write!(f, "({})", e),
                _ => write!(f, "{}", e),
            }
        }
        match self {
            Expr::And(lhs, rhs) => {
                and_operand(lhs, f)?;
                write!(f, " and ")?;
                and_operand(rhs, f)
            }
            Expr::Or(lhs, rhs) => write!(f, "{} or {}", lhs, rhs),
            Expr::Operator { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op, rhs),
        }
    }
}

impl Expr {
    fn conjuncts(self) -> Vec<Expr> {
        match self {
            Expr::And(lhs, rhs) => {
                let mut all = lhs.conjuncts();
                all.extend(rhs.conjuncts());
                all
            }
            other => vec![other],
        }
    }

    fn and_all(exprs: Vec<Expr>) -> Option<Expr> {
        exprs
            .into_iter()
            .reduce(|acc, e| Expr::And(Box::new(acc), Box::new(e)))
    }

    /// If this is `extra == "x"` (either way round), returns `x`.
    fn as_extra_clause(&self) -> Option<&str> {
        match self {
            Expr::Operator {
                op: Op::Compare(CompareOp::Equal),
                lhs,
                rhs,
            } => match (lhs, rhs) {
                (Value::Variable(var), Value::Literal(lit))
                | (Value::Literal(lit), Value::Variable(var))
                    if var == "extra" =>
                {
                    Some(lit)
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Collects the extras if this expression is made of nothing but
    /// `extra == "..."` clauses joined by 'or'.
    fn extras_only(&self, found: &mut Vec<String>) -> bool {
        match self {
            Expr::Or(lhs, rhs) => lhs.extras_only(found) && rhs.extras_only(found),
            other => match other.as_extra_clause() {
                Some(extra) => {
                    found.push(extra.to_owned());
                    true
                }
                None => false,
            },
        }
    }

    /// Converts `python_version`/`python_full_version` comparisons into a
    /// version constraint on the interpreter.
    fn as_python_specifier(&self) -> Option<Specifier> {
        let (op, var, literal) = match self {
            Expr::Operator {
                op: Op::Compare(op),
                lhs: Value::Variable(var),
                rhs: Value::Literal(lit),
            } => (*op, var, lit),
            Expr::Operator {
                op: Op::Compare(op),
                lhs: Value::Literal(lit),
                rhs: Value::Variable(var),
            } => (op.flipped()?, var, lit),
            _ => return None,
        };
        match var.as_str() {
            "python_full_version" => Specifier::new(op, literal).ok(),
            "python_version" => {
                // python_version is only ever X.Y, so compare whole minor series
                let (op, value) = match op {
                    CompareOp::Equal | CompareOp::NotEqual if !literal.ends_with(".*") => {
                        (op, format!("{}.*", literal))
                    }
                    CompareOp::StrictlyGreaterThan => {
                        let v: Version = literal.as_str().try_into().ok()?;
                        (CompareOp::GreaterThanEqual, v.bump_release()?.to_string())
                    }
                    CompareOp::LessThanEqual => {
                        let v: Version = literal.as_str().try_into().ok()?;
                        (CompareOp::StrictlyLessThan, v.bump_release()?.to_string())
                    }
                    _ => (op, literal.clone()),
                };
                Specifier::new(op, &value).ok()
            }
            _ => None,
        }
    }
}

/// An environment marker expression, e.g. `python_version >= "3.6" and
/// sys_platform == "linux"`.
///
/// We never evaluate these here; we parse them, render them canonically, and
/// pick out the bits that requirements care about (interpreter version and
/// extras).
#[derive(Debug, Clone, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Marker(pub Expr);

impl Marker {
    pub fn expr(&self) -> &Expr {
        &self.0
    }

    /// Splits off the top-level conjuncts that constrain the interpreter
    /// version. Returns the rest of the marker (if anything is left) and the
    /// collected constraint.
    pub fn split_pyspec(&self) -> (Option<Marker>, Specifiers) {
        let mut rest = Vec::new();
        let mut pyspec = Specifiers::any();
        for conjunct in self.0.clone().conjuncts() {
            match conjunct.as_python_specifier() {
                Some(spec) => pyspec.extend(Specifiers(vec![spec])),
                None => rest.push(conjunct),
            }
        }
        (Expr::and_all(rest).map(Marker), pyspec)
    }

    /// Splits off the `extra == "..."` clauses. Returns the extras named and the
    /// rest of the marker (if anything is left).
    pub fn split_extras(&self) -> (BTreeSet<String>, Option<Marker>) {
        let mut extras = BTreeSet::new();
        let mut rest = Vec::new();
        for conjunct in self.0.clone().conjuncts() {
            let mut found = Vec::new();
            if conjunct.extras_only(&mut found) {
                extras.extend(found);
            } else {
                rest.push(conjunct);
            }
        }
        (extras, Expr::and_all(rest).map(Marker))
    }
}

impl Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for Marker {
    type Error = eyre::Report;

    fn try_from(input: &str) -> Result<Self, Self::Error> {
        let expr = super::reqparse::marker(input)
            .wrap_err_with(|| format!("failed to parse marker expression {:?}", input))?;
        Ok(Marker(expr))
    }
}

try_from_str_boilerplate!(Marker);
