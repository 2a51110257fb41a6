use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specifier {
    pub op: CompareOp,
    pub value: String,
}

impl Specifier {
    /// Checks that `value` is something `op` can be applied to.
    ///
    /// `===` compares strings, so anything goes. `==` and `!=` also take a
    /// trailing `.*` wildcard. Everything else needs a real PEP 440 version.
    pub fn new(op: CompareOp, value: &str) -> Result<Specifier> {
        let value = value.trim();
        match op {
            CompareOp::ArbitraryEqual => {
                if value.is_empty() {
                    bail!("'===' needs something to compare against");
                }
            }
            CompareOp::Equal | CompareOp::NotEqual => {
                let (vstr, wildcard) = split_wildcard(value);
                let version: Version = vstr.try_into()?;
                if wildcard && (version.0.dev.is_some() || !version.0.local.is_empty()) {
                    bail!("version wildcards can't have dev or local suffixes");
                }
            }
            _ => {
                let version: Version = value.try_into()?;
                if !version.0.local.is_empty() {
                    bail!(
                        "Operator {:?} cannot be used on a version with a +local suffix",
                        op
                    );
                }
                if op == CompareOp::Compatible && version.0.release.len() < 2 {
                    bail!("~= operator requires a version with two segments (X.Y)");
                }
            }
        }
        Ok(Specifier {
            op,
            value: value.to_owned(),
        })
    }

    /// The pinned version, if this clause pins one (`==` without a wildcard, or
    /// `===`).
    pub fn pinned(&self) -> Option<&str> {
        match self.op {
            CompareOp::Equal if split_wildcard(&self.value).1 => None,
            CompareOp::Equal | CompareOp::ArbitraryEqual => Some(&self.value),
            _ => None,
        }
    }
}

fn split_wildcard(input: &str) -> (&str, bool) {
    match input.strip_suffix(".*") {
        Some(vstr) => (vstr, true),
        None => (input, false),
    }
}

impl Display for Specifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.op, self.value)
    }
}

/// A set of version clauses, all of which have to hold. No clauses at all means
/// "any version".
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr, Default,
)]
pub struct Specifiers(pub Vec<Specifier>);

impl Specifiers {
    /// Clauses are kept in a canonical (sorted, deduplicated) order, so two sets
    /// written differently compare and render the same.
    pub fn new(mut specifiers: Vec<Specifier>) -> Specifiers {
        specifiers.sort_by_cached_key(|s| s.to_string());
        specifiers.dedup();
        Specifiers(specifiers)
    }

    pub fn any() -> Specifiers {
        Specifiers(vec![])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `==X` for a single version, the way a lock file pins things.
    pub fn pinned_to(version: &str) -> Result<Specifiers> {
        Ok(Specifiers(vec![Specifier::new(CompareOp::Equal, version)?]))
    }

    /// The version this set pins, if it consists of exactly one `==` or `===`
    /// clause.
    pub fn pinned_version(&self) -> Option<&str> {
        match &self.0[..] {
            [only] => only.pinned(),
            _ => None,
        }
    }

    pub fn extend(&mut self, other: Specifiers) {
        let mut all = std::mem::take(&mut self.0);
        all.extend(other.0);
        *self = Specifiers::new(all);
    }
}

impl Display for Specifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", rendered.join(","))
    }
}

impl TryFrom<&str> for Specifiers {
    type Error = eyre::Report;

    fn try_from(input: &str) -> Result<Self, Self::Error> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Specifiers::any());
        }
        let specifiers_or_err = super::reqparse::versionspec(trimmed);
        specifiers_or_err.wrap_err_with(|| {
            format!("failed to parse versions specifiers from {:?}", input)
        })
    }
}

try_from_str_boilerplate!(Specifiers);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CompareOp {
    LessThanEqual,
    StrictlyLessThan,
    NotEqual,
    Equal,
    GreaterThanEqual,
    StrictlyGreaterThan,
    Compatible,
    ArbitraryEqual,
}

impl CompareOp {
    /// The operator you get by swapping the two sides: `a < b` iff `b > a`.
    /// `~=` and `===` are not symmetric in any useful way.
    pub fn flipped(self) -> Option<CompareOp> {
        use CompareOp::*;
        Some(match self {
            LessThanEqual => GreaterThanEqual,
            StrictlyLessThan => StrictlyGreaterThan,
            GreaterThanEqual => LessThanEqual,
            StrictlyGreaterThan => StrictlyLessThan,
            Equal => Equal,
            NotEqual => NotEqual,
            Compatible | ArbitraryEqual => return None,
        })
    }
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CompareOp::*;
        write!(
            f,
            "{}",
            match self {
                LessThanEqual => "<=",
                StrictlyLessThan => "<",
                NotEqual => "!=",
                Equal => "==",
                GreaterThanEqual => ">=",
                StrictlyGreaterThan => ">",
                Compatible => "~=",
                ArbitraryEqual => "===",
            }
        )
    }
}

impl TryFrom<&str> for CompareOp {
    type Error = eyre::Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        use CompareOp::*;
        Ok(match value {
            "==" => Equal,
            "!=" => NotEqual,
            "<=" => LessThanEqual,
            "<" => StrictlyLessThan,
            ">=" => GreaterThanEqual,
            ">" => StrictlyGreaterThan,
            "~=" => Compatible,
            "===" => ArbitraryEqual,
            _ => bail!("unrecognized operator: {:?}", value),
        })
    }
}

try_from_str_boilerplate!(CompareOp);
