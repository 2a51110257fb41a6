// 'Extra' string format is not well specified. It looks like what pip does is
// run things through pkg_resources.safe_extra, which does:
//
//   re.sub('[^A-Za-z0-9.-]+', '_', extra).lower()
//
// OTOH, PEP 508's grammar for requirement specifiers says that extras have to
// be "identifiers", which means: first char [A-Za-z0-9], remaining chars also
// allowed to include -_.
//
// We treat them the same as package names: compared in normalized form,
// rendered as given.

use crate::prelude::*;

#[derive(
    Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, DeserializeFromStr, SerializeDisplay,
)]
pub struct Extra(PackageName);

impl Extra {
    pub fn as_given(&self) -> &str {
        self.0.as_given()
    }

    pub fn normalized(&self) -> &str {
        self.0.normalized()
    }
}

impl Display for Extra {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_given())
    }
}

impl TryFrom<&str> for Extra {
    type Error = eyre::Report;

    fn try_from(s: &str) -> Result<Self> {
        let p: PackageName = s
            .trim()
            .try_into()
            .wrap_err_with(|| format!("invalid extra name {:?}", s))?;
        Ok(Extra(p))
    }
}

try_from_str_boilerplate!(Extra);

/// Parses the inside of an extras bracket (`"a, b"`), or the whole bracket
/// (`"[a, b]"`). When the same extra is spelled more than one way, the first
/// spelling is the one kept.
pub fn parse_extras(s: &str) -> Result<BTreeSet<Extra>> {
    let s = s.trim();
    let inner = s
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(s);
    let mut extras = BTreeSet::new();
    for extra in inner.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        // BTreeSet::insert leaves an existing equal element in place
        extras.insert(Extra::try_from(extra)?);
    }
    Ok(extras)
}

/// `a,b,c` in sorted order, wrapped in brackets; empty string for no extras.
pub fn format_extras(extras: &BTreeSet<Extra>) -> String {
    bracketed(extras.iter().map(Extra::as_given))
}

/// Like [`format_extras`], but with every extra in normalized form, so equal
/// sets always render the same.
pub fn format_normalized_extras(extras: &BTreeSet<Extra>) -> String {
    bracketed(extras.iter().map(Extra::normalized))
}

fn bracketed<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    if names.is_empty() {
        return String::new();
    }
    format!("[{}]", names.join(","))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_extras_collapse_and_sort() {
        let extras = parse_extras("[socks, Security,socks , security]").unwrap();
        assert_eq!(extras.len(), 2);
        assert_eq!(format_extras(&extras), "[Security,socks]");
        assert_eq!(format_normalized_extras(&extras), "[security,socks]");

        let extras = parse_extras("[SOCKS,socks]").unwrap();
        assert_eq!(format_extras(&extras), "[SOCKS]");
    }

    #[test]
    fn test_extras_empty() {
        assert!(parse_extras("").unwrap().is_empty());
        assert_eq!(format_extras(&BTreeSet::new()), "");
        assert_eq!(format_normalized_extras(&BTreeSet::new()), "");
        assert!(parse_extras("[has space]").is_err());
    }
}
