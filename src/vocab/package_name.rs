use crate::prelude::*;
use std::cmp::Ordering;

/// A package name, remembering how the user spelled it.
///
/// Equality, hashing and ordering all go through the PEP 503 normalized form,
/// so `Foo_Bar` and `foo.bar` are the same package.
#[derive(Debug, Clone, DeserializeFromStr, SerializeDisplay, Derivative)]
#[derivative(Hash, PartialEq, Eq)]
pub struct PackageName {
    #[derivative(Hash = "ignore", PartialEq = "ignore")]
    as_given: String,
    normalized: String,
}

impl PackageName {
    pub fn as_given(&self) -> &str {
        &self.as_given
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// The setuptools "safe name": every run of characters other than
    /// alphanumerics and `.` collapses into a single `-`. Case is preserved.
    pub fn project_name(&self) -> String {
        let mut safe = String::with_capacity(self.as_given.len());
        let mut in_run = false;
        for c in self.as_given.chars() {
            if c.is_ascii_alphanumeric() || c == '.' {
                safe.push(c);
                in_run = false;
            } else if !in_run {
                safe.push('-');
                in_run = true;
            }
        }
        safe
    }

    /// Lower-cased [`project_name`](Self::project_name); what requirements are
    /// keyed on.
    pub fn key(&self) -> String {
        self.project_name().to_ascii_lowercase()
    }
}

impl PartialOrd for PackageName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_given)
    }
}

impl TryFrom<&str> for PackageName {
    type Error = eyre::Report;

    fn try_from(as_given: &str) -> Result<Self, Self::Error> {
        // https://packaging.python.org/specifications/core-metadata/#name
        static NAME_VALIDATE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i-u)^([A-Z0-9]|[A-Z0-9][A-Z0-9._-]*[A-Z0-9])$").unwrap()
        });
        // https://www.python.org/dev/peps/pep-0503/#normalized-names
        static NAME_NORMALIZE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"[-_.]+").unwrap());

        if !NAME_VALIDATE.is_match(as_given) {
            bail!("Invalid package name {:?}", as_given);
        }
        let as_given = as_given.to_owned();

        let mut normalized = NAME_NORMALIZE.replace_all(&as_given, "-").to_string();
        normalized.make_ascii_lowercase();

        Ok(PackageName {
            as_given,
            normalized,
        })
    }
}

try_from_str_boilerplate!(PackageName);

#[cfg(test)]
mod test {
    use std::convert::TryInto;

    use super::*;

    #[test]
    fn test_packagename_basics() {
        let name1: PackageName = "Foo-Bar-Baz".try_into().unwrap();
        assert_eq!(name1.as_given(), "Foo-Bar-Baz");
        assert_eq!(name1.normalized(), "foo-bar-baz");

        let name2: PackageName = "foo_bar.baz".try_into().unwrap();
        assert_eq!(name2.as_given(), "foo_bar.baz");
        assert_eq!(name2.normalized(), "foo-bar-baz");

        assert_eq!(name1, name2);

        let name3: PackageName = "foo-barbaz".try_into().unwrap();
        assert_ne!(name1, name3);
    }

    #[test]
    fn test_project_name_and_key() {
        let name: PackageName = "Django_Rest__Framework".try_into().unwrap();
        assert_eq!(name.project_name(), "Django-Rest-Framework");
        assert_eq!(name.key(), "django-rest-framework");

        // dots survive safe_name, unlike PEP 503 normalization
        let name: PackageName = "zope.Interface".try_into().unwrap();
        assert_eq!(name.project_name(), "zope.Interface");
        assert_eq!(name.key(), "zope.interface");
    }

    #[test]
    fn test_packagename_validation() {
        let name: Result<PackageName> = "foobar baz".try_into();
        assert!(name.is_err());

        let name: Result<PackageName> = "foobarbaz!".parse();
        assert!(name.is_err());

        let name: Result<PackageName> = "-leading".parse();
        assert!(name.is_err());
    }

    #[test]
    fn test_packagename_serde() {
        let direct: PackageName = "foo-bar_baz".try_into().unwrap();
        let via_serde: Vec<PackageName> =
            serde_json::from_str(r#"["foo_bar.baz"]"#).unwrap();
        assert_eq!(via_serde[0], direct);
        assert_eq!(via_serde[0].as_given(), "foo_bar.baz");
        assert_eq!(via_serde[0].normalized(), "foo-bar-baz");

        let bad: serde_json::Result<PackageName> =
            serde_json::from_str(r#" "foo bar" "#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_packagename_hash() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        fn calculate_hash<T: Hash>(t: &T) -> u64 {
            let mut s = DefaultHasher::new();
            t.hash(&mut s);
            s.finish()
        }

        let name1: PackageName = "foo_bar".try_into().unwrap();
        let name2: PackageName = "foo.bar".try_into().unwrap();

        let name_other: PackageName = "foobar".try_into().unwrap();

        assert_eq!(calculate_hash(&name1), calculate_hash(&name2));
        assert_ne!(calculate_hash(&name1), calculate_hash(&name_other));
    }
}
