use crate::prelude::*;

// We lean on the 'pep440' crate for the heavy lifting part of representing
// versions. Requirements mostly carry versions around as the strings the user
// wrote; this type is what we validate them with.

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Version(pub pep440::Version);

impl Version {
    /// The release segment with its last component incremented, e.g. 3.6 -> 3.7.
    /// Pre/post/dev/local parts are dropped. `None` if the last component is
    /// already at its maximum.
    pub fn bump_release(&self) -> Option<Version> {
        let mut release = self.0.release.clone();
        if let Some(last) = release.last_mut() {
            *last = last.checked_add(1)?;
        }
        Some(Version(pep440::Version {
            epoch: self.0.epoch,
            release,
            pre: None,
            post: None,
            dev: None,
            local: vec![],
        }))
    }
}

impl TryFrom<&str> for Version {
    type Error = eyre::Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        pep440::Version::parse(value)
            .map(Version)
            .ok_or_else(|| eyre!("Failed to parse PEP 440 version {}", value))
    }
}

try_from_str_boilerplate!(Version);

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_version_parse() {
        let v: Version = "1.2.3".parse().unwrap();
        assert_eq!(v.0.release, vec![1, 2, 3]);
        assert!(Version::try_from("not a version").is_err());
    }

    #[test]
    fn test_bump_release() {
        let v: Version = "3.6".parse().unwrap();
        assert_eq!(v.bump_release().unwrap().to_string(), "3.7");
        let v: Version = "2.7.18rc1".parse().unwrap();
        assert_eq!(v.bump_release().unwrap().to_string(), "2.7.19");
        let v: Version = "4294967295".parse().unwrap();
        assert_eq!(v.bump_release(), None);
    }
}
