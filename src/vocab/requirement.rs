use crate::prelude::*;

// There are two kinds of special exact version constraints in PEP 508 whose
// semantics are a bit unclear:
//
//  === "some string"
//  @ some_url
//
// For === they're easy to parse and represent (same as all the other binary
// comparisons), so we just carry the string around. @ *replaces* version
// constraints, so it gets its own variant here, and crate::requirement turns it
// into a file or VCS requirement.
//
// NB: PEP 508 includes an entire copy of (some version of) the standard URL
// syntax. We don't want to do that, both because it's wildly more complicated
// than required, and because there are >3 different standards purporting to
// define URL syntax and we don't want to take sides. The 'packaging' module just
// does
//
//    URI = Regex(r"[^ ]+")("url")
//
// ...so we steal some version of that.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionOrUrl {
    Version(Specifiers),
    Url(String),
}

/// A requirement exactly as PEP 508 spells it, before we've decided what kind of
/// source it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pep508Requirement {
    pub name: PackageName,
    pub extras: BTreeSet<Extra>,
    pub version_or_url: VersionOrUrl,
    pub marker: Option<Marker>,
}

impl Pep508Requirement {
    pub fn parse(input: &str) -> Result<Pep508Requirement> {
        let req = super::reqparse::requirement(input)
            .wrap_err_with(|| format!("Failed parsing requirement string {:?}", input))?;
        Ok(req)
    }
}

impl Display for Pep508Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name.as_given(), format_extras(&self.extras))?;
        match &self.version_or_url {
            VersionOrUrl::Version(specifiers) => write!(f, "{}", specifiers)?,
            VersionOrUrl::Url(url) => write!(f, " @ {}", url)?,
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {}", marker)?;
        }
        Ok(())
    }
}

try_from_str_boilerplate!(Pep508Requirement);

impl TryFrom<&str> for Pep508Requirement {
    type Error = eyre::Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Pep508Requirement::parse(value)
    }
}
