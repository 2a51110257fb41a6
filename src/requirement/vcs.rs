use super::file::{parse_egg_fragment, EggInfo, FileLink};
use super::record::RecordTable;
use crate::prelude::*;
use crate::util::{split_url, url_without_fragments};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub enum VcsKind {
    Git,
    Hg,
    Svn,
    Bzr,
}

impl VcsKind {
    pub const ALL: [VcsKind; 4] = [VcsKind::Git, VcsKind::Hg, VcsKind::Svn, VcsKind::Bzr];

    pub fn as_str(self) -> &'static str {
        match self {
            VcsKind::Git => "git",
            VcsKind::Hg => "hg",
            VcsKind::Svn => "svn",
            VcsKind::Bzr => "bzr",
        }
    }
}

impl Display for VcsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for VcsKind {
    type Error = eyre::Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        VcsKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| eyre!("unknown version control system {:?}", value))
    }
}

try_from_str_boilerplate!(VcsKind);

/// A VCS requirement as written: `<vcs>+<url>[@ref][#egg=...&subdirectory=...]`.
#[derive(Debug, Clone, Default)]
pub struct VcsSource {
    pub url: String,
    /// The commit the ref resolved to, if something (a lock file) already knows.
    pub revision: Option<String>,
    pub editable: bool,
}

/// Everything that can be read off a VCS URL without touching the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVcsUrl {
    pub vcs: VcsKind,
    /// The full URL, after scp-style ssh locators are rewritten.
    pub url: String,
    /// The URL minus the `<vcs>+` prefix, the `@ref` and any fragment.
    pub repo: String,
    pub reference: Option<String>,
    pub egg: Option<EggInfo>,
    pub subdirectory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsLink {
    link: FileLink,
    vcs: VcsKind,
    repo: String,
    reference: Option<String>,
    revision: Option<String>,
}

impl VcsLink {
    pub(crate) fn resolve(
        source: VcsSource,
    ) -> Result<(VcsLink, Option<EggInfo>), RequirementError> {
        let parsed = parse_vcs_url(&source.url)?;
        trace!("{} repo {} at {:?}", parsed.vcs, parsed.repo, parsed.reference);
        let link = FileLink::new(
            url_without_fragments(&parsed.url).to_owned(),
            parsed.subdirectory,
        );
        Ok((
            VcsLink {
                link,
                vcs: parsed.vcs,
                repo: parsed.repo,
                reference: parsed.reference,
                revision: source.revision,
            },
            parsed.egg,
        ))
    }

    /// Always `<vcs>+<repo>[@ref]`.
    pub fn link(&self) -> &FileLink {
        &self.link
    }

    pub fn vcs(&self) -> VcsKind {
        self.vcs
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// The branch or tag asked for.
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// The commit that `reference` resolved to.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// The URL an installer should fetch for a reproducible checkout: the
    /// resolved revision in place of the ref, when we have one.
    pub fn pinned_url(&self) -> String {
        match &self.revision {
            Some(revision) => format!("{}+{}@{}", self.vcs, self.repo, revision),
            None => self.link.url().to_owned(),
        }
    }
}

/// Rewrites `git@host:org/repo.git` into `ssh://git@host/org/repo.git`, so it
/// decomposes the same way as the explicit form.
fn add_ssh_scheme(url: &str) -> String {
    if !url.starts_with("git@") || url.contains("://") {
        return url.to_owned();
    }
    match url.split_once(':') {
        Some((host, path)) => format!("ssh://{}/{}", host, path.trim_start_matches('/')),
        None => format!("ssh://{}", url),
    }
}

pub fn parse_vcs_url(url: &str) -> Result<ParsedVcsUrl, RequirementError> {
    let (vcs, rest) = url
        .split_once('+')
        .ok_or_else(|| RequirementError::Parse(format!("{:?} is not a VCS URL", url)))?;
    let vcs = VcsKind::try_from(vcs).map_err(RequirementError::parse)?;
    let rest = add_ssh_scheme(rest);

    let (egg, subdirectory) = parse_egg_fragment(&rest)?;
    let (prefix, path, query) = split_url(url_without_fragments(&rest));
    let (repo, reference) = match path.split_once('@') {
        Some((path, reference)) => (
            format!("{}{}{}", prefix, path, query),
            Some(reference.to_owned()),
        ),
        None => (format!("{}{}{}", prefix, path, query), None),
    };

    Ok(ParsedVcsUrl {
        vcs,
        url: format!("{}+{}", vcs, rest),
        repo,
        reference,
        egg,
        subdirectory,
    })
}

const QUOTE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

pub(crate) fn quote(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, QUOTE).to_string()
}

/// Composes `repo[@ref]#egg=<name>[&subdirectory=<sub>]` out of a manifest
/// record. Returns the fields it didn't use.
pub fn build_vcs_url(name: &str, repo: &str, mut fields: RecordTable) -> (String, RecordTable) {
    let reference = fields
        .reference
        .take()
        .map(|r| format!("@{}", r))
        .unwrap_or_default();
    let mut url = format!("{}{}#egg={}", repo, reference, quote(name));
    if let Some(subdirectory) = fields.subdirectory.take() {
        url.push_str("&subdirectory=");
        url.push_str(&quote(&subdirectory));
    }
    (url, fields)
}
