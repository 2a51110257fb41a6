use crate::prelude::*;
use std::hash::{Hash, Hasher};

mod file;
mod identity;
mod parse;
mod record;
mod vcs;

pub use self::file::{
    parse_egg_fragment, path_to_url, url_to_path, EggInfo, FileLink, FileSource,
};
pub use self::identity::IdentityCache;
pub use self::parse::parse_requirement;
pub use self::record::{requirements_from_toml, RecordExtras, RecordTable, RequirementRecord};
pub use self::vcs::{build_vcs_url, parse_vcs_url, ParsedVcsUrl, VcsKind, VcsLink, VcsSource};

/// The parts every requirement has, whatever kind of source it points at.
#[derive(Debug, Clone, Default)]
pub struct RequirementBase {
    pub name: Option<PackageName>,
    pub marker: Option<Marker>,
    pub extras: BTreeSet<Extra>,
    pub specifiers: Specifiers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementKind {
    /// `name[extras]<specifiers>`, found on an index.
    Named,
    /// A local path, or a URL pointing at an archive.
    File(FileLink),
    /// A version control checkout.
    Vcs(VcsLink),
}

/// One dependency: what it's called, where it comes from, which versions are
/// acceptable, and when it applies.
///
/// Built once by [`parse_requirement`](crate::parse_requirement) or
/// [`Requirement::from_req_dict`], and immutable after that, except for
/// [`set_version`](Requirement::set_version).
#[derive(Debug, Clone)]
pub struct Requirement {
    name: Option<PackageName>,
    marker: Option<Marker>,
    extras: BTreeSet<Extra>,
    specifiers: Specifiers,
    requires_python: Specifiers,
    editable: bool,
    kind: RequirementKind,
}

fn requires_python_of(marker: Option<&Marker>) -> Specifiers {
    marker
        .map(|m| m.split_pyspec().1)
        .unwrap_or_default()
}

impl Requirement {
    fn from_base(base: RequirementBase, kind: RequirementKind) -> Requirement {
        let requires_python = requires_python_of(base.marker.as_ref());
        Requirement {
            name: base.name,
            marker: base.marker,
            extras: base.extras,
            specifiers: base.specifiers,
            requires_python,
            editable: false,
            kind,
        }
    }

    pub fn named(base: RequirementBase) -> Requirement {
        Requirement::from_base(base, RequirementKind::Named)
    }

    /// A requirement on a local path or a URL. Touches the filesystem: a local
    /// path has to exist, and a local directory has to be an installable
    /// project (whose manifest supplies the name).
    pub fn file(
        mut base: RequirementBase,
        source: FileSource,
        config: &Config,
    ) -> Result<Requirement, RequirementError> {
        let editable = source.editable;
        let resolved = FileLink::resolve(source, config)?;
        if let Some(egg) = resolved.egg {
            base.name = Some(egg.name);
            if !egg.extras.is_empty() {
                base.extras = egg.extras;
            }
        }
        let mut version_from_name = None;
        if base.name.is_none() {
            if let Some(wheel) = resolved.wheel {
                base.name = Some(wheel.distribution);
                version_from_name = Some(wheel.version);
            }
        }
        if let Some(project_name) = resolved.project_name {
            base.name = Some(project_name);
        }
        let mut req = Requirement::from_base(base, RequirementKind::File(resolved.link));
        if let Some(version) = version_from_name {
            req.set_version(&version.to_string())?;
        }
        if editable {
            req = req.into_editable()?;
        }
        Ok(req)
    }

    /// A requirement on a version control repository, `<vcs>+<url>[@ref]`.
    pub fn vcs(mut base: RequirementBase, source: VcsSource) -> Result<Requirement, RequirementError> {
        let editable = source.editable;
        let (link, egg) = VcsLink::resolve(source)?;
        if base.name.is_none() {
            if let Some(egg) = egg {
                base.name = Some(egg.name);
                if !egg.extras.is_empty() {
                    base.extras = egg.extras;
                }
            }
        }
        let req = Requirement::from_base(base, RequirementKind::Vcs(link));
        if editable {
            req.into_editable()
        } else {
            Ok(req)
        }
    }

    /// Switches on editable mode, which only makes sense for something we can
    /// point an installer at in place: a VCS checkout or a local directory.
    pub fn into_editable(mut self) -> Result<Requirement, RequirementError> {
        let supported = match &self.kind {
            RequirementKind::Vcs(_) => true,
            RequirementKind::File(link) => link.is_local_dir(),
            RequirementKind::Named => false,
        };
        if !supported {
            return Err(RequirementError::Editable);
        }
        self.editable = true;
        Ok(self)
    }

    /// Parses a line as it would appear in a requirements file, where a leading
    /// `-e ` asks for editable mode.
    pub fn from_line(line: &str, config: &Config) -> Result<Requirement, RequirementError> {
        let line = line.trim();
        match line
            .strip_prefix("-e ")
            .or_else(|| line.strip_prefix("--editable "))
        {
            Some(rest) => parse_requirement(rest, true, config),
            None => parse_requirement(line, false, config),
        }
    }

    pub fn name(&self) -> Option<&PackageName> {
        self.name.as_ref()
    }

    pub fn project_name(&self) -> Option<String> {
        self.name.as_ref().map(PackageName::project_name)
    }

    pub fn key(&self) -> Option<String> {
        self.name.as_ref().map(PackageName::key)
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    /// Replaces the marker, re-deriving the interpreter constraint from it.
    pub fn with_marker(mut self, marker: Option<Marker>) -> Requirement {
        self.requires_python = requires_python_of(marker.as_ref());
        self.marker = marker;
        self
    }

    pub fn extras(&self) -> &BTreeSet<Extra> {
        &self.extras
    }

    pub fn specifiers(&self) -> &Specifiers {
        &self.specifiers
    }

    pub fn set_specifiers(&mut self, specifiers: Specifiers) {
        self.specifiers = specifiers;
    }

    /// Interpreter versions this requirement applies to, as implied by its
    /// marker.
    pub fn requires_python(&self) -> &Specifiers {
        &self.requires_python
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn kind(&self) -> &RequirementKind {
        &self.kind
    }

    /// The exact version this requirement is pinned to, if any.
    pub fn version(&self) -> Option<&str> {
        self.specifiers.pinned_version()
    }

    /// Pins to exactly `version`. `""` and `"*"` remove the constraint instead.
    pub fn set_version(&mut self, version: &str) -> Result<(), RequirementError> {
        let version = version.trim();
        self.specifiers = if version.is_empty() || version == "*" {
            Specifiers::any()
        } else {
            Specifiers::pinned_to(version).map_err(RequirementError::parse)?
        };
        Ok(())
    }

    pub fn is_named(&self) -> bool {
        matches!(self.kind, RequirementKind::Named)
    }

    pub fn is_vcs(&self) -> bool {
        matches!(self.kind, RequirementKind::Vcs(_))
    }

    pub fn is_file_or_url(&self) -> bool {
        matches!(self.kind, RequirementKind::File(_))
    }

    fn link(&self) -> Option<&FileLink> {
        match &self.kind {
            RequirementKind::Named => None,
            RequirementKind::File(link) => Some(link),
            RequirementKind::Vcs(vcs) => Some(vcs.link()),
        }
    }

    pub fn vcs_link(&self) -> Option<&VcsLink> {
        match &self.kind {
            RequirementKind::Vcs(vcs) => Some(vcs),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.link().map(FileLink::url)
    }

    pub fn path(&self) -> Option<&Path> {
        self.link().and_then(FileLink::path)
    }

    pub fn str_path(&self) -> Option<String> {
        self.link().and_then(FileLink::str_path)
    }

    pub fn is_local(&self) -> bool {
        self.link().map_or(false, FileLink::is_local)
    }

    pub fn is_local_dir(&self) -> bool {
        self.link().map_or(false, FileLink::is_local_dir)
    }

    /// Does `line` name the same package as this requirement (and, if
    /// `editable_match`, agree on editable mode)?
    pub fn matches(
        &self,
        line: &str,
        editable_match: bool,
        config: &Config,
    ) -> Result<bool, RequirementError> {
        let other = Requirement::from_line(line, config)?;
        Ok(self.key() == other.key() && (!editable_match || self.editable == other.editable))
    }

    /// The resolver's map key: the package key plus sorted extras. `None` for
    /// requirements with no name; see [`IdentityCache`] for those.
    pub fn identity(&self) -> Option<String> {
        let key = self.key()?;
        Some(format!("{}{}", key, format_normalized_extras(&self.extras)))
    }

    fn format_marker(&self) -> String {
        match &self.marker {
            Some(marker) => format!("; {}", marker),
            None => String::new(),
        }
    }

    /// Canonical requirement-line form; parsing it gives back an equal
    /// requirement.
    pub fn as_line(&self) -> String {
        let project_name = self.project_name().unwrap_or_default();
        let extras = format_extras(&self.extras);
        let marker = self.format_marker();
        match self.link() {
            None => format!("{}{}{}{}", project_name, extras, self.specifiers, marker),
            Some(link) => {
                let subdirectory = link.subdirectory().map(vcs::quote);
                if self.editable {
                    let subdirectory = subdirectory
                        .map(|s| format!("&subdirectory={}", s))
                        .unwrap_or_default();
                    format!(
                        "-e {}#egg={}{}{}{}",
                        link.url(),
                        project_name,
                        extras,
                        subdirectory,
                        marker
                    )
                } else {
                    let subdirectory = subdirectory
                        .map(|s| format!("#subdirectory={}", s))
                        .unwrap_or_default();
                    if project_name.is_empty() {
                        format!("{}{}{}{}", link.url(), subdirectory, extras, marker)
                    } else {
                        format!(
                            "{}{} @ {}{}{}",
                            project_name,
                            extras,
                            link.url(),
                            subdirectory,
                            marker
                        )
                    }
                }
            }
        }
    }

    fn identity_key(&self) -> IdentityKey<'_> {
        IdentityKey {
            key: self.key(),
            extras: self.extras.iter().map(Extra::normalized).collect(),
            marker: self.marker.as_ref().map(|m| m.to_string()),
            link: self
                .link()
                .map(|link| (link.url(), link.subdirectory(), self.editable)),
        }
    }
}

/// What requirement equality is defined over. Specifiers are deliberately not
/// part of it: the same dependency pinned differently is still the same
/// dependency.
#[derive(PartialEq, Eq, Hash)]
struct IdentityKey<'a> {
    key: Option<String>,
    extras: Vec<&'a str>,
    marker: Option<String>,
    link: Option<(&'a str, Option<&'a str>, bool)>,
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.identity_key() == other.identity_key()
    }
}

impl Eq for Requirement {}

impl Hash for Requirement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_key().hash(state)
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_line())
    }
}
