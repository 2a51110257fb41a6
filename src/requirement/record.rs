use super::vcs::build_vcs_url;
use super::{FileSource, Requirement, RequirementBase, RequirementKind, VcsKind, VcsSource};
use crate::prelude::*;
use serde::de::value::MapAccessDeserializer;
use serde_with::skip_serializing_none;

/// One entry of a manifest or lock file dependency table, keyed by package
/// name:
///
/// ```toml
/// requests = ">=2.0"
/// mylib = { git = "https://example.com/mylib.git", ref = "v1", extras = ["fast"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequirementRecord {
    /// Just a version constraint, for a package found on an index.
    Version(String),
    Table(RecordTable),
}

// Hand-written rather than `untagged`, so that a typo'd key in a table gets
// reported as such instead of as "data did not match any variant".
impl<'de> Deserialize<'de> for RequirementRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        struct RecordVisitor;

        impl<'de> serde::de::Visitor<'de> for RecordVisitor {
            type Value = RequirementRecord;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a version constraint string or a requirement table")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(RequirementRecord::Version(value.to_owned()))
            }

            fn visit_map<M>(self, access: M) -> Result<Self::Value, M::Error>
            where
                M: serde::de::MapAccess<'de>,
            {
                RecordTable::deserialize(MapAccessDeserializer::new(access))
                    .map(RequirementRecord::Table)
            }
        }

        deserializer.deserialize_any(RecordVisitor)
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordTable {
    pub git: Option<String>,
    pub hg: Option<String>,
    pub svn: Option<String>,
    pub bzr: Option<String>,
    pub path: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub revision: Option<String>,
    pub subdirectory: Option<String>,
    pub extras: Option<RecordExtras>,
    pub marker: Option<String>,
    pub editable: Option<bool>,
    pub version: Option<String>,
}

/// Extras, as a list or as `"[a,b]"` text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordExtras {
    List(Vec<String>),
    Text(String),
}

impl RecordTable {
    fn vcs_field(&mut self, vcs: VcsKind) -> &mut Option<String> {
        match vcs {
            VcsKind::Git => &mut self.git,
            VcsKind::Hg => &mut self.hg,
            VcsKind::Svn => &mut self.svn,
            VcsKind::Bzr => &mut self.bzr,
        }
    }

    fn take_vcs(&mut self) -> Result<Option<(VcsKind, String)>, String> {
        let mut found = Vec::new();
        for vcs in VcsKind::ALL {
            if let Some(repo) = self.vcs_field(vcs).take() {
                found.push((vcs, repo));
            }
        }
        if found.len() > 1 {
            return Err(format!(
                "more than one version control system given: {}",
                found
                    .iter()
                    .map(|(vcs, _)| vcs.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        Ok(found.pop())
    }
}

impl Requirement {
    /// Builds a requirement from a dependency table entry.
    ///
    /// A bare string is a version constraint on `name`. A table with a `git`
    /// (or `hg`, `svn`, `bzr`) key is a VCS requirement, one with `path` or
    /// `url` is a file requirement, and anything else is a named requirement.
    pub fn from_req_dict(
        name: &str,
        record: RequirementRecord,
        config: &Config,
    ) -> Result<Requirement, RequirementError> {
        let invalid = |reason: String| RequirementError::InvalidRecord {
            name: name.to_owned(),
            reason,
        };
        let package_name = PackageName::try_from(name).map_err(|e| invalid(format!("{:#}", e)))?;

        let mut table = match record {
            RequirementRecord::Version(version) => {
                let specifiers =
                    Specifiers::try_from(version.as_str()).map_err(RequirementError::parse)?;
                return Ok(Requirement::named(RequirementBase {
                    name: Some(package_name),
                    specifiers,
                    ..Default::default()
                }));
            }
            RequirementRecord::Table(table) => table,
        };

        let extras = match table.extras.take() {
            None => BTreeSet::new(),
            Some(RecordExtras::Text(text)) => {
                parse_extras(&text).map_err(|e| invalid(format!("{:#}", e)))?
            }
            Some(RecordExtras::List(list)) => list
                .iter()
                .map(|e| Extra::try_from(e.as_str()))
                .collect::<Result<_>>()
                .map_err(|e| invalid(format!("{:#}", e)))?,
        };
        let marker = table
            .marker
            .take()
            .map(|m| Marker::try_from(m.as_str()).map_err(RequirementError::marker))
            .transpose()?;
        let specifiers = match table.version.take() {
            Some(version) => {
                Specifiers::try_from(version.as_str()).map_err(RequirementError::parse)?
            }
            None => Specifiers::any(),
        };
        let editable = table.editable.take().unwrap_or(false);
        let base = RequirementBase {
            name: Some(package_name),
            marker,
            extras,
            specifiers,
        };

        if let Some((vcs, repo)) = table.take_vcs().map_err(invalid)? {
            let (url, rest) = build_vcs_url(name, &repo, table);
            if rest.path.is_some() || rest.url.is_some() {
                return Err(invalid(format!(
                    "a {} requirement can't also have a path or url",
                    vcs
                )));
            }
            let source = VcsSource {
                url: format!("{}+{}", vcs, url),
                revision: rest.revision,
                editable,
            };
            return Requirement::vcs(base, source);
        }

        if table.reference.is_some() || table.revision.is_some() {
            return Err(invalid(
                "ref and revision only apply to version control requirements".into(),
            ));
        }
        if table.path.is_some() || table.url.is_some() {
            let source = FileSource {
                url: table.url,
                path: table.path.map(PathBuf::from),
                subdirectory: table.subdirectory,
                editable,
            };
            return Requirement::file(base, source, config);
        }

        if table.subdirectory.is_some() {
            return Err(invalid("subdirectory needs a path, url or repository".into()));
        }
        let req = Requirement::named(base);
        if editable {
            req.into_editable()
        } else {
            Ok(req)
        }
    }

    /// The inverse of [`from_req_dict`](Requirement::from_req_dict), for
    /// writing a dependency table. Requirements without a name can't be keyed,
    /// so they give `None`.
    pub fn as_req_dict(&self) -> Option<(String, RequirementRecord)> {
        let name = self.project_name()?;
        let mut table = RecordTable {
            marker: self.marker.as_ref().map(|m| m.to_string()),
            editable: self.editable.then_some(true),
            ..Default::default()
        };
        if !self.extras.is_empty() {
            table.extras = Some(RecordExtras::List(
                self.extras.iter().map(|e| e.as_given().to_owned()).collect(),
            ));
        }
        if !self.specifiers.is_empty() {
            table.version = Some(self.specifiers.to_string());
        }

        match &self.kind {
            RequirementKind::Named => {
                let bare = table.marker.is_none() && table.extras.is_none();
                let version = table.version.get_or_insert_with(|| "*".into());
                if bare {
                    return Some((name, RequirementRecord::Version(version.clone())));
                }
            }
            RequirementKind::File(link) => {
                match link.path().filter(|p| p.is_relative()) {
                    Some(_) => table.path = link.str_path(),
                    None => table.url = Some(link.url().to_owned()),
                }
                table.subdirectory = link.subdirectory().map(str::to_owned);
            }
            RequirementKind::Vcs(vcs) => {
                *table.vcs_field(vcs.vcs()) = Some(vcs.repo().to_owned());
                table.reference = vcs.reference().map(str::to_owned);
                table.revision = vcs.revision().map(str::to_owned);
                table.subdirectory = vcs.link().subdirectory().map(str::to_owned);
            }
        }
        Some((name, RequirementRecord::Table(table)))
    }
}

/// Reads every entry of the dependency table at `table_path` (dotted, like
/// `tool.pdm.dev-dependencies.test`) in a TOML manifest. A missing table
/// means no dependencies.
pub fn requirements_from_toml(
    text: &str,
    table_path: &str,
    config: &Config,
) -> Result<Vec<Requirement>, RequirementError> {
    let doc = text
        .parse::<toml_edit::Document>()
        .map_err(|e| RequirementError::Parse(format!("invalid TOML: {}", e)))?;
    let mut item = doc.as_item();
    for key in table_path.split('.') {
        item = match item.get(key) {
            Some(item) => item,
            None => {
                debug!("no [{}] table, so no requirements", table_path);
                return Ok(Vec::new());
            }
        };
    }
    let table = item.as_table_like().ok_or_else(|| {
        RequirementError::Parse(format!("[{}] is not a table", table_path))
    })?;

    let mut requirements = Vec::new();
    for (name, entry) in table.iter() {
        let record: RequirementRecord =
            toml_edit::de::from_item(entry.clone()).map_err(|e| {
                RequirementError::InvalidRecord {
                    name: name.to_owned(),
                    reason: e.to_string(),
                }
            })?;
        requirements.push(Requirement::from_req_dict(name, record, config)?);
    }
    Ok(requirements)
}
