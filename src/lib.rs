//! Python package requirements: parsing every way they get written down
//! (PEP 508 strings, VCS URLs, local paths and archive URLs, manifest and lock
//! file tables), a normalized hashable model, and canonical rendering back to
//! text.

mod config;
mod error;
mod filter;
mod manifest;
mod prelude;
mod requirement;
mod util;
pub mod vocab;

#[cfg(test)]
mod test_util;

pub use crate::config::{Config, PROJECT_ROOT};
pub use crate::error::{ExtrasError, RequirementError};
pub use crate::filter::{
    filter_requirements_with_extras, FilteredRequirements, MetadataRecord, RequirementLine,
};
pub use crate::manifest::{is_installable, project_name_from_directory, MANIFEST_FILES};
pub use crate::requirement::{
    build_vcs_url, parse_egg_fragment, parse_requirement, parse_vcs_url, path_to_url,
    requirements_from_toml, url_to_path, EggInfo, FileLink, FileSource, IdentityCache,
    ParsedVcsUrl, RecordExtras, RecordTable, Requirement, RequirementBase, RequirementKind,
    RequirementRecord, VcsKind, VcsLink, VcsSource,
};
pub use crate::util::{split_url, url_without_fragments};
