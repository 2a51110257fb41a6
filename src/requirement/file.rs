use crate::config::PATH_ENCODE;
use crate::manifest;
use crate::prelude::*;
use crate::util::url_without_fragments;
use std::path::Component;

/// Where a file requirement comes from, as given by the user or a manifest.
/// At least one of `url` and `path` has to be set.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    pub url: Option<String>,
    pub path: Option<PathBuf>,
    /// Overrides any `#subdirectory=` fragment on the URL.
    pub subdirectory: Option<String>,
    pub editable: bool,
}

/// The location part of a file (or VCS) requirement.
///
/// `url` never has a fragment: `#egg=` goes into the requirement's name and
/// extras, `#subdirectory=` into `subdirectory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLink {
    url: String,
    path: Option<PathBuf>,
    subdirectory: Option<String>,
    local_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EggInfo {
    pub name: PackageName,
    pub extras: BTreeSet<Extra>,
}

/// Everything we learned about a file requirement while resolving its
/// location. Name sources are listed in priority order.
pub(crate) struct ResolvedFile {
    pub link: FileLink,
    pub egg: Option<EggInfo>,
    pub wheel: Option<WheelName>,
    pub project_name: Option<PackageName>,
}

impl FileLink {
    pub(crate) fn new(url: String, subdirectory: Option<String>) -> FileLink {
        FileLink {
            url,
            path: None,
            subdirectory,
            local_dir: false,
        }
    }

    pub(crate) fn resolve(
        source: FileSource,
        config: &Config,
    ) -> Result<ResolvedFile, RequirementError> {
        let path = source
            .path
            .map(|p| PathBuf::from(p.to_string_lossy().replace(PROJECT_ROOT, ".")));
        let (url, path) = match (source.url.filter(|u| !u.is_empty()), path) {
            (Some(url), path) => {
                let path = path.or_else(|| url_to_path(&url, config));
                (url, path)
            }
            (None, Some(path)) => (path_to_url(&path), Some(path)),
            (None, None) => {
                return Err(RequirementError::Parse(
                    "file requirement needs a path or a URL".into(),
                ))
            }
        };

        let (egg, fragment_subdirectory) = parse_egg_fragment(&url)?;
        let url = url_without_fragments(&url).to_owned();
        let wheel = wheel_name_from_url(&url);

        let mut link = FileLink {
            url,
            path,
            subdirectory: source.subdirectory.or(fragment_subdirectory),
            local_dir: false,
        };

        let mut project_name = None;
        if let Some(path) = &link.path {
            let full = config.resolve(path);
            if !full.exists() {
                return Err(RequirementError::PathNotFound(path.clone()));
            }
            if full.is_dir() {
                link.local_dir = true;
                let project_dir = match &link.subdirectory {
                    Some(sub) => full.join(sub),
                    None => full,
                };
                if !manifest::is_installable(&project_dir) {
                    return Err(RequirementError::NotInstallable(path.clone()));
                }
                project_name = manifest::project_name_from_directory(&project_dir)?;
            }
        }

        Ok(ResolvedFile {
            link,
            egg,
            wheel,
            project_name,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn subdirectory(&self) -> Option<&str> {
        self.subdirectory.as_deref()
    }

    /// A local path that existed when the requirement was built.
    pub fn is_local(&self) -> bool {
        self.path.is_some()
    }

    pub fn is_local_dir(&self) -> bool {
        self.local_dir
    }

    /// The path in posix form, with an explicit `./` on relative paths so it
    /// can't be mistaken for a package name.
    pub fn str_path(&self) -> Option<String> {
        let path = self.path.as_ref()?;
        let result = path.to_string_lossy().replace('\\', "/");
        if path.is_absolute() || result.starts_with("./") || result.starts_with("../") {
            Some(result)
        } else {
            Some(format!("./{}", result))
        }
    }
}

/// Turns a path into a `file://` URL. Relative paths are taken to be relative
/// to the project root and come out as `file:///${PROJECT_ROOT}/...`.
pub fn path_to_url(path: &Path) -> String {
    if path.is_absolute() {
        if let Ok(url) = Url::from_file_path(path) {
            return url.to_string();
        }
    }
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(
                percent_encoding::utf8_percent_encode(&part.to_string_lossy(), PATH_ENCODE)
                    .to_string(),
            ),
            Component::ParentDir => parts.push("..".to_owned()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    if parts.is_empty() {
        format!("file:///{}", PROJECT_ROOT)
    } else {
        format!("file:///{}/{}", PROJECT_ROOT, parts.join("/"))
    }
}

/// The local path a `file://` URL points at, with `${PROJECT_ROOT}` standing
/// for the configured project root. Anything else (remote URLs, URLs that
/// don't decode to a path) gives `None`.
pub fn url_to_path(url: &str, config: &Config) -> Option<PathBuf> {
    if !url.starts_with("file:") {
        return None;
    }
    let url = url.replace(PROJECT_ROOT, &config.root_url_fragment());
    Url::parse(url_without_fragments(&url))
        .ok()?
        .to_file_path()
        .ok()
}

/// Pulls `#egg=name[extras]` and `#subdirectory=...` out of a URL fragment.
pub fn parse_egg_fragment(
    url: &str,
) -> Result<(Option<EggInfo>, Option<String>), RequirementError> {
    let fragment = match url.split_once('#') {
        Some((_, fragment)) => fragment,
        None => return Ok((None, None)),
    };
    let mut egg = None;
    let mut subdirectory = None;
    for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "egg" if !value.is_empty() => egg = Some(strip_extras(&value)?),
            "subdirectory" if !value.is_empty() => subdirectory = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok((egg, subdirectory))
}

fn strip_extras(egg: &str) -> Result<EggInfo, RequirementError> {
    let (name, extras) = match egg.split_once('[') {
        Some((name, rest)) => {
            let extras = rest.strip_suffix(']').ok_or_else(|| {
                RequirementError::Parse(format!("unbalanced extras in egg fragment {:?}", egg))
            })?;
            (name, parse_extras(extras).map_err(RequirementError::parse)?)
        }
        None => (egg, BTreeSet::new()),
    };
    let name = PackageName::try_from(name.trim()).map_err(RequirementError::parse)?;
    Ok(EggInfo { name, extras })
}

fn wheel_name_from_url(url: &str) -> Option<WheelName> {
    let filename = url.rsplit('/').next()?;
    if !WheelName::looks_like_wheel(filename) {
        return None;
    }
    let filename = percent_encoding::percent_decode_str(filename).decode_utf8_lossy();
    match WheelName::try_from(filename.as_ref()) {
        Ok(wheel) => {
            debug!("recovered {} {} from wheel filename", wheel.distribution, wheel.version);
            Some(wheel)
        }
        Err(err) => {
            warn!("ignoring unparseable wheel filename {:?}: {:#}", filename, err);
            None
        }
    }
}
