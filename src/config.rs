use std::path::{Path, PathBuf};

/// Literal token stored in manifest and lock file paths/URLs, standing in for
/// the root of whatever project is currently being worked on.
pub const PROJECT_ROOT: &str = "${PROJECT_ROOT}";

/// Settings that parsing needs from its surroundings.
///
/// Everything that touches the filesystem (checking local paths, reading
/// project manifests) resolves relative paths against `project_root`, not the
/// process's working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    project_root: PathBuf,
}

impl Config {
    /// A relative `project_root` is taken relative to the working directory
    /// at the time of the call; the stored root is always absolute, since it
    /// ends up inside `file:///${PROJECT_ROOT}/...` URLs.
    pub fn new(project_root: impl Into<PathBuf>) -> Config {
        let project_root = project_root.into();
        let project_root = match std::env::current_dir() {
            Ok(cwd) if project_root.is_relative() => cwd.join(project_root),
            _ => project_root,
        };
        Config {
            // drops the `.` components joining can leave behind
            project_root: project_root.components().collect(),
        }
    }

    pub fn from_current_dir() -> std::io::Result<Config> {
        Ok(Config::new(std::env::current_dir()?))
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Resolve a (possibly relative) requirement path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.project_root.join(path)
        }
    }

    /// The project root as it gets spliced into a `file:///` URL in place of
    /// the placeholder: forward slashes, no leading slash, percent-encoded.
    pub(crate) fn root_url_fragment(&self) -> String {
        let root = self.project_root.to_string_lossy().replace('\\', "/");
        percent_encoding::utf8_percent_encode(root.trim_start_matches('/'), PATH_ENCODE)
            .to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(".")
    }
}

/// Characters escaped when a filesystem path is embedded in a file URL.
pub(crate) const PATH_ENCODE: &percent_encoding::AsciiSet = &percent_encoding::CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');
