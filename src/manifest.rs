use crate::prelude::*;
use configparser::ini::Ini;

/// A local directory is only something we can install if it has one of these.
pub const MANIFEST_FILES: &[&str] = &["pyproject.toml", "setup.py"];

pub fn is_installable(dir: &Path) -> bool {
    MANIFEST_FILES.iter().any(|f| dir.join(f).exists())
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", default)]
struct PyprojectProjectStanza {
    name: Option<String>,
}

impl PyprojectProjectStanza {
    fn parse_from(s: &str) -> Result<PyprojectProjectStanza> {
        let mut d = s.parse::<toml_edit::Document>()?;
        if let Some(table) = d.remove("project") {
            Ok(toml_edit::de::from_item(table)?)
        } else {
            Ok(Default::default())
        }
    }
}

fn name_from_pyproject(text: &str) -> Result<Option<String>> {
    Ok(PyprojectProjectStanza::parse_from(text)?.name)
}

fn name_from_setup_cfg(text: &str) -> Option<String> {
    let mut ini = Ini::new_cs();
    ini.set_multiline(true);
    let sections = match ini.read(text.to_owned()) {
        Ok(sections) => sections,
        Err(err) => {
            debug!("ignoring unreadable setup.cfg: {}", err);
            return None;
        }
    };
    sections.get("metadata")?.get("name")?.clone()
}

fn name_from_setup_py(text: &str) -> Option<String> {
    static NAME: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?:^|[^A-Za-z0-9_])name[ \t]*=[ \t]*['"]([A-Za-z0-9._-]+)['"]"#).unwrap()
    });
    NAME.captures(text).map(|c| c[1].to_owned())
}

/// Works out what a local project calls itself, without running any of its
/// code: `[project] name` in pyproject.toml, then `[metadata] name` in
/// setup.cfg, then a literal `name="..."` in setup.py.
pub fn project_name_from_directory(dir: &Path) -> Result<Option<PackageName>, RequirementError> {
    let manifest_error = |path: PathBuf, reason: String| RequirementError::Manifest { path, reason };
    let read = |filename: &str| -> Result<Option<(PathBuf, String)>, RequirementError> {
        let path = dir.join(filename);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some((path, text))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(manifest_error(path, err.to_string())),
        }
    };

    let mut found = None;
    if let Some((path, text)) = read("pyproject.toml")? {
        let name = name_from_pyproject(&text)
            .map_err(|e| manifest_error(path.clone(), format!("{:#}", e)))?;
        found = name.map(|name| (path, name));
    }
    if found.is_none() {
        if let Some((path, text)) = read("setup.cfg")? {
            found = name_from_setup_cfg(&text).map(|name| (path, name));
        }
    }
    if found.is_none() {
        if let Some((path, text)) = read("setup.py")? {
            found = name_from_setup_py(&text).map(|name| (path, name));
        }
    }

    match found {
        Some((path, name)) => {
            debug!("{} says the project is called {:?}", path.display(), name);
            let name = PackageName::try_from(name.as_str())
                .map_err(|e| manifest_error(path, format!("{:#}", e)))?;
            Ok(Some(name))
        }
        None => {
            debug!("couldn't find a project name in {}", dir.display());
            Ok(None)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_name_sources() {
        assert_eq!(
            name_from_pyproject(indoc! {r#"
                [build-system]
                requires = ["setuptools"]

                [project]
                name = "from-pyproject"
                dependencies = ["requests"]
            "#})
            .unwrap()
            .as_deref(),
            Some("from-pyproject")
        );
        assert_eq!(name_from_pyproject("[tool.black]\n").unwrap(), None);
        assert!(name_from_pyproject("[project\n").is_err());

        assert_eq!(
            name_from_setup_cfg(indoc! {"
                [options]
                name = wrong

                [metadata]
                version = 1.0
                name = from_cfg
            "})
            .as_deref(),
            Some("from_cfg")
        );
        assert_eq!(
            name_from_setup_cfg("[metadata]\nname: colon_pkg\n").as_deref(),
            Some("colon_pkg")
        );
        assert_eq!(
            name_from_setup_cfg("[metadata]\nname = spaced ; trailing comment\n").as_deref(),
            Some("spaced")
        );
        assert_eq!(name_from_setup_cfg("[metadata]\nversion = 1.0\n"), None);

        assert_eq!(
            name_from_setup_py(indoc! {r#"
                from setuptools import setup
                setup(
                    name='from.setup_py',
                    version="1.0",
                )
            "#})
            .as_deref(),
            Some("from.setup_py")
        );
        assert_eq!(name_from_setup_py("setup(name=NAME)"), None);
    }

    #[test]
    fn test_project_name_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_installable(dir.path()));
        assert_eq!(project_name_from_directory(dir.path()).unwrap(), None);

        std::fs::write(dir.path().join("setup.py"), "setup(name='legacy')").unwrap();
        assert!(is_installable(dir.path()));
        let name = project_name_from_directory(dir.path()).unwrap().unwrap();
        assert_eq!(name.as_given(), "legacy");

        // setup.cfg wins over setup.py
        std::fs::write(dir.path().join("setup.cfg"), "[metadata]\nname: from-cfg # old\n")
            .unwrap();
        let name = project_name_from_directory(dir.path()).unwrap().unwrap();
        assert_eq!(name.as_given(), "from-cfg");

        // pyproject.toml without a name doesn't shadow setup.cfg
        std::fs::write(dir.path().join("pyproject.toml"), "[build-system]\n").unwrap();
        let name = project_name_from_directory(dir.path()).unwrap().unwrap();
        assert_eq!(name.as_given(), "from-cfg");

        std::fs::write(dir.path().join("pyproject.toml"), "[project]\nname = 'modern'\n").unwrap();
        let name = project_name_from_directory(dir.path()).unwrap().unwrap();
        assert_eq!(name.as_given(), "modern");

        std::fs::write(dir.path().join("pyproject.toml"), "[project]\nname = 'not valid!'\n")
            .unwrap();
        let err = project_name_from_directory(dir.path()).err().unwrap();
        assert!(matches!(err, RequirementError::Manifest { .. }), "{:?}", err);
    }
}
