use crate::prelude::*;

pub fn from_commented_json<T>(input: &str) -> T
where
    T: serde::de::DeserializeOwned,
{
    static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"#.*").unwrap());

    let replaced = COMMENT.replace_all(input, "");
    serde_json::from_str(&replaced).unwrap()
}

/// Creates a scratch project root containing an installable package directory
/// `name/` (with a pyproject.toml declaring `project_name`).
pub fn scratch_project(name: &str, project_name: &str) -> (tempfile::TempDir, Config) {
    let root = tempfile::tempdir().unwrap();
    let pkg = root.path().join(name);
    std::fs::create_dir_all(&pkg).unwrap();
    std::fs::write(
        pkg.join("pyproject.toml"),
        format!("[project]\nname = \"{}\"\nversion = \"0.1.0\"\n", project_name),
    )
    .unwrap();
    let config = Config::new(root.path());
    (root, config)
}
