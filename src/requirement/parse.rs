use super::{FileSource, Requirement, RequirementBase, VcsKind, VcsSource};
use crate::prelude::*;

static VCS_REQ: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<url>(?:git|hg|svn|bzr)\+[^ \t\r\n;]+)(?:[ \t]*;(?P<marker>.+))?$").unwrap()
});

// A URL, or a bare path (where "\ " escapes a space), or a quoted path; then
// optional extras and marker.
static FILE_REQ: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"(?P<url>[^ \t\r\n\[\];]+://[^ \t\r\n\[\];]+)",
        r#"|(?P<path>(?:\\ |[^ \t\r\n;\[\]'"])+)"#,
        r"|'(?P<squoted>(?:\\.|[^'\\])*)'",
        r#"|"(?P<dquoted>(?:\\.|[^"\\])*)""#,
        r")",
        r"(?P<extras>\[[^\[\]]+\])?",
        r"(?:[ \t]*;(?P<marker>.+))?$",
    ))
    .unwrap()
});

enum Attempt {
    Matched(Requirement),
    /// This grammar doesn't apply. Carries a diagnostic worth showing if no
    /// other grammar applies either.
    NoMatch(Option<String>),
}

type Grammar = fn(&str, &Config) -> Result<Attempt, RequirementError>;

// Order matters: a VCS URL is also a valid-looking file URL, and a bare word
// could be either a name or a path.
const GRAMMARS: &[(&str, Grammar)] = &[
    ("vcs", vcs_grammar as Grammar),
    ("pep508", pep508_grammar as Grammar),
    ("file", file_grammar as Grammar),
];

fn parse_marker(marker: Option<&str>) -> Result<Option<Marker>, RequirementError> {
    marker
        .map(|m| Marker::try_from(m.trim()).map_err(RequirementError::marker))
        .transpose()
}

fn vcs_grammar(line: &str, _config: &Config) -> Result<Attempt, RequirementError> {
    let captures = match VCS_REQ.captures(line) {
        Some(captures) => captures,
        None => return Ok(Attempt::NoMatch(None)),
    };
    let base = RequirementBase {
        marker: parse_marker(captures.name("marker").map(|m| m.as_str()))?,
        ..Default::default()
    };
    let source = VcsSource {
        url: captures["url"].to_owned(),
        ..Default::default()
    };
    Ok(Attempt::Matched(Requirement::vcs(base, source)?))
}

fn pep508_grammar(line: &str, config: &Config) -> Result<Attempt, RequirementError> {
    let req = match Pep508Requirement::parse(line) {
        Ok(req) => req,
        Err(err) => return Ok(Attempt::NoMatch(Some(format!("{:#}", err)))),
    };
    let mut base = RequirementBase {
        name: Some(req.name),
        marker: req.marker,
        extras: req.extras,
        specifiers: Specifiers::any(),
    };
    let req = match req.version_or_url {
        VersionOrUrl::Version(specifiers) => {
            base.specifiers = specifiers;
            Requirement::named(base)
        }
        VersionOrUrl::Url(url) => {
            let is_vcs = VcsKind::ALL
                .iter()
                .any(|vcs| url.starts_with(&format!("{}+", vcs)));
            if is_vcs {
                Requirement::vcs(base, VcsSource { url, ..Default::default() })?
            } else if url.contains("://") || url.starts_with("file:") {
                let source = FileSource {
                    url: Some(url),
                    ..Default::default()
                };
                Requirement::file(base, source, config)?
            } else {
                let source = FileSource {
                    path: Some(url.into()),
                    ..Default::default()
                };
                Requirement::file(base, source, config)?
            }
        }
    };
    Ok(Attempt::Matched(req))
}

fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ (' ' | '\'' | '"' | '\\')) => result.push(escaped),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            },
            c => result.push(c),
        }
    }
    result
}

fn file_grammar(line: &str, config: &Config) -> Result<Attempt, RequirementError> {
    let captures = match FILE_REQ.captures(line) {
        Some(captures) => captures,
        None => return Ok(Attempt::NoMatch(None)),
    };
    let mut source = FileSource::default();
    if let Some(url) = captures.name("url") {
        source.url = Some(url.as_str().to_owned());
    } else if let Some(path) = captures.name("path") {
        let path = unescape(path.as_str());
        // A bare word that isn't on disk is much more likely to be a mangled
        // name than a missing file; leave the name grammar's diagnostic alone.
        let looks_like_path = path.contains('/') || path.contains('\\') || path.starts_with('.');
        if !looks_like_path && !config.resolve(Path::new(&path)).exists() {
            return Ok(Attempt::NoMatch(None));
        }
        source.path = Some(path.into());
    } else if let Some(quoted) = captures.name("squoted").or_else(|| captures.name("dquoted")) {
        source.path = Some(unescape(quoted.as_str()).into());
    }

    let extras = match captures.name("extras") {
        Some(extras) => {
            let extras = extras.as_str();
            parse_extras(&extras[1..extras.len() - 1]).map_err(RequirementError::parse)?
        }
        None => BTreeSet::new(),
    };
    let base = RequirementBase {
        marker: parse_marker(captures.name("marker").map(|m| m.as_str()))?,
        extras,
        ..Default::default()
    };
    Ok(Attempt::Matched(Requirement::file(base, source, config)?))
}

/// Parses one requirement line: a VCS URL, a PEP 508 requirement, or a URL
/// or local path, tried in that order. `editable` asks for editable mode,
/// which is an error for anything that can't be installed in place.
pub fn parse_requirement(
    line: &str,
    editable: bool,
    config: &Config,
) -> Result<Requirement, RequirementError> {
    let line = line.trim();
    let mut diagnostic = None;
    for (label, grammar) in GRAMMARS {
        match grammar(line, config)? {
            Attempt::Matched(req) => {
                trace!("parsed {:?} with the {} grammar", line, label);
                return if editable { req.into_editable() } else { Ok(req) };
            }
            Attempt::NoMatch(diag) => {
                trace!("{} grammar doesn't match {:?}", label, line);
                diagnostic = diagnostic.or(diag);
            }
        }
    }
    Err(RequirementError::Parse(diagnostic.unwrap_or_else(|| {
        format!("Failed parsing requirement string {:?}", line)
    })))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::scratch_project;
    use indoc::indoc;

    #[test]
    fn test_dispatch() {
        let config = Config::new("/");
        let r = parse_requirement("requests[socks]>=2.0,<3.0", false, &config).unwrap();
        assert!(r.is_named());
        assert_eq!(r.key().unwrap(), "requests");

        let r = parse_requirement(
            "git+https://h/o/r.git@v1.2#egg=pkg; python_version < '3.8'",
            false,
            &config,
        )
        .unwrap();
        let vcs = r.vcs_link().unwrap();
        assert_eq!(vcs.vcs(), VcsKind::Git);
        assert_eq!(vcs.repo(), "https://h/o/r.git");
        assert_eq!(vcs.reference(), Some("v1.2"));
        assert_eq!(r.name().unwrap().as_given(), "pkg");
        assert_eq!(r.requires_python().to_string(), "<3.8");

        let r = parse_requirement("pkg @ git+https://h/o/r.git@main", false, &config).unwrap();
        assert!(r.is_vcs());
        assert_eq!(r.url(), Some("git+https://h/o/r.git@main"));

        let r = parse_requirement("https://example.com/pkg-1.0.tar.gz[extra]", false, &config)
            .unwrap();
        assert!(r.is_file_or_url());
        assert_eq!(r.name(), None);
        assert_eq!(format_extras(r.extras()), "[extra]");
    }

    #[test]
    fn test_wheel_url() {
        let config = Config::new("/");
        let r = parse_requirement(
            "https://example.com/dist/mypkg-1.2.3-py3-none-any.whl",
            false,
            &config,
        )
        .unwrap();
        assert_eq!(r.name().unwrap().as_given(), "mypkg");
        assert_eq!(r.version(), Some("1.2.3"));

        // egg fragment wins over the wheel filename
        let r = parse_requirement(
            "https://example.com/dist/mypkg-1.2.3-py3-none-any.whl#egg=other",
            false,
            &config,
        )
        .unwrap();
        assert_eq!(r.name().unwrap().as_given(), "other");
        assert_eq!(r.version(), None);
    }

    #[test]
    fn test_errors() {
        let config = Config::new("/");
        let err = parse_requirement("requests", true, &config).err().unwrap();
        assert_eq!(err, RequirementError::Editable);
        assert!(err.to_string().contains("VCS link or local directory"));

        let err = parse_requirement("https://example.com/pkg.tar.gz", true, &config)
            .err()
            .unwrap();
        assert_eq!(err, RequirementError::Editable);

        // the name grammar's complaint is what gets reported
        let err = parse_requirement("foo >= ", false, &config).err().unwrap();
        assert!(matches!(err, RequirementError::Parse(_)), "{:?}", err);
        assert!(err.to_string().contains("foo >="), "{}", err);

        let err = parse_requirement("./pkg; bogus == 'x'", false, &config)
            .err()
            .unwrap();
        assert!(matches!(err, RequirementError::InvalidMarker(_)), "{:?}", err);

        let err = parse_requirement("./does/not/exist", false, &config)
            .err()
            .unwrap();
        assert_eq!(err, RequirementError::PathNotFound("./does/not/exist".into()));
    }

    #[test]
    fn test_local_paths() {
        let (root, config) = scratch_project("my pkg", "demo");
        for line in [r"./my\ pkg", "'./my pkg'", r#""./my pkg""#] {
            let r = parse_requirement(line, true, &config).unwrap();
            assert!(r.is_local_dir(), "{}", line);
            assert!(r.is_editable());
            assert_eq!(r.name().unwrap().as_given(), "demo");
            assert_eq!(r.str_path().unwrap(), "./my pkg");
            assert_eq!(r.url(), Some("file:///${PROJECT_ROOT}/my%20pkg"));
        }

        std::fs::write(root.path().join("dist.tar.gz"), b"").unwrap();
        // a bare word is a name, even if a file happens to have that name
        assert!(parse_requirement("dist.tar.gz", false, &config).unwrap().is_named());
        let r = parse_requirement("./dist.tar.gz", false, &config).unwrap();
        assert!(r.is_local());
        assert!(!r.is_local_dir());
        assert_eq!(r.str_path().unwrap(), "./dist.tar.gz");
        assert_eq!(
            parse_requirement("./dist.tar.gz", true, &config).err().unwrap(),
            RequirementError::Editable
        );
    }

    #[test]
    fn test_roundtrip() {
        let (_root, config) = scratch_project("demo", "demo");
        let lines = indoc! {r#"
            requests[socks]<3.0,>=2.0
            foo==1.0; os_name == "nt" and (python_version < "3" or extra == "x")
            pkg[a,b] @ https://example.com/pkg-1.0.tar.gz; sys_platform == "linux"
            https://example.com/pkg-1.0.tar.gz[a]
            https://example.com/mypkg-1.2.3-py3-none-any.whl
            git+https://h/o/r.git@v1.2; python_version >= "3.7"
            pkg @ git+https://h/o/r.git@main
            pkg @ git+ssh://git@host/org/repo.git#subdirectory=py%20src
            -e git+https://h/o/r.git@main#egg=pkg[x]&subdirectory=sub
            -e file:///${PROJECT_ROOT}/demo#egg=demo
            demo @ file:///${PROJECT_ROOT}/demo
        "#};
        for line in lines.lines() {
            let req = Requirement::from_line(line, &config).unwrap();
            let rendered = req.as_line();
            let again = Requirement::from_line(&rendered, &config).unwrap();
            assert_eq!(req, again, "{} -> {}", line, rendered);
            assert_eq!(rendered, again.as_line());
        }
    }

    #[test]
    fn test_roundtrip_relative_project_root() {
        let root = tempfile::tempdir_in(".").unwrap();
        let relative = root.path();
        assert!(relative.is_relative());
        std::fs::create_dir(root.path().join("demo")).unwrap();
        std::fs::write(root.path().join("demo/setup.py"), "setup(name='demo')").unwrap();

        let config = Config::new(relative);
        let req = parse_requirement("./demo", false, &config).unwrap();
        let rendered = req.as_line();
        assert_eq!(rendered, "demo @ file:///${PROJECT_ROOT}/demo");
        let again = Requirement::from_line(&rendered, &config).unwrap();
        assert_eq!(req, again);
        assert!(again.is_local_dir());
    }
}
