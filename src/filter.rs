use crate::prelude::*;
use crate::requirement::Requirement;

/// One entry of a package's declared dependencies: a requirement line, or a
/// group of lines that only apply under an extra and/or an environment marker
/// (the shape installed-package metadata comes in).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequirementLine {
    Text(String),
    Record(MetadataRecord),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataRecord {
    pub requires: Vec<String>,
    pub extra: Option<String>,
    pub environment: Option<String>,
}

impl MetadataRecord {
    /// Reads the `requires.txt` file from an `.egg-info` directory:
    ///
    /// ```text
    /// requests>=2
    ///
    /// [socks]
    /// PySocks>=1.5.6
    ///
    /// [security:sys_platform == "win32"]
    /// pywin32
    /// ```
    ///
    /// Each `[extra:environment]` section (either half optional) becomes a
    /// record, as do the unconditional lines at the top.
    pub fn parse_requires_txt(text: &str) -> Vec<MetadataRecord> {
        let mut records = vec![MetadataRecord::default()];
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                Some(section) => {
                    let (extra, environment) = match section.split_once(':') {
                        Some((extra, environment)) => (extra, environment),
                        None => (section, ""),
                    };
                    let non_empty = |s: &str| Some(s.trim().to_owned()).filter(|s| !s.is_empty());
                    records.push(MetadataRecord {
                        requires: Vec::new(),
                        extra: non_empty(extra),
                        environment: non_empty(environment),
                    });
                }
                None => {
                    if let Some(record) = records.last_mut() {
                        record.requires.push(line.to_owned());
                    }
                }
            }
        }
        records.retain(|r| !r.requires.is_empty());
        records
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredRequirements {
    pub lines: Vec<String>,
    /// Requested extras that nothing in the input mentioned.
    pub unknown_extras: Option<ExtrasError>,
}

fn normalize_extra(extra: &str) -> String {
    match Extra::try_from(extra) {
        Ok(extra) => extra.normalized().to_owned(),
        Err(_) => extra.trim().to_ascii_lowercase(),
    }
}

/// Picks out the requirements that apply when a package is installed with
/// `extras`, taking the `extra == "..."` clauses out of their markers.
///
/// Requesting an extra that the package doesn't have isn't fatal, but it is
/// almost certainly a mistake, so it comes back in `unknown_extras` (and gets
/// logged).
pub fn filter_requirements_with_extras<S: AsRef<str>>(
    requirement_lines: &[RequirementLine],
    extras: &[S],
    config: &Config,
) -> Result<FilteredRequirements, RequirementError> {
    let requested: HashSet<String> = extras.iter().map(|e| normalize_extra(e.as_ref())).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut lines = Vec::new();

    for entry in requirement_lines {
        match entry {
            RequirementLine::Record(record) => {
                let extra = record.extra.as_deref().filter(|e| !e.is_empty()).map(normalize_extra);
                if let Some(extra) = &extra {
                    seen.insert(extra.clone());
                }
                if extra.map_or(true, |e| requested.contains(&e)) {
                    let marker = match record.environment.as_deref() {
                        Some(env) if !env.is_empty() => format!("; {}", env),
                        _ => String::new(),
                    };
                    lines.extend(record.requires.iter().map(|line| format!("{}{}", line, marker)));
                }
            }
            RequirementLine::Text(line) => {
                let req = Requirement::from_line(line, config)?;
                let marker = match req.marker() {
                    Some(marker) => marker.clone(),
                    None => {
                        lines.push(line.clone());
                        continue;
                    }
                };
                let (elements, rest) = marker.split_extras();
                let elements: HashSet<String> =
                    elements.iter().map(|e| normalize_extra(e)).collect();
                seen.extend(elements.iter().cloned());
                if elements.is_empty() || !elements.is_disjoint(&requested) {
                    lines.push(req.with_marker(rest).as_line());
                } else {
                    trace!("skipping {:?}, not in the requested extras", line);
                }
            }
        }
    }

    let not_found: Vec<String> = extras
        .iter()
        .map(|e| e.as_ref().to_owned())
        .filter(|e| !seen.contains(&normalize_extra(e)))
        .collect();
    let unknown_extras = if not_found.is_empty() {
        None
    } else {
        let err = ExtrasError(not_found);
        warn!("{}", err);
        Some(err)
    };

    Ok(FilteredRequirements {
        lines,
        unknown_extras,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::from_commented_json;
    use indoc::indoc;

    fn metadata_lines() -> Vec<RequirementLine> {
        from_commented_json(indoc! {r#"
            [
                {"requires": ["a"], "extra": null},
                {"requires": ["b"], "extra": "x", "environment": "os=='linux'"}
            ]
        "#})
    }

    #[test]
    fn test_structured_records() {
        let config = Config::new("/");
        let result = filter_requirements_with_extras(&metadata_lines(), &["x"], &config).unwrap();
        assert_eq!(result.lines, vec!["a", "b; os=='linux'"]);
        assert_eq!(result.unknown_extras, None);

        let result = filter_requirements_with_extras(&metadata_lines(), &["y"], &config).unwrap();
        assert_eq!(result.lines, vec!["a"]);
        assert_eq!(result.unknown_extras, Some(ExtrasError(vec!["y".into()])));
        assert_eq!(result.unknown_extras.unwrap().to_string(), "Extras not found: y");

        let none: &[&str] = &[];
        let result = filter_requirements_with_extras(&metadata_lines(), none, &config).unwrap();
        assert_eq!(result.lines, vec!["a"]);
        assert_eq!(result.unknown_extras, None);
    }

    #[test]
    fn test_text_lines() {
        let config = Config::new("/");
        let input: Vec<RequirementLine> = from_commented_json(indoc! {r#"
            [
                "plain>=1",
                "winonly; sys_platform == 'win32'",
                "socks; extra == 'Socks_Proxy' and python_version >= '3.7'",
                "either; extra == 'a' or extra == 'b'",
                "never; extra == 'other'"
            ]
        "#});
        let result =
            filter_requirements_with_extras(&input, &["socks-proxy", "b"], &config).unwrap();
        insta::assert_debug_snapshot!(result.lines, @r###"
        [
            "plain>=1",
            "winonly; sys_platform == \"win32\"",
            "socks; python_version >= \"3.7\"",
            "either",
        ]
        "###);
        assert_eq!(result.unknown_extras, None);

        let result = filter_requirements_with_extras(&input, &["nope"], &config).unwrap();
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.unknown_extras, Some(ExtrasError(vec!["nope".into()])));
    }

    #[test]
    fn test_bad_line_is_an_error() {
        let config = Config::new("/");
        let input = vec![RequirementLine::Text("not a requirement!".into())];
        let none: &[&str] = &[];
        assert!(filter_requirements_with_extras(&input, none, &config).is_err());
    }

    #[test]
    fn test_parse_requires_txt() {
        let records = MetadataRecord::parse_requires_txt(indoc! {r#"
            requests>=2

            [socks]
            PySocks>=1.5.6

            [security:sys_platform == "win32"]
            pywin32

            [:python_version < "3.8"]
            importlib-metadata
        "#});
        insta::assert_debug_snapshot!(records, @r###"
        [
            MetadataRecord {
                requires: [
                    "requests>=2",
                ],
                extra: None,
                environment: None,
            },
            MetadataRecord {
                requires: [
                    "PySocks>=1.5.6",
                ],
                extra: Some(
                    "socks",
                ),
                environment: None,
            },
            MetadataRecord {
                requires: [
                    "pywin32",
                ],
                extra: Some(
                    "security",
                ),
                environment: Some(
                    "sys_platform == \"win32\"",
                ),
            },
            MetadataRecord {
                requires: [
                    "importlib-metadata",
                ],
                extra: None,
                environment: Some(
                    "python_version < \"3.8\"",
                ),
            },
        ]
        "###);

        let config = Config::new("/");
        let lines: Vec<RequirementLine> = records.into_iter().map(RequirementLine::Record).collect();
        let result = filter_requirements_with_extras(&lines, &["socks"], &config).unwrap();
        assert_eq!(
            result.lines,
            vec!["requests>=2", "PySocks>=1.5.6", r#"importlib-metadata; python_version < "3.8""#]
        );
    }
}
