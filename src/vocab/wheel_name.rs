use crate::prelude::*;

// https://packaging.python.org/specifications/binary-distribution-format/#file-name-convention
//
//   {distribution}-{version}(-{build tag})?-{python tag}-{abi tag}-{platform tag}.whl
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct WheelName {
    pub distribution: PackageName,
    pub version: Version,
    // The build tag "sorts as an empty tuple if unspecified, else sort as a
    // two-item tuple with the first item being the initial digits as an 'int',
    // and the second item being the remainder of the tag as a 'str'". We don't
    // sort wheels here, but we do keep the pieces apart:
    //
    //   <no build tag> => (None, "")
    //   1              => (Some(1), "")
    //   1stuff         => (Some(1), "stuff")
    //   stuff          => (None, "stuff")
    pub build_number: Option<u32>,
    pub build_name: String,
    pub py_tags: Vec<String>,
    pub abi_tags: Vec<String>,
    pub arch_tags: Vec<String>,
}

impl WheelName {
    /// Cheap check for whether a filename is even trying to be a wheel.
    pub fn looks_like_wheel(filename: &str) -> bool {
        filename.ends_with(".whl")
    }
}

fn format_build_tag(build_number: Option<u32>, build_name: &str) -> String {
    match (build_number, build_name) {
        (None, "") => String::from(""),
        (None, name) => format!("-{}", name),
        (Some(num), name) => format!("-{}{}", num, name),
    }
}

impl TryFrom<&str> for WheelName {
    type Error = eyre::Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        static VALID_CHARS: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.+!-]*$").unwrap());
        static BUILD_TAG_SPLIT: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^([0-9]*)(.*)$").unwrap());

        // names/versions/etc. will be further validated by their respective
        // constructors. This is just to rule out real ridiculous stuff, like
        // spaces or control characters.
        if !VALID_CHARS.is_match(value) {
            bail!("Invalid characters in wheel name: {:?}", value);
        }
        let stem = value
            .strip_suffix(".whl")
            .ok_or_else(|| eyre!("expected {:?} to end in .whl", value))?;

        let mut pieces: Vec<&str> = stem.split('-').collect();

        let mut build_number = None;
        let mut build_name = String::new();
        if pieces.len() == 6 {
            let build_tag = pieces.remove(2);
            if build_tag.is_empty() {
                bail!("found empty build tag: {:?}", value);
            }
            if let Some(captures) = BUILD_TAG_SPLIT.captures(build_tag) {
                build_number = captures.get(1).and_then(|m| m.as_str().parse().ok());
                build_name = captures
                    .get(2)
                    .map(|m| m.as_str().to_owned())
                    .unwrap_or_default();
            }
        }

        if pieces.len() != 5 {
            bail!("can't parse wheel name {:?}", value);
        }

        let distribution: PackageName = pieces[0].try_into()?;
        let version: Version = pieces[1].try_into()?;
        let tags =
            |compressed: &str| -> Vec<String> { compressed.split('.').map(String::from).collect() };

        Ok(WheelName {
            distribution,
            version,
            build_number,
            build_name,
            py_tags: tags(pieces[2]),
            abi_tags: tags(pieces[3]),
            arch_tags: tags(pieces[4]),
        })
    }
}

try_from_str_boilerplate!(WheelName);

impl Display for WheelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{dist}-{ver}{build}-{py_tags}-{abi_tags}-{arch_tags}.whl",
            dist = self.distribution.as_given(),
            ver = self.version,
            build = format_build_tag(self.build_number, &self.build_name),
            py_tags = self.py_tags.join("."),
            abi_tags = self.abi_tags.join("."),
            arch_tags = self.arch_tags.join("."),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wheel_name_from_str() {
        let n: WheelName = "mypkg-1.2.3-py3-none-any.whl".try_into().unwrap();
        assert_eq!(n.distribution, "mypkg".try_into().unwrap());
        assert_eq!(n.version, "1.2.3".try_into().unwrap());
        assert_eq!(n.build_number, None);
        assert_eq!(n.build_name, "");
        assert_eq!(n.py_tags, vec!["py3"]);
        assert_eq!(n.abi_tags, vec!["none"]);
        assert_eq!(n.arch_tags, vec!["any"]);

        assert_eq!(n.to_string(), "mypkg-1.2.3-py3-none-any.whl");
    }

    #[test]
    fn test_wheel_name_from_str_harder() {
        let n: WheelName = "foo.bar-0.1b3-1local-py2.py3-none-any.whl"
            .try_into()
            .unwrap();
        assert_eq!(n.distribution, "foo.bar".try_into().unwrap());
        assert_eq!(n.version, "0.1b3".try_into().unwrap());
        assert_eq!(n.build_number, Some(1));
        assert_eq!(n.build_name, "local");
        assert_eq!(n.py_tags, vec!["py2", "py3"]);
    }

    #[test]
    fn test_wheel_name_rejects() {
        for bad in [
            "mypkg-1.2.3.tar.gz",
            "mypkg-1.2.3-py3-none.whl",
            "my pkg-1.2.3-py3-none-any.whl",
            "mypkg-notaversion-py3-none-any.whl",
        ] {
            assert!(WheelName::try_from(bad).is_err(), "{:?}", bad);
        }
    }
}
