/// Work around an annoyance in Rust's standard traits -- if you define
/// TryFrom<&str>, then you probably also want TryFrom<String> and FromStr,
/// and the implementation is trivial in terms of TryFrom<&str>. So this macro
/// just generates the boilerplate for you.
#[macro_export]
macro_rules! try_from_str_boilerplate {
    ($name:ident) => {
        impl std::convert::TryFrom<String> for $name {
            type Error = eyre::Report;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                (&*s).try_into()
            }
        }

        impl std::str::FromStr for $name {
            type Err = eyre::Report;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.try_into()
            }
        }
    };
}

/// Splits `scheme://netloc/path?query#fragment` into `(scheme://netloc, path, tail)`,
/// where `tail` is everything from the first `?` or `#` on. Anything without a
/// `://` is treated as all path.
///
/// We do this by hand rather than going through `Url`, because `Url` normalizes
/// (percent-encoding, trailing slashes, `${...}` placeholders) and requirement
/// strings have to survive a round-trip byte-for-byte.
pub fn split_url(url: &str) -> (&str, &str, &str) {
    let (before_tail, tail) = match url.find(&['?', '#'][..]) {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    };
    let netloc_end = match before_tail.find("://") {
        Some(scheme_end) => {
            let after = scheme_end + 3;
            before_tail[after..]
                .find('/')
                .map(|idx| after + idx)
                .unwrap_or(before_tail.len())
        }
        None => 0,
    };
    let (prefix, path) = before_tail.split_at(netloc_end);
    (prefix, path, tail)
}

pub fn url_without_fragments(url: &str) -> &str {
    match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    }
}
