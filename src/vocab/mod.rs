mod extra;
pub mod marker;
mod package_name;
mod reqparse;
mod requirement;
mod specifier;
mod version;
mod wheel_name;

// All this stuff is also re-exported from crate::prelude::*

pub use self::extra::{format_extras, format_normalized_extras, parse_extras, Extra};
pub use self::marker::Marker;
pub use self::package_name::PackageName;
pub use self::requirement::{Pep508Requirement, VersionOrUrl};
pub use self::specifier::{CompareOp, Specifier, Specifiers};
pub use self::version::Version;
pub use self::wheel_name::WheelName;
