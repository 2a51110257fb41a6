pub use std::collections::{BTreeSet, HashMap, HashSet};
pub use std::convert::{TryFrom, TryInto};
pub use std::fmt::Display;
pub use std::path::{Path, PathBuf};
pub use std::str::FromStr;

pub use derivative::Derivative;
pub use eyre::{bail, eyre, Result, WrapErr};
pub use once_cell::sync::Lazy;
pub use regex::Regex;
pub use serde::{Deserialize, Serialize};
pub use serde_with::{DeserializeFromStr, SerializeDisplay};
pub use tracing::{debug, trace, warn};
pub use url::Url;

pub use crate::config::{Config, PROJECT_ROOT};
pub use crate::error::{ExtrasError, RequirementError};
pub use crate::try_from_str_boilerplate;
pub use crate::vocab::*;
