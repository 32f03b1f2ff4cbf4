use std::fmt;
use serde::{Deserialize, Serialize};

/// Name of the group every dependency belongs to unless it declares another.
pub const MAIN_GROUP: &str = "Main";

/// A dependency group name.
///
/// Group names compare case-insensitively (`main` and `Main` are the same
/// group) but keep their original spelling for display and directory names.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupName(String);

impl GroupName {
    pub fn new<S: Into<String>>(name: S) -> Self {
        GroupName(name.into())
    }

    pub fn main() -> Self {
        GroupName(MAIN_GROUP.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_main(&self) -> bool {
        self.0.eq_ignore_ascii_case(MAIN_GROUP)
    }

    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for GroupName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl std::hash::Hash for GroupName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl Default for GroupName {
    fn default() -> Self {
        GroupName::main()
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupName {
    fn from(value: &str) -> Self {
        GroupName::new(value)
    }
}
