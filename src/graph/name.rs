use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Pipeline, stage and job identity.
///
/// Compares and hashes case-insensitively but keeps the spelling it was
/// declared with, so error messages quote names the way the user wrote them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseInsensitiveName(String);

impl CaseInsensitiveName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    fn folded(&self) -> String {
        self.0.to_lowercase()
    }
}

impl PartialEq for CaseInsensitiveName {
    fn eq(&self, other: &Self) -> bool {
        self.folded() == other.folded()
    }
}

impl Eq for CaseInsensitiveName {}

impl PartialEq<str> for CaseInsensitiveName {
    fn eq(&self, other: &str) -> bool {
        self.folded() == other.to_lowercase()
    }
}

impl PartialEq<&str> for CaseInsensitiveName {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Hash for CaseInsensitiveName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded().hash(state);
    }
}

impl PartialOrd for CaseInsensitiveName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CaseInsensitiveName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(&other.folded())
    }
}

impl fmt::Display for CaseInsensitiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseInsensitiveName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CaseInsensitiveName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_compare_ignoring_case() {
        assert_eq!(CaseInsensitiveName::from("Upstream"), CaseInsensitiveName::from("upstream"));
        assert_eq!(CaseInsensitiveName::from("UP-stage1"), "up-STAGE1");
        assert_ne!(CaseInsensitiveName::from("upstream"), CaseInsensitiveName::from("upstream2"));
    }

    #[test]
    fn test_hash_agrees_with_equality() {
        let mut names = HashSet::new();
        names.insert(CaseInsensitiveName::from("Build"));

        assert!(names.contains(&CaseInsensitiveName::from("BUILD")));
    }

    #[test]
    fn test_display_keeps_declared_spelling() {
        assert_eq!(CaseInsensitiveName::from("Uppest_Stream").to_string(), "Uppest_Stream");
    }

    #[test]
    fn test_blank_names() {
        assert!(CaseInsensitiveName::from("").is_blank());
        assert!(CaseInsensitiveName::from("   ").is_blank());
        assert!(!CaseInsensitiveName::from("stage").is_blank());
    }
}
