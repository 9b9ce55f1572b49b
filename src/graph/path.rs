use std::fmt;

use serde::{Deserialize, Serialize};

use super::name::CaseInsensitiveName;

/// Route from the pipeline an artifact is fetched from down to the pipeline
/// that fetches it, written `ancestor/.../parent`.
///
/// The first segment is the pipeline the artifact comes from and the last one
/// is the immediate upstream of the fetching pipeline. A single segment names
/// an immediate upstream (or the fetching pipeline itself); no segments means
/// the fetching pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PathFromAncestor {
    segments: Vec<CaseInsensitiveName>,
}

impl PathFromAncestor {
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(CaseInsensitiveName::from)
            .collect();
        Self { segments }
    }

    pub fn from_segments(segments: Vec<CaseInsensitiveName>) -> Self {
        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether this names a multi-hop route rather than a single pipeline.
    pub fn has_path(&self) -> bool {
        self.segments.len() > 1
    }

    pub fn segments(&self) -> &[CaseInsensitiveName] {
        &self.segments
    }
}

impl fmt::Display for PathFromAncestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .segments
            .iter()
            .map(CaseInsensitiveName::as_str)
            .collect::<Vec<_>>()
            .join("/");
        f.write_str(&joined)
    }
}

impl From<String> for PathFromAncestor {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<&str> for PathFromAncestor {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<PathFromAncestor> for String {
    fn from(path: PathFromAncestor) -> Self {
        path.to_string()
    }
}
