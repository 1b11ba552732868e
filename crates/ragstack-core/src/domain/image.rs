//! Image references, identities and build outcomes.

use serde::{Deserialize, Serialize};

/// A tagged image reference such as `ragstack-ollama:latest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        ImageRef(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current content identifier of an image reference.
///
/// `Absent` is an expected observation (first build, fresh host), not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum ImageIdentity {
    Absent,
    Present(String),
}

impl ImageIdentity {
    pub fn is_present(&self) -> bool {
        matches!(self, ImageIdentity::Present(_))
    }

    /// Short form (first 12 characters after any `sha256:` prefix).
    pub fn short(&self) -> &str {
        match self {
            ImageIdentity::Absent => "absent",
            ImageIdentity::Present(id) => {
                let hex = id.strip_prefix("sha256:").unwrap_or(id);
                hex.char_indices().nth(12).map_or(hex, |(end, _)| &hex[..end])
            }
        }
    }
}

impl std::fmt::Display for ImageIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageIdentity::Absent => write!(f, "absent"),
            ImageIdentity::Present(id) => write!(f, "{}", id),
        }
    }
}

/// Classification of one build attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum BuildOutcome {
    /// Identity before and after are both present and equal.
    Unchanged,
    /// The image is new or its identity changed.
    Updated,
    Failed(String),
}

impl BuildOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            BuildOutcome::Unchanged => "unchanged",
            BuildOutcome::Updated => "updated",
            BuildOutcome::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_short_strips_digest_prefix() {
        let id = ImageIdentity::Present(
            "sha256:4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945".to_string(),
        );
        assert_eq!(id.short(), "4f53cda18c2b");
        assert_eq!(ImageIdentity::Absent.short(), "absent");
    }

    #[test]
    fn test_identity_short_handles_short_ids() {
        let id = ImageIdentity::Present("abc".to_string());
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn test_identity_short_cuts_on_char_boundary() {
        let id = ImageIdentity::Present("sha256:aéééééééééééééé".to_string());
        assert_eq!(id.short(), "aéééééééééé");
        assert_eq!(id.short().chars().count(), 12);
    }

    #[test]
    fn test_identity_serializes_tagged() {
        let json = serde_json::to_value(ImageIdentity::Present("sha256:aa".into())).unwrap();
        assert_eq!(json["state"], "present");
        assert_eq!(json["id"], "sha256:aa");
    }
}
