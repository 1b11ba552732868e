//! Build change detection.
//!
//! Compares an image's identity before and after a build. Equality of the
//! backend's content identifiers is taken as "nothing changed"; a backend that
//! rewrites identifiers without a content change will report `Updated`.

use crate::domain::{BuildOutcome, ImageIdentity};

/// Classify a build from the identities observed around it.
///
/// A missing post-build identity is a failure even if the build reported
/// success, so a broken image is never silently left unarchived.
pub fn classify(before: &ImageIdentity, after: &ImageIdentity) -> BuildOutcome {
    match (before, after) {
        (_, ImageIdentity::Absent) => {
            BuildOutcome::Failed("post-build identity unavailable".to_string())
        }
        (ImageIdentity::Absent, ImageIdentity::Present(_)) => BuildOutcome::Updated,
        (ImageIdentity::Present(b), ImageIdentity::Present(a)) if b == a => {
            BuildOutcome::Unchanged
        }
        (ImageIdentity::Present(_), ImageIdentity::Present(_)) => BuildOutcome::Updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(id: &str) -> ImageIdentity {
        ImageIdentity::Present(id.to_string())
    }

    #[test]
    fn test_first_build_is_updated() {
        for after in ["sha256:aa", "sha256:bb", ""] {
            assert_eq!(
                classify(&ImageIdentity::Absent, &present(after)),
                BuildOutcome::Updated
            );
        }
    }

    #[test]
    fn test_equal_identities_are_unchanged() {
        for id in ["sha256:aa", "sha256:ff00", "x"] {
            assert_eq!(classify(&present(id), &present(id)), BuildOutcome::Unchanged);
        }
    }

    #[test]
    fn test_distinct_identities_are_updated() {
        let pairs = [("sha256:aa", "sha256:bb"), ("a", "A"), ("sha256:1", "sha256:10")];
        for (before, after) in pairs {
            assert_eq!(
                classify(&present(before), &present(after)),
                BuildOutcome::Updated
            );
        }
    }

    #[test]
    fn test_absent_after_build_fails() {
        for before in [ImageIdentity::Absent, present("sha256:aa")] {
            let outcome = classify(&before, &ImageIdentity::Absent);
            assert_eq!(
                outcome,
                BuildOutcome::Failed("post-build identity unavailable".to_string())
            );
        }
    }
}
