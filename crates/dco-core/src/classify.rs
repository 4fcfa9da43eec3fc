use std::sync::LazyLock;

use regex::Regex;

use crate::{AttestationStore, ClassificationOutcome, Commit};

static SIGN_OFF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Signed-off-by: .+").expect("static regex"));

/// A `Signed-off-by: ` marker followed by at least one character on the same line.
pub fn has_sign_off(message: &str) -> bool {
    SIGN_OFF.is_match(message)
}

/// Checks run in a fixed order and the first hit wins:
/// sign-off, then merge parents, then prior attestation.
pub fn classify(commit: &Commit, store: &AttestationStore) -> ClassificationOutcome {
    if has_sign_off(&commit.message) {
        return ClassificationOutcome::Compliant;
    }
    if commit.is_merge() {
        return ClassificationOutcome::MergeExempt;
    }
    if store.matches(&commit.repo_name, &commit.sha) {
        return ClassificationOutcome::PriorAttested;
    }
    ClassificationOutcome::NonCompliant
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_off_anywhere_in_message() {
        assert!(has_sign_off("has a signoff  Signed-off-by: John Mertic <jmertic@linuxfoundation.org>"));
        assert!(has_sign_off("fix bug\n\nSigned-off-by: A B <a@b.com>"));
        assert!(!has_sign_off("has no signoff"));
    }

    #[test]
    fn marker_needs_trailing_content_on_the_same_line() {
        assert!(!has_sign_off("Signed-off-by: "));
        assert!(!has_sign_off("Signed-off-by: \nA B <a@b.com>"));
        assert!(!has_sign_off("Signed-off-by:A B"));
        assert!(!has_sign_off("signed-off-by: A B"));
    }
}
