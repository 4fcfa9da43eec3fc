use std::collections::HashMap;

use crate::AttestationRecord;

/// Index of blanket-attestation bodies, keyed by repository name.
///
/// Bodies are kept raw and in discovery order; several documents for the
/// same repository are all retained.
#[derive(Clone, Debug, Default)]
pub struct AttestationStore {
    by_repo: HashMap<String, Vec<Vec<u8>>>,
}

impl AttestationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(records: impl IntoIterator<Item = AttestationRecord>) -> Self {
        let mut store = Self::new();
        store.extend(records);
        store
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = AttestationRecord>) {
        for record in records {
            self.by_repo.entry(record.repo_name).or_default().push(record.content);
        }
    }

    /// True when any body indexed for `repo_name` contains `sha` as a
    /// contiguous byte substring. A short hash also matches longer hashes
    /// and prose that happens to contain it.
    pub fn matches(&self, repo_name: &str, sha: &str) -> bool {
        let needle = sha.as_bytes();
        if needle.is_empty() {
            return false;
        }
        self.by_repo
            .get(repo_name)
            .map(|bodies| bodies.iter().any(|body| contains(body, needle)))
            .unwrap_or(false)
    }

    #[cfg(test)]
    pub fn documents(&self, repo_name: &str) -> &[Vec<u8>] {
        self.by_repo.get(repo_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_repo.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(repo: &str, body: &str) -> AttestationRecord {
        AttestationRecord {
            repo_name: repo.into(),
            path: format!("dco-signoffs/{repo}.txt"),
            content: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn matches_hash_embedded_in_prose() {
        let store = AttestationStore::build([record("repo", "...abc123 old message...")]);
        assert!(store.matches("repo", "abc123"));
        assert!(!store.matches("other", "abc123"));
        assert!(!store.matches("repo", "def456"));
    }

    #[test]
    fn short_hash_matches_longer_hash() {
        let store = AttestationStore::build([record("repo", "abc123def456 msg")]);
        assert!(store.matches("repo", "abc123"));
    }

    #[test]
    fn empty_hash_never_matches() {
        let store = AttestationStore::build([record("repo", "anything")]);
        assert!(!store.matches("repo", ""));
    }

    #[test]
    fn keeps_every_document_in_order() {
        let mut store = AttestationStore::build([record("repo", "first")]);
        store.extend([record("repo", "second"), record("other", "third")]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.documents("repo"), &[b"first".to_vec(), b"second".to_vec()]);
        assert!(store.matches("repo", "second"));
        assert!(store.documents("missing").is_empty());
    }
}
