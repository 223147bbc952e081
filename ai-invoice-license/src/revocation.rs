//! Revoked token ids and subjects.

use std::collections::HashSet;

/// Two independent revocation predicates: by token id and by subject.
///
/// Both are hash sets, so lookups stay constant-time as the lists grow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevocationList {
    token_ids: HashSet<String>,
    subjects: HashSet<String>,
}

impl RevocationList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from raw entries. Entries are trimmed and blanks dropped.
    pub fn from_entries<I, J, S, T>(token_ids: I, subjects: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            token_ids: normalize(token_ids),
            subjects: normalize(subjects),
        }
    }

    /// Adds a revoked token id.
    pub fn revoke_token_id(&mut self, token_id: impl AsRef<str>) {
        self.token_ids.extend(normalize([token_id]));
    }

    /// Adds a revoked subject.
    pub fn revoke_subject(&mut self, subject: impl AsRef<str>) {
        self.subjects.extend(normalize([subject]));
    }

    /// Returns true if the token id is revoked.
    #[must_use]
    pub fn is_token_revoked(&self, token_id: &str) -> bool {
        self.token_ids.contains(token_id)
    }

    /// Returns true if the subject is revoked.
    #[must_use]
    pub fn is_subject_revoked(&self, subject: &str) -> bool {
        self.subjects.contains(subject)
    }

    /// Total number of entries across both predicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.token_ids.len() + self.subjects.len()
    }

    /// Returns true if nothing is revoked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize<I, S>(entries: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|e| e.as_ref().trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}
