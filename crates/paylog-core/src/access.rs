//! Static IP allow-list for the ingestion endpoint.
//!
//! Matching is exact string comparison against the configured entries. There
//! is no wildcard, prefix or subnet support, and no address normalisation.

use std::collections::BTreeSet;

/// Outcome of checking a client address against the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Address is allow-listed.
    Allow,
    /// Address is absent, empty, or not allow-listed.
    Deny,
    /// No addresses are configured, so nothing can be allowed.
    Misconfigured,
}

/// Set of client addresses allowed to submit call records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    entries: BTreeSet<String>,
}

impl AllowList {
    /// Builds an allow-list from individual addresses, dropping blanks.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|entry| entry.as_ref().trim().to_string())
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { entries }
    }

    /// Parses a comma-separated list such as `"10.0.0.1, 10.0.0.2"`.
    ///
    /// # Example
    ///
    /// ```
    /// use paylog_core::AllowList;
    ///
    /// let list = AllowList::parse("10.0.0.1, ,10.0.0.2");
    /// assert_eq!(list.len(), 2);
    /// ```
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    /// Checks a candidate client address.
    ///
    /// An empty allow-list is reported as [`AccessDecision::Misconfigured`]
    /// regardless of the candidate.
    pub fn check(&self, candidate: Option<&str>) -> AccessDecision {
        if self.entries.is_empty() {
            return AccessDecision::Misconfigured;
        }
        match candidate {
            Some(addr) if !addr.is_empty() && self.entries.contains(addr) => AccessDecision::Allow,
            _ => AccessDecision::Deny,
        }
    }

    /// Returns true if no addresses are configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of configured addresses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Configured addresses in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_exact_members_only() {
        let list = AllowList::parse("127.0.0.1,10.0.0.5");

        assert_eq!(list.check(Some("127.0.0.1")), AccessDecision::Allow);
        assert_eq!(list.check(Some("10.0.0.5")), AccessDecision::Allow);
        assert_eq!(list.check(Some("10.0.0.50")), AccessDecision::Deny);
        assert_eq!(list.check(Some("10.0.0")), AccessDecision::Deny);
        assert_eq!(list.check(Some("::ffff:127.0.0.1")), AccessDecision::Deny);
    }

    #[test]
    fn absent_or_empty_candidate_is_denied() {
        let list = AllowList::parse("127.0.0.1");

        assert_eq!(list.check(None), AccessDecision::Deny);
        assert_eq!(list.check(Some("")), AccessDecision::Deny);
    }

    #[test]
    fn empty_list_is_misconfigured() {
        for raw in ["", " ", ",,", " , "] {
            let list = AllowList::parse(raw);
            assert!(list.is_empty());
            assert_eq!(list.check(Some("127.0.0.1")), AccessDecision::Misconfigured);
            assert_eq!(list.check(None), AccessDecision::Misconfigured);
        }
    }

    #[test]
    fn entries_are_trimmed_and_deduplicated() {
        let list = AllowList::parse(" 10.0.0.1 ,10.0.0.1,\t10.0.0.2");

        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(list.check(Some("10.0.0.2")), AccessDecision::Allow);
    }
}
