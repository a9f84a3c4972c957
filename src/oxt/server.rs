//! Server-side evaluation of OXT queries.
//!
//! The server walks the pivot's posting list and, for every entry at occurrence index `c`, raises
//! each test token for `c` to the entry's `y`. The entry matches when every result is a stored
//! cross-tag. Nothing is decrypted here.

use crate::index::{EncryptedIndex, PostingEntry};
use crate::oxt::QueryMessage;
use core::iter::Enumerate;
use core::slice::Iter;
use num_bigint::BigUint;
use tracing::trace;

/// Answers OXT queries against an immutable [`EncryptedIndex`].
#[derive(Clone, Copy, Debug)]
pub struct StorageServer<'a> {
    index: &'a EncryptedIndex,
    modulus: &'a BigUint,
}

impl<'a> StorageServer<'a> {
    /// `modulus` is the public group modulus `p`.
    pub fn new(index: &'a EncryptedIndex, modulus: &'a BigUint) -> Self {
        StorageServer { index, modulus }
    }

    /// Lazily yields the encrypted identifiers matching `query`.
    pub fn process_query<'q>(&self, query: &'q QueryMessage) -> Matches<'a, 'q> {
        let entries = self.index.retrieve_posting_list(&query.search_tag);
        let conjunctive = query.test_tokens.values().any(|set| !set.is_empty());

        trace!(entries = entries.len(), conjunctive, "processing query");

        Matches {
            entries: entries.iter().enumerate(),
            server: *self,
            query,
            conjunctive,
        }
    }
}

/// Iterator over the encrypted identifiers matching a query.
pub struct Matches<'a, 'q> {
    entries: Enumerate<Iter<'a, PostingEntry>>,
    server: StorageServer<'a>,
    query: &'q QueryMessage,
    conjunctive: bool,
}

impl<'a, 'q> Matches<'a, 'q> {
    fn is_match(&self, c: usize, entry: &PostingEntry) -> bool {
        // Conjunctive semantics: an occurrence without test tokens never matches.
        let tokens = match self.query.test_tokens.get(&c) {
            Some(tokens) => tokens,
            None => return false,
        };

        tokens.iter().all(|xtoken| {
            let candidate = xtoken.modpow(&entry.y, self.server.modulus);
            self.server.index.contains_membership_tag(&candidate)
        })
    }
}

impl<'a, 'q> Iterator for Matches<'a, 'q> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (c, entry) = self.entries.next()?;

            if !self.conjunctive || self.is_match(c, entry) {
                return Some(entry.ciphertext.as_slice());
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.entries.size_hint().1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Metadata;
    use crate::group::{PrimeGroup, SAFE_PRIME_64};
    use crate::oxt::{Oxt, OxtParams};
    use std::collections::BTreeMap;

    fn perform_default() -> (Oxt, crate::keys::KeyMaterial, EncryptedIndex) {
        let mut rng = rand::thread_rng();
        let group = PrimeGroup::new(BigUint::from(SAFE_PRIME_64)).unwrap();
        let oxt = Oxt::new(group, OxtParams { max_occurrences: 16 }).unwrap();

        let metadata: Metadata = [
            ("apple", vec!["doc1", "doc3", "doc4"]),
            ("banana", vec!["doc1", "doc2", "doc4"]),
        ]
        .into_iter()
        .collect();

        let (keys, index) = oxt.setup_from_metadata(&metadata, &mut rng).unwrap();
        (oxt, keys, index)
    }

    #[test]
    fn unknown_tag_yields_nothing() {
        let (oxt, _, index) = perform_default();
        let server = StorageServer::new(&index, oxt.group().modulus());

        let query = QueryMessage {
            search_tag: [0u8; 32],
            test_tokens: BTreeMap::new(),
        };

        assert_eq!(server.process_query(&query).count(), 0);
    }

    #[test]
    fn single_keyword_yields_every_entry() {
        let (oxt, keys, index) = perform_default();
        let server = StorageServer::new(&index, oxt.group().modulus());

        let query = oxt.generate_query(&keys, &["banana"]).unwrap();
        assert_eq!(server.process_query(&query).count(), 3);
    }

    #[test]
    fn missing_token_set_does_not_match() {
        let (oxt, keys, index) = perform_default();
        let server = StorageServer::new(&index, oxt.group().modulus());

        let mut query = oxt.generate_query(&keys, &["apple", "banana"]).unwrap();
        assert_eq!(server.process_query(&query).count(), 2);

        // Drop the sets for every occurrence but the first: later entries must not auto-accept.
        query.test_tokens.retain(|&c, _| c == 0);
        assert!(server.process_query(&query).count() <= 1);
    }

    #[test]
    fn matches_are_restartable() {
        let (oxt, keys, index) = perform_default();
        let server = StorageServer::new(&index, oxt.group().modulus());
        let query = oxt.generate_query(&keys, &["apple", "banana"]).unwrap();

        let first: Vec<_> = server.process_query(&query).collect();
        let second: Vec<_> = server.process_query(&query).collect();

        assert_eq!(first, second);
    }
}
