//! Oblivious Cross-Tags (OXT) conjunctive searchable encryption.
//! * From: "[Highly-Scalable Searchable Symmetric Encryption with Support for Boolean Queries](https://eprint.iacr.org/2013/169)", Cash et al.
//!
//! The index stores, per keyword `w`, a randomly permuted posting list of
//! `(Enc(K_e, ind), y = xind * z^-1)` pairs, and a set of cross-tags `g^(xtrap(w) * xind)`.
//! A conjunctive query sends the search tag of the pivot `w_1` together with test tokens
//! `g^(z(w_1, c) * xtrap(w_i))` per occurrence `c`. Raising a token to the stored `y` cancels
//! `z` and yields the cross-tag of `(w_i, ind)`, which is in the set exactly when `ind`
//! contains `w_i`.
//!
//! Which keyword is the pivot only influences cost, not the result. Put the rarest keyword first.

pub mod server;

pub use server::{Matches, StorageServer};

use crate::cipher;
use crate::document::{DocumentSet, Metadata, Tokenizer, WordTokenizer};
use crate::error::{Error, Result};
use crate::group::PrimeGroup;
use crate::index::{EncryptedIndex, PostingEntry, SearchTag};
use crate::keys::{BuildKeys, KeyMaterial, SecretKey};
use crate::util::{derive_key, prf};
use crate::SearchScheme;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::seq::SliceRandom;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Default bound on the occurrence indices a query carries test tokens for.
pub const MAX_OCCURRENCES: usize = 2048;

/// Tunable OXT parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OxtParams {
    /// Test tokens are generated for occurrences `0..max_occurrences`. Posting-list entries past
    /// this bound never match a conjunctive query.
    pub max_occurrences: usize,
}

impl Default for OxtParams {
    fn default() -> Self {
        OxtParams {
            max_occurrences: MAX_OCCURRENCES,
        }
    }
}

impl OxtParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_occurrences == 0 {
            return Err(Error::InvalidConfig(
                "max_occurrences must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// A query as sent from the client to the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryMessage {
    pub(crate) search_tag: SearchTag,
    /// Occurrence index to the test tokens of every non-pivot keyword.
    pub(crate) test_tokens: BTreeMap<usize, Vec<BigUint>>,
}

impl QueryMessage {
    pub fn search_tag(&self) -> &SearchTag {
        &self.search_tag
    }

    pub fn test_tokens(&self, occurrence: usize) -> Option<&[BigUint]> {
        self.test_tokens.get(&occurrence).map(Vec::as_slice)
    }
}

/// The OXT scheme.
#[derive(Clone, Debug, Default)]
pub struct Oxt<T = WordTokenizer> {
    group: PrimeGroup,
    params: OxtParams,
    tokenizer: T,
}

impl Oxt<WordTokenizer> {
    pub fn new(group: PrimeGroup, params: OxtParams) -> Result<Self> {
        Self::with_tokenizer(group, params, WordTokenizer)
    }
}

impl<T: Tokenizer> Oxt<T> {
    pub fn with_tokenizer(group: PrimeGroup, params: OxtParams, tokenizer: T) -> Result<Self> {
        params.validate()?;

        Ok(Oxt {
            group,
            params,
            tokenizer,
        })
    }

    pub fn group(&self) -> &PrimeGroup {
        &self.group
    }

    pub fn params(&self) -> &OxtParams {
        &self.params
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Per-document exponent shared by all keywords of `ind`.
    fn cross_identifier(&self, key: &SecretKey, ind: &str) -> BigUint {
        let x = self.group.randomize_exponent(key.as_bytes(), ind) % self.group.order();
        if x.is_zero() {
            BigUint::one()
        } else {
            x
        }
    }

    /// Per-keyword exponent used in cross-tags and test tokens.
    fn cross_tag_factor(&self, key: &SecretKey, w: &str) -> BigUint {
        self.group.exponent(&prf(key.as_bytes(), w.as_bytes()))
    }

    /// Per-`(keyword, occurrence)` exponent, invertible modulo `p - 1`.
    fn counter_factor(&self, key: &SecretKey, w: &str, c: usize) -> BigUint {
        self.group
            .invertible_factor(&derive_key(key.as_bytes(), w, c as u64))
    }

    /// Builds the encrypted index from prepared keyword metadata.
    pub fn setup_from_metadata<R: RngCore + CryptoRng>(
        &self,
        metadata: &Metadata,
        rng: &mut R,
    ) -> Result<(KeyMaterial, EncryptedIndex)> {
        let keys = BuildKeys::random(rng);

        let mut posting_lists = BTreeMap::new();
        let mut cross_tags = HashSet::new();

        for (w, ids) in metadata.iter() {
            let ke = prf(keys.doc_enc_seed.as_bytes(), w.as_bytes());
            let xtrap = self.cross_tag_factor(&keys.cross_tag, w);

            if ids.len() > self.params.max_occurrences {
                warn!(
                    entries = ids.len(),
                    max_occurrences = self.params.max_occurrences,
                    "posting list exceeds the occurrence bound; conjunctive queries will miss entries"
                );
            }

            let mut ids: Vec<&String> = ids.iter().collect();
            ids.shuffle(rng);

            let mut list = Vec::with_capacity(ids.len());
            for (c, ind) in ids.into_iter().enumerate() {
                let xind = self.cross_identifier(&keys.doc_index, ind);
                let z = self.counter_factor(&keys.counter, w, c);
                let y = self
                    .group
                    .exponent_mul(&xind, &self.group.exponent_inverse(&z)?);

                list.push(PostingEntry {
                    ciphertext: cipher::encrypt(&ke, ind.as_bytes(), rng)?,
                    y,
                });

                let xtag = self
                    .group
                    .pow_generator(&self.group.exponent_mul(&xtrap, &xind));
                cross_tags.insert(xtag);
            }

            posting_lists.insert(w.clone(), list);
        }

        debug!(
            keywords = posting_lists.len(),
            cross_tags = cross_tags.len(),
            "built OXT index"
        );

        let (search_tag, index) = EncryptedIndex::setup(posting_lists, cross_tags, rng);

        Ok((keys.finish(search_tag), index))
    }

    /// Computes the query message for `keywords`; `keywords[0]` is the pivot.
    pub fn generate_query<S: AsRef<str>>(
        &self,
        keys: &KeyMaterial,
        keywords: &[S],
    ) -> Result<QueryMessage> {
        self.generate_bounded_query(keys, keywords, self.params.max_occurrences)
    }

    /// Like [`Self::generate_query`], but only carries test tokens for the first `occurrences`
    /// entries of the pivot's posting list.
    ///
    /// A client that knows the size of the pivot's posting list passes it here. The bound never
    /// exceeds `max_occurrences` and is at least one.
    pub fn generate_bounded_query<S: AsRef<str>>(
        &self,
        keys: &KeyMaterial,
        keywords: &[S],
        occurrences: usize,
    ) -> Result<QueryMessage> {
        let occurrences = occurrences.clamp(1, self.params.max_occurrences);
        let (pivot, rest) = keywords.split_first().ok_or(Error::EmptyQuery)?;
        let pivot = pivot.as_ref();

        let search_tag = prf(keys.search_tag.as_bytes(), pivot.as_bytes());
        let mut test_tokens = BTreeMap::new();

        if rest.is_empty() {
            test_tokens.insert(0, Vec::new());
        } else {
            let xtraps: Vec<BigUint> = rest
                .iter()
                .map(|w| self.cross_tag_factor(&keys.cross_tag, w.as_ref()))
                .collect();

            for c in 0..occurrences {
                let z = self.counter_factor(&keys.counter, pivot, c);
                let tokens = xtraps
                    .iter()
                    .map(|xtrap| self.group.pow_generator(&self.group.exponent_mul(&z, xtrap)))
                    .collect();
                test_tokens.insert(c, tokens);
            }
        }

        debug!(
            conjuncts = rest.len(),
            occurrences = test_tokens.len(),
            "generated query"
        );

        Ok(QueryMessage {
            search_tag,
            test_tokens,
        })
    }

    /// Runs a conjunctive search whose query is bounded as in [`Self::generate_bounded_query`].
    pub fn bounded_search(
        &self,
        keys: &KeyMaterial,
        index: &EncryptedIndex,
        keywords: &[&str],
        occurrences: usize,
    ) -> Result<Vec<String>> {
        let query = self.generate_bounded_query(keys, keywords, occurrences)?;
        let server = StorageServer::new(index, self.group.modulus());

        // `generate_bounded_query` rejects an empty keyword list.
        self.decrypt_results(keys, keywords[0], server.process_query(&query))
    }

    /// Decrypts identifiers returned for a query whose pivot was `pivot`.
    ///
    /// Duplicates are dropped. A ciphertext that does not decrypt is an [`Error::Integrity`].
    pub fn decrypt_results<'c, I>(
        &self,
        keys: &KeyMaterial,
        pivot: &str,
        ciphertexts: I,
    ) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = &'c [u8]>,
    {
        let ke = prf(keys.doc_enc_seed.as_bytes(), pivot.as_bytes());

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for ct in ciphertexts {
            let id = String::from_utf8(cipher::decrypt(&ke, ct)?).map_err(|_| Error::Integrity)?;
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }

        Ok(ids)
    }
}

impl<T: Tokenizer> SearchScheme for Oxt<T> {
    type Keys = KeyMaterial;
    type Index = EncryptedIndex;
    type Query<'q> = &'q [&'q str];

    fn setup<R: RngCore + CryptoRng>(
        &self,
        documents: &DocumentSet,
        rng: &mut R,
    ) -> Result<(KeyMaterial, EncryptedIndex)> {
        let metadata = documents.metadata(&self.tokenizer);
        debug!(
            documents = documents.len(),
            keywords = metadata.len(),
            "tokenized documents"
        );

        self.setup_from_metadata(&metadata, rng)
    }

    fn search(
        &self,
        keys: &KeyMaterial,
        index: &EncryptedIndex,
        keywords: Self::Query<'_>,
    ) -> Result<Vec<String>> {
        self.bounded_search(keys, index, keywords, self.params.max_occurrences)
    }
}
