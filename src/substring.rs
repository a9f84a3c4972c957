//! Substring search on top of OXT.
//!
//! Every document is expanded into q-gram tokens `G:q:gram` for `q` in `[q_min, q_max]`, plus
//! adjacency tokens `A:q:g_i|g_i+1` linking consecutive grams of the same length. The text is
//! padded with boundary characters so that prefixes and suffixes yield grams too.
//!
//! A pattern becomes a conjunctive OXT query over its own grams and adjacency tokens. The result
//! is the set of documents in which all of those tokens co-occur. Grams are not positional, so a
//! match is not a proof of containment: long patterns can produce false positives when their
//! grams and adjacent pairs are scattered over one document.

use crate::document::{DocumentSet, Tokenizer};
use crate::error::{Error, Result};
use crate::group::PrimeGroup;
use crate::index::{EncryptedIndex, SearchTag};
use crate::keys::KeyMaterial;
use crate::oxt::{Oxt, OxtParams};
use crate::util::prf;
use crate::SearchScheme;
use core::fmt;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::iter;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstringConfig {
    /// Shortest gram length, and the shortest pattern that can be searched.
    pub q_min: usize,
    /// Longest gram length.
    pub q_max: usize,
    /// Padding character placed around each document.
    pub boundary: char,
}

impl Default for SubstringConfig {
    fn default() -> Self {
        SubstringConfig {
            q_min: 3,
            q_max: 5,
            boundary: '#',
        }
    }
}

impl SubstringConfig {
    pub fn validate(&self) -> Result<()> {
        if self.q_min < 2 {
            return Err(Error::InvalidConfig(format!(
                "q_min must be at least 2, got {}",
                self.q_min
            )));
        }
        if self.q_max < self.q_min {
            return Err(Error::InvalidConfig(format!(
                "q_max ({}) must not be smaller than q_min ({})",
                self.q_max, self.q_min
            )));
        }

        Ok(())
    }
}

/// Expands text into gram and adjacency tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QGramTokenizer {
    config: SubstringConfig,
}

impl QGramTokenizer {
    pub fn new(config: SubstringConfig) -> Result<Self> {
        config.validate()?;

        Ok(QGramTokenizer { config })
    }

    pub fn config(&self) -> &SubstringConfig {
        &self.config
    }

    fn is_boundary(&self, gram: &[char]) -> bool {
        gram.iter().all(|&c| c == self.config.boundary)
    }

    /// The tokens a pattern is searched with, or `None` if it is shorter than `q_min`.
    ///
    /// Tokens are distinct and in order of appearance: grams first, then adjacent pairs.
    pub fn query_tokens(&self, pattern: &str) -> Option<Vec<String>> {
        let chars: Vec<char> = pattern.to_lowercase().chars().collect();
        if chars.len() < self.config.q_min {
            return None;
        }

        // A pattern of at most `q_max` characters is a single gram.
        let q = chars.len().min(self.config.q_max);
        let grams: Vec<String> = chars.windows(q).map(|g| g.iter().collect()).collect();

        let mut seen = HashSet::new();
        let tokens = grams
            .iter()
            .map(|g| gram_token(q, g))
            .chain(grams.windows(2).map(|pair| pair_token(q, &pair[0], &pair[1])))
            .filter(|t| seen.insert(t.clone()))
            .collect();

        Some(tokens)
    }
}

impl Tokenizer for QGramTokenizer {
    fn tokenize(&self, text: &str) -> BTreeSet<String> {
        let pad = self.config.q_max - 1;
        let chars: Vec<char> = iter::repeat(self.config.boundary)
            .take(pad)
            .chain(text.to_lowercase().chars())
            .chain(iter::repeat(self.config.boundary).take(pad))
            .collect();

        let mut tokens = BTreeSet::new();
        for q in self.config.q_min..=self.config.q_max {
            let grams: Vec<&[char]> = chars.windows(q).collect();

            for gram in grams.iter().filter(|g| !self.is_boundary(g)) {
                tokens.insert(gram_token(q, &gram.iter().collect::<String>()));
            }

            for pair in grams.windows(2) {
                if self.is_boundary(pair[0]) || self.is_boundary(pair[1]) {
                    continue;
                }

                let a: String = pair[0].iter().collect();
                let b: String = pair[1].iter().collect();
                tokens.insert(pair_token(q, &a, &b));
            }
        }

        tokens
    }
}

fn gram_token(q: usize, gram: &str) -> String {
    format!("G:{q}:{gram}")
}

fn pair_token(q: usize, first: &str, second: &str) -> String {
    format!("A:{q}:{first}|{second}")
}

/// Client state of the substring scheme.
///
/// Next to the OXT keys the client remembers how many documents every token occurs in, so it can
/// pick the rarest token as the pivot. Counts are keyed by the token's search tag, so the state
/// holds neither identifiers nor any gram of the document text.
#[derive(Clone, PartialEq, Eq)]
pub struct SubstringKeys {
    pub keys: KeyMaterial,
    token_counts: HashMap<SearchTag, usize>,
}

impl SubstringKeys {
    fn new<'m, I>(keys: KeyMaterial, counts: I) -> Self
    where
        I: IntoIterator<Item = (&'m String, usize)>,
    {
        let token_counts = counts
            .into_iter()
            .map(|(token, n)| (prf(keys.search_tag.as_bytes(), token.as_bytes()), n))
            .collect();

        SubstringKeys { keys, token_counts }
    }

    /// Posting-list size of `token`, `None` if no document produced it.
    pub fn token_count(&self, token: &str) -> Option<usize> {
        let tag = prf(self.keys.search_tag.as_bytes(), token.as_bytes());
        self.token_counts.get(&tag).copied()
    }
}

impl fmt::Debug for SubstringKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubstringKeys")
            .field("keys", &self.keys)
            .field("tokens", &self.token_counts.len())
            .finish()
    }
}

/// Substring search scheme wrapping [`Oxt`] with a [`QGramTokenizer`].
#[derive(Clone, Debug, Default)]
pub struct SubstringOxt {
    oxt: Oxt<QGramTokenizer>,
}

impl SubstringOxt {
    pub fn new(group: PrimeGroup, params: OxtParams, config: SubstringConfig) -> Result<Self> {
        let tokenizer = QGramTokenizer::new(config)?;

        Ok(SubstringOxt {
            oxt: Oxt::with_tokenizer(group, params, tokenizer)?,
        })
    }

    pub fn oxt(&self) -> &Oxt<QGramTokenizer> {
        &self.oxt
    }

    pub fn config(&self) -> &SubstringConfig {
        self.oxt.tokenizer().config()
    }

    /// Query tokens for `pattern` with the rarest one moved to the front.
    ///
    /// Tokens the index has never seen count as the most frequent.
    pub fn plan(&self, keys: &SubstringKeys, pattern: &str) -> Option<Vec<String>> {
        let mut tokens = self.oxt.tokenizer().query_tokens(pattern)?;

        let pivot = tokens
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| keys.token_count(t).unwrap_or(usize::MAX))
            .map(|(i, _)| i)?;
        tokens.swap(0, pivot);

        Some(tokens)
    }
}

impl SearchScheme for SubstringOxt {
    type Keys = SubstringKeys;
    type Index = EncryptedIndex;
    type Query<'q> = &'q str;

    fn setup<R: RngCore + CryptoRng>(
        &self,
        documents: &DocumentSet,
        rng: &mut R,
    ) -> Result<(SubstringKeys, EncryptedIndex)> {
        let metadata = documents.metadata(self.oxt.tokenizer());

        debug!(
            documents = documents.len(),
            tokens = metadata.len(),
            "expanded documents into q-gram tokens"
        );

        let (keys, index) = self.oxt.setup_from_metadata(&metadata, rng)?;

        let counts = metadata.iter().map(|(token, ids)| (token, ids.len()));

        Ok((SubstringKeys::new(keys, counts), index))
    }

    fn search(
        &self,
        keys: &SubstringKeys,
        index: &EncryptedIndex,
        pattern: Self::Query<'_>,
    ) -> Result<Vec<String>> {
        let tokens = match self.plan(keys, pattern) {
            Some(tokens) => tokens,
            None => return Ok(Vec::new()),
        };

        // A token no document produced has an empty posting list, so the conjunction is empty.
        let counts: Option<Vec<usize>> = tokens.iter().map(|t| keys.token_count(t)).collect();
        let pivot_count = match counts {
            Some(counts) => counts[0],
            None => return Ok(Vec::new()),
        };

        debug!(
            tokens = tokens.len(),
            occurrences = pivot_count,
            "planned substring query"
        );

        let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
        self.oxt
            .bounded_search(&keys.keys, index, refs.as_slice(), pivot_count)
    }
}
