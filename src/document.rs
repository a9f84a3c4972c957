//! Plaintext document collection and its inverted keyword metadata.
//!
//! This is the only place plaintext lives. The metadata is built once per setup and dropped after
//! the index has been built.

use serde::{Deserialize, Serialize};
use std::collections::{btree_map, BTreeMap, BTreeSet};
use unicode_segmentation::UnicodeSegmentation;

/// An `(identifier, content)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Document {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// An ordered collection of documents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentSet {
    documents: Vec<Document>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    /// Tokenizes every document and maps each term to the identifiers containing it.
    pub fn metadata<T: Tokenizer + ?Sized>(&self, tokenizer: &T) -> Metadata {
        let mut metadata = Metadata::new();
        for doc in &self.documents {
            for term in tokenizer.tokenize(&doc.content) {
                metadata.insert(term, &doc.id);
            }
        }

        metadata
    }
}

impl From<Vec<Document>> for DocumentSet {
    fn from(documents: Vec<Document>) -> Self {
        DocumentSet { documents }
    }
}

impl<I, C> FromIterator<(I, C)> for DocumentSet
where
    I: Into<String>,
    C: Into<String>,
{
    fn from_iter<It: IntoIterator<Item = (I, C)>>(iter: It) -> Self {
        iter.into_iter()
            .map(|(id, content)| Document::new(id, content))
            .collect::<Vec<_>>()
            .into()
    }
}

/// Splits text into a set of normalized terms.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> BTreeSet<String>;
}

/// Splits on non-word characters (anything other than alphanumerics and `_`) and lower-cases.
///
/// Text is walked by grapheme cluster, so combining marks stay attached to the letter they
/// modify.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WordTokenizer;

fn is_word_grapheme(g: &str) -> bool {
    g.chars()
        .next()
        .map_or(false, |c| c.is_alphanumeric() || c == '_')
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> BTreeSet<String> {
        let mut tokens = BTreeSet::new();
        let mut word = String::new();

        for g in text.graphemes(true) {
            if is_word_grapheme(g) {
                word.push_str(g);
            } else if !word.is_empty() {
                tokens.insert(word.to_lowercase());
                word.clear();
            }
        }
        if !word.is_empty() {
            tokens.insert(word.to_lowercase());
        }

        tokens
    }
}

/// Keyword to document identifiers. An identifier appears at most once per keyword.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    map: BTreeMap<String, BTreeSet<String>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, keyword: impl Into<String>, id: &str) {
        self.map
            .entry(keyword.into())
            .or_default()
            .insert(id.to_owned());
    }

    pub fn get(&self, keyword: &str) -> Option<&BTreeSet<String>> {
        self.map.get(keyword)
    }

    /// Number of documents containing `keyword`.
    pub fn posting_len(&self, keyword: &str) -> usize {
        self.map.get(keyword).map_or(0, BTreeSet::len)
    }

    /// Number of distinct keywords.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, BTreeSet<String>> {
        self.map.iter()
    }
}

impl<K, I, S> FromIterator<(K, I)> for Metadata
where
    K: Into<String>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fn from_iter<It: IntoIterator<Item = (K, I)>>(iter: It) -> Self {
        let mut metadata = Metadata::new();
        for (keyword, ids) in iter {
            let keyword = keyword.into();
            for id in ids {
                metadata.insert(keyword.clone(), id.as_ref());
            }
        }

        metadata
    }
}
