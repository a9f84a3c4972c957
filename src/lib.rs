//! Searchable symmetric encryption with conjunctive keyword queries and substring search.
//!
//! This crate implements the Oblivious Cross-Tags (OXT) protocol of Cash et al. (see
//! [the oxt module](`crate::oxt`)) over the multiplicative group of a large safe prime, and a
//! substring extension that turns q-grams of the documents into OXT keywords (see
//! [the substring module](`crate::substring`)).
//!
//! A client encrypts a document collection into an [`EncryptedIndex`] which is handed to an
//! untrusted server. The server answers queries by looking up an opaque search tag and filtering
//! the resulting posting list with set-membership tests; it never learns keywords or identifiers.
//!
//! # Examples
//!
//! Both schemes implement [`SearchScheme`]:
//!
//! ```
//! use oxt_sse::{DocumentSet, Oxt, SearchScheme};
//!
//! let mut rng = rand::thread_rng();
//!
//! let documents: DocumentSet = [
//!     ("doc1", "apple banana cherry"),
//!     ("doc2", "banana cherry date"),
//! ]
//! .into_iter()
//! .collect();
//!
//! // Encrypt the collection with the default 256-bit group.
//! let oxt: Oxt = Oxt::default();
//! let (keys, index) = oxt.setup(&documents, &mut rng).unwrap();
//!
//! // The first keyword is the pivot, put the rarest one first.
//! let ids = oxt.search(&keys, &index, &["apple", "cherry"]).unwrap();
//!
//! assert_eq!(ids, vec!["doc1"]);
//! ```

#[cfg(test)]
#[macro_use]
mod test_macros;

mod util;

pub mod cipher;
pub mod document;
pub mod error;
pub mod group;
pub mod index;
pub mod keys;
pub mod oxt;
pub mod substring;

pub use document::{Document, DocumentSet, Metadata, Tokenizer, WordTokenizer};
pub use error::{Error, Result};
pub use group::PrimeGroup;
pub use index::EncryptedIndex;
pub use keys::KeyMaterial;
pub use oxt::{Oxt, OxtParams};
pub use substring::{SubstringConfig, SubstringOxt};

use rand::{CryptoRng, RngCore};

/// Artifacts of the system that have a fixed-size byte encoding should implement this trait.
///
/// Secret artifacts such as key material should implement this in constant-time.
pub trait Compress: Sized {
    const OUTPUT_SIZE: usize;
    type Output: Sized + Clone + AsRef<[u8]>;

    /// Encodes this artifact to its byte representation.
    fn to_bytes(&self) -> Self::Output;

    /// Decodes a serialized artifact.
    fn from_bytes(output: &Self::Output) -> subtle::CtOption<Self>;
}

/// Searchable symmetric encryption scheme.
pub trait SearchScheme {
    /// Client-side secret state produced by the setup.
    type Keys;

    /// Server-side encrypted index.
    type Index;

    /// Scheme-specific query, e.g. a list of keywords or a pattern.
    type Query<'q>;

    /// Encrypts a document collection, returning the client keys and the server index.
    fn setup<R: RngCore + CryptoRng>(
        &self,
        documents: &DocumentSet,
        rng: &mut R,
    ) -> Result<(Self::Keys, Self::Index)>;

    /// Runs a query against the index and returns the matching document identifiers.
    ///
    /// The order of the identifiers is unspecified. Misses yield an empty list, not an error.
    fn search(
        &self,
        keys: &Self::Keys,
        index: &Self::Index,
        query: Self::Query<'_>,
    ) -> Result<Vec<String>>;
}
