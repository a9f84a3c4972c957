//! The server-held encrypted index: the TSet of posting lists and the XSet of cross-tags.
//!
//! The store never sees a plaintext keyword. During [`EncryptedIndex::setup`] every posting list
//! is re-keyed under an opaque search tag derived from a freshly generated key, which is returned
//! to the client. Afterwards the index is immutable and may be shared freely between readers.

use crate::error::{Error, Result};
use crate::keys::SecretKey;
use crate::util::{prf, PRF_BYTES};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Opaque per-keyword lookup token.
pub type SearchTag = [u8; PRF_BYTES];

/// One `(keyword, document)` occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostingEntry {
    /// The document identifier, encrypted under the keyword's key.
    pub(crate) ciphertext: Vec<u8>,
    /// `crossIdentifier * counterFactor^-1 mod (p - 1)`.
    pub(crate) y: BigUint,
}

impl PostingEntry {
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn y(&self) -> &BigUint {
        &self.y
    }
}

/// Encrypted OXT index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncryptedIndex {
    posting_lists: HashMap<SearchTag, Vec<PostingEntry>>,
    cross_tags: HashSet<BigUint>,
}

/// On-disk layout: posting lists keyed by base64 search tag, cross-tags and exponents as
/// big-endian integer bytes.
#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    posting_lists: BTreeMap<String, Vec<(Vec<u8>, Vec<u8>)>>,
    cross_tags: Vec<Vec<u8>>,
}

impl EncryptedIndex {
    /// Stores the posting lists under opaque search tags.
    ///
    /// Returns the freshly generated search tag key alongside the index. The client keeps the key
    /// to derive search tags for its queries.
    pub fn setup<R: RngCore + CryptoRng>(
        posting_lists: BTreeMap<String, Vec<PostingEntry>>,
        cross_tags: HashSet<BigUint>,
        rng: &mut R,
    ) -> (SecretKey, Self) {
        let key = SecretKey::random(rng);

        let posting_lists: HashMap<SearchTag, Vec<PostingEntry>> = posting_lists
            .into_iter()
            .map(|(keyword, list)| (prf(key.as_bytes(), keyword.as_bytes()), list))
            .collect();

        debug!(
            keywords = posting_lists.len(),
            cross_tags = cross_tags.len(),
            "encrypted index stored"
        );

        (
            key,
            EncryptedIndex {
                posting_lists,
                cross_tags,
            },
        )
    }

    /// The posting list stored under `tag`, or an empty list for unknown tags.
    pub fn retrieve_posting_list(&self, tag: &SearchTag) -> &[PostingEntry] {
        self.posting_lists
            .get(tag)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Set-membership test against the cross-tags.
    pub fn contains_membership_tag(&self, candidate: &BigUint) -> bool {
        self.cross_tags.contains(candidate)
    }

    /// Number of stored posting lists, i.e. distinct keywords.
    pub fn keyword_count(&self) -> usize {
        self.posting_lists.len()
    }

    /// Total number of posting entries over all lists.
    pub fn entry_count(&self) -> usize {
        self.posting_lists.values().map(Vec::len).sum()
    }

    pub fn cross_tag_count(&self) -> usize {
        self.cross_tags.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let persisted = PersistedIndex {
            posting_lists: self
                .posting_lists
                .iter()
                .map(|(tag, list)| {
                    let entries = list
                        .iter()
                        .map(|e| (e.ciphertext.clone(), e.y.to_bytes_be()))
                        .collect();
                    (STANDARD.encode(tag), entries)
                })
                .collect(),
            cross_tags: self.cross_tags.iter().map(BigUint::to_bytes_be).collect(),
        };

        Ok(bincode::serialize(&persisted)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let persisted: PersistedIndex = bincode::deserialize(bytes)?;

        let mut posting_lists = HashMap::with_capacity(persisted.posting_lists.len());
        for (encoded, entries) in persisted.posting_lists {
            let tag: SearchTag = STANDARD
                .decode(&encoded)?
                .try_into()
                .map_err(|_| Error::Serialization(format!("bad search tag length: {encoded}")))?;

            let list = entries
                .into_iter()
                .map(|(ciphertext, y)| PostingEntry {
                    ciphertext,
                    y: BigUint::from_bytes_be(&y),
                })
                .collect();

            posting_lists.insert(tag, list);
        }

        let cross_tags = persisted
            .cross_tags
            .iter()
            .map(|b| BigUint::from_bytes_be(b))
            .collect();

        Ok(EncryptedIndex {
            posting_lists,
            cross_tags,
        })
    }
}
