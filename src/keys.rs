//! Client-side key material.
//!
//! Five independent 32-byte keys are generated per index build. Four are drawn by the client,
//! the search tag key is generated by [`EncryptedIndex::setup`](crate::index::EncryptedIndex::setup)
//! and handed back. None of them ever leaves the client.

use crate::util::{random_bytes, KEY_BYTES};
use crate::Compress;
use arrayref::{array_refs, mut_array_refs};
use core::fmt;
use rand::{CryptoRng, RngCore};
use subtle::{Choice, ConstantTimeEq, CtOption};

/// Size of a serialized [`KeyMaterial`].
pub const KEY_MATERIAL_BYTES: usize = 5 * KEY_BYTES;

/// A 256-bit symmetric key.
#[derive(Clone)]
pub struct SecretKey(pub(crate) [u8; KEY_BYTES]);

impl SecretKey {
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        SecretKey(random_bytes(rng))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.0
    }

    fn is_zero(&self) -> Choice {
        self.0[..].ct_eq(&[0u8; KEY_BYTES][..])
    }
}

impl ConstantTimeEq for SecretKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[..].ct_eq(&other.0[..])
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Keys produced by an OXT index build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Seed for the per-keyword identifier encryption keys.
    pub(crate) doc_enc_seed: SecretKey,
    /// Derives the per-keyword cross-tag factor.
    pub(crate) cross_tag: SecretKey,
    /// Derives the per-document cross-identifier.
    pub(crate) doc_index: SecretKey,
    /// Derives the per-(keyword, occurrence) counter factor.
    pub(crate) counter: SecretKey,
    /// Derives opaque search tags; generated by the index store.
    pub(crate) search_tag: SecretKey,
}

/// The four keys the client draws before the index store has run.
pub(crate) struct BuildKeys {
    pub(crate) doc_enc_seed: SecretKey,
    pub(crate) cross_tag: SecretKey,
    pub(crate) doc_index: SecretKey,
    pub(crate) counter: SecretKey,
}

impl BuildKeys {
    pub(crate) fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        BuildKeys {
            doc_enc_seed: SecretKey::random(rng),
            cross_tag: SecretKey::random(rng),
            doc_index: SecretKey::random(rng),
            counter: SecretKey::random(rng),
        }
    }

    pub(crate) fn finish(self, search_tag: SecretKey) -> KeyMaterial {
        KeyMaterial {
            doc_enc_seed: self.doc_enc_seed,
            cross_tag: self.cross_tag,
            doc_index: self.doc_index,
            counter: self.counter,
            search_tag,
        }
    }
}

impl Compress for KeyMaterial {
    const OUTPUT_SIZE: usize = KEY_MATERIAL_BYTES;
    type Output = [u8; KEY_MATERIAL_BYTES];

    fn to_bytes(&self) -> [u8; KEY_MATERIAL_BYTES] {
        let mut buf = [0u8; KEY_MATERIAL_BYTES];
        let (enc, xtag, ind, cnt, stag) =
            mut_array_refs![&mut buf, KEY_BYTES, KEY_BYTES, KEY_BYTES, KEY_BYTES, KEY_BYTES];

        *enc = self.doc_enc_seed.0;
        *xtag = self.cross_tag.0;
        *ind = self.doc_index.0;
        *cnt = self.counter.0;
        *stag = self.search_tag.0;

        buf
    }

    /// Decodes key material, rejecting it if any of the keys is all-zero.
    fn from_bytes(bytes: &[u8; KEY_MATERIAL_BYTES]) -> CtOption<Self> {
        let (enc, xtag, ind, cnt, stag) =
            array_refs![bytes, KEY_BYTES, KEY_BYTES, KEY_BYTES, KEY_BYTES, KEY_BYTES];

        let km = KeyMaterial {
            doc_enc_seed: SecretKey(*enc),
            cross_tag: SecretKey(*xtag),
            doc_index: SecretKey(*ind),
            counter: SecretKey(*cnt),
            search_tag: SecretKey(*stag),
        };

        let any_zero = km.doc_enc_seed.is_zero()
            | km.cross_tag.is_zero()
            | km.doc_index.is_zero()
            | km.counter.is_zero()
            | km.search_tag.is_zero();

        CtOption::new(km, !any_zero)
    }
}
