use byteorder::{ByteOrder, LittleEndian};
use rand::{CryptoRng, RngCore};
use tiny_keccak::{Hasher, Kmac};

/// Size of every symmetric key in bytes.
pub(crate) const KEY_BYTES: usize = 32;

/// Size of a PRF output in bytes.
pub(crate) const PRF_BYTES: usize = 32;

/// Customization string for the general-purpose PRF.
const PRF_CUSTOM: &[u8] = b"oxt-sse/prf";

/// Customization string for indexed key derivation.
const DERIVE_CUSTOM: &[u8] = b"oxt-sse/derive";

pub fn kmac256<const N: usize>(key: &[u8], custom: &[u8], parts: &[&[u8]]) -> [u8; N] {
    let mut mac = Kmac::v256(key, custom);
    for part in parts {
        mac.update(part);
    }

    let mut buf = [0u8; N];
    mac.finalize(&mut buf);

    buf
}

/// Keyed PRF over an arbitrary byte string.
#[inline(always)]
pub fn prf(key: &[u8; KEY_BYTES], input: &[u8]) -> [u8; PRF_BYTES] {
    kmac256::<PRF_BYTES>(key, PRF_CUSTOM, &[input])
}

/// Derives a key from `master` for the pair `(context, index)`.
///
/// The PRF input is `UTF-8(context) || LE64(index)`. The index is fixed width, so distinct
/// pairs never share an input.
pub fn derive_key(master: &[u8; KEY_BYTES], context: &str, index: u64) -> [u8; KEY_BYTES] {
    let mut index_bytes = [0u8; 8];
    LittleEndian::write_u64(&mut index_bytes, index);

    kmac256::<KEY_BYTES>(master, DERIVE_CUSTOM, &[context.as_bytes(), &index_bytes])
}

#[inline(always)]
pub fn random_bytes<R: RngCore + CryptoRng, const N: usize>(rng: &mut R) -> [u8; N] {
    let mut buf = [0u8; N];
    rng.fill_bytes(&mut buf);

    buf
}
