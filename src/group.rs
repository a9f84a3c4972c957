//! Arithmetic in the multiplicative group `Z_p^*` of a large prime `p`.
//!
//! Group elements live in `[1, p)`, exponents live in `Z_{p-1}`. The OXT cross-tags rely on the
//! identity `g^(p-1) = 1`, so every exponent is reduced modulo `p - 1` before exponentiation.
//!
//! The modulus and generator are carried by a [`PrimeGroup`] value which the schemes take at
//! construction. The default is a 256-bit safe prime; [`SAFE_PRIME_64`] is a small safe prime
//! that keeps tests fast.

use crate::error::{Error, Result};
use crate::util::{prf, KEY_BYTES};
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};

/// `2^256 - 36113`, a safe prime: `(p - 1) / 2` is prime as well.
pub const SAFE_PRIME_256: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x72, 0xef,
];

/// The generator selected by [`find_generator`] for [`SAFE_PRIME_256`].
pub const SAFE_PRIME_256_GENERATOR: u32 = 5;

/// `2^64 - 1469`, a safe prime.
pub const SAFE_PRIME_64: u64 = 18_446_744_073_709_550_147;

const GENERATOR_CANDIDATES: [u32; 8] = [2, 3, 5, 7, 11, 13, 17, 19];

/// A prime-order multiplicative group together with a fixed generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimeGroup {
    p: BigUint,
    order: BigUint,
    g: BigUint,
}

impl PrimeGroup {
    /// Creates a group for the prime `p`, selecting the generator with [`find_generator`].
    ///
    /// `p` is assumed to be a safe prime; primality is not verified here.
    pub fn new(p: BigUint) -> Result<Self> {
        let g = find_generator(&p)?;
        let order = &p - 1u32;

        Ok(PrimeGroup { p, order, g })
    }

    /// The modulus `p`.
    pub fn modulus(&self) -> &BigUint {
        &self.p
    }

    /// `p - 1`, the modulus of the exponent domain.
    pub fn order(&self) -> &BigUint {
        &self.order
    }

    pub fn generator(&self) -> &BigUint {
        &self.g
    }

    /// `base^exp mod p`.
    #[inline(always)]
    pub fn pow(&self, base: &BigUint, exp: &BigUint) -> BigUint {
        base.modpow(exp, &self.p)
    }

    /// `g^(exp mod (p - 1)) mod p`.
    pub fn pow_generator(&self, exp: &BigUint) -> BigUint {
        self.g.modpow(&(exp % &self.order), &self.p)
    }

    /// Maps a PRF output into `Z_{p-1}`, coercing zero to one.
    pub fn exponent(&self, bytes: &[u8]) -> BigUint {
        let e = BigUint::from_bytes_be(bytes) % &self.order;
        if e.is_zero() {
            BigUint::one()
        } else {
            e
        }
    }

    /// PRF keyed by `key` on `value`, mapped into `[1, p - 1]`.
    pub fn randomize_exponent(&self, key: &[u8; KEY_BYTES], value: &str) -> BigUint {
        let raw = BigUint::from_bytes_be(&prf(key, value.as_bytes()));
        (raw % &self.order) + 1u32
    }

    /// Maps a PRF output to an exponent that is invertible modulo `p - 1`.
    ///
    /// Candidates below two are raised to two, then incremented (wrapping back to two) until
    /// coprime to `p - 1`.
    pub fn invertible_factor(&self, bytes: &[u8]) -> BigUint {
        let two = BigUint::from(2u32);

        let mut z = BigUint::from_bytes_be(bytes) % &self.order;
        if z < two {
            z = two.clone();
        }

        while !z.gcd(&self.order).is_one() {
            z += 1u32;
            if z >= self.order {
                z = two.clone();
            }
        }

        z
    }

    /// `a * b mod (p - 1)`.
    pub fn exponent_mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        mod_mul(a, b, &self.order)
    }

    /// The inverse of `a` modulo `p - 1`.
    pub fn exponent_inverse(&self, a: &BigUint) -> Result<BigUint> {
        mod_inverse(a, &self.order)
    }
}

impl Default for PrimeGroup {
    fn default() -> Self {
        let p = BigUint::from_bytes_be(&SAFE_PRIME_256);
        let order = &p - 1u32;

        PrimeGroup {
            p,
            order,
            g: BigUint::from(SAFE_PRIME_256_GENERATOR),
        }
    }
}

/// Finds a generator of `Z_p^*` for a safe prime `p = 2q + 1`.
///
/// Tests the small candidates in order and returns the first `g` with `g^((p-1)/2) != 1` and
/// `g^((p-1)/q) != 1`.
pub fn find_generator(p: &BigUint) -> Result<BigUint> {
    if *p <= BigUint::from(2u32) || p.is_even() {
        return Err(Error::InvalidModulus);
    }

    let one = BigUint::one();
    let order = p - 1u32;
    let q = &order / 2u32;
    let cofactor = &order / &q;

    for candidate in GENERATOR_CANDIDATES {
        let g = BigUint::from(candidate) % p;
        if g.is_zero() {
            continue;
        }

        if g.modpow(&q, p) != one && g.modpow(&cofactor, p) != one {
            return Ok(g);
        }
    }

    Err(Error::NoGeneratorFound)
}

/// Modular inverse via the extended Euclidean algorithm.
pub fn mod_inverse(a: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    if *modulus <= BigUint::one() {
        return Err(Error::InvalidModulus);
    }

    let m = BigInt::from(modulus.clone());
    let a = BigInt::from(a % modulus);

    let egcd = a.extended_gcd(&m);
    if !egcd.gcd.is_one() {
        return Err(Error::NotInvertible);
    }

    egcd.x.mod_floor(&m).to_biguint().ok_or(Error::NotInvertible)
}

#[inline(always)]
pub fn mod_mul(a: &BigUint, b: &BigUint, modulus: &BigUint) -> BigUint {
    ((a % modulus) * (b % modulus)) % modulus
}
