//! implements the Paillier cryptosystem
//! Public-Key Cryptosystems Based on Composite Degree Residuosity Classes
//! https://link.springer.com/chapter/10.1007/3-540-48910-X_16

use super::Cryptosystem;
use crate::math::primes;
use crate::protocol::error::{CryptoErrorKind, Error, Result};
use crypto_bigint::modular::{BoxedMontyForm, BoxedMontyParams};
use crypto_bigint::{BoxedUint, NonZero, RandomMod};
use rand::rngs::OsRng;
use serde::de::{Deserializer, Error as _};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

const MIN_KEY_BITS: u32 = 256;

/// the scheme with modulus N = pq, generator g = N + 1, plaintext space Z_N
pub struct Paillier;

/// encryption half of a keypair; safe to hand to the peer
#[derive(Clone, Debug)]
pub struct PublicKey {
    n: NonZero<BoxedUint>,
    /// Montgomery domain mod N², where ciphertexts live
    params: BoxedMontyParams,
}

/// decryption half of a keypair; never leaves the owning process
#[derive(Debug)]
pub struct PrivateKey {
    bits: u32,
    /// (p-1)(q-1)
    phi: BoxedUint,
    /// phi^-1 mod N
    mu: BoxedUint,
    n_wide: NonZero<BoxedUint>,
    params_n: BoxedMontyParams,
    params_n2: BoxedMontyParams,
}

/// opaque element of Z_N², stored out of Montgomery form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ciphertext(BoxedUint);

impl PublicKey {
    /// rebuilds the derived Montgomery domain from the bare modulus
    pub fn from_modulus(n: BoxedUint) -> Result<Self> {
        let squared = n.mul(&n);
        let params = BoxedMontyParams::new(
            Option::from(squared.to_odd()).ok_or(Error::Crypto(CryptoErrorKind::KeySize))?,
        );
        let n = Option::from(NonZero::new(n)).ok_or(Error::Crypto(CryptoErrorKind::KeySize))?;
        Ok(Self { n, params })
    }

    fn key_bits(&self) -> u32 {
        self.n.as_ref().bits_precision()
    }

    /// lift a ciphertext representative into the mod-N² Montgomery domain
    fn form(&self, value: &BoxedUint) -> Result<BoxedMontyForm> {
        let value = at_precision(value, 2 * self.key_bits())?;
        Ok(BoxedMontyForm::new(value, self.params.clone()))
    }

    /// g^m = 1 + mN (mod N²), the deterministic part of an encryption
    fn one_plus_mn(&self, m: &BoxedUint) -> Result<BoxedMontyForm> {
        let wide = 2 * self.key_bits();
        let m = BoxedMontyForm::new(at_precision(m, wide)?, self.params.clone());
        let n = BoxedMontyForm::new(self.n.as_ref().clone().widen(wide), self.params.clone());
        Ok(m * n + BoxedMontyForm::one(self.params.clone()))
    }

    /// encode a plaintext, checking it fits Z_N
    fn plaintext(&self, value: u128) -> Result<BoxedUint> {
        let m = at_precision(&BoxedUint::from(value), self.key_bits())?;
        if m >= *self.n.as_ref() {
            return Err(Error::Crypto(CryptoErrorKind::PlaintextOverflow));
        }
        Ok(m)
    }
}

impl Cryptosystem for Paillier {
    type PublicKey = PublicKey;
    type PrivateKey = PrivateKey;
    type Ciphertext = Ciphertext;

    fn generate_keypair(&self, bits: u32) -> Result<(PublicKey, PrivateKey)> {
        if bits < MIN_KEY_BITS || bits % 128 != 0 {
            return Err(Error::Crypto(CryptoErrorKind::KeySize));
        }
        let half = bits / 2;
        let p = primes::random_prime(half);
        let q = loop {
            let q = primes::random_prime(half);
            if q != p {
                break q;
            }
        };
        let n = p.mul(&q);
        let key = PublicKey::from_modulus(n.clone())?;
        let one = BoxedUint::one().widen(half);
        let phi = p.wrapping_sub(&one).mul(&q.wrapping_sub(&one));
        let params_n = BoxedMontyParams::new(
            Option::from(n.clone().to_odd()).ok_or(Error::Crypto(CryptoErrorKind::KeySize))?,
        );
        let mu = Option::<BoxedMontyForm>::from(
            BoxedMontyForm::new(phi.clone(), params_n.clone()).invert(),
        )
        .ok_or(Error::Crypto(CryptoErrorKind::NotInvertible))?
        .retrieve();
        let n_wide = Option::from(NonZero::new(n.clone().widen(2 * bits)))
            .ok_or(Error::Crypto(CryptoErrorKind::KeySize))?;
        let private = PrivateKey {
            bits,
            phi,
            mu,
            n_wide,
            params_n,
            params_n2: key.params.clone(),
        };
        Ok((key, private))
    }

    fn encrypt(&self, key: &PublicKey, value: u128) -> Result<Ciphertext> {
        let g_m = key.one_plus_mn(&key.plaintext(value)?)?;
        // fresh unit randomness per ciphertext
        let r = loop {
            let r = BoxedUint::random_mod(&mut OsRng, &key.n);
            if bool::from(r.is_zero()) {
                continue;
            }
            let r = key.form(&r)?;
            if Option::<BoxedMontyForm>::from(r.invert()).is_some() {
                break r;
            }
        };
        // todo: precompute fixed-base windows for r^N when batches are large
        Ok(Ciphertext((g_m * r.pow(key.n.as_ref())).retrieve()))
    }

    fn decrypt(&self, key: &PrivateKey, cipher: &Ciphertext) -> Result<u128> {
        let c = at_precision(&cipher.0, 2 * key.bits)?;
        let u = BoxedMontyForm::new(c, key.params_n2.clone())
            .pow(&key.phi)
            .retrieve();
        // L(u) = (u - 1) / N, exact by construction
        let l = u
            .wrapping_sub(&BoxedUint::one().widen(2 * key.bits))
            .div_rem(&key.n_wide)
            .0;
        let l = at_precision(&l, key.bits)?;
        let m = BoxedMontyForm::new(l, key.params_n.clone())
            * BoxedMontyForm::new(key.mu.clone(), key.params_n.clone());
        to_u128(&m.retrieve())
    }

    fn add(&self, key: &PublicKey, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        Ok(Ciphertext((key.form(&lhs.0)? * key.form(&rhs.0)?).retrieve()))
    }

    fn sub(&self, key: &PublicKey, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        let inverse = Option::<BoxedMontyForm>::from(key.form(&rhs.0)?.invert())
            .ok_or(Error::Crypto(CryptoErrorKind::NotInvertible))?;
        Ok(Ciphertext((key.form(&lhs.0)? * inverse).retrieve()))
    }

    fn sub_plain(&self, key: &PublicKey, lhs: &Ciphertext, value: u128) -> Result<Ciphertext> {
        // g^value is always a unit: it is congruent to 1 mod N
        let inverse = Option::<BoxedMontyForm>::from(
            key.one_plus_mn(&key.plaintext(value)?)?.invert(),
        )
        .ok_or(Error::Crypto(CryptoErrorKind::NotInvertible))?;
        Ok(Ciphertext((key.form(&lhs.0)? * inverse).retrieve()))
    }

    fn mul_plain(&self, key: &PublicKey, lhs: &Ciphertext, value: u128) -> Result<Ciphertext> {
        Ok(Ciphertext(
            key.form(&lhs.0)?.pow(&BoxedUint::from(value)).retrieve(),
        ))
    }

    fn plaintext_capacity(&self, key: &PublicKey) -> u128 {
        let n = key.n.as_ref();
        if n.bits() > 128 {
            u128::MAX
        } else {
            to_u128(n).unwrap_or(u128::MAX).saturating_sub(1)
        }
    }
}

/// clamp a value to an exact bit precision, erroring if it cannot fit
fn at_precision(value: &BoxedUint, bits: u32) -> Result<BoxedUint> {
    if value.bits_precision() == bits {
        Ok(value.clone())
    } else if value.bits_precision() < bits {
        Ok(value.clone().widen(bits))
    } else if value.bits() <= bits {
        Ok(value.clone().shorten(bits))
    } else {
        Err(Error::Crypto(CryptoErrorKind::PlaintextOverflow))
    }
}

fn to_u128(value: &BoxedUint) -> Result<u128> {
    if value.bits() > 128 {
        return Err(Error::Crypto(CryptoErrorKind::PlaintextOverflow));
    }
    let words = value.as_words();
    let low = words[0] as u128;
    let high = words.get(1).copied().unwrap_or(0) as u128;
    Ok(low | high << 64)
}

impl Serialize for Ciphertext {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.to_be_bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ciphertext {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        BoxedUint::from_be_slice(&bytes, bytes.len() as u32 * 8)
            .map(Ciphertext)
            .map_err(D::Error::custom)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.n.as_ref().to_be_bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        let n = BoxedUint::from_be_slice(&bytes, bytes.len() as u32 * 8).map_err(D::Error::custom)?;
        PublicKey::from_modulus(n).map_err(D::Error::custom)
    }
}

#[test]
fn test_identities() {
    let (pk, sk) = Paillier.generate_keypair(256).unwrap();
    let x = Paillier.encrypt(&pk, 63).unwrap();
    let y = Paillier.encrypt(&pk, 15).unwrap();
    assert_eq!(63, Paillier.decrypt(&sk, &x).unwrap());
    assert_eq!(
        78,
        Paillier.decrypt(&sk, &Paillier.add(&pk, &x, &y).unwrap()).unwrap()
    );
    assert_eq!(
        48,
        Paillier.decrypt(&sk, &Paillier.sub(&pk, &x, &y).unwrap()).unwrap()
    );
    assert_eq!(
        23,
        Paillier
            .decrypt(&sk, &Paillier.sub_plain(&pk, &x, 40).unwrap())
            .unwrap()
    );
    assert_eq!(
        945,
        Paillier
            .decrypt(&sk, &Paillier.mul_plain(&pk, &x, 15).unwrap())
            .unwrap()
    );
}

#[test]
fn test_masked_cross_term_shape() {
    // the exact combination the triple protocol performs
    let (pk, sk) = Paillier.generate_keypair(256).unwrap();
    let enc_a1 = Paillier.encrypt(&pk, 7).unwrap();
    let enc_b1 = Paillier.encrypt(&pk, 3).unwrap();
    let cross = Paillier
        .add(
            &pk,
            &Paillier.mul_plain(&pk, &enc_a1, 9).unwrap(),
            &Paillier.mul_plain(&pk, &enc_b1, 5).unwrap(),
        )
        .unwrap();
    let lifted = Paillier
        .add(&pk, &cross, &Paillier.encrypt(&pk, 101).unwrap())
        .unwrap();
    let masked = Paillier.sub_plain(&pk, &lifted, 40).unwrap();
    assert_eq!(78 + 101 - 40, Paillier.decrypt(&sk, &masked).unwrap());
}

#[test]
fn test_randomized_ciphertexts() {
    let (pk, _sk) = Paillier.generate_keypair(256).unwrap();
    assert_ne!(
        Paillier.encrypt(&pk, 63).unwrap(),
        Paillier.encrypt(&pk, 63).unwrap()
    );
}

#[test]
fn test_serde_roundtrip() {
    let (pk, sk) = Paillier.generate_keypair(256).unwrap();
    let wire = serde_json::to_vec(&pk).unwrap();
    let restored: PublicKey = serde_json::from_slice(&wire).unwrap();
    let cipher = Paillier.encrypt(&restored, 59).unwrap();
    let wire = serde_json::to_vec(&cipher).unwrap();
    let restored: Ciphertext = serde_json::from_slice(&wire).unwrap();
    assert_eq!(cipher, restored);
    assert_eq!(59, Paillier.decrypt(&sk, &restored).unwrap());
}

#[test]
fn test_rejects_bad_key_sizes() {
    for bits in [0, 100, 130, 255] {
        assert_eq!(
            Error::Crypto(CryptoErrorKind::KeySize),
            Paillier.generate_keypair(bits).unwrap_err()
        );
    }
}

#[test]
fn test_capacity() {
    let (pk, _sk) = Paillier.generate_keypair(256).unwrap();
    assert_eq!(u128::MAX, Paillier.plaintext_capacity(&pk));
}
