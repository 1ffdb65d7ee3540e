//! additively homomorphic encryption consumed by the protocols

use crate::protocol::error::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// Abstract additively homomorphic public-key cryptosystem.
///
/// Implementations must preserve the algebraic identity
/// `decrypt(op(encrypt(x), y)) == x op y` for every operation below and
/// all x, y representable in the scheme's plaintext space.
pub trait Cryptosystem {
    type PublicKey: Clone + Debug + Serialize + DeserializeOwned + Send;
    type PrivateKey: Send;
    type Ciphertext: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send;

    /// `bits` is a security parameter, not a correctness parameter
    fn generate_keypair(&self, bits: u32) -> Result<(Self::PublicKey, Self::PrivateKey)>;

    fn encrypt(&self, key: &Self::PublicKey, value: u128) -> Result<Self::Ciphertext>;

    fn decrypt(&self, key: &Self::PrivateKey, cipher: &Self::Ciphertext) -> Result<u128>;

    /// Enc(x) + Enc(y) -> Enc(x + y)
    fn add(
        &self,
        key: &Self::PublicKey,
        lhs: &Self::Ciphertext,
        rhs: &Self::Ciphertext,
    ) -> Result<Self::Ciphertext>;

    /// Enc(x) - Enc(y) -> Enc(x - y)
    fn sub(
        &self,
        key: &Self::PublicKey,
        lhs: &Self::Ciphertext,
        rhs: &Self::Ciphertext,
    ) -> Result<Self::Ciphertext>;

    /// Enc(x) - y -> Enc(x - y) without encrypting y
    fn sub_plain(
        &self,
        key: &Self::PublicKey,
        lhs: &Self::Ciphertext,
        value: u128,
    ) -> Result<Self::Ciphertext>;

    /// Enc(x) * y -> Enc(x * y) without decrypting
    fn mul_plain(
        &self,
        key: &Self::PublicKey,
        lhs: &Self::Ciphertext,
        value: u128,
    ) -> Result<Self::Ciphertext>;

    /// largest value v such that every plaintext in [0, v] round-trips exactly
    fn plaintext_capacity(&self, key: &Self::PublicKey) -> u128;
}

pub mod functionality;
pub mod paillier;
