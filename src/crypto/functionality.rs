//! demonstrates the functionality of an additively homomorphic scheme
//! Panic! NEVER use this scheme because it's unsafe.

use super::Cryptosystem;
use crate::protocol::error::Result;

/// "encrypts" by doing the homomorphic arithmetic on plaintexts mod 2^128
pub struct Plain;

impl Cryptosystem for Plain {
    type PublicKey = ();
    type PrivateKey = ();
    type Ciphertext = u128;

    fn generate_keypair(&self, _bits: u32) -> Result<((), ())> {
        Ok(((), ()))
    }

    fn encrypt(&self, _key: &(), value: u128) -> Result<u128> {
        Ok(value)
    }

    fn decrypt(&self, _key: &(), cipher: &u128) -> Result<u128> {
        Ok(*cipher)
    }

    fn add(&self, _key: &(), lhs: &u128, rhs: &u128) -> Result<u128> {
        Ok(lhs.wrapping_add(*rhs))
    }

    fn sub(&self, _key: &(), lhs: &u128, rhs: &u128) -> Result<u128> {
        Ok(lhs.wrapping_sub(*rhs))
    }

    fn sub_plain(&self, _key: &(), lhs: &u128, value: u128) -> Result<u128> {
        Ok(lhs.wrapping_sub(value))
    }

    fn mul_plain(&self, _key: &(), lhs: &u128, value: u128) -> Result<u128> {
        Ok(lhs.wrapping_mul(value))
    }

    fn plaintext_capacity(&self, _key: &()) -> u128 {
        u128::MAX
    }
}

#[test]
fn test_identities() {
    let (pk, sk) = Plain.generate_keypair(0).unwrap();
    let x = Plain.encrypt(&pk, 63).unwrap();
    let y = Plain.encrypt(&pk, 15).unwrap();
    assert_eq!(78, Plain.decrypt(&sk, &Plain.add(&pk, &x, &y).unwrap()).unwrap());
    assert_eq!(48, Plain.decrypt(&sk, &Plain.sub(&pk, &x, &y).unwrap()).unwrap());
    assert_eq!(23, Plain.decrypt(&sk, &Plain.sub_plain(&pk, &x, 40).unwrap()).unwrap());
    assert_eq!(945, Plain.decrypt(&sk, &Plain.mul_plain(&pk, &x, 15).unwrap()).unwrap());
}
