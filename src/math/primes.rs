//! prime number arithmetic

use crypto_bigint::modular::{BoxedMontyForm, BoxedMontyParams};
use crypto_bigint::{BoxedUint, Integer, NonZero, RandomMod};
use rand::rngs::OsRng;

const MAX_ITERTIME: usize = 128;

/// Miller-Rabin pseudo-primality test
pub fn is_prime(n: &BoxedUint) -> bool {
    if bool::from(n.is_even()) {
        return eq_u64(n, 2);
    }
    if bool::from(n.is_zero()) || eq_u64(n, 1) {
        return false;
    }
    let params = BoxedMontyParams::new(n.to_odd().unwrap());
    let one = BoxedMontyForm::one(params.clone());
    let minus_one = -one.clone();
    let t = n.wrapping_sub(&BoxedUint::one().widen(n.bits_precision()));
    let h = t.trailing_zeros();
    let t = t >> h;
    let modulus = NonZero::new(n.clone()).unwrap();
    for _ in 0..MAX_ITERTIME {
        let a = BoxedUint::random_mod(&mut OsRng, &modulus);
        if a.bits() < 2 {
            continue;
        }
        let mut b = BoxedMontyForm::new(a, params.clone()).pow(&t);
        if b == one {
            continue;
        }
        let mut witness = true;
        for _ in 0..h {
            if b == minus_one {
                witness = false;
                break;
            }
            if b == one {
                break;
            }
            b = &b * &b;
        }
        if witness {
            return false;
        }
    }
    true
}

/// draws random odd candidates of the given bit size (top bit set) until
/// one passes the primality test
pub fn random_prime(bits: u32) -> BoxedUint {
    let bound = NonZero::new(BoxedUint::one().widen(bits + 64) << bits).unwrap();
    let mask = (BoxedUint::one().widen(bits) << (bits - 1)) | BoxedUint::one().widen(bits);
    loop {
        let candidate = BoxedUint::random_mod(&mut OsRng, &bound).shorten(bits) | &mask;
        if is_prime(&candidate) {
            return candidate;
        }
    }
}

fn eq_u64(n: &BoxedUint, value: u64) -> bool {
    n.bits() <= 64 && n.as_words()[0] == value
}

#[test]
fn test_known_primes() {
    for prime in [2u64, 3, 5, 7, 7919, (1 << 31) - 1] {
        assert!(is_prime(&BoxedUint::from(prime)), "{prime}");
    }
}

#[test]
fn test_known_composites() {
    // 561 and 6601 are Carmichael numbers
    for composite in [0u64, 1, 4, 9, 561, 6601, 7917, 3 * 7919] {
        assert!(!is_prime(&BoxedUint::from(composite)), "{composite}");
    }
}

#[test]
fn test_random_prime() {
    let p = random_prime(64);
    assert_eq!(64, p.bits());
    assert!(is_prime(&p));
    assert!(bool::from(p.is_odd()));
}
