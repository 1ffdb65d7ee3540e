//! provides basic math functions

use rand::rngs::OsRng;
use rand::Rng;

pub mod primes;

/// represents the public share modulus M
///
/// Every share lies in [0, M). The upper bound on M keeps all protocol
/// intermediates (at most 2M² + M) representable in a u128.
/// Example:
/// ```
/// use beaver::math::ShareModulus;
///
/// let modulus = ShareModulus::new(101).unwrap();
/// let x = modulus.random();
/// let y = modulus.random();
/// println!("{x} * {y} = {}", modulus.mul(x, y));
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ShareModulus(u64);

impl ShareModulus {
    pub const MAX_BITS: u32 = 63;

    /// constructs a modulus; `None` unless 2 <= modulus < 2^63
    pub fn new(modulus: u64) -> Option<Self> {
        if modulus >= 2 && modulus < 1 << Self::MAX_BITS {
            Some(Self(modulus))
        } else {
            None
        }
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// reduce an intermediate value into [0, M)
    pub fn reduce(self, value: u128) -> u64 {
        (value % self.0 as u128) as u64
    }

    pub fn add(self, a: u64, b: u64) -> u64 {
        self.reduce(a as u128 + b as u128)
    }

    pub fn sub(self, a: u64, b: u64) -> u64 {
        self.reduce(a as u128 + (self.0 - b % self.0) as u128)
    }

    pub fn mul(self, a: u64, b: u64) -> u64 {
        self.reduce(a as u128 * b as u128)
    }

    /// draw uniformly from [0, M) with fresh OS randomness
    pub fn random(self) -> u64 {
        OsRng.gen_range(0..self.0)
    }

    /// largest plaintext the cryptosystem must represent exactly:
    /// a lifted masked cross term is bounded by 2M² + M
    pub fn cross_bound(self) -> u128 {
        let m = self.0 as u128;
        2 * m * m + m
    }
}

#[test]
fn test_bounds() {
    assert_eq!(None, ShareModulus::new(0));
    assert_eq!(None, ShareModulus::new(1));
    assert_eq!(None, ShareModulus::new(1 << 63));
    assert!(ShareModulus::new(2).is_some());
    assert!(ShareModulus::new((1 << 63) - 1).is_some());
}

#[test]
fn test_arithmetic() {
    let m = ShareModulus::new(101).unwrap();
    assert_eq!(43, m.mul(12, 12));
    assert_eq!(0, m.add(100, 1));
    assert_eq!(97, m.sub(3, 7));
    assert_eq!(38, m.reduce(78 + 101 - 40));
    // (M-1)^2 = 1 (mod M); the product would overflow a u64
    let wide = ShareModulus::new((1 << 63) - 1).unwrap();
    assert_eq!(1, wide.mul(wide.get() - 1, wide.get() - 1));
}

#[test]
fn test_range() {
    let m = ShareModulus::new(7).unwrap();
    for _ in 0..200 {
        assert!(m.random() < 7);
    }
}

#[test]
fn test_mask_freshness() {
    use std::collections::HashSet;

    let m = ShareModulus::new((1 << 61) - 1).unwrap();
    let draws: HashSet<u64> = (0..1000).map(|_| m.random()).collect();
    assert_eq!(1000, draws.len());
}
