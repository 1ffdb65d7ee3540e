//! demonstrates the functionality of triple generation
//! Panic! NEVER use this protocol because it's unsafe.

use super::Triple;
use crate::math::ShareModulus;

/// a trusted dealer that sees both parties' shares
pub struct Dealer(pub ShareModulus);

impl Dealer {
    /// draws both halves of one triple centrally and splits c at random
    pub fn deal(&self) -> (Triple, Triple) {
        let m = self.0;
        let (a1, b1) = (m.random(), m.random());
        let (a2, b2) = (m.random(), m.random());
        let product = m.mul(m.add(a1, a2), m.add(b1, b2));
        let c1 = m.random();
        let c2 = m.sub(product, c1);
        (
            Triple {
                a: a1,
                b: b1,
                c: c1,
            },
            Triple {
                a: a2,
                b: b2,
                c: c2,
            },
        )
    }
}

#[test]
fn test_correctness() {
    for modulus in [2u64, 3, 101, (1 << 61) - 1] {
        let m = ShareModulus::new(modulus).unwrap();
        let dealer = Dealer(m);
        for _ in 0..16 {
            let (one, two) = dealer.deal();
            assert_eq!(
                m.mul(m.add(one.a, two.a), m.add(one.b, two.b)),
                m.add(one.c, two.c)
            );
            for share in [one.a, one.b, one.c, two.a, two.b, two.c] {
                assert!(share < modulus);
            }
        }
    }
}
