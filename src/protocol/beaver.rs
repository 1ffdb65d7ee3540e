//! beaver triple generation
//! A triple (a, b, c) with a*b = c, split additively between two parties,
//! buys one round of secure multiplication on secret-shared values.

use crate::config::Config;
use crate::crypto::paillier::Paillier;
use crate::math::ShareModulus;
use crate::protocol::error::{CryptoErrorKind, Error, Result};
use crate::protocol::party::TwoParty;
use self::semi_honest::{PartyOne, PartyTwo};
use serde::{Deserialize, Serialize};

/// one party's additive share of a multiplication triple
///
/// No share satisfies an invariant on its own; only the sum across the
/// two parties does: (a1+a2)(b1+b2) = c1+c2 (mod M).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    pub a: u64,
    pub b: u64,
    pub c: u64,
}

/// ordered shares produced by one party in one run
pub type Batch = Vec<Triple>;

/// one side of the per-triple generation protocol
pub trait TripleGen {
    fn generate(&self) -> Result<Triple>;
}

/// Runs `count` sequential rounds, appending each triple as it completes.
/// On a fatal error the completed prefix stays in `batch` and the error is
/// returned; no partial triple is ever appended.
pub fn generate_batch(gen: &impl TripleGen, count: usize, batch: &mut Batch) -> Result<()> {
    for index in 0..count {
        batch.push(gen.generate()?);
        tracing::info!(index, count, "triple generated");
    }
    Ok(())
}

/// party 1 entry point: generates the keypair, then drives the rounds
pub fn run_party1(config: &Config, batch: &mut Batch) -> Result<()> {
    let modulus = share_modulus(config)?;
    let party = TwoParty::new(0, config.rendezvous)?;
    tracing::info!(bits = config.key_bits, "generating keypair");
    let gen = PartyOne::new(party, Paillier, modulus, config.key_bits)?;
    generate_batch(&gen, config.triples, batch)
}

/// party 2 entry point: receives the public key, then follows the rounds
pub fn run_party2(config: &Config, batch: &mut Batch) -> Result<()> {
    let modulus = share_modulus(config)?;
    let party = TwoParty::new(1, config.rendezvous)?;
    let gen = PartyTwo::new(party, Paillier, modulus)?;
    generate_batch(&gen, config.triples, batch)
}

fn share_modulus(config: &Config) -> Result<ShareModulus> {
    ShareModulus::new(config.modulus).ok_or(Error::Crypto(CryptoErrorKind::Modulus))
}

pub mod functionality;
pub mod semi_honest;

#[test]
fn test_partial_batch_on_error() {
    use std::cell::Cell;

    struct Flaky {
        fail_at: usize,
        calls: Cell<usize>,
    }

    impl TripleGen for Flaky {
        fn generate(&self) -> Result<Triple> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if call == self.fail_at {
                Err(Error::Crypto(CryptoErrorKind::PlaintextOverflow))
            } else {
                Ok(Triple {
                    a: call as u64,
                    b: 0,
                    c: 0,
                })
            }
        }
    }

    let gen = Flaky {
        fail_at: 3,
        calls: Cell::new(0),
    };
    let mut batch = Batch::new();
    assert_eq!(
        Error::Crypto(CryptoErrorKind::PlaintextOverflow),
        generate_batch(&gen, 10, &mut batch).unwrap_err()
    );
    assert_eq!(3, batch.len());
    assert_eq!(2, batch[2].a);
}

#[test]
fn test_run_parties() {
    use std::net::SocketAddr;
    use std::thread;

    let config = Config {
        rendezvous: SocketAddr::from(([127, 0, 0, 1], 7943)),
        modulus: (1 << 31) - 1,
        triples: 3,
        key_bits: 256,
    };
    let mut one = Batch::new();
    let mut two = Batch::new();
    thread::scope(|scope| {
        scope.spawn(|| run_party1(&config, &mut one).unwrap());
        scope.spawn(|| run_party2(&config, &mut two).unwrap());
    });
    assert_eq!(3, one.len());
    assert_eq!(3, two.len());
    let m = ShareModulus::new(config.modulus).unwrap();
    for (one, two) in one.iter().zip(&two) {
        assert_eq!(
            m.mul(m.add(one.a, two.a), m.add(one.b, two.b)),
            m.add(one.c, two.c)
        );
    }
}
