//! implements the masked-cross-term triple protocol
//! Efficient Multiparty Protocols Using Circuit Randomization
//! https://link.springer.com/chapter/10.1007/3-540-46766-1_34

use super::{Triple, TripleGen};
use crate::crypto::Cryptosystem;
use crate::math::ShareModulus;
use crate::protocol::error::{CryptoErrorKind, Error, ProtocolErrorKind, Result};
use crate::protocol::party::TwoParty;
use serde::{Deserialize, Serialize};

/// protocol messages, in wire order
#[derive(Serialize, Deserialize)]
enum Message<P, C> {
    /// run preamble, party 1 to party 2: the encrypting key
    PublicKey(P),
    /// per round, party 1 to party 2: Enc(a1), Enc(b1)
    Pair(C, C),
    /// per round, party 2 to party 1: Enc(cross_sum + M - r2)
    Cross(C),
}

type Msg<C> = Message<<C as Cryptosystem>::PublicKey, <C as Cryptosystem>::Ciphertext>;

impl<P, C> Message<P, C> {
    fn into_public_key(self) -> Result<P> {
        match self {
            Message::PublicKey(key) => Ok(key),
            _ => Err(Error::Protocol(ProtocolErrorKind::UnexpectedMessage)),
        }
    }

    fn into_pair(self) -> Result<(C, C)> {
        match self {
            Message::Pair(a, b) => Ok((a, b)),
            _ => Err(Error::Protocol(ProtocolErrorKind::UnexpectedMessage)),
        }
    }

    fn into_cross(self) -> Result<C> {
        match self {
            Message::Cross(cross) => Ok(cross),
            _ => Err(Error::Protocol(ProtocolErrorKind::UnexpectedMessage)),
        }
    }
}

/// the key-holding role: contributes a1, b1 and decrypts the masked cross term
pub struct PartyOne<C: Cryptosystem> {
    party: TwoParty,
    scheme: C,
    modulus: ShareModulus,
    public: C::PublicKey,
    private: C::PrivateKey,
}

impl<C: Cryptosystem> PartyOne<C> {
    /// generates a keypair sized by `key_bits` and shares the public half
    pub fn new(party: TwoParty, scheme: C, modulus: ShareModulus, key_bits: u32) -> Result<Self> {
        let (public, private) = scheme.generate_keypair(key_bits)?;
        if scheme.plaintext_capacity(&public) < modulus.cross_bound() {
            return Err(Error::Crypto(CryptoErrorKind::KeySize));
        }
        party.push_value(&Msg::<C>::PublicKey(public.clone()))?;
        Ok(Self {
            party,
            scheme,
            modulus,
            public,
            private,
        })
    }

    /// one protocol round with the random draws fixed by the caller
    fn round(&self, a1: u64, b1: u64) -> Result<Triple> {
        let m = self.modulus;
        let c1_local = m.mul(a1, b1);
        let enc_a1 = self.scheme.encrypt(&self.public, a1 as u128)?;
        let enc_b1 = self.scheme.encrypt(&self.public, b1 as u128)?;
        self.party.push_value(&Msg::<C>::Pair(enc_a1, enc_b1))?;
        tracing::debug!("sent encrypted pair");
        let cross = self.party.pull_value::<Msg<C>>()?.into_cross()?;
        // the only decryption in the protocol: the cross term, already masked by r2
        let cross = m.reduce(self.scheme.decrypt(&self.private, &cross)?);
        Ok(Triple {
            a: a1,
            b: b1,
            c: m.add(c1_local, cross),
        })
    }
}

impl<C: Cryptosystem> TripleGen for PartyOne<C> {
    fn generate(&self) -> Result<Triple> {
        self.round(self.modulus.random(), self.modulus.random())
    }
}

/// the masking role: contributes a2, b2 and blinds the cross term with r2
pub struct PartyTwo<C: Cryptosystem> {
    party: TwoParty,
    scheme: C,
    modulus: ShareModulus,
    public: C::PublicKey,
}

impl<C: Cryptosystem> PartyTwo<C> {
    /// receives the peer's public key before any round starts
    pub fn new(party: TwoParty, scheme: C, modulus: ShareModulus) -> Result<Self> {
        let public = party.pull_value::<Msg<C>>()?.into_public_key()?;
        if scheme.plaintext_capacity(&public) < modulus.cross_bound() {
            return Err(Error::Crypto(CryptoErrorKind::KeySize));
        }
        Ok(Self {
            party,
            scheme,
            modulus,
            public,
        })
    }

    /// one protocol round with the random draws fixed by the caller
    fn round(&self, a2: u64, b2: u64, r2: u64) -> Result<Triple> {
        let m = self.modulus;
        let (enc_a1, enc_b1) = self.party.pull_value::<Msg<C>>()?.into_pair()?;
        let c2_local = m.mul(a2, b2);
        // Enc(a1*b2 + a2*b1), using only homomorphic operations
        let cross_sum = self.scheme.add(
            &self.public,
            &self.scheme.mul_plain(&self.public, &enc_a1, b2 as u128)?,
            &self.scheme.mul_plain(&self.public, &enc_b1, a2 as u128)?,
        )?;
        // lift by M before masking: the plaintext stays non-negative, so the
        // peer's mod-M reduction agrees with the scheme's own arithmetic
        let lifted = self.scheme.add(
            &self.public,
            &cross_sum,
            &self.scheme.encrypt(&self.public, m.get() as u128)?,
        )?;
        let masked = self.scheme.sub_plain(&self.public, &lifted, r2 as u128)?;
        self.party.push_value(&Msg::<C>::Cross(masked))?;
        tracing::debug!("sent masked cross term");
        // r2 is added back here, cancelling its subtraction on the peer's side
        Ok(Triple {
            a: a2,
            b: b2,
            c: m.add(c2_local, r2),
        })
    }
}

impl<C: Cryptosystem> TripleGen for PartyTwo<C> {
    fn generate(&self) -> Result<Triple> {
        self.round(
            self.modulus.random(),
            self.modulus.random(),
            self.modulus.random(),
        )
    }
}

#[cfg(test)]
fn holds(m: ShareModulus, one: &Triple, two: &Triple) -> bool {
    m.mul(m.add(one.a, two.a), m.add(one.b, two.b)) == m.add(one.c, two.c)
}

#[test]
fn test_correctness() {
    use crate::crypto::paillier::Paillier;
    use std::net::SocketAddr;
    use std::thread;

    let rendezvous = SocketAddr::from(([127, 0, 0, 1], 7941));
    let modulus = ShareModulus::new(101).unwrap();
    let mut one = None;
    let mut two = None;
    thread::scope(|scope| {
        scope.spawn(|| {
            let party = TwoParty::new(0, rendezvous).unwrap();
            let gen = PartyOne::new(party, Paillier, modulus, 256).unwrap();
            one = Some(gen.generate().unwrap());
        });
        scope.spawn(|| {
            let party = TwoParty::new(1, rendezvous).unwrap();
            let gen = PartyTwo::new(party, Paillier, modulus).unwrap();
            two = Some(gen.generate().unwrap());
        });
    });
    let (one, two) = (one.unwrap(), two.unwrap());
    assert!(holds(modulus, &one, &two));
    for share in [one.a, one.b, one.c, two.a, two.b, two.c] {
        assert!(share < 101);
    }
}

#[test]
fn test_worked_example() {
    use crate::crypto::functionality::Plain;
    use std::net::SocketAddr;
    use std::thread;

    let rendezvous = SocketAddr::from(([127, 0, 0, 1], 7942));
    let modulus = ShareModulus::new(101).unwrap();
    let mut one = None;
    let mut two = None;
    thread::scope(|scope| {
        scope.spawn(|| {
            let party = TwoParty::new(0, rendezvous).unwrap();
            let gen = PartyOne::new(party, Plain, modulus, 256).unwrap();
            one = Some(gen.round(7, 3).unwrap());
        });
        scope.spawn(|| {
            let party = TwoParty::new(1, rendezvous).unwrap();
            let gen = PartyTwo::new(party, Plain, modulus).unwrap();
            two = Some(gen.round(5, 9, 40).unwrap());
        });
    });
    // c1_local = 21, cross_sum = 63 + 15 = 78, sent value = 78 - 40 (mod 101) = 38
    assert_eq!(Some(Triple { a: 7, b: 3, c: 59 }), one);
    // c2_local = 45, c2 = 45 + 40 = 85
    assert_eq!(Some(Triple { a: 5, b: 9, c: 85 }), two);
}

#[test]
fn test_small_moduli() {
    use crate::crypto::functionality::Plain;
    use std::net::SocketAddr;
    use std::thread;

    for (index, m) in [2u64, 3, 5, 1 << 20].into_iter().enumerate() {
        let rendezvous = SocketAddr::from(([127, 0, 0, 1], 7950 + index as u16));
        let modulus = ShareModulus::new(m).unwrap();
        let mut one = None;
        let mut two = None;
        thread::scope(|scope| {
            scope.spawn(|| {
                let party = TwoParty::new(0, rendezvous).unwrap();
                let gen = PartyOne::new(party, Plain, modulus, 256).unwrap();
                one = Some(gen.generate().unwrap());
            });
            scope.spawn(|| {
                let party = TwoParty::new(1, rendezvous).unwrap();
                let gen = PartyTwo::new(party, Plain, modulus).unwrap();
                two = Some(gen.generate().unwrap());
            });
        });
        let (one, two) = (one.unwrap(), two.unwrap());
        assert!(holds(modulus, &one, &two), "modulus {m}");
        for share in [one.a, one.b, one.c, two.a, two.b, two.c] {
            assert!(share < m);
        }
    }
}

#[test]
fn test_batch_independence() {
    use super::{generate_batch, Batch};
    use crate::crypto::functionality::Plain;
    use std::net::SocketAddr;
    use std::thread;

    let rendezvous = SocketAddr::from(([127, 0, 0, 1], 7944));
    let modulus = ShareModulus::new((1 << 61) - 1).unwrap();
    let mut one = Batch::new();
    let mut two = Batch::new();
    thread::scope(|scope| {
        scope.spawn(|| {
            let party = TwoParty::new(0, rendezvous).unwrap();
            let gen = PartyOne::new(party, Plain, modulus, 256).unwrap();
            generate_batch(&gen, 5, &mut one).unwrap();
        });
        scope.spawn(|| {
            let party = TwoParty::new(1, rendezvous).unwrap();
            let gen = PartyTwo::new(party, Plain, modulus).unwrap();
            generate_batch(&gen, 5, &mut two).unwrap();
        });
    });
    // shares pair by round index; any other pairing breaks the invariant
    for i in 0..5 {
        for j in 0..5 {
            assert_eq!(i == j, holds(modulus, &one[i], &two[j]), "{i} {j}");
        }
    }
}

#[test]
fn test_decrypts_only_the_masked_cross_term() {
    use super::{generate_batch, Batch};
    use crate::crypto::functionality::Plain;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::thread;

    /// forwards to `Plain` while recording every ciphertext created or opened
    #[derive(Clone)]
    struct Recording {
        encrypted: Arc<Mutex<Vec<u128>>>,
        decrypted: Arc<Mutex<Vec<u128>>>,
    }

    impl Cryptosystem for Recording {
        type PublicKey = ();
        type PrivateKey = ();
        type Ciphertext = u128;

        fn generate_keypair(&self, bits: u32) -> Result<((), ())> {
            Plain.generate_keypair(bits)
        }

        fn encrypt(&self, key: &(), value: u128) -> Result<u128> {
            let cipher = Plain.encrypt(key, value)?;
            self.encrypted.lock().unwrap().push(cipher);
            Ok(cipher)
        }

        fn decrypt(&self, key: &(), cipher: &u128) -> Result<u128> {
            self.decrypted.lock().unwrap().push(*cipher);
            Plain.decrypt(key, cipher)
        }

        fn add(&self, key: &(), lhs: &u128, rhs: &u128) -> Result<u128> {
            Plain.add(key, lhs, rhs)
        }

        fn sub(&self, key: &(), lhs: &u128, rhs: &u128) -> Result<u128> {
            Plain.sub(key, lhs, rhs)
        }

        fn sub_plain(&self, key: &(), lhs: &u128, value: u128) -> Result<u128> {
            Plain.sub_plain(key, lhs, value)
        }

        fn mul_plain(&self, key: &(), lhs: &u128, value: u128) -> Result<u128> {
            Plain.mul_plain(key, lhs, value)
        }

        fn plaintext_capacity(&self, key: &()) -> u128 {
            Plain.plaintext_capacity(key)
        }
    }

    let rendezvous = SocketAddr::from(([127, 0, 0, 1], 7945));
    let modulus = ShareModulus::new((1 << 61) - 1).unwrap();
    let recording = Recording {
        encrypted: Arc::new(Mutex::new(vec![])),
        decrypted: Arc::new(Mutex::new(vec![])),
    };
    let rounds = 3;
    thread::scope(|scope| {
        scope.spawn(|| {
            let party = TwoParty::new(0, rendezvous).unwrap();
            let gen = PartyOne::new(party, recording.clone(), modulus, 256).unwrap();
            generate_batch(&gen, rounds, &mut Batch::new()).unwrap();
        });
        scope.spawn(|| {
            let party = TwoParty::new(1, rendezvous).unwrap();
            let gen = PartyTwo::new(party, Plain, modulus).unwrap();
            generate_batch(&gen, rounds, &mut Batch::new()).unwrap();
        });
    });
    let encrypted = recording.encrypted.lock().unwrap();
    let decrypted = recording.decrypted.lock().unwrap();
    // exactly one decryption per round, never of party 1's own ciphertexts
    assert_eq!(2 * rounds, encrypted.len());
    assert_eq!(rounds, decrypted.len());
    for cipher in decrypted.iter() {
        assert!(!encrypted.contains(cipher));
    }
}
