//! run configuration

use std::net::SocketAddr;

/// Parameters of one batch run, supplied by the bootstrap layer before
/// the protocol starts. Both parties must agree on the modulus and the
/// triple count out of band.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// party 0's listen address, dialed by party 1
    pub rendezvous: SocketAddr,
    /// public share modulus M
    pub modulus: u64,
    /// triples per batch
    pub triples: usize,
    /// cryptosystem security parameter, party 1 only
    pub key_bits: u32,
}
