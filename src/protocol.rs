//! implementations of MPC protocols

pub mod beaver;
pub mod error;
pub mod party;
