//! manages persistence of generated batches.
//! To use, choose a specialized store struct and `save` the batch into it;
//! the protocol core has no file-format concerns of its own.

use crate::protocol::beaver::Triple;
use std::io;

/// sink for a finished (or partially finished) batch
pub trait BatchStore {
    fn save(&mut self, batch: &[Triple]) -> io::Result<()>;
}

pub mod csv;
