use beaver::config::Config;
use beaver::protocol::beaver::{run_party1, run_party2, Batch};
use beaver::store::{csv::CsvStore, BatchStore};
use clap::Parser;
use std::net::ToSocketAddrs;
use std::path::PathBuf;
use std::process::ExitCode;

/// jointly generates a batch of Beaver triples with a peer process
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// this party's rank: 0 holds the decryption key, 1 masks the cross term
    #[arg(long, env = "RANK")]
    rank: usize,

    /// host that party 0 listens on and party 1 dials
    #[arg(long, env = "MASTER_ADDR", default_value = "127.0.0.1")]
    master_addr: String,

    /// port on the master host
    #[arg(long, env = "MASTER_PORT", default_value_t = 29500)]
    master_port: u16,

    /// public share modulus M
    #[arg(long, default_value_t = (1 << 61) - 1)]
    modulus: u64,

    /// triples per batch
    #[arg(long, default_value_t = 10)]
    triples: usize,

    /// key size in bits, used by party 0 only
    #[arg(long, default_value_t = 2048)]
    key_bits: u32,

    /// where to write the batch; defaults to output/p<rank+1>.csv
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let rendezvous = (args.master_addr.as_str(), args.master_port)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next());
    let Some(rendezvous) = rendezvous else {
        tracing::error!(addr = %args.master_addr, "cannot resolve master address");
        return ExitCode::FAILURE;
    };
    let config = Config {
        rendezvous,
        modulus: args.modulus,
        triples: args.triples,
        key_bits: args.key_bits,
    };

    tracing::info!(rank = args.rank, triples = config.triples, "starting run");
    let mut batch = Batch::new();
    let result = match args.rank {
        0 => run_party1(&config, &mut batch),
        1 => run_party2(&config, &mut batch),
        rank => {
            tracing::error!(rank, "rank must be 0 or 1");
            return ExitCode::FAILURE;
        }
    };

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("output/p{}.csv", args.rank + 1)));
    if result.is_ok() || !batch.is_empty() {
        if let Err(err) = CsvStore::new(&output).save(&batch) {
            tracing::error!(%err, path = %output.display(), "cannot persist batch");
            return ExitCode::FAILURE;
        }
        tracing::info!(rows = batch.len(), path = %output.display(), "batch saved");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // completed triples up to the failure point were kept on disk
            tracing::error!(%err, "run aborted");
            ExitCode::FAILURE
        }
    }
}
