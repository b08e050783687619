//! Proof-of-Space sector driver
//!
//! This binary exercises the full sector lifecycle: create (or open) a
//! sector bound to an identity, draw random challenges, generate and save
//! proofs, pack them for the wire, and verify the packed blob with a
//! stateless verifier.
//!
//! Run with: cargo run --release -- --path /tmp/sectors --create
//! Reuse an existing sector: cargo run --release -- --path /tmp/sectors

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use pospace_crypto::{
    config::SECTOR_SIZE_M, save_proof_file, IntegrityCheck, SectorProver, SectorVerifier,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Integrity pass selection on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CheckArg {
    None,
    Fast,
    Full,
}

impl From<CheckArg> for IntegrityCheck {
    fn from(arg: CheckArg) -> Self {
        match arg {
            CheckArg::None => IntegrityCheck::None,
            CheckArg::Fast => IntegrityCheck::Fast,
            CheckArg::Full => IntegrityCheck::Full,
        }
    }
}

/// Command-line arguments for the sector driver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Identity of the storage user
    #[arg(long, default_value = "abcd")]
    user_id: String,

    /// Identity of the sector (also names the region files)
    #[arg(long, default_value = "1234")]
    sector_id: String,

    /// Directory holding the sector region files
    #[arg(long)]
    path: PathBuf,

    /// Sector data size in bytes (power of two)
    #[arg(long, default_value_t = SECTOR_SIZE_M)]
    data_size: u64,

    /// Build the sector instead of opening an existing one
    #[arg(long, default_value_t = false)]
    create: bool,

    /// Integrity pass to run when opening
    #[arg(long, value_enum, default_value = "fast")]
    integrity: CheckArg,

    /// Number of random challenges to prove
    #[arg(long, default_value_t = 2)]
    challenges: usize,

    /// Seed for challenge generation (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Write the generated proofs to this file
    #[arg(long)]
    proof_file: Option<PathBuf>,

    /// Increase output verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut prover = match SectorProver::new(
        cli.user_id.as_str(),
        cli.sector_id.as_str(),
        cli.data_size,
        &cli.path,
    ) {
        Ok(prover) => prover,
        Err(e) => {
            error!("prover construction failed: {e}");
            std::process::exit(1);
        }
    };

    // Phase 1: build or open the sector.
    if cli.create {
        info!("[1/4] Building sector ({} bytes)", cli.data_size);
        if !prover.create(&|percent, desc| info!("{percent}%, {desc}")) {
            error!("sector create failed");
            std::process::exit(1);
        }
    } else {
        info!("[1/4] Opening sector ({:?} check)", cli.integrity);
        if !prover.open(cli.integrity.into()) {
            error!("sector open failed");
            std::process::exit(1);
        }
    }

    let params = *prover.params();
    info!("data_count: {}", params.data_count);
    info!("root:   {}", prover.mkl_root());
    info!("prefix: {}", prover.prefix());
    info!("d0:     {}", prover.d0());

    // Phase 2: draw challenges and generate proofs.
    info!("[2/4] Generating {} proofs", cli.challenges);
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let challenges: Vec<u64> = (0..cli.challenges.max(1))
        .map(|_| rng.gen::<u64>() % params.data_count)
        .collect();

    let proofs = prover.generate_proofs(&challenges);
    for (challenge, proof) in challenges.iter().zip(proofs.iter()) {
        info!("challenge: {challenge}");
        info!("{proof}");
    }

    // Phase 3: persist and pack.
    if let Some(proof_path) = &cli.proof_file {
        info!("[3/4] Saving proofs to {proof_path:?}");
        if let Err(e) = save_proof_file(
            proof_path,
            &cli.user_id,
            &cli.sector_id,
            &prover.mkl_root(),
            &challenges,
            &proofs,
        ) {
            error!("saving proofs failed: {e}");
            std::process::exit(1);
        }
    } else {
        info!("[3/4] Packing proofs");
    }
    let packed = prover.pack_proofs(&proofs);
    info!(
        "packed {} proofs: {} bytes ({} raw)",
        proofs.len(),
        packed.len(),
        proofs.iter().map(|p| p.size_bytes()).sum::<usize>()
    );

    // Phase 4: verify the packed blob with a stateless verifier.
    info!("[4/4] Verifying packed proofs");
    let verifier = match SectorVerifier::new(
        &cli.user_id,
        &cli.sector_id,
        cli.data_size,
        prover.mkl_root(),
    ) {
        Ok(verifier) => verifier,
        Err(e) => {
            error!("verifier construction failed: {e}");
            std::process::exit(1);
        }
    };

    if !verifier.verify_packed_proofs(&challenges, &packed) {
        error!("verification failed");
        std::process::exit(1);
    }
    info!("verify success");
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info,pospace_crypto=info",
        1 => "debug,pospace_crypto=debug",
        _ => "pospace_crypto=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    use tracing_tree::HierarchicalLayer;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            HierarchicalLayer::new(2)
                .with_targets(false)
                .with_bracketed_fields(true),
        )
        .init();
}
