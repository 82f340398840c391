use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use gp_recover::{engine_name_from_env, init_logging, LOG_FILE_NAME};
use gprec_core::engine::{default_engine_registry, EngineError};
use gprec_core::recovery::{GpRecoveryPass, PassSummary, RecoveryRequest};

/// MIPS32 import cross-reference recovery CLI.
///
/// This binary is a thin wrapper around `gprec-core` (exposed in code as
/// `gprec_core`): it wires a host engine adapter to the recovery pass and
/// maps the pass outcome onto an exit status. All substantive logic lives
/// in the library so it can be tested thoroughly.
#[derive(Parser, Debug)]
#[command(
    name = "gp-recover",
    version,
    about = "Annotate missing MIPS32 import cross-references, via a user data reference and comment, for loads resolved through $gp",
    long_about = None
)]
struct Cli {
    /// Path to the binary to process.
    binary: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(Path::new(LOG_FILE_NAME))?;

    log::info!("Processing '{}'", cli.binary.display());

    match run(&cli) {
        Ok(summary) if summary.aborted() => {
            bail!("unable to find canonical $gp in {}", cli.binary.display());
        }
        Ok(summary) => {
            println!(
                "Recovered {} import reference(s) in {}",
                summary.recovered.len(),
                summary.binary.display()
            );
            for snapshot in &summary.snapshots {
                println!("  snapshot: {}", snapshot.display());
            }
            Ok(())
        }
        Err(err) => {
            log::error!("Uncaught failure: {err:#}");
            Err(err)
        }
    }
}

fn run(cli: &Cli) -> Result<PassSummary> {
    let registry = default_engine_registry();
    let engine_name = engine_name_from_env();
    let engine = registry.get(&engine_name).ok_or_else(|| {
        EngineError::MissingEngine(format!(
            "{engine_name} (known: {})",
            registry.names().join(", ")
        ))
    })?;

    let request = RecoveryRequest::new(&cli.binary);
    let pass = GpRecoveryPass::new(engine);
    let summary = pass
        .run(&request)
        .with_context(|| format!("Failed to recover gp references for {}", cli.binary.display()))?;
    Ok(summary)
}
