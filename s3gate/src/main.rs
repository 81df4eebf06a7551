use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use s3gate::cli::HarnessCli;
use s3gate::logging;
use s3gate::orchestrator::{Orchestrator, shutdown_signal};
use s3gate::report::OutputWriter;
use s3gate_core::{BuildVariant, HarnessConfig};
use s3gate_env::ProcessRunner;

/// Usage and configuration errors; 2 is reserved for test failures.
const USAGE_ERROR: i32 = 1;

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("s3gate: {e:#}");
            USAGE_ERROR
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<i32> {
    let cli = match HarnessCli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help / --version print to stdout and succeed
            let code = if e.use_stderr() { USAGE_ERROR } else { 0 };
            let _ = e.print();
            return Ok(code);
        }
    };

    let loaded = HarnessConfig::load_unvalidated(cli.config.as_deref()).await;
    let (mut config, ignored) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("s3gate: {e}");
            return Ok(e.outcome().code());
        }
    };

    // CLI flags take precedence over file and environment
    if let Some(level) = &cli.log_level {
        config.general.log_level.clone_from(level);
    }
    if let Some(format) = &cli.log_format {
        config.general.log_format.clone_from(format);
    }
    if let Err(e) = config.validate() {
        eprintln!("s3gate: {e}");
        return Ok(e.outcome().code());
    }

    logging::init_tracing(&config.general)?;
    for entry in &ignored {
        tracing::warn!(env_key = %entry.key, value = %entry.value, "{entry}");
    }

    let variant: BuildVariant = match cli.variant_name().parse() {
        Ok(variant) => variant,
        Err(e) => {
            tracing::error!(error = %e, "invalid variant");
            return Ok(USAGE_ERROR);
        }
    };

    tracing::info!(variant = %variant, "s3gate starting");

    let orchestrator = Orchestrator::new(config, Arc::new(ProcessRunner::new()));
    let report = orchestrator.run(variant, shutdown_signal()).await;

    if let Err(e) = OutputWriter::new(cli.output).render(&report) {
        tracing::error!(error = %e, "failed to write run report");
    }

    Ok(report.exit_code)
}
