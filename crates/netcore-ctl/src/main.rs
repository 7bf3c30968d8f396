use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

/// Starts a netcore server instance from a JSON runtime config.
#[derive(Parser)]
#[command(name = "netcore-ctl", version)]
struct Args {
    /// Path to the runtime settings file (see `RuntimeConfig`).
    #[arg(long)]
    config: PathBuf,
    /// Path to the bootstrap script, staged before the event loop starts.
    #[arg(long)]
    bootstrap: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match netcore::RuntimeConfig::from_path(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load {}: {err}", args.config.display());
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match netcore::init_logging(&config.global) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialize logging: {err}");
            return ExitCode::FAILURE;
        }
    };

    let runtime_dir = netcore_util::directories::resolve_or_default(None, "netcore", "run");
    if let Err(err) = std::fs::create_dir_all(&runtime_dir) {
        error!(?err, dir = %runtime_dir.display(), "failed to create runtime directory");
        return ExitCode::FAILURE;
    }
    let pidfile = match netcore::PidFile::create(&runtime_dir, config.global.instance_id) {
        Ok(pidfile) => pidfile,
        Err(err) => {
            error!(?err, "failed to write pid file");
            return ExitCode::FAILURE;
        }
    };

    let runtime = netcore::Runtime::new(config, netcore_script::NullInterpreter::default());

    if let Some(bootstrap) = &args.bootstrap {
        match std::fs::read(bootstrap) {
            Ok(bytes) => {
                if let Err(err) = runtime.load_script(&bytes) {
                    error!(%err, path = %bootstrap.display(), "bootstrap script failed to load");
                    return ExitCode::FAILURE;
                }
            }
            Err(err) => {
                error!(?err, path = %bootstrap.display(), "failed to read bootstrap script");
                return ExitCode::FAILURE;
            }
        }
    }

    info!("starting netcore runtime");
    let result = runtime.run();
    drop(pidfile);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "runtime exited with error");
            ExitCode::FAILURE
        }
    }
}
