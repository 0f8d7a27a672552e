use std::process::ExitCode;

use learnhub_server::ServerBuilder;
use learnhub_server::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use learnhub_server::observability;

const CONFIG_ENV: &str = "LEARNHUB_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathOrigin {
    Flag,
    Env,
    Default,
}

impl PathOrigin {
    fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "--config",
            Self::Env => CONFIG_ENV,
            Self::Default => "default",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    let startup_level = observability::init_tracing();
    tracing::debug!(source = %startup_level, "Tracing installed");

    let (path, origin) = config_path(
        std::env::args().skip(1),
        std::env::var(CONFIG_ENV).ok(),
    );
    let cfg = match load_config(Some(&path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(path = %path, origin = origin.as_str(), error = %e, "Invalid configuration");
            return ExitCode::from(2);
        }
    };
    tracing::info!(path = %path, origin = origin.as_str(), "Configuration loaded");

    observability::apply_logging_level(&cfg.logging.level);

    let server = match ServerBuilder::new().with_config(cfg).build().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Server initialization failed");
            return ExitCode::from(2);
        }
    };

    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server stopped with an error");
            ExitCode::FAILURE
        }
    }
}

/// A missing `.env` is normal; anything else is worth a line on stderr,
/// since tracing is not installed yet.
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => eprintln!("ignoring .env: {e}"),
    }
}

/// `--config <path>` or `--config=<path>`, then `LEARNHUB_CONFIG`, then
/// `learnhub.toml`.
fn config_path(
    args: impl IntoIterator<Item = String>,
    env_value: Option<String>,
) -> (String, PathOrigin) {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if let Some(path) = arg.strip_prefix("--config=") {
            return (path.to_string(), PathOrigin::Flag);
        }
        if arg == "--config"
            && let Some(path) = args.next()
        {
            return (path, PathOrigin::Flag);
        }
    }

    match env_value {
        Some(path) if !path.trim().is_empty() => (path, PathOrigin::Env),
        _ => (DEFAULT_CONFIG_PATH.to_string(), PathOrigin::Default),
    }
}
