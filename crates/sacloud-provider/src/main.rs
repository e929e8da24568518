// # sacloud-provider
//
// Thin integration layer around `sacloud-core`:
// 1. Read configuration from environment variables
// 2. Initialize logging and the runtime
// 3. Register backends
// 4. Read one operation request (JSON) from stdin, run it, and write the
//    resulting state (JSON) to stdout
//
// All resource logic lives in `sacloud-core`. Logs and error messages go
// to stderr so stdout only ever carries the response.
//
// ## Configuration
//
// - `SAKURACLOUD_ACCESS_TOKEN`: API access token (http backend)
// - `SAKURACLOUD_ACCESS_TOKEN_SECRET`: API access token secret (http backend)
// - `SAKURACLOUD_ZONE`: Zone (default `is1b`)
// - `SAKURACLOUD_API_ROOT_URL`: API root URL
// - `SAKURACLOUD_TIMEOUT`: HTTP timeout in seconds (default 300)
// - `SAKURACLOUD_BACKEND`: `http` (default) or `memory`
// - `SAKURACLOUD_MEMORY_FIXTURE`: JSON fixture for the memory backend
// - `SAKURACLOUD_LOG_LEVEL`: trace, debug, info, warn, error (default warn)
//
// ## Example
//
// ```bash
// export SAKURACLOUD_BACKEND=memory
// export SAKURACLOUD_MEMORY_FIXTURE=./cloud.json
//
// echo '{"operation":"create","type":"sakuracloud_dns_record",
//        "attributes":{"dns_id":"113000000001","name":"www","type":"A","value":"192.0.2.1"}}' \
//   | sacloud-provider
// ```

use anyhow::{Context, Result};
use sacloud_core::{OperationRequest, Provider, ProviderConfig, ProviderRegistry};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes
///
/// - 0: Operation succeeded, response written to stdout
/// - 1: Configuration, startup or request decoding error
/// - 2: The operation itself failed
#[derive(Debug, Clone, Copy)]
enum ProviderExitCode {
    Success = 0,
    ConfigError = 1,
    OperationError = 2,
}

impl From<ProviderExitCode> for ExitCode {
    fn from(code: ProviderExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Load the provider configuration from `SAKURACLOUD_*` variables
fn config_from_env() -> Result<ProviderConfig> {
    let mut config = ProviderConfig {
        access_token: env::var("SAKURACLOUD_ACCESS_TOKEN").unwrap_or_default(),
        access_token_secret: env::var("SAKURACLOUD_ACCESS_TOKEN_SECRET").unwrap_or_default(),
        ..ProviderConfig::default()
    };

    if let Ok(backend) = env::var("SAKURACLOUD_BACKEND") {
        config.backend = backend.parse()?;
    }
    if let Ok(zone) = env::var("SAKURACLOUD_ZONE") {
        config.zone = zone;
    }
    if let Ok(url) = env::var("SAKURACLOUD_API_ROOT_URL") {
        config.api_root_url = url;
    }
    if let Ok(timeout) = env::var("SAKURACLOUD_TIMEOUT") {
        config.http_timeout_secs = timeout
            .parse()
            .with_context(|| format!("SAKURACLOUD_TIMEOUT must be a number of seconds, got '{}'", timeout))?;
    }
    config.memory_fixture = env::var("SAKURACLOUD_MEMORY_FIXTURE").ok().map(PathBuf::from);

    config.validate()?;
    Ok(config)
}

fn log_level() -> Level {
    match env::var("SAKURACLOUD_LOG_LEVEL")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

fn main() -> ExitCode {
    let config = match config_from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ProviderExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ProviderExitCode::ConfigError.into();
    }

    debug!("Configuration loaded: {:?}", config);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ProviderExitCode::ConfigError.into();
        }
    };

    rt.block_on(run(config)).into()
}

async fn run(config: ProviderConfig) -> ProviderExitCode {
    let (provider, request) = match setup(&config).await {
        Ok(ready) => ready,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            eprintln!("{:#}", e);
            return ProviderExitCode::ConfigError;
        }
    };

    info!("Running {} {}", request.operation, request.type_name);
    let result = provider.apply(request).await;

    // Persist whatever the backend holds, even after a failed operation.
    if let Err(e) = provider.flush().await {
        error!("Failed to flush backend state: {}", e);
        eprintln!("{}", e);
        return ProviderExitCode::OperationError;
    }

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            error!("Operation failed: {}", e);
            eprintln!("{}", e);
            return ProviderExitCode::OperationError;
        }
    };

    match serde_json::to_string(&response) {
        Ok(json) => {
            println!("{}", json);
            ProviderExitCode::Success
        }
        Err(e) => {
            error!("Failed to encode response: {}", e);
            eprintln!("{}", e);
            ProviderExitCode::OperationError
        }
    }
}

/// Build the provider and decode the request from stdin
async fn setup(config: &ProviderConfig) -> Result<(Provider, OperationRequest)> {
    let registry = Arc::new(ProviderRegistry::with_builtins());

    #[cfg(feature = "http")]
    {
        debug!("Registering HTTP backend");
        sacloud_api_http::register(&registry);
    }

    let provider = Provider::new(registry, config)
        .await
        .context("Failed to initialize provider")?;

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read request from stdin")?;

    let request: OperationRequest =
        serde_json::from_str(&input).context("Failed to decode operation request")?;

    Ok((provider, request))
}
