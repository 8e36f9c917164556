//! `loan-quote-server`: serves `POST /v1/loan/calculate` and `GET /health`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use loan_quote_server::config::{self, build_config, CliArgs, ServerConfig};
use loan_quote_server::server::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Quote annuity loans over HTTP.
///
/// Settings resolve as flags, then LOAN_QUOTE_* variables, then the TOML
/// file given with --config, then built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "loan-quote-server", version, about)]
struct ServeOptions {
    /// TOML file with `host`, `port`, `log_level`, `environment`, `max_body_bytes`
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Interface or hostname to listen on (e.g. 0.0.0.0, localhost)
    #[arg(long, env = config::ENV_HOST)]
    host: Option<String>,

    #[arg(short, long, env = config::ENV_PORT)]
    port: Option<u16>,

    /// trace, debug, info, warn or error; RUST_LOG takes precedence
    #[arg(long, env = config::ENV_LOG_LEVEL)]
    log_level: Option<String>,

    /// Requests larger than this are answered with 413
    #[arg(long, env = config::ENV_MAX_BODY_BYTES, value_name = "BYTES")]
    max_body_bytes: Option<usize>,

    /// Resolve and print the configuration, then exit without serving
    #[arg(long)]
    check: bool,
}

impl ServeOptions {
    fn overrides(&self) -> CliArgs {
        CliArgs {
            config_file: self.config.clone(),
            host: self.host.clone(),
            port: self.port,
            log_level: self.log_level.clone(),
            max_body_bytes: self.max_body_bytes,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let options = ServeOptions::parse();

    let config = match build_config(&options.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("loan-quote-server: {e}");
            return ExitCode::from(2);
        }
    };

    if options.check {
        println!("{}", describe(&config));
        return ExitCode::SUCCESS;
    }

    install_subscriber(&config);
    tracing::info!(
        version = loan_quote_server::VERSION,
        listen = %config.bind_addr(),
        environment = %config.environment,
        max_body_bytes = config.max_body_bytes,
        "starting loan quote service"
    );

    match Server::new(config).run().await {
        Ok(()) => {
            tracing::info!("loan quote service stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "loan quote service failed");
            ExitCode::FAILURE
        }
    }
}

fn install_subscriber(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn describe(config: &ServerConfig) -> String {
    format!(
        "listen={} log_level={} environment={} max_body_bytes={}",
        config.bind_addr(),
        config.log_level,
        config.environment,
        config.max_body_bytes
    )
}
