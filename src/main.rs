use clap::Parser;
use gitcache::cli::{Cli, Commands};
use gitcache::types::config::Config;
use gitcache::GitCacheResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> GitCacheResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = if cli.config.exists() {
        Config::load(&cli.config).unwrap_or_else(|e| {
            eprintln!("Invalid configuration at {}: {}", cli.config.display(), e);
            Config::default_config()
        })
    } else {
        Config::load_or_default()
    };

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("gitcache={}", log_level)
            .parse()
            .unwrap_or_else(|_| "gitcache=info".parse().expect("fallback directive is valid")),
    );

    if config.general.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            gitcache::cli::commands::init(path).await?;
        }
        Commands::Status { repo, json } => {
            gitcache::cli::commands::status(&repo, json, &config).await?;
        }
        Commands::Diff { repo, staged } => {
            gitcache::cli::commands::diff(&repo, staged, &config).await?;
        }
        Commands::Log { repo, limit, json } => {
            gitcache::cli::commands::log(&repo, limit, json, &config).await?;
        }
        Commands::Bench { repo, iterations } => {
            gitcache::cli::commands::bench(&repo, iterations, &config).await?;
        }
        Commands::Doctor => {
            gitcache::cli::commands::doctor(&config).await?;
        }
        Commands::Version => {
            gitcache::cli::commands::version();
        }
    }

    Ok(())
}
