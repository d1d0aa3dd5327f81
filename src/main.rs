use aliasmap::Settings;
use aliasmap::cli::commands::{init, registry, watch};
use aliasmap::cli::{Cli, Commands};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Commands::Init { force } = cli.command {
        let root = std::env::current_dir().unwrap_or_else(|e| {
            eprintln!("Error: cannot determine current directory: {e}");
            std::process::exit(1);
        });
        init::run_init(&root, force);
        return;
    }

    // Load configuration, from --config when given
    let config = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    aliasmap::logging::init_with_config(&config.logging);

    let result = match &cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Config => {
            init::run_config(&config);
            Ok(())
        }
        Commands::Scan => registry::run_scan(&config, cli.json).await,
        Commands::Watch => watch::run_watch(&config, cli.json).await,
        Commands::Show => registry::run_show(&config, cli.json).await,
        Commands::Resolve { key } => match registry::run_resolve(&config, key, cli.json).await {
            Ok(true) => Ok(()),
            Ok(false) => std::process::exit(1),
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
