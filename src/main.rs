use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pinchat::connector::adapter::http;
use pinchat::connector::api::{Container, ContainerConfig, Router};
use pinchat::Commands;

#[derive(Parser)]
#[command(name = "pinchat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true, default_value = "~/.pinchat")]
    data_dir: String,

    /// Settings file (default: <data-dir>/settings.toml)
    #[arg(long, global = true, env = "PINCHAT_SETTINGS_PATH")]
    settings: Option<String>,

    /// Pin manifest (default: <data-dir>/pinned.toml)
    #[arg(long, global = true, env = "PINCHAT_PINNED_PATH")]
    pinned: Option<String>,

    /// Conversation database (overrides storage.db_path)
    #[arg(long, global = true, env = "PINCHAT_DB_PATH")]
    db: Option<String>,

    /// Export root (overrides exports.root)
    #[arg(long, global = true, env = "PINCHAT_EXPORTS_ROOT")]
    exports_root: Option<String>,

    #[arg(long, global = true)]
    memory_storage: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let data_dir = expand_path(&cli.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let config = ContainerConfig {
        data_dir,
        settings_path: cli.settings.as_deref().map(expand_path),
        pinned_path: cli.pinned.as_deref().map(expand_path),
        db_path: cli.db.as_deref().map(expand_path),
        exports_root: cli.exports_root.as_deref().map(expand_path),
        memory_storage: cli.memory_storage,
    };
    let container = Container::new(config)?;

    if let Commands::Serve = cli.command {
        let addr = container.settings().bind_addr()?;
        return http::serve(Arc::new(container), &addr).await;
    }

    let router = Router::new(&container);
    let output = router.route(cli.command).await?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}

/// Expands `~` and anchors relative paths at the working directory.
fn expand_path(path: &str) -> PathBuf {
    let expanded = PathBuf::from(expand_tilde(path));
    match std::env::current_dir() {
        Ok(cwd) if expanded.is_relative() => cwd.join(expanded),
        _ => expanded,
    }
}

fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().to_string();
            }
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
