//! roster-server binary.
//!
//! Loads [`ServerConfig`] from `config.toml` (or `--config`) and `ROSTER_*`
//! environment variables, then serves the people API from a SQLite file.
//!
//! `--hash-password` prints the argon2 PHC string for `auth.password_hash`:
//!
//! ```text
//! cargo run -p roster-server --bin server -- --hash-password
//! ```

use std::{
  io::{self, BufRead, Write},
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::Parser;
use roster_server::{AppState, ServerConfig, auth};
use roster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Roster people service")]
struct Cli {
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Hash a password read from stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  if cli.hash_password {
    let password = prompt_line("Password: ")?;
    println!("{}", auth::hash_password(&password)?);
    return Ok(());
  }

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("loading {}", cli.config.display()))?;
  cfg.auth.check().context("auth settings")?;

  let db = home_relative(&cfg.store_path);
  let store = SqliteStore::open(&db)
    .await
    .with_context(|| format!("opening {}", db.display()))?;
  if cfg.seed_demo_data {
    store.seed_demo_people().await.context("seeding demo people")?;
  }

  let address = format!("{}:{}", cfg.host, cfg.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("binding {address}"))?;
  tracing::info!(%address, store = %db.display(), "roster listening");

  axum::serve(listener, roster_server::router(AppState::new(store, cfg)))
    .await
    .context("serving")
}

fn prompt_line(prompt: &str) -> io::Result<String> {
  print!("{prompt}");
  io::stdout().flush()?;
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}

/// `~/x` becomes `$HOME/x`; other paths are returned as given.
fn home_relative(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
