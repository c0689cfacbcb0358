use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use taskdeck_core::user::Role;
use taskdeck_db::Db;
use taskdeck_server::auth::{self, TokenKeys};
use taskdeck_service::UserService;
use taskdeck_store::LocalStore;

#[derive(Parser)]
#[command(name = "taskdeck-server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an admin account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = std::env::var("TASKDECK_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| taskdeck_db::data_dir());
    let db = Db::open(&data_dir.join("taskdeck.db"))?;

    match cli.command {
        Some(Commands::CreateAdmin { email, password }) => {
            let hash = auth::hash_password(&password, bcrypt_cost())?;
            let user = UserService::new(db).register(&email, &hash, Role::Admin)?;
            println!("created admin {} ({})", user.email, user.id);
        }
        None => {
            let bind = std::env::var("TASKDECK_BIND").unwrap_or_else(|_| "0.0.0.0".into());
            let port: u16 = std::env::var("TASKDECK_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000);
            let addr = SocketAddr::new(bind.parse()?, port);

            let secret = match std::env::var("TASKDECK_JWT_SECRET") {
                Ok(secret) if !secret.is_empty() => secret,
                _ => {
                    tracing::warn!(
                        "TASKDECK_JWT_SECRET not set; tokens are signed with a development secret"
                    );
                    "taskdeck-dev-secret".into()
                }
            };

            let store = Arc::new(LocalStore::new(data_dir.join("objects")));
            let state =
                taskdeck_server::build_state(db, store, TokenKeys::new(&secret), bcrypt_cost());

            let listener = TcpListener::bind(addr).await?;
            tracing::info!(%addr, "taskdeck-server listening");
            taskdeck_server::serve(listener, state).await?;
        }
    }

    Ok(())
}

fn bcrypt_cost() -> u32 {
    std::env::var("TASKDECK_BCRYPT_COST")
        .ok()
        .and_then(|cost| cost.parse().ok())
        .unwrap_or(bcrypt::DEFAULT_COST)
}
