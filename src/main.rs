//! Billow CLI
//!
//! Command-line client for the Billow social wall.
//!
//! # Configuration
//!
//! Environment variables:
//! - `BILLOW_API_URL`: Server base URL (default: http://localhost:8080)
//! - `BILLOW_WS_URL`: Realtime channel URL (default: ws://localhost:8080/messages)
//! - `BILLOW_CLIENT_SECRET`: Shared secret for request signing
//! - `BILLOW_STATE_DIR`: Directory for the persisted session token
//! - `RUST_LOG`: Log level (default: info)

use anyhow::Result;
use billow_client::config::{generate_default_config, Config};
use billow_client::remote::{MediaUpload, RegistrationForm, RemoteService};
use billow_client::session::{FileTokenStore, Session, SessionHooks};
use billow_client::templates::TemplateCache;
use billow_client::wall::{WallModel, WallTarget};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "billow", version, about = "Client for the Billow social wall")]
struct Cli {
    /// Config file path; default locations are searched otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new account and sign straight into it
    Register {
        email: String,
        password: String,
        first_name: String,
        family_name: String,
        #[arg(long)]
        gender: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        country: String,
    },
    /// Sign in with email and password
    Login { email: String, password: String },
    /// Sign out and clear the persisted session
    Logout,
    /// Show whether the persisted session is still valid
    Status,
    /// Show a wall: your own, or another user's by email
    Wall { email: Option<String> },
    /// Post a message to a wall
    Post {
        text: String,
        /// Recipient's email; defaults to your own wall
        #[arg(long)]
        to: Option<String>,
        /// Attach a media file
        #[arg(long)]
        media: Option<PathBuf>,
    },
    /// Change the account password
    Passwd {
        old_password: String,
        new_password: String,
    },
    /// Stay connected and print live statistics as they arrive
    Listen,
    /// Fetch and compile the display template bundle
    Templates,
    /// Write a default config file
    Config { output: Option<PathBuf> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_tracing(&config);

    match cli.command {
        Command::Register {
            email,
            password,
            first_name,
            family_name,
            gender,
            city,
            country,
        } => {
            let session = open_session(&config, SessionHooks::default()).await?;
            let form = RegistrationForm {
                email,
                password,
                first_name,
                family_name,
                gender,
                city,
                country,
            };
            let envelope = session.sign_up(&form).await?;
            println!("{}", envelope.message);
        }
        Command::Login { email, password } => {
            let session = open_session(&config, SessionHooks::default()).await?;
            let envelope = session.sign_in(&email, &password).await?;
            println!("{}", envelope.message);
        }
        Command::Logout => {
            let session = open_session(&config, SessionHooks::default()).await?;
            session.sign_out().await;
            println!("Signed out");
        }
        Command::Status => {
            let session = open_session(&config, SessionHooks::default()).await?;
            if session.is_signed_in().await {
                let profile = session.current_profile().await?;
                println!(
                    "Signed in as {} ({} {})",
                    profile.email, profile.first_name, profile.family_name
                );
            } else {
                println!("Not signed in");
            }
        }
        Command::Wall { email } => {
            let session = open_session(&config, SessionHooks::default()).await?;
            let target = match email {
                Some(email) => WallTarget::User(email),
                None => WallTarget::Own,
            };
            let mut wall = WallModel::new(session, target);
            wall.refresh().await?;
            print_wall(&wall);
        }
        Command::Post { text, to, media } => {
            let session = open_session(&config, SessionHooks::default()).await?;
            let upload = match media {
                Some(path) => Some(read_media(&path).await?),
                None => None,
            };
            let envelope = match to {
                Some(email) => session.post_message(&email, &text, upload).await?,
                None => session.post_on_own_wall(&text, upload).await?,
            };
            println!("{}", envelope.message);
        }
        Command::Passwd {
            old_password,
            new_password,
        } => {
            let session = open_session(&config, SessionHooks::default()).await?;
            let envelope = session.change_password(&old_password, &new_password).await?;
            println!("{}", envelope.message);
        }
        Command::Listen => {
            let hooks = SessionHooks {
                on_change: Arc::new(|| println!("Session state changed")),
                on_statistics: Arc::new(|stats| {
                    println!(
                        "connected={} posts={} views={}",
                        stats.nb_connected_users, stats.nb_posts, stats.nb_views
                    );
                }),
            };
            let session = open_session(&config, hooks).await?;
            if !session.has_channel().await {
                println!("No live channel; sign in first");
                return Ok(());
            }
            println!("Listening for statistics, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
        }
        Command::Templates => {
            let service = Arc::new(RemoteService::new(&config.api));
            let mut cache = TemplateCache::new(service);
            cache
                .add("welcome")
                .add("login")
                .add("wall")
                .add("message");
            let compiled = cache.compile().await;
            println!("Compiled {compiled} templates");
        }
        Command::Config { output } => match output {
            Some(path) => {
                tokio::fs::write(&path, generate_default_config()).await?;
                println!("Wrote {}", path.display());
            }
            None => print!("{}", generate_default_config()),
        },
    }

    Ok(())
}

async fn open_session(
    config: &Config,
    hooks: SessionHooks,
) -> Result<Session, billow_client::SessionError> {
    let service = Arc::new(RemoteService::new(&config.api));
    let store = Arc::new(FileTokenStore::new(&config.storage.state_dir));
    Session::connect(service, store, &config.realtime.ws_url, hooks).await
}

async fn read_media(path: &PathBuf) -> Result<MediaUpload, std::io::Error> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    Ok(MediaUpload::new(file_name, bytes))
}

fn print_wall(wall: &WallModel) {
    if let Some(profile) = wall.profile() {
        println!(
            "{} {} <{}> - {}, {}",
            profile.first_name, profile.family_name, profile.email, profile.city, profile.country
        );
    }
    for entry in wall.entries() {
        let media = match (&entry.post.media, entry.media_kind) {
            (Some(name), Some(kind)) => format!(" [{kind:?}: {name}]"),
            (Some(name), None) => format!(" [attachment: {name}]"),
            _ => String::new(),
        };
        println!(
            "{} | {}: {}{}",
            entry.post.date_posted, entry.post.from_user, entry.post.content, media
        );
    }
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
