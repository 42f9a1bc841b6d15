use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use forum_client::config::ClientConfig;
use forum_client::constants::{CONFIG_PATH_ENV_VAR, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use forum_client::models::LoginRequest;
use forum_client::navigation::{MemoryHistory, NavigationGateway};
use forum_client::session::{return_target, BoundaryError};
use forum_client::ForumClient;

/// Forum Client - command line access to the forum REST API
#[derive(Parser, Debug)]
#[command(name = "forum-client")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (falls back to FORUM_CLIENT_CONFIG, then FORUM_API_BASE_URL)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log in as this user before running the command
    #[arg(short = 'u', long = "user", global = true, requires = "auth_password")]
    auth_user: Option<String>,

    /// Password for --user
    #[arg(short = 'p', long = "password", global = true, requires = "auth_user")]
    auth_password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List forums grouped by category
    Forums,
    /// List one page of a forum's posts
    Posts {
        slug: String,
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },
    /// Show a single post
    Post { slug: String, number: u64 },
    /// List a post's comments
    Comments { slug: String, number: u64 },
    /// List users (admin only)
    Users,
    /// Show the signed-in user
    Whoami,
    /// Log in and show the resolved user
    Login { username: String, password: String },
    /// Comment on a post
    Comment {
        slug: String,
        number: u64,
        content: String,
    },
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ClientConfig> {
    let path = path.or_else(|| std::env::var_os(CONFIG_PATH_ENV_VAR).map(PathBuf::from));
    match path {
        Some(path) => ClientConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => ClientConfig::from_env().context("Failed to load configuration from environment"),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(args.config)?;

    forum_client::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let history = Arc::new(MemoryHistory::new("/"));
    let navigation = NavigationGateway::with_navigator(history.clone(), history.clone());
    let client = ForumClient::new(&config, navigation)?;

    if let (Some(username), Some(password)) = (args.auth_user, args.auth_password) {
        client.login(&LoginRequest::new(username, password)).await?;
    }

    match args.command {
        Command::Forums => {
            let forums = client.forums().await?;
            let grouped: Vec<_> = forum_client::models::group_by_category(&forums)
                .into_iter()
                .map(|(category, forums)| serde_json::json!({ "category": category, "forums": forums }))
                .collect();
            print_json(&grouped)?;
        }
        Command::Posts {
            slug,
            page,
            page_size,
        } => {
            let (posts, paginator) = client.browse_posts(&slug, page, page_size).await?;
            print_json(&posts)?;
            if paginator.is_visible() {
                eprintln!(
                    "{} (page {} of {})",
                    paginator.summary(),
                    paginator.current().page,
                    paginator.total_pages()
                );
            }
        }
        Command::Post { slug, number } => print_json(&client.post(&slug, number).await?)?,
        Command::Comments { slug, number } => {
            print_json(&client.comments(&slug, number).await?)?
        }
        Command::Users => {
            let session = enter(&client, "/admin/users").await?;
            session.require_admin()?;
            print_json(&client.users().await?)?;
        }
        Command::Whoami => {
            let session = enter(&client, "/profile").await?;
            print_json(session.user())?;
        }
        Command::Login { username, password } => {
            client.login(&LoginRequest::new(username, password)).await?;
            let location = history.current();
            let query = location.split_once('?').map_or("", |(_, query)| query);
            let session = enter(&client, &return_target(query)).await?;
            print_json(session.user())?;
        }
        Command::Comment {
            slug,
            number,
            content,
        } => {
            enter(&client, &format!("/forums/{}/posts/{}", slug, number)).await?;
            print_json(&client.create_comment(&slug, number, &content).await?)?;
        }
    }

    tracing::debug!(stats = ?client.stats(), history = ?history.entries(), "Done");
    Ok(())
}

async fn enter(
    client: &ForumClient,
    path: &str,
) -> anyhow::Result<forum_client::session::SessionContext> {
    match client.enter(path).await {
        Ok(session) => Ok(session),
        Err(BoundaryError::Redirect { to }) => {
            bail!("Not signed in (would redirect to {}); pass --user and --password", to)
        }
    }
}
