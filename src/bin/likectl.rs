use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use post_likes::client::{FileStorage, HttpLikeApi, LikeController, LikedPosts};

// Like posts from a terminal, remembering what you liked in --data-dir
#[derive(Parser, Debug)]
#[command(name = "likectl")]
#[command(about = "Command line client for the post like service")]
struct Args {
    // Like service base url
    #[arg(short, long, default_value = "http://localhost:8080")]
    server: String,

    // Directory holding the liked-posts file
    #[arg(short, long, default_value = "./.likectl")]
    data_dir: PathBuf,

    // Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    // Show the count and whether you liked the post
    Count { post_id: String },
    // Like the post, or unlike it if you already did
    Toggle { post_id: String },
    // List posts you liked
    Liked,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let api = HttpLikeApi::with_timeout(&args.server, Duration::from_secs(args.timeout))
        .context("Failed to build HTTP client")?;
    let liked_posts = LikedPosts::new(Arc::new(FileStorage::new(&args.data_dir)));

    match args.command {
        Command::Liked => {
            for post_id in liked_posts.read() {
                println!("{post_id}");
            }
        }
        Command::Count { post_id } => {
            let controller = LikeController::new(post_id, Arc::new(api), liked_posts);
            controller.mount().await;
            let state = controller.state().await;
            if let Some(err) = state.error() {
                bail!("{err}");
            }
            println!("{} {}", state.count(), heart(state.liked()));
        }
        Command::Toggle { post_id } => {
            let controller = LikeController::new(post_id, Arc::new(api), liked_posts);
            controller.mount().await;
            controller.dismiss_error().await;
            controller.toggle().await;

            let state = controller.state().await;
            if let Some(err) = state.error() {
                bail!("{err}");
            }
            println!("{} {}", state.count(), heart(state.liked()));
        }
    }

    Ok(())
}

fn heart(liked: bool) -> &'static str {
    if liked { "♥" } else { "♡" }
}
