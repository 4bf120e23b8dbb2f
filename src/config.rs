use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    // Durable sled database at --db-path
    Sled,
    // Process memory, lost on restart
    Memory,
}

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "post-likes")]
#[command(about = "Anonymous like counter for blog posts")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Where like counts are kept
    #[arg(long, value_enum, default_value_t = StorageKind::Sled)]
    pub storage: StorageKind,

    // Sled database directory
    #[arg(long, default_value = "./data/likes")]
    pub db_path: PathBuf,

    // Rate limit max requests per window, per client
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    // Rate limit window in milliseconds
    #[arg(long, default_value_t = 60_000, value_parser = clap::value_parser!(u64).range(1..))]
    pub rate_window_ms: u64,

    // s-maxage for GET /like/count
    #[arg(long, default_value_t = 10)]
    pub count_max_age: u32,

    // stale-while-revalidate for GET /like/count
    #[arg(long, default_value_t = 30)]
    pub count_stale_while_revalidate: u32,

    // Take the client address from x-forwarded-for / x-real-ip.
    // Only safe behind a reverse proxy that overwrites those headers.
    #[arg(long)]
    pub trust_proxy: bool,
}

impl Args {
    pub fn rate_window(&self) -> Duration {
        Duration::from_millis(self.rate_window_ms)
    }

    pub fn count_cache_control(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            self.count_max_age, self.count_stale_while_revalidate
        )
    }
}
