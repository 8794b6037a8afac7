//! Typecache - A typed caching facade
//!
//! Command line access to a cache configured from the environment, with
//! flags overriding individual settings.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use typecache::{Cache, CacheConfig, CacheValue, ObjectType};

#[derive(Debug, Parser)]
#[command(name = "typecache", version, about = "Read and write a typed cache")]
struct Cli {
    /// Connection string (redis://, mongodb://, memory://, file:// or a path)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Local disk cache directory
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Default TTL in seconds; -1 never expires, 0 disables writes
    #[arg(long, global = true, allow_hyphen_values = true)]
    ttl: Option<i64>,

    /// Prefix joined to every key
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Object type, e.g. `str`, `int`, `dict` or `record(name:str,age:int)`
    #[arg(long = "type", global = true)]
    object_type: Option<ObjectType>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the value stored under a key
    Get { key: String },
    /// Store a value under a key
    Set {
        key: String,
        value: String,
        /// TTL in seconds for this write only
        #[arg(long)]
        ex: Option<u64>,
    },
    /// Remove a key
    Delete { key: String },
    /// Print the physical key a logical key is stored under
    Key { key: String },
    /// Remove expired entries from stores without native expiration
    Purge,
}

impl Cli {
    /// Overlays the command line flags on the environment configuration.
    fn config(&self) -> anyhow::Result<CacheConfig> {
        let mut config = CacheConfig::from_env().context("Failed to load configuration")?;

        if let Some(object_type) = &self.object_type {
            config.object_type = object_type.clone();
        }
        if let Some(url) = &self.url {
            config = config.with_url(url.as_str());
        }
        if let Some(dir) = &self.dir {
            config = config.with_dir(dir);
        }
        if let Some(ttl) = self.ttl {
            config = config.with_ttl(ttl);
        }
        if let Some(prefix) = &self.prefix {
            config = config.with_prefix(prefix.as_str());
        }
        Ok(config)
    }
}

/// Parses a command line value as the declared object type.
fn parse_value(object_type: &ObjectType, raw: &str) -> anyhow::Result<CacheValue> {
    let value = match object_type {
        ObjectType::Bytes => CacheValue::Bytes(raw.as_bytes().to_vec()),
        ObjectType::Text => CacheValue::Text(raw.to_string()),
        ObjectType::Integer => CacheValue::Integer(
            raw.trim()
                .parse()
                .with_context(|| format!("'{raw}' is not an integer"))?,
        ),
        ObjectType::Float => CacheValue::Float(
            raw.trim()
                .parse()
                .with_context(|| format!("'{raw}' is not a float"))?,
        ),
        ObjectType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => CacheValue::Boolean(true),
            "false" | "0" | "no" => CacheValue::Boolean(false),
            _ => bail!("'{raw}' is not a boolean"),
        },
        ObjectType::List | ObjectType::Map | ObjectType::Record(_) | ObjectType::Object => {
            let json: serde_json::Value = serde_json::from_str(raw)
                .with_context(|| format!("{object_type} values are given as JSON"))?;
            CacheValue::from(json)
        }
    };
    Ok(value)
}

fn print_value(value: &CacheValue) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    match value {
        CacheValue::Bytes(bytes) => stdout.write_all(bytes)?,
        CacheValue::Text(text) => writeln!(stdout, "{text}")?,
        other => writeln!(stdout, "{}", serde_json::to_string_pretty(&other.to_json())?)?,
    }
    stdout.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "warn", can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "typecache=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cache = Cache::new(cli.config()?);
    debug!("Using {:?}", cache);

    match cli.command {
        Command::Get { key } => {
            let value = cache.get_or_fail(&key)?;
            print_value(&value)?;
        }
        Command::Set { key, value, ex } => {
            let value = parse_value(cache.object_type(), &value)?;
            cache.set(&key, &value, ex)?;
        }
        Command::Delete { key } => cache.delete(&key)?,
        Command::Key { key } => println!("{}", cache.cache_key(&key)),
        Command::Purge => {
            let removed = cache.backend()?.purge_expired()?;
            println!("Removed {removed} expired entries");
        }
    }

    Ok(())
}
