//! FlatKV CLI
//!
//! Operates on a raw store image file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flatkv::{Config, FileMedium, Medium, Result, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// FlatKV CLI
#[derive(Parser, Debug)]
#[command(name = "flatkv-cli")]
#[command(about = "Inspect and edit a FlatKV store image")]
#[command(version)]
struct Args {
    /// Image file (created zero-filled if missing)
    #[arg(short, long, default_value = "./flatkv.img")]
    image: PathBuf,

    /// Image size in bytes
    #[arg(short, long, default_value = "1024")]
    size: usize,

    /// First byte of the store within the image
    #[arg(long, default_value = "0")]
    start: usize,

    /// Store size in bytes (defaults to the rest of the image)
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Grow the store from the high end of its window
    #[arg(long)]
    invert: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Wipe the store to empty
    Reset,

    /// Validate the layout (a corrupt store is reset)
    Check,

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List all entries in append order
    List,

    /// Show usage statistics
    Stats,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,flatkv=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let medium = FileMedium::open(&args.image, args.size)?;

    let config = Config::builder()
        .capacity(args.capacity.unwrap_or(args.size.saturating_sub(args.start)))
        .start_addr(args.start)
        .invert_storage(args.invert)
        .build();

    tracing::debug!("Image: {} ({:?})", args.image.display(), config);

    let mut store = Store::open(medium, &config)?;
    execute(&mut store, args.command)
}

fn execute<M: Medium>(store: &mut Store<M>, command: Commands) -> Result<()> {
    match command {
        Commands::Reset => {
            store.reset()?;
            println!("OK");
        }
        Commands::Check => {
            if store.check()? {
                println!("OK");
            } else {
                println!("CORRUPT (store reset)");
            }
        }
        Commands::Set { key, value } => {
            store.set(&key, &value)?;
            println!("OK");
        }
        Commands::Get { key } => {
            let value = match store.find(&key)? {
                Some(record) => store.get(&key, record.value_len)?,
                None => None,
            };
            match value {
                Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                None => println!("(nil)"),
            }
        }
        Commands::Del { key } => {
            let deleted = store.delete(&key)?;
            println!("{}", if deleted { "1" } else { "0" });
        }
        Commands::List => {
            for (key, value) in store.entries()? {
                println!(
                    "{} = {}",
                    String::from_utf8_lossy(&key),
                    String::from_utf8_lossy(&value)
                );
            }
        }
        Commands::Stats => {
            let stats = store.stats()?;
            println!("capacity:   {}", stats.capacity);
            println!("used_bytes: {}", stats.used_bytes);
            println!("free_bytes: {}", stats.free_bytes());
            println!("num_keys:   {}", stats.num_keys);
        }
    }
    Ok(())
}
