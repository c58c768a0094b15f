//! CLI entry point for quire

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quire::Site;

#[derive(Parser)]
#[command(name = "quire")]
#[command(version)]
#[command(about = "A small static site generator for Jekyll-style blogs", long_about = None)]
struct Cli {
    /// Site root (defaults to current directory)
    #[arg(short, long, global = true)]
    source: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new post or page
    New {
        /// Layout to use (post, page)
        #[arg(short, long, default_value = "post")]
        layout: String,

        /// Title of the new post
        title: String,
    },

    /// Build the site
    #[command(alias = "b")]
    Build {
        /// Output directory (overrides `destination` in _config.yml)
        #[arg(short = 'o', long)]
        destination: Option<PathBuf>,

        /// Rebuild when files change
        #[arg(short, long)]
        watch: bool,
    },

    /// Remove the output directory
    Clean,

    /// List site content
    List {
        /// Type of content to list (post, page, category)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug { "quire=debug,info" } else { "quire=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.source {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            quire::commands::init::init_site(&target_dir)?;
            println!("Initialized empty site in {:?}", target_dir);
        }

        Commands::New { layout, title } => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Creating new {} with title: {}", layout, title);
            let path = site.new_post(&title, &layout)?;
            println!("Created: {:?}", path);
        }

        Commands::Build { destination, watch } => {
            let mut site = Site::new(&base_dir)?;
            if let Some(destination) = destination {
                site = site.with_destination(destination)?;
            }

            let report = site.build()?;
            println!("{}", report.summary());

            if watch {
                quire::commands::build::watch(&site)?;
            } else if !report.is_success() {
                anyhow::bail!("{} item(s) failed to build", report.failures.len());
            }
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Cleaning {:?}...", site.destination_dir);
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let site = Site::new(&base_dir)?;
            quire::commands::list::run(&site, &r#type)?;
        }

        Commands::Version => {
            println!("quire version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
