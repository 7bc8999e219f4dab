//! CLI entry point for postmill

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "postmill")]
#[command(author = "Yukang Chen")]
#[command(version)]
#[command(about = "Resolve blog drafts and posts into a canonical corpus", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new post or draft
    New {
        /// Layout to use (post, draft); revisions default to draft
        #[arg(short, long)]
        layout: Option<String>,

        /// Title of the new post
        title: String,

        /// File name for the new post, without extension
        #[arg(short, long)]
        path: Option<String>,

        /// Start from the body of an existing document and link back to it
        #[arg(short, long)]
        revision_of: Option<String>,
    },

    /// Resolve the corpus and write the export
    #[command(alias = "r")]
    Resolve {
        /// Watch for file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Report parse, validation and ambiguity issues
    Check,

    /// Remove the export
    Clean,

    /// List site information
    List {
        /// Type of content to list (post, draft, cluster, tag, category)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "postmill=debug,info"
    } else {
        "postmill=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
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
            postmill::Site::new(&target_dir)?.init()?;
            println!("Initialized empty site in {:?}", target_dir);
        }

        Commands::New {
            layout,
            title,
            path,
            revision_of,
        } => {
            let site = postmill::Site::new(&base_dir)?;
            tracing::info!("Creating new document with title: {}", title);
            site.new_post(
                &title,
                layout.as_deref(),
                path.as_deref(),
                revision_of.as_deref(),
            )?;
        }

        Commands::Resolve { watch } => {
            let site = postmill::Site::new(&base_dir)?;
            tracing::info!("Resolving corpus...");

            site.generate()?;
            println!("Resolved successfully!");

            if watch {
                postmill::commands::resolve::watch(&site).await?;
            }
        }

        Commands::Check => {
            let site = postmill::Site::new(&base_dir)?;
            let issues = postmill::commands::check::run(&site)?;
            if !issues.is_empty() {
                std::process::exit(1);
            }
        }

        Commands::Clean => {
            let site = postmill::Site::new(&base_dir)?;
            tracing::info!("Cleaning export...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let site = postmill::Site::new(&base_dir)?;
            postmill::commands::list::run(&site, &r#type)?;
        }

        Commands::Version => {
            println!("postmill version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
