//! Entity progress CLI - completion status of fixture entities.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use entity_progress_core::{Entity, ProgressResult};
use entity_progress_engine::{HostFixture, InMemoryHost, ProgressConfig, ProgressManager};
use entity_progress_storage::{CacheBackend, JsonFileCache};

#[derive(Parser)]
#[command(name = "entity-progress")]
#[command(about = "Entity completion status", long_about = None)]
struct Cli {
    /// Persistent cache directory
    #[arg(long, global = true, default_value = ".entity-progress")]
    cache_dir: PathBuf,

    /// Engine configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the progress of an entity
    Progress {
        /// Host fixture (JSON)
        fixture: PathBuf,
        /// Entity type
        entity_type: String,
        /// Entity ID
        id: String,
        /// Rebuild instead of reading the cache
        #[arg(long)]
        no_cache: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-field completion of an entity
    Fields {
        /// Host fixture (JSON)
        fixture: PathBuf,
        /// Entity type
        entity_type: String,
        /// Entity ID
        id: String,
    },
    /// Invalidate cached results by tag
    Invalidate {
        /// Cache tags, e.g. `user:1`
        #[arg(long = "tag", required = true)]
        tags: Vec<String>,
    },
    /// Drop every cached result
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ProgressConfig::from_file(path)?,
        None => ProgressConfig::default(),
    };
    let cache = Arc::new(
        JsonFileCache::new(&cli.cache_dir)
            .with_context(|| format!("opening cache at {}", cli.cache_dir.display()))?,
    );

    match cli.command {
        Commands::Progress { fixture, entity_type, id, no_cache, json } => {
            let host = load_host(&fixture).await?;
            let entity = find_entity(&host, &entity_type, &id)?;
            let manager = ProgressManager::new(host.clone(), host.clone())
                .with_access(host.clone())
                .with_cache(cache)
                .with_config(config);

            let progress = manager.entity_progress(&entity, no_cache);
            if json {
                println!("{}", serde_json::to_string_pretty(&progress)?);
            } else {
                print_progress(&progress);
            }
        }
        Commands::Fields { fixture, entity_type, id } => {
            let host = load_host(&fixture).await?;
            let entity = find_entity(&host, &entity_type, &id)?;
            let manager = ProgressManager::new(host.clone(), host.clone())
                .with_access(host.clone())
                .with_config(config);

            let completion = manager.get_field_progress(&entity);
            let selection = manager.field_definitions(&entity);
            println!("Fields of {} ({})", entity.key(), completion.len());
            for (name, done) in &completion {
                let label = selection.get(name).map(|d| d.label.as_str()).unwrap_or(name.as_str());
                println!("  [{}] {} ({})", if *done { "x" } else { " " }, label, name);
            }
            let hidden: Vec<_> = selection.keys().filter(|n| !completion.contains_key(*n)).collect();
            if !hidden.is_empty() {
                println!("  Not updatable: {}", hidden.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(", "));
            }
        }
        Commands::Invalidate { tags } => {
            let removed = cache.invalidate_tags(&tags)?;
            info!(removed, "Invalidated cache entries");
            println!("Invalidated {} entries", removed);
        }
        Commands::Clear => {
            cache.clear()?;
            println!("Cache cleared");
        }
    }

    Ok(())
}

async fn load_host(path: &Path) -> Result<Arc<InMemoryHost>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading fixture {}", path.display()))?;
    let fixture: HostFixture = serde_json::from_str(&raw)
        .with_context(|| format!("parsing fixture {}", path.display()))?;
    Ok(Arc::new(InMemoryHost::from(fixture)))
}

fn find_entity(host: &InMemoryHost, entity_type: &str, id: &str) -> Result<Entity> {
    host.entity(entity_type, id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Entity {}:{} not found in fixture", entity_type, id))
}

fn print_progress(progress: &ProgressResult) {
    println!("{} {}", progress.entity_type_label, progress.entity_id);
    println!("  Progress: {}% ({}/{})", progress.percent, progress.complete, progress.total);
    for definition in &progress.fields.complete {
        println!("  [x] {}", definition.label);
    }
    for definition in &progress.fields.incomplete {
        println!("  [ ] {}", definition.label);
    }
}
