mod display;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use arsenal_core::{
    RawItem, RawNode, RuleTable, StarChartNode, build_catalog, exploration_score,
    mastery_by_category, player_score, star_chart_by_region,
};
use arsenal_store::{CatalogStore, DuckStore, ProgressStore};
use arsenal_sync::{FileProfileSource, HttpProfileSource, ProfileSource, reconcile};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arsenal")]
#[command(about = "Track player progression through the equipment catalog")]
struct Cli {
    /// DuckDB database file
    #[arg(long, env = "ARSENAL_DB", default_value = "arsenal.duckdb")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify raw upstream records and upsert them into the catalog
    BuildCatalog {
        /// JSON array of raw item records
        #[arg(long)]
        items: PathBuf,

        /// JSON array of raw star-chart node records
        #[arg(long)]
        nodes: Option<PathBuf>,
    },

    /// Register a player, or print the existing id
    Register {
        natural_id: String,

        /// pc, psn, xbox or switch
        #[arg(long, default_value = "pc")]
        platform: String,
    },

    /// Reconcile a player's external profile into local state
    Sync {
        player_id: i64,

        /// Read the snapshot from a file instead of the profile service
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Profile service base URL
        #[arg(long, env = "ARSENAL_PROFILE_URL")]
        profile_url: Option<String>,

        /// Timeout for the profile fetch
        #[arg(long, env = "ARSENAL_FETCH_TIMEOUT_SECS", default_value_t = 30)]
        fetch_timeout_secs: u64,
    },

    /// Print mastery, star-chart, and score summaries for a player
    Summary { player_id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("arsenal v{}", env!("CARGO_PKG_VERSION"));

    let store = DuckStore::open_persistent(&cli.db)
        .with_context(|| format!("opening {}", cli.db.display()))?;

    match cli.command {
        Command::BuildCatalog { items, nodes } => {
            build(&store, &items, nodes.as_deref()).await
        }
        Command::Register {
            natural_id,
            platform,
        } => {
            let platform = platform.parse()?;
            let player = store.register_player(&natural_id, platform).await?;
            println!("player {} ({} on {})", player.id, player.natural_id, player.platform);
            Ok(())
        }
        Command::Sync {
            player_id,
            snapshot,
            profile_url,
            fetch_timeout_secs,
        } => {
            let source: Box<dyn ProfileSource> = match (snapshot, profile_url) {
                (Some(path), _) => Box::new(FileProfileSource::new(path)),
                (None, Some(url)) => Box::new(
                    HttpProfileSource::new(url, Duration::from_secs(fetch_timeout_secs))
                        .context("building HTTP client")?,
                ),
                (None, None) => bail!("either --snapshot or --profile-url is required"),
            };
            sync(&store, source.as_ref(), player_id).await
        }
        Command::Summary { player_id } => summary(&store, player_id).await,
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

async fn build(store: &DuckStore, items: &Path, nodes: Option<&Path>) -> anyhow::Result<()> {
    let rules = RuleTable::standard().context("compiling catalog rules")?;

    let raw_items: Vec<RawItem> = read_json(items)?;
    let build = build_catalog(&rules, &raw_items);
    let mut version = store
        .upsert_items(&build.items)
        .await
        .context("writing catalog items")?;
    println!(
        "Seeded {} items ({} not progressable, {} unclassified, {} duplicates)",
        build.items.len(),
        build.skipped,
        build.unclassified,
        build.duplicates
    );

    if let Some(path) = nodes {
        let raw_nodes: Vec<RawNode> = read_json(path)?;
        let nodes: Vec<StarChartNode> = raw_nodes.into_iter().map(StarChartNode::from).collect();
        version = store
            .upsert_nodes(&nodes)
            .await
            .context("writing star chart nodes")?;
        println!("Seeded {} star chart nodes", nodes.len());
    }

    println!("Catalog version {version}");
    Ok(())
}

async fn sync(store: &DuckStore, source: &dyn ProfileSource, player_id: i64) -> anyhow::Result<()> {
    let catalog = store.load_catalog().await.context("loading catalog")?;
    match reconcile(store, source, &catalog, player_id).await {
        Ok(summary) => {
            display::print_sync_summary(&summary);
            Ok(())
        }
        Err(e) => bail!("sync failed [{}]: {e}", e.kind()),
    }
}

async fn summary(store: &DuckStore, player_id: i64) -> anyhow::Result<()> {
    let Some(player) = store.player(player_id).await? else {
        bail!("player {player_id} not found");
    };
    let catalog = store.load_catalog().await.context("loading catalog")?;
    let records = store.mastery_records(player_id).await?;
    let completions = store.node_completions(player_id).await?;
    let intrinsics = store.intrinsics(player_id).await?.unwrap_or_default();

    let items = records.iter().filter_map(|r| {
        catalog
            .item(r.item_id)
            .map(|e| (r.xp, e.item.category, e.item.progression_cap))
    });
    let score = player_score(
        items,
        intrinsics.total_levels(),
        exploration_score(&catalog, &completions),
    );

    display::print_player(&player, &score);
    display::print_mastery(&mastery_by_category(&catalog, &records));
    display::print_star_chart(&star_chart_by_region(&catalog, &completions));
    Ok(())
}
