use clap::{Parser, Subcommand};
use juju_gallery::cache::{CacheStore, CachedSource, FileStorage};
use juju_gallery::comics::comics_or_fallback;
use juju_gallery::config::{self, SiteConfig};
use juju_gallery::gallery::{Gallery, LoadAllOutcome};
use juju_gallery::remote::{ContentApi, GithubApi};
use juju_gallery::server::{self, AppState};
use juju_gallery::types::SortOrder;
use juju_gallery::{output, render};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Shared flags for commands that lay out the grid.
#[derive(clap::Args, Clone)]
struct LayoutArgs {
    /// Seed for the tile-size draw (random arrangement when omitted)
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser)]
#[command(name = "juju-gallery")]
#[command(about = "Fan-art and comic gallery pipeline for La Grotte de Juju")]
#[command(long_about = "\
Fan-art and comic gallery pipeline for La Grotte de Juju

Lists images from the community's GitHub resources repository, caches the
listing locally for 30 minutes, and arranges it as a bento grid of mixed
tile sizes.

Repository layout:

  Fanarts/classic/                 # Fan-art gallery (one image per file)
  ├── Juju-Dragon.png
  └── tortue.webp
  BD/                              # Comics (one folder per comic)
  └── Tortueville/
      ├── cover.png                # Cover (else the first page)
      ├── page1.png                # Pages sorted by the number in the name
      ├── page10.png
      └── description.txt          # Optional blurb

Anonymous GitHub clients get 60 requests per hour and every image costs
one. Set [github] token in config.toml if you hit the limit.

Run 'juju-gallery gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the gallery (cache first) and print the grid
    List {
        #[arg(long, value_enum, default_value_t = SortOrder::Newest)]
        sort: SortOrder,
        /// Case-insensitive name filter; shows every match
        #[arg(long)]
        search: Option<String>,
        /// Show every image instead of the first page
        #[arg(long)]
        all: bool,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Refetch the gallery, ignoring the cache
    Refresh(LayoutArgs),
    /// Delete the cached gallery listing
    ClearCache,
    /// Write a standalone HTML page of the first gallery page
    Render {
        /// Output HTML file
        #[arg(long, default_value = "gallery.html")]
        output: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// List the comic library
    Comics,
    /// Serve the comic folders as JSON
    Serve,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "juju_gallery=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site_config = config::load_config(&cli.config)?;
    let api: Arc<dyn ContentApi> = Arc::new(GithubApi::new(site_config.github.clone())?);

    match cli.command {
        Command::List {
            sort,
            search,
            all,
            layout,
        } => {
            let mut gallery = build_gallery(&site_config, api, &layout);
            let loaded = gallery.load(false).await;
            let state = gallery.state_mut();
            if loaded.is_ok() {
                state.set_sort_order(sort);
                if let Some(query) = &search {
                    state.set_search_query(query);
                }
                if all
                    && let LoadAllOutcome::ConfirmationRequired { remaining } =
                        state.request_load_all()
                {
                    eprintln!("Loading all {remaining} remaining images");
                    state.confirm_load_all();
                }
            }
            output::print_gallery_view(&state.view());
            loaded?;
        }
        Command::Refresh(layout) => {
            let mut gallery = build_gallery(&site_config, api, &layout);
            let loaded = gallery.refresh().await;
            output::print_gallery_view(&gallery.state().view());
            loaded?;
        }
        Command::ClearCache => {
            let store = cache_store(&site_config);
            store.invalidate(&site_config.gallery_cache_key())?;
            println!("Cleared cache for {}", site_config.gallery.folder);
        }
        Command::Render { output, layout } => {
            let mut gallery = build_gallery(&site_config, api, &layout);
            gallery.load(false).await?;
            let page = render::gallery_page(&gallery.state().view(), site_config.gallery.columns);
            std::fs::write(&output, page.into_string())?;
            println!("Wrote {}", output.display());
        }
        Command::Comics => {
            let comics = comics_or_fallback(api.as_ref(), &site_config.comics.folder).await;
            output::print_comics(&comics);
        }
        Command::Serve => {
            let state = AppState {
                api,
                comics_root: site_config.comics.folder.clone(),
            };
            server::serve(&site_config.server.bind, state).await?;
        }
        Command::GenConfig => {}
    }

    Ok(())
}

fn cache_store(site_config: &SiteConfig) -> CacheStore {
    CacheStore::new(
        FileStorage::new(site_config.cache.dir.clone()),
        site_config.cache.ttl(),
    )
}

fn build_gallery(
    site_config: &SiteConfig,
    api: Arc<dyn ContentApi>,
    layout: &LayoutArgs,
) -> Gallery {
    let rng = match layout.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let source = CachedSource::new(api, cache_store(site_config));
    Gallery::new(site_config, source, rng)
}
