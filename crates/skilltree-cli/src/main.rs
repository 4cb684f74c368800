// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! skilltree: developer CLI over the skill tree allocation engine.
//!
//! Loads a catalog and a build document, prints snapshots, toggles nodes,
//! re-validates histories and previews timeless jewel rerolls.

mod build_file;
mod config;
mod report;

use std::fmt::Display;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use skilltree_core::{
    timeless_reroll, toggle_node, tree_view_state, validate_variants, BuildVariant, NodeId,
    TimelessSeed,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::build_file::{load_catalog, BuildFile};
use crate::config::CliConfig;
use crate::report::{budget_table, node_table, reroll_table, RerollRow, StateSummary};

#[derive(Parser)]
#[command(
    name = "skilltree",
    version,
    about = "Inspect and edit skill tree builds"
)]
struct Cli {
    /// Catalog JSON; defaults to the configured catalog.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// Log filter; overrides RUST_LOG and the configured filter.
    #[arg(long, global = true)]
    log: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the snapshot of a build.
    State {
        /// Build document.
        #[arg(long)]
        build: PathBuf,
        /// Emit a JSON summary instead of tables.
        #[arg(long)]
        json: bool,
    },
    /// Allocate the path to a node, or remove it with its dependents.
    Toggle {
        /// Build document.
        #[arg(long)]
        build: PathBuf,
        /// Node to toggle.
        #[arg(long)]
        node: NodeId,
        /// Attribute choice recorded for every added node.
        #[arg(long)]
        attribute: Option<usize>,
        /// Save the new history into the build.
        #[arg(long)]
        write: bool,
    },
    /// Replay the history from an empty tree; exits 1 when it changes.
    Validate {
        /// Build document.
        #[arg(long)]
        build: PathBuf,
        /// Save the validated history into the build.
        #[arg(long)]
        write: bool,
    },
    /// Preview timeless jewel rerolls of catalog nodes.
    Reroll {
        /// Catalog tree version.
        #[arg(long)]
        tree_version: u32,
        /// Alternate tree version of the jewel.
        #[arg(long)]
        jewel_version: u32,
        /// Jewel seed.
        #[arg(long)]
        seed: u32,
        /// Nodes to reroll.
        #[arg(long, required = true, num_args = 1..)]
        node: Vec<NodeId>,
        /// Keystone tag of the jewel.
        #[arg(long)]
        keystone: Option<u32>,
        /// Keystone revision.
        #[arg(long)]
        revision: Option<u32>,
    },
    /// Show or change persisted settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the settings and where they live.
    Show,
    /// Remember a default catalog.
    SetCatalog {
        /// Catalog JSON.
        path: PathBuf,
    },
    /// Remember a default log filter.
    SetLog {
        /// `tracing` filter directives, e.g. `skilltree_core=debug`.
        filter: String,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let loaded = CliConfig::load();
    let settings = loaded.as_ref().cloned().unwrap_or_default();
    init_tracing(cli.log.as_deref(), &settings)?;
    if let Err(err) = &loaded {
        warn!(error = %err, "using default settings");
    }

    match cli.command {
        Commands::State { build, json } => {
            let catalog = load_catalog(&catalog_path(cli.catalog, &settings)?)?;
            let build = BuildFile::load(&build)?;
            let view = tree_view_state(&catalog, &build.tree, &build.editing, &build.items)?;
            if json {
                let summary = serde_json::to_string_pretty(&StateSummary::new(&view))?;
                emit(summary)?;
            } else {
                let access = catalog.tree(build.tree.version, build.tree.variant.is_atlas())?;
                emit(node_table(access, &view))?;
                emit(budget_table(&view.count, view.limit.as_ref()))?;
                emit(format_args!("digest: {}", hex::encode(view.digest())))?;
            }
        }
        Commands::Toggle {
            build: path,
            node,
            attribute,
            write,
        } => {
            let catalog = load_catalog(&catalog_path(cli.catalog, &settings)?)?;
            let mut build = BuildFile::load(&path)?;
            let next = toggle_node(
                &catalog,
                &build.tree,
                &build.editing,
                node,
                &build.items,
                attribute,
            )?;
            if next == build.editing {
                info!(node, "toggle had no effect");
            }
            emit(serde_json::to_string(&next.history)?)?;
            if write {
                build.editing = next;
                build.save(&path)?;
            }
        }
        Commands::Validate { build: path, write } => {
            let catalog = load_catalog(&catalog_path(cli.catalog, &settings)?)?;
            let mut build = BuildFile::load(&path)?;
            let variant = BuildVariant {
                history: build.editing.history.clone(),
                masteries: build.editing.masteries.clone(),
                jewels: build.editing.jewels.clone(),
                attributes: build.editing.attributes.clone(),
            };
            let (variants, changed) =
                validate_variants(&catalog, &build.tree, &[variant], &build.items)?;
            let history = variants
                .into_iter()
                .next()
                .map(|variant| variant.history)
                .unwrap_or_default();
            let total = build.editing.history.len();
            emit(format_args!(
                "accepted {} of {total} steps, dropped {}",
                history.len(),
                total.saturating_sub(history.len())
            ))?;
            emit(serde_json::to_string(&history)?)?;
            if !changed {
                return Ok(ExitCode::SUCCESS);
            }
            if write {
                let at_end = build.editing.position >= total;
                build.editing.position = if at_end {
                    history.len()
                } else {
                    build.editing.position.min(history.len())
                };
                build.editing.history = history;
                build.save(&path)?;
            }
            return Ok(ExitCode::from(1));
        }
        Commands::Reroll {
            tree_version,
            jewel_version,
            seed,
            node,
            keystone,
            revision,
        } => {
            let catalog = load_catalog(&catalog_path(cli.catalog, &settings)?)?;
            let access = catalog.tree(tree_version, false)?;
            let seed = TimelessSeed {
                version: jewel_version,
                seed,
                keystone,
                revision,
            };
            let rows = node
                .iter()
                .map(|&id| -> Result<RerollRow<'_>> {
                    let original = access
                        .skill(id)
                        .with_context(|| format!("node {id} not in tree version {tree_version}"))?;
                    Ok(RerollRow {
                        id,
                        original,
                        rerolled: timeless_reroll(&catalog, id, &seed, original),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            emit(reroll_table(&rows))?;
        }
        Commands::Config { action } => run_config(action, settings)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn run_config(action: ConfigAction, mut settings: CliConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            emit(format_args!("# {}", CliConfig::path()?.display()))?;
            emit(serde_json::to_string_pretty(&settings)?)?;
            return Ok(());
        }
        ConfigAction::SetCatalog { path } => {
            let path = std::path::absolute(&path)
                .with_context(|| format!("resolving {}", path.display()))?;
            settings.catalog = Some(path);
        }
        ConfigAction::SetLog { filter } => {
            EnvFilter::try_new(&filter).with_context(|| format!("invalid log filter {filter:?}"))?;
            settings.log_filter = filter;
        }
    }
    let location = settings.save()?;
    debug!(path = %location.display(), "settings saved");
    Ok(())
}

fn catalog_path(flag: Option<PathBuf>, settings: &CliConfig) -> Result<PathBuf> {
    flag.or_else(|| settings.catalog.clone())
        .context("no catalog: pass --catalog or run `skilltree config set-catalog PATH`")
}

fn init_tracing(flag: Option<&str>, settings: &CliConfig) -> Result<()> {
    let filter = match flag {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter {directives:?}"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn emit(text: impl Display) -> Result<()> {
    writeln!(io::stdout().lock(), "{text}")?;
    Ok(())
}
