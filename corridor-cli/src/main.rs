//! Command-line driver for the corridor toolkit.
//!
//! Typical session:
//!   corridor analyze --graph graph.json --store store.json
//!   corridor segments --graph graph.json --store store.json
//!   corridor network --store store.json --odd odd.json --output network.geojson

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use corridor_graph::{core_match, NodeId, RoadGraph};
use corridor_junction::{
    road_segments, AnalysisParams, JunctionAnalyzer, JunctionType, RuleTable,
};
use corridor_network::{odd_compliant_network, OddSpec};
use corridor_store::{FeatureAttribute, MemoryStore};
use geojson::FeatureCollection;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "corridor")]
#[command(about = "Junction analysis and ODD-compliant network extraction")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze junctions of a road graph into the store
    Analyze {
        /// Road graph JSON ({nodes: [...], edges: [...]})
        #[arg(long)]
        graph: PathBuf,
        /// Optional drivable-core graph; only nodes matched in it are analyzed
        #[arg(long)]
        core_graph: Option<PathBuf>,
        /// Analysis parameters JSON (defaults apply per field)
        #[arg(long)]
        params: Option<PathBuf>,
        /// Conflict rule table JSON (48 rules); built-in table when omitted
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Store file, created when missing
        #[arg(long)]
        store: PathBuf,
        /// Write analyzed junctions as a GeoJSON FeatureCollection
        #[arg(long)]
        output: Option<PathBuf>,
        /// Recompute junctions already in the store
        #[arg(long)]
        overwrite: bool,
    },
    /// Extract road segment documents into the store
    Segments {
        #[arg(long)]
        graph: PathBuf,
        #[arg(long)]
        store: PathBuf,
    },
    /// Compute the longest ODD-compliant network from the store
    Network {
        #[arg(long)]
        store: PathBuf,
        /// ODD specification JSON; without it every stored edge is compliant
        #[arg(long)]
        odd: Option<PathBuf>,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the feature catalog for authoring ODD specifications
    Catalog,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Analyze {
            graph,
            core_graph,
            params,
            rules,
            store,
            output,
            overwrite,
        } => analyze(
            &graph,
            core_graph.as_deref(),
            params.as_deref(),
            rules.as_deref(),
            &store,
            output.as_deref(),
            overwrite,
        ),
        Command::Segments { graph, store } => segments(&graph, &store),
        Command::Network { store, odd, output } => {
            network(&store, odd.as_deref(), output.as_deref())
        }
        Command::Catalog => catalog(),
    }
}

fn load_graph(path: &Path) -> Result<RoadGraph> {
    let mut graph =
        RoadGraph::load(path).with_context(|| format!("loading graph {}", path.display()))?;
    graph.prepare();
    Ok(graph)
}

fn load_store(path: &Path) -> Result<MemoryStore> {
    if path.exists() {
        MemoryStore::load(path).with_context(|| format!("loading store {}", path.display()))
    } else {
        Ok(MemoryStore::new())
    }
}

#[allow(clippy::too_many_arguments)]
fn analyze(
    graph_path: &Path,
    core_graph: Option<&Path>,
    params_path: Option<&Path>,
    rules_path: Option<&Path>,
    store_path: &Path,
    output: Option<&Path>,
    overwrite: bool,
) -> Result<()> {
    let graph = load_graph(graph_path)?;

    let node_ids: Vec<NodeId> = match core_graph {
        Some(path) => {
            let core = load_graph(path)?;
            core_match::match_core_nodes(&graph, &core, core_match::MATCH_TOLERANCE_DEG)
        }
        None => graph.nodes().map(|n| n.id).collect(),
    };

    let mut params = match params_path {
        Some(path) => AnalysisParams::from_json_file(path)
            .with_context(|| format!("loading params {}", path.display()))?,
        None => AnalysisParams::default(),
    };
    params.overwrite = params.overwrite || overwrite;

    let rules = match rules_path {
        Some(path) => RuleTable::from_json_file(path)
            .with_context(|| format!("loading rule table {}", path.display()))?,
        None => RuleTable::default(),
    };

    let mut store = load_store(store_path)?;
    let analyzer = JunctionAnalyzer::new(&graph, params, rules);
    let report = analyzer.run(&node_ids, &mut store)?;
    store
        .save(store_path)
        .with_context(|| format!("saving store {}", store_path.display()))?;

    if let Some(path) = output {
        let collection = FeatureCollection {
            bbox: None,
            features: store.junctions().cloned().collect(),
            foreign_members: None,
        };
        std::fs::write(path, collection.to_string())
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!(
        "analyzed {} junctions ({} reused, {} not junctions, {} degenerate)",
        report.analyzed, report.reused, report.skipped_not_junction, report.skipped_invalid_geometry
    );
    Ok(())
}

fn segments(graph_path: &Path, store_path: &Path) -> Result<()> {
    let graph = load_graph(graph_path)?;
    let mut store = load_store(store_path)?;
    let written = road_segments::run(&graph, &mut store)?;
    store
        .save(store_path)
        .with_context(|| format!("saving store {}", store_path.display()))?;
    println!("extracted {written} road segments");
    Ok(())
}

fn network(store_path: &Path, odd_path: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let store = MemoryStore::load(store_path)
        .with_context(|| format!("loading store {}", store_path.display()))?;
    let odd = match odd_path {
        Some(path) => Some(
            OddSpec::from_json_file(path)
                .with_context(|| format!("loading odd {}", path.display()))?,
        ),
        None => None,
    };

    match odd_compliant_network(&store, odd.as_ref()) {
        None => println!("no compliant network"),
        Some(feature) => {
            let rendered = feature.to_string();
            match output {
                Some(path) => std::fs::write(path, rendered)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{rendered}"),
            }
        }
    }
    Ok(())
}

fn catalog() -> Result<()> {
    let mut catalog = road_segments::catalog();
    catalog.add_feature_type(
        "junction",
        vec![
            FeatureAttribute::new(
                "junction_type",
                JunctionType::ALL.iter().map(|t| json!(t.name())).collect(),
            ),
            FeatureAttribute::new(
                "junction_conflict",
                vec![json!("INTERSECT"), json!("MERGE"), json!("NO_CONFLICT")],
            ),
        ],
    );
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
