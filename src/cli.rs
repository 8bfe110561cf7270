//! Command-line interface for pglayout

use crate::config::LayoutConfig;
use crate::export::WindowSnapshot;
use crate::gfa::GfaGraph;
use crate::hit::{locate, Hit};
use crate::observer::{LogObserver, TimingRecorder};
use crate::pipeline::Pipeline;
use crate::stats::WindowStats;
use crate::store::{GenomeId, NodeId};
use crate::viewport::Viewport;
use crate::window::Window;
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// pglayout - windowed layered layout for pangenome graphs
#[derive(Parser)]
#[command(name = "pglayout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that builds a window
#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Path to the GFA file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Segment name (or numeric id) to center the window on
    #[arg(short, long)]
    pub center: String,

    /// Neighborhood radius
    #[arg(short, long)]
    pub radius: Option<usize>,

    /// Zoom factor
    #[arg(long)]
    pub zoom: Option<f64>,

    /// Keep SNP bubbles expanded
    #[arg(long)]
    pub no_bubbles: bool,

    /// JSON file with layout settings
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Lay out a window and print its statistics or render view
    Layout {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Simulate scrolling right through the graph
    Scroll {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Number of scroll steps
        #[arg(long, default_value_t = 10)]
        steps: usize,

        /// Pixels scrolled per step
        #[arg(long, default_value_t = 200.0)]
        step_px: f64,

        /// Width of the visible range
        #[arg(long, default_value_t = 1000.0)]
        view_width: f64,
    },

    /// Report the node or edge at a canvas point
    Locate {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Canvas x coordinate
        #[arg(short = 'x', long)]
        x: f64,

        /// Canvas y coordinate
        #[arg(short = 'y', long)]
        y: f64,
    },

    /// List window nodes and edges carrying a genome, or nodes by genome count
    Trace {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Genome (path) name or index to trace
        #[arg(short, long)]
        genome: Option<String>,

        /// Smallest genome count of a reported node
        #[arg(long, conflicts_with = "genome")]
        min: Option<usize>,

        /// Largest genome count of a reported node
        #[arg(long, conflicts_with = "genome")]
        max: Option<usize>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a binary snapshot of a window
    Snapshot {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Output snapshot file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show information about a snapshot file
    SnapshotInfo {
        /// Path to the snapshot file
        #[arg(short, long)]
        snapshot: PathBuf,
    },
}

/// Run the CLI application
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Layout {
            layout,
            format,
            output,
        } => cmd_layout(&layout, &format, output.as_deref()),
        Commands::Scroll {
            layout,
            steps,
            step_px,
            view_width,
        } => cmd_scroll(&layout, steps, step_px, view_width),
        Commands::Locate { layout, x, y } => cmd_locate(&layout, x, y),
        Commands::Trace {
            layout,
            genome,
            min,
            max,
            output,
        } => cmd_trace(&layout, genome.as_deref(), min, max, output.as_deref()),
        Commands::Snapshot { layout, output } => cmd_snapshot(&layout, &output),
        Commands::SnapshotInfo { snapshot } => cmd_snapshot_info(&snapshot),
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

impl LayoutArgs {
    /// Settings from the config file, overridden by flags
    fn load_config(&self) -> Result<LayoutConfig> {
        let mut config = match &self.config {
            Some(path) => LayoutConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => LayoutConfig::default(),
        };
        if let Some(radius) = self.radius {
            config.radius = radius;
        }
        if let Some(zoom) = self.zoom {
            config.zoom = zoom;
        }
        if self.no_bubbles {
            config.collapse_bubbles = false;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Everything a command needs after loading its input
struct Loaded {
    gfa: GfaGraph,
    config: LayoutConfig,
    center: NodeId,
}

fn load(args: &LayoutArgs, spinner: &ProgressBar) -> Result<Loaded> {
    let config = args.load_config()?;
    spinner.set_message("Reading GFA file...");
    let gfa = GfaGraph::from_file(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let center = gfa.lookup(&args.center)?;
    log::debug!("Centering on segment {} (node {})", args.center, center);
    Ok(Loaded {
        gfa,
        config,
        center,
    })
}

fn build(loaded: &Loaded, recorder: &TimingRecorder) -> Result<Window> {
    let window = Pipeline::new(&loaded.gfa.graph, &loaded.config)
        .with_observer(recorder)
        .build_window(loaded.center, loaded.config.radius, loaded.config.zoom)?;
    Ok(window)
}

fn cmd_layout(args: &LayoutArgs, format: &str, output: Option<&Path>) -> Result<()> {
    let spinner = create_spinner("Loading...");
    let start = Instant::now();

    let loaded = load(args, &spinner)?;
    spinner.set_message("Laying out window...");
    let recorder = TimingRecorder::new();
    let window = build(&loaded, &recorder)?;
    spinner.finish_with_message(format!("Done in {:.2?}", start.elapsed()));

    let output_text = match format.to_lowercase().as_str() {
        "json" => WindowSnapshot::from_window(&window, &loaded.config).to_json()?,
        "text" => WindowStats::from_window(&window)
            .with_timings(recorder.totals())
            .format_summary(),
        other => bail!("Unknown output format '{}' (expected text or json)", other),
    };

    if let Some(output_path) = output {
        std::fs::write(output_path, &output_text)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        println!("Layout written to: {}", output_path.display());
    } else {
        println!("{}", output_text);
    }

    Ok(())
}

fn cmd_scroll(args: &LayoutArgs, steps: usize, step_px: f64, view_width: f64) -> Result<()> {
    let spinner = create_spinner("Loading...");
    let loaded = load(args, &spinner)?;
    spinner.finish_and_clear();

    let Loaded {
        gfa,
        config,
        center,
    } = loaded;
    let names = gfa.names;
    let radius = config.radius;
    let mut viewport =
        Viewport::open_with_observer(Arc::new(gfa.graph), config, Arc::new(LogObserver), center, radius)?;

    let center_x = viewport
        .window()
        .get(center)
        .map_or(0.0, |n| n.x + n.width / 2.0);
    let mut left = center_x - view_width / 2.0;

    println!("{:>6} {:>12} {:>8} {:>8}  center", "step", "left", "layers", "nodes");
    for step in 0..=steps {
        if step > 0 {
            left += step_px;
        }
        let right = left + view_width;
        let loaded = viewport.check_dynamic_load(left, right)?;
        let center = viewport.update_center(left + view_width / 2.0);
        let window = viewport.window();
        println!(
            "{:>6} {:>12.1} {:>8} {:>8}  {}{}",
            step,
            left,
            window.layers.len(),
            window.len(),
            segment_name(&names, center),
            if loaded { " (loaded)" } else { "" }
        );
    }

    Ok(())
}

fn segment_name(names: &[String], id: NodeId) -> String {
    usize::try_from(id)
        .ok()
        .and_then(|i| names.get(i))
        .cloned()
        .unwrap_or_else(|| id.to_string())
}

fn cmd_locate(args: &LayoutArgs, x: f64, y: f64) -> Result<()> {
    let spinner = create_spinner("Loading...");
    let loaded = load(args, &spinner)?;
    let window = build(&loaded, &TimingRecorder::new())?;
    spinner.finish_and_clear();

    match locate(&window, x, y, &loaded.config) {
        Some(Hit::Node(id)) => {
            let node = window
                .get(id)
                .with_context(|| format!("Node {} vanished from the window", id))?;
            println!("Node: {}", segment_name(&loaded.gfa.names, id));
            println!("  Kind: {}", node.kind.tag());
            println!("  Box: ({:.1}, {:.1}) {:.1} x {:.1}", node.x, node.y, node.width, node.height);
            println!("  Genomes: {}", node.genomes.len());
        }
        Some(Hit::Edge { from, to }) => {
            println!(
                "Edge: {} -> {}",
                segment_name(&loaded.gfa.names, from),
                segment_name(&loaded.gfa.names, to)
            );
            let genomes = window.flows.get(&(from, to)).map_or(0, |f| f.len());
            println!("  Genomes: {}", genomes);
        }
        None => println!("Nothing at ({}, {})", x, y),
    }

    Ok(())
}

/// Resolve a genome by path name, falling back to its numeric index
fn genome_id(names: &[String], genome: &str) -> Result<GenomeId> {
    if let Some(index) = names.iter().position(|n| n == genome) {
        return Ok(index as GenomeId);
    }
    match genome.parse::<GenomeId>() {
        Ok(index) if (index as usize) < names.len() => Ok(index),
        _ => bail!("Unknown genome '{}' ({} genomes loaded)", genome, names.len()),
    }
}

fn cmd_trace(
    args: &LayoutArgs,
    genome: Option<&str>,
    min: Option<usize>,
    max: Option<usize>,
    output: Option<&Path>,
) -> Result<()> {
    let spinner = create_spinner("Loading...");
    let loaded = load(args, &spinner)?;
    spinner.set_message("Laying out window...");
    let window = build(&loaded, &TimingRecorder::new())?;
    spinner.finish_and_clear();

    let names = &loaded.gfa.names;
    let mut text = String::new();
    let nodes = match (genome, min, max) {
        (Some(genome), _, _) => {
            let id = genome_id(&loaded.gfa.graph.genome_names, genome)?;
            let nodes = window.nodes_with_genome(id);
            let edges = window.edges_with_genome(id);
            text.push_str(&format!(
                "Genome {} ({}): {} nodes, {} edges\n",
                genome,
                id,
                nodes.len(),
                edges.len()
            ));
            text.push_str("--- Edges ---\n");
            for (from, to) in edges {
                text.push_str(&format!(
                    "  {} -> {}\n",
                    segment_name(names, from),
                    segment_name(names, to)
                ));
            }
            nodes
        }
        (None, None, None) => bail!("Give a genome with --genome, or a range with --min/--max"),
        (None, min, max) => {
            let min = min.unwrap_or(0);
            let max = max.unwrap_or(window.total_genomes);
            if min > max {
                bail!("--min {} is larger than --max {}", min, max);
            }
            let nodes = window.nodes_by_genome_count(min, max);
            text.push_str(&format!(
                "Nodes carrying {} to {} genomes: {}\n",
                min,
                max,
                nodes.len()
            ));
            nodes
        }
    };

    text.push_str("--- Nodes ---\n");
    for id in nodes {
        if let Some(node) = window.get(id) {
            text.push_str(&format!(
                "  {:<12} {:<8} layer {:>4} genomes {}\n",
                segment_name(names, id),
                node.kind.tag(),
                node.layer.unwrap_or_default(),
                node.genomes.len()
            ));
        }
    }

    if let Some(output_path) = output {
        std::fs::write(output_path, &text)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        println!("Trace written to: {}", output_path.display());
    } else {
        print!("{}", text);
    }
    Ok(())
}

fn cmd_snapshot(args: &LayoutArgs, output: &Path) -> Result<()> {
    let spinner = create_spinner("Loading...");
    let start = Instant::now();

    let loaded = load(args, &spinner)?;
    spinner.set_message("Laying out window...");
    let window = build(&loaded, &TimingRecorder::new())?;

    spinner.set_message("Saving snapshot...");
    let snapshot = WindowSnapshot::from_window(&window, &loaded.config);
    snapshot
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    spinner.finish_with_message(format!("Snapshot saved in {:.2?}", start.elapsed()));

    println!("\n{}", snapshot.summary());
    println!("Snapshot saved to: {}", output.display());
    Ok(())
}

fn cmd_snapshot_info(path: &Path) -> Result<()> {
    let snapshot = WindowSnapshot::load(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    println!("{}", snapshot.summary());
    Ok(())
}
