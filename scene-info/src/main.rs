//! Scene graph inspection tool.
//!
//! Builds a generated hierarchy (or loads a snapshot), animates it for a
//! number of frames with the per-frame sweep, and prints:
//! - Node, root and depth statistics
//! - How many nodes each sweep recomputed and how long it took
//! - World-space bounds of all visible nodes
//! - Optionally the indented tree with local and world positions
//!
//! Usage: cargo run -p scene-info -- [--depth N] [--fanout N] [--frames N] [--tree]

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use cgmath::{Deg, Point3, Vector3};
use clap::Parser;
use scenegraph::{walk_all, GraphSnapshot, Node, NodeId, SceneGraph, Space, TreeVisitor};

#[derive(Parser)]
#[command(name = "scene-info")]
#[command(about = "Build, animate and inspect scene graph hierarchies")]
#[command(version)]
struct Cli {
    /// Load a snapshot file instead of generating a hierarchy
    #[arg(short, long)]
    load: Option<PathBuf>,

    /// Write a snapshot of the first root after the last frame
    #[arg(short, long)]
    save: Option<PathBuf>,

    /// Depth of the generated hierarchy (the root is depth 0)
    #[arg(long, default_value_t = 4)]
    depth: usize,

    /// Children per generated node
    #[arg(long, default_value_t = 3)]
    fanout: usize,

    /// Number of animated frames to sweep
    #[arg(short, long, default_value_t = 10)]
    frames: usize,

    /// Print the indented tree after the last frame
    #[arg(short, long)]
    tree: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.fanout == 0 && cli.depth > 0 {
        bail!("--fanout must be at least 1 when --depth is non-zero");
    }

    let mut graph = SceneGraph::new();
    match &cli.load {
        Some(path) => {
            let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            let snapshot = GraphSnapshot::from_bytes(&bytes)
                .with_context(|| format!("parsing snapshot {}", path.display()))?;
            graph.instantiate(&snapshot, None)?;
            eprintln!("Loaded {} nodes from {}", snapshot.nodes.len(), path.display());
        }
        None => {
            build_hierarchy(&mut graph, cli.depth, cli.fanout)?;
            eprintln!("Generated {} nodes", graph.len());
        }
    }

    let sweeps = animate(&mut graph, cli.frames)?;

    print_summary(&graph, &sweeps)?;
    print_bounds(&graph);

    if cli.tree {
        println!();
        print_tree(&graph);
    }

    if let Some(path) = &cli.save {
        let Some(&root) = graph.roots().first() else {
            bail!("Nothing to save: the graph is empty");
        };
        let bytes = graph.snapshot(root)?.to_bytes()?;
        fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        eprintln!("Saved {} to {}", format_bytes(bytes.len() as u64), path.display());
    }

    Ok(())
}

/// Builds a single tree where every node below `depth` has `fanout` children
/// spread in a ring around it.
/// Number of nodes a `depth` x `fanout` hierarchy holds, root included.
fn generated_node_count(depth: usize, fanout: usize) -> Option<usize> {
    let mut level = 1usize;
    let mut total = 1usize;
    for _ in 0..depth {
        level = level.checked_mul(fanout)?;
        total = total.checked_add(level)?;
    }
    Some(total)
}

fn build_hierarchy(graph: &mut SceneGraph, depth: usize, fanout: usize) -> Result<()> {
    if generated_node_count(depth, fanout).is_none() {
        bail!("--depth {depth} with --fanout {fanout} would generate more nodes than fit in memory");
    }

    let root = graph.create_node("root");
    let mut level = vec![root];

    for d in 1..=depth {
        let mut next = Vec::with_capacity(level.len() * fanout);
        let radius = 10.0 / d as f32;

        for &parent in &level {
            for i in 0..fanout {
                let child = graph.create_child(parent, format!("node_{d}_{}", next.len()))?;
                let angle = Deg(360.0 * i as f32 / fanout as f32);
                graph.yaw(child, angle, Space::Parent)?;
                graph.translate(child, Vector3::new(radius, 0.0, 0.0), Space::Local)?;
                graph.scale_uniform(child, 0.8)?;
                next.push(child);
            }
        }

        log::debug!("generated level {d} with {} nodes", next.len());
        level = next;
    }

    Ok(())
}

struct SweepStats {
    recomputed: usize,
    elapsed: Duration,
}

/// Spins every root and every node with children, sweeping once per frame.
fn animate(graph: &mut SceneGraph, frames: usize) -> Result<Vec<SweepStats>> {
    let spinners: Vec<NodeId> = graph
        .iter()
        .filter(|(_, node)| !node.children().is_empty())
        .map(|(id, _)| id)
        .collect();

    let mut sweeps = Vec::with_capacity(frames + 1);

    // Initial sweep brings everything up to date
    let start = Instant::now();
    let recomputed = graph.update_world_transforms();
    sweeps.push(SweepStats {
        recomputed,
        elapsed: start.elapsed(),
    });

    for frame in 0..frames {
        for &id in &spinners {
            graph.yaw(id, Deg(5.0), Space::Local)?;
        }
        // Every other frame only the roots move, so the dirty set differs
        if frame % 2 == 0 {
            let roots = graph.roots().to_vec();
            for root in roots {
                graph.translate(root, Vector3::new(0.0, 0.1, 0.0), Space::World)?;
            }
        }

        let start = Instant::now();
        let recomputed = graph.update_world_transforms();
        sweeps.push(SweepStats {
            recomputed,
            elapsed: start.elapsed(),
        });
    }

    Ok(sweeps)
}

fn print_summary(graph: &SceneGraph, sweeps: &[SweepStats]) -> Result<()> {
    let mut max_depth = 0;
    let mut leaves = 0;
    let mut hidden = 0;
    for (id, node) in graph.iter() {
        max_depth = max_depth.max(graph.depth(id)?);
        if node.children().is_empty() {
            leaves += 1;
        }
        if !node.is_visible() {
            hidden += 1;
        }
    }

    println!("Scene Graph:");
    println!("  {:<16} {:>12}", "Nodes", format_number(graph.len()));
    println!("  {:<16} {:>12}", "Roots", format_number(graph.roots().len()));
    println!("  {:<16} {:>12}", "Leaves", format_number(leaves));
    println!("  {:<16} {:>12}", "Hidden", format_number(hidden));
    println!("  {:<16} {:>12}", "Max depth", max_depth);
    println!();

    println!("Sweeps:");
    println!("  {:<8} {:>12} {:>12}", "Frame", "Recomputed", "Time");
    println!("  {}", "-".repeat(34));
    for (frame, sweep) in sweeps.iter().enumerate() {
        println!(
            "  {:<8} {:>12} {:>10.1}us",
            frame,
            format_number(sweep.recomputed),
            sweep.elapsed.as_secs_f64() * 1e6
        );
    }

    let total: Duration = sweeps.iter().map(|s| s.elapsed).sum();
    if !sweeps.is_empty() {
        println!(
            "  Average: {:.1}us per sweep",
            total.as_secs_f64() * 1e6 / sweeps.len() as f64
        );
    }
    println!();

    Ok(())
}

fn print_bounds(graph: &SceneGraph) {
    let matrices = graph.world_matrices();
    if matrices.is_empty() {
        println!("World Bounds: (no visible nodes)");
        return;
    }

    let mut min = Point3::new(f32::MAX, f32::MAX, f32::MAX);
    let mut max = Point3::new(f32::MIN, f32::MIN, f32::MIN);
    for (_, matrix) in &matrices {
        let translation = matrix.w;
        min = Point3::new(min.x.min(translation.x), min.y.min(translation.y), min.z.min(translation.z));
        max = Point3::new(max.x.max(translation.x), max.y.max(translation.y), max.z.max(translation.z));
    }

    println!("World Bounds ({} visible nodes):", matrices.len());
    println!("  Min: ({:.3}, {:.3}, {:.3})", min.x, min.y, min.z);
    println!("  Max: ({:.3}, {:.3}, {:.3})", max.x, max.y, max.z);
}

struct TreePrinter<'a> {
    graph: &'a SceneGraph,
    indent: usize,
}

impl TreeVisitor for TreePrinter<'_> {
    fn enter_node(&mut self, id: NodeId, node: &Node) -> bool {
        let local = node.position();
        let world = match self.graph.resolved_transform(id) {
            Some(derived) => format!(
                "({:.2}, {:.2}, {:.2})",
                derived.position.x, derived.position.y, derived.position.z
            ),
            None => "dirty".to_string(),
        };
        let hidden = if node.is_visible() { "" } else { " [hidden]" };

        println!(
            "{}{}{}  local=({:.2}, {:.2}, {:.2}) world={}",
            "  ".repeat(self.indent),
            node.name(),
            hidden,
            local.x,
            local.y,
            local.z,
            world
        );

        self.indent += 1;
        true
    }

    fn exit_node(&mut self, _id: NodeId, _node: &Node) {
        self.indent -= 1;
    }
}

fn print_tree(graph: &SceneGraph) {
    println!("Hierarchy:");
    let mut printer = TreePrinter { graph, indent: 1 };
    walk_all(graph, &mut printer);
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_number(n: usize) -> String {
    if n < 1000 {
        n.to_string()
    } else if n < 1_000_000 {
        format!("{:.1}K", n as f64 / 1000.0)
    } else {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    }
}
