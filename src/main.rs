use anyhow::Context;
use host_core::display::{self, SearchReport};
use host_core::graph::RandomWeightedGraphGenerator;
use host_core::io::{MultiFactorReader, WeightedGraphReader, WeightedGraphWriter};
use host_core::terms::{CandidateConflictTerm, ExplicitWeightTerm, MultiArcFactors, MultiEdgeFactors, MultiFactorTerm};
use host_core::{ArcLabels, ArcSelection, ArcTypes, ArcWeights, Graph, HostSearch, SearchConfig, SearchPhase};
use std::path::PathBuf;
use tracing::info;

/// Graphs with at most this many arcs have their weights and selection printed.
const PRINT_ARC_LIMIT: usize = 100;

struct Options {
    graph: Option<PathBuf>,
    multi_edge_factors: Option<PathBuf>,
    multi_arc_factors: Option<PathBuf>,
    random_nodes: usize,
    random_arcs: usize,
    random_min_weight: f64,
    random_max_weight: f64,
    random_seed: Option<u64>,
    write_result: Option<PathBuf>,
    num_iterations: Option<usize>,
    config: Option<PathBuf>,
    json: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            graph: None,
            multi_edge_factors: None,
            multi_arc_factors: None,
            random_nodes: 100,
            random_arcs: 1000,
            random_min_weight: 0.0,
            random_max_weight: 1.0,
            random_seed: None,
            write_result: None,
            num_iterations: None,
            config: None,
            json: false,
        }
    }
}

fn main() {
    let options = parse_args();
    init_tracing();

    if let Err(e) = run(&options) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn parse_args() -> Options {
    let mut options = Options::default();
    let args: Vec<String> = std::env::args().collect();

    fn value<T: std::str::FromStr>(args: &[String], i: usize) -> T {
        let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
        v.parse().unwrap_or_else(|_| usage_and_exit(2))
    }

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--graph" | "-g" => options.graph = Some(value(&args, i)),
            "--multiEdgeFactors" | "-me" => options.multi_edge_factors = Some(value(&args, i)),
            "--multiArcFactors" | "-ma" => options.multi_arc_factors = Some(value(&args, i)),
            "--randomGraphNodes" => options.random_nodes = value(&args, i),
            "--randomGraphArcs" => options.random_arcs = value(&args, i),
            "--randomGraphMinWeight" => options.random_min_weight = value(&args, i),
            "--randomGraphMaxWeight" => options.random_max_weight = value(&args, i),
            "--randomGraphSeed" => options.random_seed = Some(value(&args, i)),
            "--writeResult" => options.write_result = Some(value(&args, i)),
            "--numIterations" => options.num_iterations = Some(value(&args, i)),
            "--config" => options.config = Some(value(&args, i)),
            "--json" => {
                options.json = true;
                i += 1;
                continue;
            }
            "--help" | "-h" => usage_and_exit(0),
            _ => usage_and_exit(2),
        }
        i += 2;
    }
    options
}

fn usage_and_exit(code: i32) -> ! {
    eprintln!(
        "Usage:\n  host [--graph FILE] [--multiEdgeFactors FILE] [--multiArcFactors FILE] [--writeResult FILE]\n       [--numIterations N] [--config FILE] [--json]\n  host [--randomGraphNodes N] [--randomGraphArcs M] [--randomGraphMinWeight W] [--randomGraphMaxWeight W]\n\nOptions:\n  -g, --graph FILE              Read the graph from FILE (otherwise a random graph is generated)\n  -me, --multiEdgeFactors FILE  Read multi-edge factors from FILE\n  -ma, --multiArcFactors FILE   Read multi-arc factors from FILE\n  --randomGraphNodes N          Nodes of the random graph (default: 100)\n  --randomGraphArcs M           Arcs of the random graph (default: 1000)\n  --randomGraphMinWeight W      Smallest random arc weight (default: 0)\n  --randomGraphMaxWeight W      Largest random arc weight (default: 1)\n  --randomGraphSeed S           Seed of the random graph (default: 23)\n  --writeResult FILE            Write graph and selection to FILE (.lgf or GUESS)\n  --numIterations N             Search iteration budget (default: 100)\n  --config FILE                 Search configuration as JSON\n  --json                        Print a JSON report instead of text\n\nLog verbosity follows RUST_LOG (default: host_core=info).\n"
    );
    std::process::exit(code)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "host_core=info,host=info".into()),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(options: &Options) -> anyhow::Result<()> {
    let mut config = match &options.config {
        Some(path) => SearchConfig::from_json_file(path).context("loading search configuration")?,
        None => SearchConfig::default(),
    };
    if let Some(n) = options.num_iterations {
        config.num_iterations = n;
    }
    config.validate()?;

    let mut graph = Graph::new();
    let mut weights = ArcWeights::new(&graph);
    let mut labels = ArcLabels::new(&graph);
    let mut types = ArcTypes::new(&graph);

    match &options.graph {
        Some(path) => WeightedGraphReader::new(path)
            .fill(&mut graph, &mut weights, &mut labels, &mut types)
            .with_context(|| format!("reading graph {}", path.display()))?,
        None => {
            let mut generator = RandomWeightedGraphGenerator::new(
                options.random_nodes,
                options.random_arcs,
                options.random_min_weight,
                options.random_max_weight,
            );
            if let Some(seed) = options.random_seed {
                generator = generator.with_seed(seed);
            }
            generator
                .fill(&mut graph, &mut weights, &mut labels, &mut types)
                .context("generating random graph")?;
            if !options.json {
                println!("generated a random graph with {} nodes", graph.node_count());
            }
        }
    }
    info!(nodes = graph.node_count(), arcs = graph.arc_count(), "graph ready");

    let mut edge_factors = MultiEdgeFactors::new();
    if let Some(path) = &options.multi_edge_factors {
        MultiFactorReader::new(path)
            .fill(&graph, &labels, &mut edge_factors)
            .with_context(|| format!("reading multi-edge factors {}", path.display()))?;
    }
    let mut arc_factors = MultiArcFactors::new();
    if let Some(path) = &options.multi_arc_factors {
        MultiFactorReader::new(path)
            .fill(&graph, &labels, &mut arc_factors)
            .with_context(|| format!("reading multi-arc factors {}", path.display()))?;
    }

    let small = graph.arc_count() <= PRINT_ARC_LIMIT;
    if small && !options.json {
        print!("{}", display::format_weights(&graph, &weights));
    }

    let mut search = HostSearch::new(&graph).with_config(config);
    search.add_term(ExplicitWeightTerm::new(&graph, &weights));
    search.add_term(CandidateConflictTerm::new(&graph, &types).context("building conflict constraints")?);
    if !edge_factors.is_empty() {
        search.add_term(MultiFactorTerm::new(&graph, &edge_factors));
    }
    if !arc_factors.is_empty() {
        search.add_term(MultiFactorTerm::new(&graph, &arc_factors));
    }

    let mut selection = ArcSelection::new(&graph);
    let outcome = search.find(&mut selection);

    if options.json {
        println!("{}", SearchReport::new(&graph, &labels, &selection, &outcome).to_json());
    } else {
        if outcome.constraints_fulfilled {
            println!("found a minimal spanning tree that fulfills the constraints");
        } else if outcome.phase == SearchPhase::BudgetExhausted {
            println!("could not fulfill all constraints within {} iterations", search.config().num_iterations);
        } else {
            println!("no spanning tree fulfills the constraints");
        }
        if small {
            println!("minimal spanning tree is:");
            print!("{}", display::format_selection(&graph, &selection));
            print!("{}", display::format_tree(&graph, &labels, &selection));
        }
        println!("length of minimal spanning tree is {}", outcome.value);
    }

    if let Some(path) = &options.write_result {
        WeightedGraphWriter::new(path)
            .with_labels(&labels)
            .with_types(&types)
            .write(&graph, &weights, &selection)
            .with_context(|| format!("writing result {}", path.display()))?;
        if !options.json {
            println!("wrote result to {}", path.display());
        }
    }

    Ok(())
}
