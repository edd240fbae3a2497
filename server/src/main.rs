use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::net::SocketAddr;

use space_tree::bound::HRectBound;
use space_tree::config::{SplitterKind, TreeConfig};
use space_tree::distributed::DistributedTraversal;
use space_tree::io::read_csv_glob;
use space_tree::split::{MeanSplit, MidpointSplit};
use space_tree::statistic::EmptyStatistic;
use space_tree::tree::{KdTree, Tree};

mod http;
mod rule;

use http::{spawn_worker, HttpTransport};
use rule::RangeCountRule;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve one task, then exit
    Worker {
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        listen: SocketAddr,
    },
    /// Range-count a point set against itself across HTTP workers
    Coordinate {
        //glob of csv files holding the points
        #[arg(short, long)]
        input: String,

        #[arg(short, long)]
        radius: f64,

        #[arg(short, long)]
        config: Option<String>,

        //comma separated worker addresses, overrides the config
        #[arg(short, long, value_delimiter = ',')]
        workers: Option<Vec<String>>,
    },
}

#[derive(Serialize, Debug)]
struct Summary {
    points: usize,
    radius: f64,
    workers: usize,
    dispatched: Vec<usize>,
    released: Vec<usize>,
    pairs_within_radius: u64,
    mean_neighbors: f64,
}

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {

    env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Worker { listen } => {
            let (_, handle) = spawn_worker::<HRectBound, EmptyStatistic, RangeCountRule>(listen)?;
            handle.await??;
            info!("worker done");
        }
        Command::Coordinate { input, radius, config, workers } => {
            let mut config = match config {
                Some(filename) => TreeConfig::from_file(filename)?,
                None => TreeConfig::default(),
            };
            if let Some(workers) = workers {
                config.workers = workers;
            }

            let summary = coordinate(&input, radius, &config).await?;
            print!("{}", serde_yaml::to_string(&summary)?);
        }
    }

    Ok(())
}

async fn coordinate(input: &str, radius: f64, config: &TreeConfig) -> Result<Summary, Box<dyn std::error::Error + Send + Sync>> {

    let data = read_csv_glob(input)?;
    info!("read {} points of dimension {}", data.n_cols(), data.dim());

    let tree: KdTree = match config.splitter {
        SplitterKind::Midpoint => Tree::build_with_splitter(&data, config.max_leaf_size, &mut MidpointSplit)?,
        SplitterKind::Mean => Tree::build_with_splitter(&data, config.max_leaf_size, &mut MeanSplit)?,
    };
    info!("built a tree of {} nodes, depth {}", tree.num_nodes(), tree.root().tree_depth());

    let mut rule = RangeCountRule::new(radius, tree.dataset().n_cols());
    let transport = HttpTransport::new(config.workers.clone());

    let mut traversal = DistributedTraversal::new(&mut rule, transport).with_result_timeout(config.result_timeout());
    let report = traversal.traverse(tree.root(), tree.root()).await?;
    traversal.into_transport().finish().await;

    let points = tree.dataset().n_cols();
    let mean_neighbors = match points {
        0 => 0.0,
        n => rule.total() as f64 / n as f64,
    };

    Ok(Summary {
        points,
        radius,
        workers: config.workers.len(),
        dispatched: report.dispatched,
        released: report.released,
        pairs_within_radius: rule.total(),
        mean_neighbors,
    })
}
