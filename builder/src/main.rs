use kdam::{tqdm, BarExt};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use space_tree::config::{SplitterKind, TreeConfig};
use space_tree::io::{expand_glob, read_csv_files};
use space_tree::split::{MeanSplit, MidpointSplit};
use space_tree::tree::{KdTree, Permutation, Tree};

use clap::Parser;
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {

    //Which task to carry out: build or inspect
    #[arg(short, long)]
    task: String,

    //Glob of csv files if task is build
    #[arg(short, long)]
    input: Option<String>,

    //Directory holding tree.json, permutation.json and config.yaml
    #[arg(short, long)]
    output: String,

    #[arg(short, long)]
    config: Option<String>,

    #[arg(short, long)]
    max_leaf_size: Option<usize>,

    #[arg(short, long)]
    save_depth: Option<usize>,
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), BoxError> {

    env_logger::init();

    let args = Args::parse();

    match args.task.as_str() {
        "build" => build(&args),
        "inspect" => inspect(Path::new(&args.output)),
        other => Err(format!("unknown task: {}", other).into()),
    }
}

fn load_config(args: &Args) -> Result<TreeConfig, BoxError> {

    let mut config = match &args.config {
        Some(filename) => TreeConfig::from_file(filename)?,
        None => TreeConfig::default(),
    };

    if let Some(x) = args.max_leaf_size {
        config.max_leaf_size = x;
    }
    if let Some(x) = args.save_depth {
        config.save_depth = x;
    }
    config.validate()?;

    Ok(config)
}

fn build(args: &Args) -> Result<(), BoxError> {

    let pattern = match &args.input {
        Some(x) => x,
        None => return Err("--input is required to build".into()),
    };

    let config = load_config(args)?;
    info!("{:?}", config);

    let filenames: Vec<PathBuf> = expand_glob(pattern)?;
    let mut pb = tqdm!(total = filenames.len());
    let data = read_csv_files(&filenames, |filename| {
        info!("read {}", filename.display());
        pb.update(1).ok();
    })?;
    eprintln!();

    info!("building over {} points of dimension {}", data.n_cols(), data.dim());

    let (tree, permutation): (KdTree, Permutation) = match config.splitter {
        SplitterKind::Midpoint => Tree::build_with_permutation_and_splitter(&data, config.max_leaf_size, &mut MidpointSplit)?,
        SplitterKind::Mean => Tree::build_with_permutation_and_splitter(&data, config.max_leaf_size, &mut MeanSplit)?,
    };

    let leaves = tree.leaves().count();
    let largest_leaf = tree.leaves().map(|x| x.count()).max().unwrap_or(0);
    info!(
        "built {} nodes, depth {}, {} leaves, largest leaf {}",
        tree.num_nodes(),
        tree.root().tree_depth(),
        leaves,
        largest_leaf
    );

    let output = Path::new(&args.output);
    fs::create_dir_all(output)?;

    tree.save(output.join("tree.json"), config.save_depth)?;
    fs::write(output.join("permutation.json"), serde_json::to_vec(&permutation.old_from_new)?)?;
    config.to_file(output.join("config.yaml"))?;

    info!("wrote {}", output.display());

    Ok(())
}

fn inspect(directory: &Path) -> Result<(), BoxError> {

    let tree: KdTree = Tree::load(directory.join("tree.json"))?;
    let root = tree.root();

    println!("points: {}", root.count());
    println!("dimension: {}", tree.dataset().dim());
    println!("nodes: {}", root.tree_size());
    println!("depth: {}", root.tree_depth());
    println!("descendant nodes: {}", root.num_descendant_nodes());
    println!("leaves: {}", tree.leaves().count());

    Ok(())
}
