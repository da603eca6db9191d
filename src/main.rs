use anyhow::Result;
use clap::{Parser, Subcommand};
use medsnap_ml::{dataset, Config, InferenceContext};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "medsnap-ml")]
#[command(about = "ONNX-powered skin condition and facial expression inference")]
struct Args {
    /// Model directory path
    #[arg(long, default_value = "models")]
    models_dir: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output format ("text" or "json")
    #[arg(long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict the skin condition for a single image
    Skin {
        /// Image file path
        image: PathBuf,
    },

    /// Recognize the facial expression in a single image
    Expression {
        /// Image file path
        image: PathBuf,

        /// Dataset directory used to derive class names (defaults to the full vocabulary)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Scan an expression dataset directory and report per-class counts
    Dataset {
        /// Dataset directory path
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&args.log_level))
        )
        .with_target(false)
        .init();

    let config = Config::new(args.models_dir)?;
    let json_output = args.format == "json";

    match args.command {
        Command::Skin { image } => run_skin(config, &image, json_output),
        Command::Expression { image, data_dir } => {
            run_expression(config, &image, data_dir.as_deref(), json_output)
        }
        Command::Dataset { dir } => run_dataset(&config, &dir),
    }

    Ok(())
}

fn run_skin(config: Config, image: &Path, json_output: bool) {
    let context = InferenceContext::load(config);
    tracing::debug!("Context stats: {:?}", context.stats());

    // 任一构件缺失时在此拒绝，predict内部无需再检查
    let classifier = match context.skin_classifier() {
        Ok(classifier) => classifier,
        Err(e) => {
            tracing::error!("Cannot predict skin condition: {}", e);
            return;
        }
    };

    match classifier.predict(image) {
        Ok(prediction) => {
            if json_output {
                print_json(&prediction);
            } else {
                println!(
                    "Predicted condition for {}: {}",
                    image.display(),
                    prediction.condition
                );
            }
        }
        Err(e) => tracing::error!("Skin prediction failed: {}", e),
    }
}

fn run_expression(config: Config, image: &Path, data_dir: Option<&Path>, json_output: bool) {
    // 类别名序列：优先从数据集推导，否则使用完整词表的编码顺序
    let class_names = match data_dir {
        Some(dir) => match dataset::load_dataset(dir, &config.expression_input) {
            Ok(ds) if !ds.class_names.is_empty() => ds.class_names,
            Ok(_) => {
                tracing::warn!("Dataset yielded no classes, using the full vocabulary");
                dataset::default_class_names()
            }
            Err(e) => {
                tracing::error!("Failed to load dataset from {}: {}", dir.display(), e);
                return;
            }
        },
        None => dataset::default_class_names(),
    };

    let context = InferenceContext::load(config);
    tracing::debug!("Context stats: {:?}", context.stats());

    let classifier = match context.expression_classifier(class_names) {
        Ok(classifier) => classifier,
        Err(e) => {
            tracing::error!("Cannot predict expression: {}", e);
            return;
        }
    };
    tracing::debug!("Using {} expression classes", classifier.class_names().len());

    match classifier.predict(image) {
        Ok(prediction) => {
            if json_output {
                print_json(&prediction);
            } else {
                println!("Predicted Expression: {}", prediction.expression);
                println!("Probability: {:.4}", prediction.probability);
                println!();
                print!("{}", prediction.render_chart());
            }
        }
        Err(e) => tracing::error!("Expression prediction failed: {}", e),
    }
}

fn run_dataset(config: &Config, dir: &Path) {
    match dataset::load_dataset(dir, &config.expression_input) {
        Ok(ds) => {
            println!("Loaded {} images from {}", ds.len(), dir.display());
            for (name, count) in ds.class_counts() {
                println!("{:<12} {}", name, count);
            }
        }
        Err(e) => tracing::error!("Failed to load dataset from {}: {}", dir.display(), e),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to serialize result: {}", e),
    }
}
