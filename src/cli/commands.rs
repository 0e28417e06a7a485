// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `show` and `evaluate`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    evaluate_use_case::EvaluateConfig,
    show_use_case::ShowConfig,
    train_use_case::TrainConfig,
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the CNN and checkpoint the best validation accuracy
    Train(TrainArgs),

    /// Write a 4x5 preview grid of dataset samples
    Show(ShowArgs),

    /// Score a saved checkpoint on a dataset
    Evaluate(EvaluateArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Training set in the binary image format
    #[arg(long, default_value = "dataset/normalized-train.bin")]
    pub train_file: String,

    /// Validation set, same class count and image size as the training set
    #[arg(long, default_value = "dataset/normalized-val.bin")]
    pub val_file: String,

    /// Directory for checkpoints, configs, metrics and the preview
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Checkpoint file name inside the output directory
    #[arg(long, default_value = "validations")]
    pub file: String,

    /// Number of optimizer steps
    #[arg(long, default_value_t = 10_000)]
    pub iterations: usize,

    /// Samples per optimizer step
    #[arg(long, default_value_t = 100)]
    pub batch: usize,

    /// Validate every N iterations (iteration 0 included)
    #[arg(long, default_value_t = 100)]
    pub eval_every: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Seed for shuffling, batch order and weight init
    #[arg(long)]
    pub seed: Option<u64>,

    /// Continue from the saved checkpoint
    #[arg(long)]
    pub restore: bool,

    /// Write a preview grid of training samples before training
    #[arg(long)]
    pub show: bool,

    /// Preview PNG path [default: <output-dir>/preview.png]
    #[arg(long)]
    pub preview_path: Option<String>,

    /// Comma-separated class names, in label order
    #[arg(long, value_delimiter = ',')]
    pub class_names: Vec<String>,

    #[arg(long, default_value_t = 32)]
    pub conv1_channels: usize,

    #[arg(long, default_value_t = 64)]
    pub conv2_channels: usize,

    /// Convolution kernel size, must be odd
    #[arg(long, default_value_t = 5)]
    pub kernel_size: usize,

    /// Width of the dense hidden layer
    #[arg(long, default_value_t = 1024)]
    pub hidden_size: usize,

    /// Dropout probability after the dense hidden layer
    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_file:      a.train_file,
            val_file:        a.val_file,
            output_dir:      a.output_dir,
            checkpoint_name: a.file,
            iterations:      a.iterations,
            batch_size:      a.batch,
            eval_every:      a.eval_every,
            lr:              a.lr,
            seed:            a.seed,
            restore:         a.restore,
            show:            a.show,
            preview_path:    a.preview_path,
            class_names:     a.class_names,
            conv1_channels:  a.conv1_channels,
            conv2_channels:  a.conv2_channels,
            kernel_size:     a.kernel_size,
            hidden_size:     a.hidden_size,
            dropout:         a.dropout,
        }
    }
}

/// All arguments for the `show` command
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(long, default_value = "dataset/normalized-train.bin")]
    pub file: String,

    /// PNG to write
    #[arg(long, default_value = "output/preview.png")]
    pub output: String,

    /// Integer upscaling factor per pixel
    #[arg(long, default_value_t = 4)]
    pub scale: u32,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_delimiter = ',')]
    pub class_names: Vec<String>,
}

impl From<ShowArgs> for ShowConfig {
    fn from(a: ShowArgs) -> Self {
        ShowConfig {
            file:        a.file,
            output:      a.output,
            scale:       a.scale,
            seed:        a.seed,
            class_names: a.class_names,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory the model was trained into
    #[arg(long, default_value = "output")]
    pub output_dir: String,

    /// Checkpoint file name inside the output directory
    #[arg(long, default_value = "validations")]
    pub file: String,

    /// Dataset to score
    #[arg(long, default_value = "dataset/normalized-val.bin")]
    pub dataset: String,

    #[arg(long, default_value_t = 100)]
    pub batch: usize,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            output_dir:      a.output_dir,
            checkpoint_name: a.file,
            dataset:         a.dataset,
            batch_size:      a.batch,
        }
    }
}
