// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`    — trains the CNN, checkpointing the best model
//   2. `show`     — writes a preview grid of dataset samples
//   3. `evaluate` — scores a saved checkpoint on a dataset
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, ShowArgs, TrainArgs};

use crate::application::evaluate_use_case::EvaluationReport;
use crate::domain::sample::label_name;

#[derive(Parser, Debug)]
#[command(
    name = "image-cnn-trainer",
    version,
    about = "Train a small CNN image classifier on a binary image dataset."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Show(args)     => run_show(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.train_file);

    let use_case = TrainUseCase::new(args.into());
    let summary  = use_case.execute()?;

    match summary.best_iteration {
        Some(it) => println!(
            "Training complete. Best validation accuracy {:.4}% at iteration {} ({} checkpoints saved).",
            summary.best_accuracy * 100.0, it, summary.checkpoints_saved
        ),
        None => println!(
            "Training complete. No improvement over {:.4}%, checkpoint unchanged.",
            summary.best_accuracy * 100.0
        ),
    }
    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    use crate::application::show_use_case::ShowUseCase;

    let output   = args.output.clone();
    let labels   = ShowUseCase::new(args.into()).execute()?;
    println!("Wrote {} samples to {}", labels.len(), output);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(args.into()).execute()?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &EvaluationReport) {
    let eval = &report.evaluation;
    println!("samples:  {}", eval.total);
    println!("accuracy: {:.4}% ({}/{})", eval.accuracy * 100.0, eval.correct, eval.total);
    println!("loss:     {:.6}", eval.loss);
    for (label, tally) in eval.per_class.iter().enumerate() {
        println!(
            "  {:<16} {:>8.4}% ({}/{})",
            label_name(&report.class_names, label),
            tally.accuracy() * 100.0,
            tally.correct,
            tally.total,
        );
    }
}
