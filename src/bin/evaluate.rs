use ncd_classifier::{logging, Pipeline, Result};
use std::process::ExitCode;


// scores the classifier on a labeled test corpus.
// arguments to this executable should be a path to the same json used by the main
// binary, with `test_file` set. Optional `test_limit` and `seed` pick a reproducible
// random subset of the test corpus, which matters since every test sample is compared
// against the whole training corpus.

fn main() -> ExitCode {

    logging::init();

    if let Err(e) = run() {
        tracing::error!("{}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    let params = Pipeline::params_from_args()?;
    let train = Pipeline::load_train(&params)?;
    let evaluation = Pipeline::evaluate(&params, &train)?;
    tracing::info!("saved confusion matrix and {} predictions to {}", evaluation.predictions().len(), params.output_dir);
    Ok(())
}
