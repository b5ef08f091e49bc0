use ncd_classifier::{logging, Pipeline};
use std::process::ExitCode;

// usage: ncd_classifier <config.json>
// the json names the training corpus and the query to classify

fn main() -> ExitCode {

    logging::init();

    match Pipeline::run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
