
// imports
use crate::classifier::{Classifier, Hooks};
use crate::config::{files_handling, Config, JsonParams};
use crate::compressor::Deflate;
use crate::corpus::{ClassId, ClassVoteTally, Corpus};
use crate::error::{NcdError, Result};
use crate::report::Evaluation;

use std::env;
use std::time::Instant;
use rand::{SeedableRng, rngs::StdRng, seq::IteratorRandom};

pub struct Pipeline {}

impl Pipeline {

    // both binaries share the same steps -
    // -> configuration of arguments
    // -> loading the labeled corpus
    // -> classification (one query, or every sample of a test corpus)

    pub fn params_from_args() -> Result<JsonParams> {
        let args: Vec<String> = env::args().collect();
        let params = Config::new(&args)?.get_params();
        tracing::info!("{}", params);
        Ok(params)
    }

    pub fn load_train(params: &JsonParams) -> Result<Corpus> {
        let timer = Instant::now();
        let corpus = files_handling::read_corpus(&params.train_file, params.class_count())?;
        tracing::info!("loaded {} training samples in {} ms", corpus.len(), timer.elapsed().as_millis());
        Ok(corpus)
    }

    pub fn build_classifier(params: &JsonParams) -> Result<Classifier<Deflate>> {
        Classifier::with_threads(params.compressor()?, params.num_threads)
    }

    /// Runs the `query` of the configuration through the classifier.
    pub fn run() -> Result<ClassId> {

        let params = Pipeline::params_from_args()?;
        let train = Pipeline::load_train(&params)?;
        let predicted = Pipeline::classify_query(&params, &train)?;

        tracing::info!("class: {}", params.class_name(predicted.index()));
        Ok(predicted)
    }

    pub fn classify_query(params: &JsonParams, train: &Corpus) -> Result<ClassId> {

        let query = match &params.query {
            Some(query) => query,
            None => return Err(NcdError::Config("query was not supplied through json".to_string()))
        };

        let classifier = Pipeline::build_classifier(params)?;
        let progress_every = params.progress_every;
        let progress = move |done: usize, total: usize| {
            if done % progress_every == 0 || done == total {
                tracing::info!("classifying {}/{}", done, total);
            }
        };
        let hooks = Hooks { progress: Some(&progress), cancel: None };

        let timer = Instant::now();
        let nearest = classifier.nearest_with(train, query.as_bytes(), params.k, &hooks)?;
        for (rank, record) in nearest.iter().enumerate() {
            tracing::debug!("neighbour {}: {} at {:.4}", rank, params.class_name(record.label.index()), record.distance);
        }

        let predicted = ClassVoteTally::from_records(&nearest, train.class_count()).winner();
        tracing::info!("text: {}", query);
        tracing::info!("classified against {} samples in {} ms", train.len(), timer.elapsed().as_millis());
        Ok(predicted)
    }

    /// Classifies the test corpus (or a seeded random subset of it) and saves the
    /// confusion matrix and the predictions under `output_dir`.
    pub fn evaluate(params: &JsonParams, train: &Corpus) -> Result<Evaluation> {

        let test_file = match &params.test_file {
            Some(test_file) => test_file,
            None => return Err(NcdError::Config("test_file was not supplied through json".to_string()))
        };
        let test = files_handling::read_corpus(test_file, params.class_count())?;

        let mut indices: Vec<usize> = match params.test_limit {
            Some(limit) if limit < test.len() => {
                let mut rng = StdRng::seed_from_u64(params.seed);
                (0..test.len()).choose_multiple(&mut rng, limit)
            },
            _ => (0..test.len()).collect()
        };
        indices.sort();
        tracing::info!("evaluating {} of {} test samples", indices.len(), test.len());

        let classifier = Pipeline::build_classifier(params)?;
        let mut evaluation = Evaluation::new(params.class_count());
        let timer = Instant::now();

        for (done, i) in indices.iter().enumerate() {
            let sample = &test.samples()[*i];
            let predicted = classifier.classify(train, sample.text(), params.k)?;
            evaluation.record(*i, sample.label(), predicted);

            if (done + 1) % params.progress_every == 0 {
                tracing::info!("classified {}/{}, accuracy so far {:.4}", done + 1, indices.len(), evaluation.accuracy());
            }
        }

        tracing::info!(
            "accuracy {:.4} ({}/{}), took {} seconds",
            evaluation.accuracy(), evaluation.correct(), evaluation.total(), timer.elapsed().as_secs()
        );
        for (class, name) in params.class_names.iter().enumerate() {
            if let Some(recall) = evaluation.recall(ClassId(class)) {
                tracing::info!("recall {}: {:.4}", name, recall);
            }
        }

        files_handling::save_output(&params.output_dir, "confusion", evaluation.confusion())?;
        files_handling::save_output(&params.output_dir, "predictions", evaluation.predictions())?;
        Ok(evaluation)
    }

}
