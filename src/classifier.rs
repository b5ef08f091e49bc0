
// imports
use crate::compressor::{Compress, Deflate};
use crate::corpus::{ClassId, ClassVoteTally, Corpus, DistanceRecord};
use crate::distance::{NcdEngine, Reference};
use crate::error::{NcdError, Result};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};

/// Optional observers of the per-sample loop.
///
/// `progress` receives `(done, total)` after every computed distance, `cancel` is
/// polled before every sample. Neither influences the result of a call that runs
/// to completion.
#[derive(Clone, Copy, Default)]
pub struct Hooks<'a> {
    pub progress: Option<&'a (dyn Fn(usize, usize) + Sync)>,
    pub cancel: Option<&'a AtomicBool>,
}

impl<'a> Hooks<'a> {

    fn check_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(NcdError::Cancelled),
            _ => Ok(())
        }
    }

    fn report(&self, done: usize, total: usize) {
        if let Some(progress) = self.progress {
            progress(done, total);
        }
    }
}

/// k-nearest-neighbour majority vote under the compression distance.
///
/// There is no training phase, the corpus handed to every call is the model.
pub struct Classifier<C: Compress = Deflate> {
    engine: NcdEngine<C>,
    pool: Option<ThreadPool>,
}

impl Default for Classifier<Deflate> {
    fn default() -> Self {
        Classifier::new(Deflate::default())
    }
}

impl<C: Compress> Classifier<C> {

    /// A classifier computing distances one sample after the other.
    pub fn new(compressor: C) -> Classifier<C> {
        Self {
            engine: NcdEngine::new(compressor),
            pool: None
        }
    }

    /// A classifier spreading the per-sample distances over `num_threads` workers.
    ///
    /// The pool is private to this classifier, one thread means the sequential path.
    pub fn with_threads(compressor: C, num_threads: usize) -> Result<Classifier<C>> {

        if num_threads == 0 {
            return Err(NcdError::InvalidArgument("num_threads must be at least 1".to_string()));
        }

        let pool = match num_threads {
            1 => None,
            n => Some(ThreadPoolBuilder::new().num_threads(n).build()?)
        };

        Ok(
            Self {
                engine: NcdEngine::new(compressor),
                pool: pool
            }
        )
    }

    pub fn num_threads(&self) -> usize {
        self.pool.as_ref().map_or(1, |pool| pool.current_num_threads())
    }

    pub fn classify(&self, corpus: &Corpus, query: &[u8], k: usize) -> Result<ClassId> {
        self.classify_with(corpus, query, k, &Hooks::default())
    }

    /// Predicts the class of `query` from its `k` nearest corpus samples.
    ///
    /// `k == 0` and an empty corpus cast no vote and both yield `ClassId(0)`. Any
    /// compression or distance error aborts the whole call.
    pub fn classify_with(&self, corpus: &Corpus, query: &[u8], k: usize, hooks: &Hooks<'_>) -> Result<ClassId> {
        let nearest = self.nearest_with(corpus, query, k, hooks)?;
        let tally = ClassVoteTally::from_records(&nearest, corpus.class_count());
        Ok(tally.winner())
    }

    pub fn nearest(&self, corpus: &Corpus, query: &[u8], k: usize) -> Result<Vec<DistanceRecord>> {
        self.nearest_with(corpus, query, k, &Hooks::default())
    }

    /// The first `min(k, corpus.len())` records by ascending distance.
    ///
    /// The sort is stable, records at equal distance keep corpus order.
    pub fn nearest_with(&self, corpus: &Corpus, query: &[u8], k: usize, hooks: &Hooks<'_>) -> Result<Vec<DistanceRecord>> {

        if k == 0 || corpus.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = self.distances(corpus, query, hooks)?;
        records.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        records.truncate(k);
        Ok(records)
    }

    /// One record per sample, in corpus order.
    pub fn distances(&self, corpus: &Corpus, query: &[u8], hooks: &Hooks<'_>) -> Result<Vec<DistanceRecord>> {

        let reference = self.engine.reference(query)?;

        match &self.pool {
            Some(pool) => pool.install(|| self.distances_parallel(corpus, &reference, hooks)),
            None => self.distances_sequential(corpus, &reference, hooks)
        }
    }

    fn distance_record(&self, text: &[u8], label: ClassId, reference: &Reference<'_>) -> Result<DistanceRecord> {
        let distance = self.engine.ncd_with_reference(text, reference)?;
        Ok(DistanceRecord { distance: distance, label: label })
    }

    fn distances_sequential(&self, corpus: &Corpus, reference: &Reference<'_>, hooks: &Hooks<'_>) -> Result<Vec<DistanceRecord>> {

        let total = corpus.len();
        let mut records = Vec::with_capacity(total);

        for (i, sample) in corpus.iter().enumerate() {
            hooks.check_cancelled()?;
            records.push(self.distance_record(sample.text(), sample.label(), reference)?);
            hooks.report(i + 1, total);
        }

        Ok(records)
    }

    fn distances_parallel(&self, corpus: &Corpus, reference: &Reference<'_>, hooks: &Hooks<'_>) -> Result<Vec<DistanceRecord>> {

        // each worker owns disjoint samples, the indexed collect merges them back in corpus order
        let total = corpus.len();
        let done = AtomicUsize::new(0);

        corpus.samples().par_iter().map(|sample| -> Result<DistanceRecord> {
            hooks.check_cancelled()?;
            let record = self.distance_record(sample.text(), sample.label(), reference)?;
            hooks.report(done.fetch_add(1, Ordering::Relaxed) + 1, total);
            Ok(record)
        }).collect()
    }

}

/// Classifies `query` with zlib at maximum compression, sequentially.
pub fn classify(corpus: &Corpus, query: &[u8], k: usize) -> Result<ClassId> {
    Classifier::new(Deflate::default()).classify(corpus, query, k)
}
