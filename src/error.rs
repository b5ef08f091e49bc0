
// error taxonomy shared by the compressor, the distance engine, the classifier
// and the file handling around them.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum NcdError {

    /// The compression primitive could not process a buffer.
    #[error("compression failed: {0}")]
    CompressionFailure(#[source] io::Error),

    /// Both compressed sizes were zero, the distance is undefined.
    #[error("degenerate distance: max(C(a), C(b)) is zero")]
    DegenerateDistance,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The classification was cancelled between two samples.
    #[error("classification cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A corpus row did not follow the `<class code>,<text>` layout.
    #[error("corpus line {line}: {reason}")]
    CorpusFormat {
        line: u64,
        reason: String,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("npy error: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
}

pub type Result<T> = std::result::Result<T, NcdError>;
