
mod classifier;
mod compressor;
mod config;
mod corpus;
mod distance;
mod error;
mod pipeline;
mod report;
pub mod logging;

pub use classifier::{classify, Classifier, Hooks};
pub use compressor::{Compress, Deflate, Framing};
pub use config::{files_handling, Config, JsonParams};
pub use corpus::{ClassId, ClassVoteTally, Corpus, DistanceRecord, Sample};
pub use distance::{ncd_from_sizes, NcdEngine, Reference};
pub use error::{NcdError, Result};
pub use pipeline::Pipeline;
pub use report::{Evaluation, Prediction};
