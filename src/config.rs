
// imports
use crate::compressor::{Deflate, Framing};
use crate::error::{NcdError, Result};

use serde_json::Value;
use std::{fs::File, fmt::Display, io::BufReader};

const DEFAULT_CLASS_NAMES: [&str; 4] = ["World", "Sports", "Business", "Sci/Tech"];

#[derive(Clone, Debug, PartialEq)]
pub struct JsonParams {
    pub train_file: String,
    pub test_file: Option<String>,
    pub query: Option<String>,
    pub output_dir: String,
    pub k: usize,
    pub class_names: Vec<String>,
    pub num_threads: usize,
    pub compression: Framing,
    pub compression_level: u32,
    pub test_limit: Option<usize>,
    pub seed: u64,
    pub progress_every: usize,
}

impl JsonParams {

    pub fn class_count(&self) -> usize {
        self.class_names.len()
    }

    pub fn compressor(&self) -> Result<Deflate> {
        Deflate::new(self.compression, self.compression_level)
    }

    pub fn class_name(&self, index: usize) -> &str {
        self.class_names.get(index).map_or("<unknown>", |name| name.as_str())
    }
}

impl Display for JsonParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using parameters:
        train_file: {}
        test_file: {:?}
        output_dir: {}
        k: {}
        class_names: {:?}
        num_threads: {}
        compression: {} (level {})
        test_limit: {:?}
        seed: {}",
        self.train_file, self.test_file, self.output_dir, self.k, self.class_names, self.num_threads,
        self.compression, self.compression_level, self.test_limit, self.seed)
    }
}

pub struct Config {
    params: JsonParams
}

impl Config {

    pub fn get_params(&self) -> JsonParams {
        self.params.clone()
    }

    pub fn new(args: &[String]) -> Result<Config> {

        if args.len() != 2 {
            return Err(NcdError::Config("input should be a path to json file only".to_string()));
        }

        let f = BufReader::new(File::open(&args[1])?);
        let json: Value = serde_json::from_reader(f)?;
        Config::from_json(&json)
    }

    pub fn from_json(json: &Value) -> Result<Config> {

        if !json.is_object() {
            return Err(NcdError::Config("top level json value should be an object".to_string()));
        }

        // only the training corpus is mandatory
        let train_file = match read_str(json, "train_file")? {
            Some(train_file) => train_file,
            None => return Err(NcdError::Config("train_file was not supplied through json".to_string()))
        };

        let class_names = match json.get("class_names") {
            Some(Value::Array(names)) => names.iter().map(|name| match name.as_str() {
                Some(name) => Ok(name.to_string()),
                None => Err(NcdError::Config("class_names should only hold strings".to_string()))
            }).collect::<Result<Vec<String>>>()?,
            Some(_) => return Err(NcdError::Config("class_names should be an array".to_string())),
            None => DEFAULT_CLASS_NAMES.iter().map(|name| name.to_string()).collect()
        };
        if class_names.is_empty() {
            return Err(NcdError::Config("class_names should name at least one class".to_string()));
        }

        let compression = match read_str(json, "compression")? {
            Some(compression) => compression.parse::<Framing>()?,
            None => Framing::Zlib
        };

        let compression_level = read_usize(json, "compression_level")?.unwrap_or(9);
        if compression_level > 9 {
            return Err(NcdError::InvalidArgument(format!("compression_level must be within 0..=9, got {}", compression_level)));
        }

        let num_threads = read_usize(json, "num_threads")?.unwrap_or(1);
        if num_threads == 0 {
            return Err(NcdError::InvalidArgument("num_threads must be at least 1".to_string()));
        }

        let params = JsonParams {
            train_file: train_file,
            test_file: read_str(json, "test_file")?,
            query: read_str(json, "query")?,
            output_dir: read_str(json, "output_dir")?.unwrap_or_else(|| "Output".to_string()),
            k: read_usize(json, "k")?.unwrap_or(5),
            class_names: class_names,
            num_threads: num_threads,
            compression: compression,
            compression_level: compression_level as u32,
            test_limit: read_usize(json, "test_limit")?,
            seed: read_usize(json, "seed")?.unwrap_or(42) as u64,
            progress_every: read_usize(json, "progress_every")?.unwrap_or(1000).max(1),
        };

        Ok(
            Self {
                params: params
            }
        )
    }

}

fn read_str(json: &Value, key: &str) -> Result<Option<String>> {
    match json.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.to_owned())),
        Some(other) => Err(NcdError::Config(format!("{} should be a string, got {}", key, other)))
    }
}

// negative and fractional numbers are rejected before any work starts
fn read_usize(json: &Value, key: &str) -> Result<Option<usize>> {
    match json.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match value.as_u64().map(usize::try_from) {
            Some(Ok(n)) => Ok(Some(n)),
            Some(Err(_)) => Err(NcdError::InvalidArgument(format!("{} does not fit a usize on this target, got {}", key, value))),
            None => Err(NcdError::InvalidArgument(format!("{} must be a non-negative integer, got {}", key, value)))
        }
    }
}


pub mod files_handling {

    use crate::corpus::{ClassId, Corpus, Sample};
    use crate::error::{NcdError, Result};

    use ndarray::Array2;
    use ndarray_npy::write_npy;
    use serde::Serialize;
    use std::{fs::{self, File}, io::{BufReader, BufWriter, Read, Write}, path::Path};

    /// Reads a delimited corpus: a header row, then `<class code>,<text...>` rows.
    pub fn read_corpus(file_path: &str, class_count: usize) -> Result<Corpus> {
        let f = BufReader::new(File::open(file_path)?);
        parse_corpus(f, class_count)
    }

    pub fn parse_corpus<R: Read>(reader: R, class_count: usize) -> Result<Corpus> {

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut samples = Vec::new();
        for record in rdr.byte_records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());

            let class_field = match record.get(0) {
                Some(field) => field,
                None => return Err(NcdError::CorpusFormat { line: line, reason: "empty row".to_string() })
            };
            let label = parse_class_code(class_field, class_count, line)?;

            if record.len() < 2 {
                return Err(NcdError::CorpusFormat { line: line, reason: "missing text column".to_string() });
            }

            // the remaining columns (e.g. title and description) form the text
            let text = record.iter().skip(1).collect::<Vec<&[u8]>>().join(&b' ');
            samples.push(Sample::new(label, text));
        }

        Corpus::new(samples, class_count)
    }

    /// Class codes are one-based decimal integers on disk, `1..=class_count`.
    pub fn parse_class_code(field: &[u8], class_count: usize, line: u64) -> Result<ClassId> {

        let code = std::str::from_utf8(field).map(|s| s.trim()).unwrap_or("");
        let code_value = match code.parse::<usize>() {
            Ok(code_value) => code_value,
            Err(_) => return Err(NcdError::CorpusFormat {
                line: line,
                reason: format!("class code '{}' is not a decimal integer", String::from_utf8_lossy(field))
            })
        };

        if code_value == 0 || code_value > class_count {
            return Err(NcdError::CorpusFormat {
                line: line,
                reason: format!("class code {} outside of 1..={}", code_value, class_count)
            });
        }

        Ok(ClassId(code_value - 1))
    }

    pub fn save_output<S: SaveFile>(output_dir: &str, file_name: &str, item: &S) -> Result<()> {

        // create output folder
        fs::create_dir_all(output_dir)?;
        item.save_file(output_dir, file_name)
    }

    pub trait SaveFile {
        fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()>;
    }

    impl SaveFile for Array2<u64> {
        fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()> {
            let out = Path::new(output_dir).join(format!("{}.npy", file_name));
            write_npy(out, self)?;
            Ok(())
        }
    }

    impl<T: Serialize> SaveFile for Vec<T> {
        fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()> {
            let out = Path::new(output_dir).join(format!("{}.json", file_name));
            let mut f = BufWriter::new(File::create(out)?);
            serde_json::to_writer_pretty(&mut f, self)?;
            f.flush()?;
            Ok(())
        }
    }

}


#[cfg(test)]
mod tests {

    use super::{Config, files_handling};
    use crate::compressor::Framing;
    use crate::corpus::ClassId;
    use crate::error::NcdError;
    use ndarray::Array2;
    use ndarray_npy::read_npy;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn defaults_test() {

        let params = Config::from_json(&json!({"train_file": "train.csv"})).unwrap().get_params();
        assert_eq!(params.train_file, "train.csv");
        assert_eq!(params.test_file, None);
        assert_eq!(params.output_dir, "Output");
        assert_eq!(params.k, 5);
        assert_eq!(params.class_count(), 4);
        assert_eq!(params.class_name(3), "Sci/Tech");
        assert_eq!(params.class_name(7), "<unknown>");
        assert_eq!(params.num_threads, 1);
        assert_eq!(params.compression, Framing::Zlib);
        assert_eq!(params.compression_level, 9);
        assert_eq!(params.seed, 42);
    }

    #[test]
    fn overrides_test() {

        let json = json!({
            "train_file": "train.csv",
            "test_file": "test.csv",
            "query": "some text",
            "k": 3,
            "class_names": ["spam", "ham"],
            "num_threads": 8,
            "compression": "raw",
            "compression_level": 6,
            "test_limit": 100
        });
        let params = Config::from_json(&json).unwrap().get_params();
        assert_eq!(params.test_file.as_deref(), Some("test.csv"));
        assert_eq!(params.query.as_deref(), Some("some text"));
        assert_eq!(params.k, 3);
        assert_eq!(params.class_count(), 2);
        assert_eq!(params.num_threads, 8);
        assert_eq!(params.compressor().unwrap().framing(), Framing::Raw);
        assert_eq!(params.compressor().unwrap().level(), 6);
        assert_eq!(params.test_limit, Some(100));
    }

    #[test]
    fn invalid_k_test() {

        for k in [json!(-1), json!(2.5), json!("five")] {
            let result = Config::from_json(&json!({"train_file": "train.csv", "k": k}));
            assert!(matches!(result, Err(NcdError::InvalidArgument(_))));
        }

        // u64::MAX only fits where usize is 64 bits wide
        let result = Config::from_json(&json!({"train_file": "train.csv", "k": u64::MAX}));
        if usize::BITS < 64 {
            assert!(matches!(result, Err(NcdError::InvalidArgument(_))));
        } else {
            assert_eq!(result.unwrap().get_params().k, usize::MAX);
        }

        // zero is a legal, degenerate k
        let params = Config::from_json(&json!({"train_file": "train.csv", "k": 0})).unwrap().get_params();
        assert_eq!(params.k, 0);
    }

    #[test]
    fn invalid_config_test() {
        assert!(Config::from_json(&json!({})).is_err());
        assert!(Config::from_json(&json!([1, 2])).is_err());
        assert!(Config::from_json(&json!({"train_file": 3})).is_err());
        assert!(Config::from_json(&json!({"train_file": "a", "class_names": []})).is_err());
        assert!(Config::from_json(&json!({"train_file": "a", "compression": "gzip"})).is_err());
        assert!(Config::from_json(&json!({"train_file": "a", "compression_level": 12})).is_err());
        assert!(Config::from_json(&json!({"train_file": "a", "num_threads": 0})).is_err());
        assert!(Config::new(&["prog".to_string()]).is_err());
    }

    #[test]
    fn config_file_test() {

        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{{\"train_file\": \"data/train.csv\", \"k\": 7}}").unwrap();
        let args = vec!["prog".to_string(), f.path().display().to_string()];

        let params = Config::new(&args).unwrap().get_params();
        assert_eq!(params.train_file, "data/train.csv");
        assert_eq!(params.k, 7);
    }

    #[test]
    fn parse_corpus_test() {

        let content = "\"Class Index\",\"Title\",\"Description\"\n\
            \"3\",\"Wall St. Bears Claw Back\",\"Short-sellers, Wall Street's dwindling band, are seeing green again.\"\n\
            2,Sinner wins,Sinner rallies from two sets down\n\
            4,single column text\n";
        let corpus = files_handling::parse_corpus(content.as_bytes(), 4).unwrap();

        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.samples()[0].label(), ClassId(2));
        assert_eq!(
            corpus.samples()[0].text(),
            &b"Wall St. Bears Claw Back Short-sellers, Wall Street's dwindling band, are seeing green again."[..]
        );
        assert_eq!(corpus.samples()[1].label(), ClassId(1));
        assert_eq!(corpus.samples()[1].text(), &b"Sinner wins Sinner rallies from two sets down"[..]);
        assert_eq!(corpus.samples()[2].label(), ClassId(3));
        assert_eq!(corpus.samples()[2].text(), &b"single column text"[..]);
    }

    #[test]
    fn bad_class_code_test() {

        // multi-digit, non-numeric, zero and out of range codes are all refused
        for row in ["12,text", "x,text", "0,text", "5,text", ",text"] {
            let content = format!("label,text\n{}\n", row);
            let result = files_handling::parse_corpus(content.as_bytes(), 4);
            assert!(matches!(result, Err(NcdError::CorpusFormat { line: 2, .. })), "row {} was accepted", row);
        }

        let result = files_handling::parse_corpus("label,text\n1\n".as_bytes(), 4);
        assert!(matches!(result, Err(NcdError::CorpusFormat { .. })));

        // codes above 9 are fine when the domain has that many classes
        let corpus = files_handling::parse_corpus("label,text\n12,text\n".as_bytes(), 12).unwrap();
        assert_eq!(corpus.samples()[0].label(), ClassId(11));
    }

    #[test]
    fn header_only_test() {
        let corpus = files_handling::parse_corpus("label,text\n".as_bytes(), 4).unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn read_and_save_test() {

        let dir = tempfile::tempdir().unwrap();
        let train_path = dir.path().join("train.csv");
        std::fs::write(&train_path, "label,text\n1,first\n2,second\n").unwrap();
        let corpus = files_handling::read_corpus(train_path.to_str().unwrap(), 2).unwrap();
        assert_eq!(corpus.len(), 2);

        let output_dir = dir.path().join("out");
        let output_dir = output_dir.to_str().unwrap();
        let confusion: Array2<u64> = Array2::from_shape_vec((2, 2), vec![3, 1, 0, 4]).unwrap();
        files_handling::save_output(output_dir, "confusion", &confusion).unwrap();
        let loaded: Array2<u64> = read_npy(format!("{}/confusion.npy", output_dir)).unwrap();
        assert_eq!(loaded, confusion);

        files_handling::save_output(output_dir, "names", &vec!["a".to_string(), "b".to_string()]).unwrap();
        let names: Vec<String> = serde_json::from_str(&std::fs::read_to_string(format!("{}/names.json", output_dir)).unwrap()).unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }

}
