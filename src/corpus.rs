
// in-memory representation of the labeled corpus and of the ephemeral values a
// single classification produces from it.

use crate::error::{NcdError, Result};

use std::fmt::Display;
use serde::Serialize;

/// Zero-based class index, bounded by the class count of the corpus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ClassId(pub usize);

impl ClassId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    label: ClassId,
    text: Box<[u8]>,
}

impl Sample {

    pub fn new(label: ClassId, text: impl Into<Vec<u8>>) -> Sample {
        Self {
            label: label,
            text: text.into().into_boxed_slice()
        }
    }

    pub fn label(&self) -> ClassId {
        self.label
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }
}

/// An ordered collection of samples whose labels all fall below `class_count`.
///
/// Order only matters for tie-breaking between equal distances, duplicates are
/// legal and simply weigh more in the vote.
#[derive(Clone, Debug)]
pub struct Corpus {
    samples: Vec<Sample>,
    class_count: usize,
}

impl Corpus {

    pub fn new(samples: Vec<Sample>, class_count: usize) -> Result<Corpus> {

        if class_count == 0 {
            return Err(NcdError::InvalidArgument("class count must be at least 1".to_string()));
        }

        if let Some((i, sample)) = samples.iter().enumerate().find(|(_, s)| s.label.0 >= class_count) {
            return Err(NcdError::InvalidArgument(format!(
                "sample {} has label {} but only {} classes are known", i, sample.label, class_count
            )));
        }

        Ok(
            Self {
                samples: samples,
                class_count: class_count
            }
        )
    }

    pub fn empty(class_count: usize) -> Result<Corpus> {
        Corpus::new(Vec::new(), class_count)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }
}

/// Distance from the query to one corpus sample, along with that sample's label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceRecord {
    pub distance: f64,
    pub label: ClassId,
}

/// Votes per class among the nearest records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassVoteTally {
    counts: Vec<usize>,
}

impl ClassVoteTally {

    pub fn new(class_count: usize) -> ClassVoteTally {
        Self {
            counts: vec![0; class_count]
        }
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a DistanceRecord>, class_count: usize) -> ClassVoteTally {
        let mut tally = ClassVoteTally::new(class_count);
        for record in records {
            tally.vote(record.label);
        }
        tally
    }

    pub fn vote(&mut self, label: ClassId) {
        debug_assert!(label.0 < self.counts.len(), "label {} outside of tally", label);
        if let Some(count) = self.counts.get_mut(label.0) {
            *count += 1;
        }
    }

    pub fn count(&self, label: ClassId) -> usize {
        self.counts.get(label.0).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// The class with the strictly highest count.
    ///
    /// Classes are scanned in ascending order and only a strictly greater count
    /// replaces the current pick, so ties go to the lowest class id and an empty
    /// tally yields `ClassId(0)`.
    pub fn winner(&self) -> ClassId {
        let mut predicted = 0;
        for (i, count) in self.counts.iter().enumerate().skip(1) {
            if self.counts[predicted] < *count {
                predicted = i;
            }
        }
        ClassId(predicted)
    }
}
