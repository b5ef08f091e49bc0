
// accuracy bookkeeping over a labeled test corpus

use crate::corpus::ClassId;

use ndarray::Array2;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub index: usize,
    pub actual: ClassId,
    pub predicted: ClassId,
}

/// Confusion matrix (rows = actual class, columns = predicted class) and the
/// individual predictions it was built from.
#[derive(Clone, Debug)]
pub struct Evaluation {
    confusion: Array2<u64>,
    predictions: Vec<Prediction>,
}

impl Evaluation {

    pub fn new(class_count: usize) -> Evaluation {
        Self {
            confusion: Array2::zeros((class_count, class_count)),
            predictions: Vec::new()
        }
    }

    pub fn record(&mut self, index: usize, actual: ClassId, predicted: ClassId) {
        if let Some(cell) = self.confusion.get_mut((actual.0, predicted.0)) {
            *cell += 1;
        }
        self.predictions.push(Prediction { index: index, actual: actual, predicted: predicted });
    }

    pub fn confusion(&self) -> &Array2<u64> {
        &self.confusion
    }

    pub fn predictions(&self) -> &Vec<Prediction> {
        &self.predictions
    }

    pub fn total(&self) -> u64 {
        self.confusion.sum()
    }

    pub fn correct(&self) -> u64 {
        self.confusion.diag().sum()
    }

    /// Fraction of correct predictions, 0 when nothing was evaluated.
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct() as f64 / total as f64
        }
    }

    /// Recall of one class: correct predictions over its actual occurrences.
    pub fn recall(&self, class: ClassId) -> Option<f64> {
        if class.0 >= self.confusion.nrows() {
            return None;
        }
        let row = self.confusion.row(class.0);
        let actual = row.sum();
        if actual == 0 {
            return None;
        }
        Some(row[class.0] as f64 / actual as f64)
    }
}
