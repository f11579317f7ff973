use std::sync::Arc;

use housecast_core::FeatureRecord;

use crate::PredictError;

/// A loaded regression model.
///
/// Implementations are immutable after construction and shared across
/// request handlers without locking.
pub trait Predictor: Send + Sync {
    /// Predict one value per input row, in row order.
    fn predict(&self, rows: &[FeatureRecord]) -> Result<Vec<f64>, PredictError>;
}

/// Single-record price prediction over a shared [`Predictor`].
#[derive(Clone)]
pub struct PredictionService {
    model: Arc<dyn Predictor>,
}

impl PredictionService {
    pub fn new(model: Arc<dyn Predictor>) -> Self {
        Self { model }
    }

    /// Predict the price for one record.
    pub fn predict(&self, record: &FeatureRecord) -> Result<f64, PredictError> {
        let output = self.model.predict(std::slice::from_ref(record))?;
        output.first().copied().ok_or(PredictError::EmptyOutput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ForestModel;
    use crate::forest::tests::{record, sample_artifact};

    struct NoRows;

    impl Predictor for NoRows {
        fn predict(&self, _rows: &[FeatureRecord]) -> Result<Vec<f64>, PredictError> {
            Ok(vec![])
        }
    }

    #[test]
    fn predicts_single_record_with_forest() {
        let bytes = serde_json::to_vec(&sample_artifact()).unwrap();
        let model = ForestModel::from_slice(&bytes).unwrap();
        let service = PredictionService::new(Arc::new(model));
        assert_eq!(service.predict(&record(150.0, "House")).unwrap(), 850000.0);
    }

    #[test]
    fn empty_output_is_an_error() {
        let service = PredictionService::new(Arc::new(NoRows));
        let err = service.predict(&record(60.0, "Flat")).unwrap_err();
        assert!(matches!(err, PredictError::EmptyOutput));
    }

    #[test]
    fn service_clones_share_the_model() {
        let service = PredictionService::new(Arc::new(NoRows));
        let clone = service.clone();
        assert!(Arc::ptr_eq(&service.model, &clone.model));
    }
}
