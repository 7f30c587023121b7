//! Pure transforms from raw backend payloads to the minimal structures a
//! chart or table consumes. None of them mutate their input or keep state,
//! so deriving twice from the same payload yields equal view models.

pub mod datasets;
pub mod genes;
pub mod heatmap;
pub mod pca;
pub mod statistics;
pub mod volcano;

use serde_json::Value;

use crate::error::NetaError;

pub use datasets::{DatasetCollection, rank_datasets};
pub use genes::shape_genes;
pub use heatmap::{HeatmapImage, HeatmapView, shape_heatmap};
pub use pca::{PcaPoint, PcaView, shape_pca};
pub use statistics::{Breakdown, StatisticsView, shape_statistics};
pub use volcano::{VolcanoPoint, VolcanoView, shape_volcano};

/// Unwraps the `{task_id, status, results, error}` envelope returned by the
/// analysis routes.
pub fn analysis_results(envelope: Value) -> Result<Value, NetaError> {
    let Value::Object(mut fields) = envelope else {
        return Err(NetaError::Decode(
            "analysis response is not a JSON object".to_string(),
        ));
    };
    if fields.get("status").and_then(Value::as_str) == Some("failed") {
        let message = fields
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("backend reported a failed analysis")
            .to_string();
        return Err(NetaError::AnalysisFailed(message));
    }
    fields
        .remove("results")
        .ok_or_else(|| NetaError::Decode("analysis response has no results".to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_yields_results() {
        let envelope = json!({"task_id": 9, "status": "completed", "results": {"n_genes": 50}});
        assert_eq!(analysis_results(envelope).unwrap(), json!({"n_genes": 50}));
    }

    #[test]
    fn failed_envelope_carries_backend_message() {
        let envelope = json!({"task_id": 9, "status": "failed", "error": "R script not found"});
        assert_matches!(
            analysis_results(envelope),
            Err(NetaError::AnalysisFailed(message)) if message == "R script not found"
        );
    }

    #[test]
    fn envelope_without_results_is_decode_failure() {
        assert_matches!(
            analysis_results(json!({"status": "completed"})),
            Err(NetaError::Decode(_))
        );
        assert_matches!(analysis_results(json!([1, 2])), Err(NetaError::Decode(_)));
    }
}
