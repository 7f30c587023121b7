use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NetaError;

/// Per-gene point, passed through from the backend as is. R writes `NA` as
/// null, so either coordinate may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolcanoPoint {
    #[serde(default, alias = "gene_symbol", skip_serializing_if = "Option::is_none")]
    pub gene: Option<String>,
    #[serde(rename = "log2FoldChange", default)]
    pub log2_fold_change: Option<f64>,
    #[serde(rename = "negLog10Pvalue", alias = "negLog10PValue", default)]
    pub neg_log10_p_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolcanoView {
    pub points: Vec<VolcanoPoint>,
    pub upregulated_count: u64,
    pub downregulated_count: u64,
    pub significant_count: u64,
}

impl VolcanoView {
    /// Points with both coordinates present, as `(x, y)` pairs.
    pub fn plottable(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points
            .iter()
            .filter_map(|point| Some((point.log2_fold_change?, point.neg_log10_p_value?)))
    }
}

#[derive(Deserialize)]
struct RawVolcano {
    #[serde(default)]
    volcano_data: Vec<VolcanoPoint>,
    upregulated_count: u64,
    downregulated_count: u64,
    significant_count: u64,
}

/// The three counts are independent fields taken verbatim from the backend;
/// they are never recomputed from the points or reconciled with each other.
pub fn shape_volcano(raw: &Value) -> Result<VolcanoView, NetaError> {
    let raw = RawVolcano::deserialize(raw).map_err(NetaError::decode)?;
    Ok(VolcanoView {
        points: raw.volcano_data,
        upregulated_count: raw.upregulated_count,
        downregulated_count: raw.downregulated_count,
        significant_count: raw.significant_count,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn counts_are_not_reconciled() {
        let raw = json!({
            "volcano_data": [
                {"gene": "ASCL1", "log2FoldChange": 3.2, "negLog10Pvalue": 8.1},
                {"gene": "NEUROD1", "log2FoldChange": -1.4, "negLog10Pvalue": 2.0}
            ],
            "upregulated_count": 1,
            "downregulated_count": 1,
            "significant_count": 7
        });
        let view = shape_volcano(&raw).unwrap();
        assert_eq!(view.points.len(), 2);
        assert_eq!(view.upregulated_count, 1);
        assert_eq!(view.downregulated_count, 1);
        assert_eq!(view.significant_count, 7);
    }

    #[test]
    fn null_coordinates_are_kept_but_not_plotted() {
        let raw = json!({
            "volcano_data": [
                {"log2FoldChange": null, "negLog10Pvalue": 1.0},
                {"log2FoldChange": 0.0, "negLog10Pvalue": 0.5}
            ],
            "upregulated_count": 0,
            "downregulated_count": 0,
            "significant_count": 0
        });
        let view = shape_volcano(&raw).unwrap();
        assert_eq!(view.points[0].log2_fold_change, None);
        assert_eq!(view.plottable().collect::<Vec<_>>(), vec![(0.0, 0.5)]);
    }

    #[test]
    fn missing_count_is_decode_failure() {
        let raw = json!({"volcano_data": [], "upregulated_count": 2, "downregulated_count": 1});
        assert_matches!(shape_volcano(&raw), Err(NetaError::Decode(_)));
    }
}
