use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ClusteringMethod;
use crate::error::NetaError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum HeatmapImage {
    Ready { png_base64: String },
    /// Image not rendered yet; a valid intermediate state, not a fault.
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapView {
    pub image: HeatmapImage,
    pub gene_count: Option<u64>,
    pub sample_count: Option<u64>,
    pub clustering_method: ClusteringMethod,
}

impl HeatmapView {
    pub fn is_ready(&self) -> bool {
        matches!(self.image, HeatmapImage::Ready { .. })
    }
}

#[derive(Deserialize)]
struct RawHeatmap {
    #[serde(default)]
    heatmap_image: Option<String>,
    #[serde(default)]
    n_genes: Option<u64>,
    #[serde(default)]
    n_samples: Option<u64>,
}

pub fn shape_heatmap(
    raw: &Value,
    clustering_method: ClusteringMethod,
) -> Result<HeatmapView, NetaError> {
    let raw = RawHeatmap::deserialize(raw).map_err(NetaError::decode)?;
    let image = match raw.heatmap_image {
        Some(encoded) if !encoded.trim().is_empty() => HeatmapImage::Ready {
            png_base64: encoded,
        },
        _ => HeatmapImage::Pending,
    };
    Ok(HeatmapView {
        image,
        gene_count: raw.n_genes,
        sample_count: raw.n_samples,
        clustering_method,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn absent_image_is_pending() {
        let view = shape_heatmap(
            &json!({"n_genes": 50, "n_samples": 24}),
            ClusteringMethod::Hierarchical,
        )
        .unwrap();
        assert_eq!(view.image, HeatmapImage::Pending);
        assert_eq!(view.gene_count, Some(50));
        assert!(!view.is_ready());
    }

    #[test]
    fn empty_image_string_is_pending() {
        let view = shape_heatmap(
            &json!({"heatmap_image": "", "n_genes": 10, "n_samples": 4}),
            ClusteringMethod::Kmeans,
        )
        .unwrap();
        assert_eq!(view.image, HeatmapImage::Pending);
    }

    #[test]
    fn encoded_image_is_ready() {
        let view = shape_heatmap(
            &json!({"heatmap_image": "iVBORw0KGgo=", "n_genes": 10, "n_samples": 4}),
            ClusteringMethod::Unclustered,
        )
        .unwrap();
        assert!(view.is_ready());
        assert_eq!(view.sample_count, Some(4));
    }
}
