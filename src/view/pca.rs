use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::NetaError;

const SAMPLE_KEYS: [&str; 3] = ["sample", "sample_id", "sample_name"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcaPoint {
    pub sample: Option<String>,
    /// Value of the `color_by` field for this sample, when the payload has it.
    pub group: Option<String>,
    /// One slot per requested component. `None` means the axis is not
    /// available, which is distinct from a real zero coordinate.
    pub coordinates: Vec<Option<f64>>,
}

impl PcaPoint {
    /// One-based component accessor.
    pub fn component(&self, component: usize) -> Option<f64> {
        component
            .checked_sub(1)
            .and_then(|index| self.coordinates.get(index).copied().flatten())
    }

    pub fn pc1(&self) -> Option<f64> {
        self.component(1)
    }

    pub fn pc2(&self) -> Option<f64> {
        self.component(2)
    }

    pub fn pc3(&self) -> Option<f64> {
        self.component(3)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcaView {
    pub num_components: usize,
    pub points: Vec<PcaPoint>,
    pub explained_variance_ratio: Vec<Option<f64>>,
}

impl PcaView {
    /// Axis title such as `PC1 (42.3%)`, or `PC3 (n/a)` when the ratio is missing.
    pub fn axis_label(&self, component: usize) -> String {
        let ratio = component
            .checked_sub(1)
            .and_then(|index| self.explained_variance_ratio.get(index).copied().flatten());
        match ratio {
            Some(ratio) => format!("PC{component} ({:.1}%)", ratio * 100.0),
            None => format!("PC{component} (n/a)"),
        }
    }
}

/// Keeps the first `num_components` coordinates of each sample and the
/// matching prefix of the explained variance ratio. Components the payload
/// lacks come back as `None` rather than failing.
pub fn shape_pca(
    raw: &Value,
    num_components: usize,
    color_by: Option<&str>,
) -> Result<PcaView, NetaError> {
    let samples = raw
        .get("pca_data")
        .and_then(Value::as_array)
        .ok_or_else(|| NetaError::Decode("PCA result has no pca_data array".to_string()))?;
    let ratios = raw
        .get("explained_variance_ratio")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            NetaError::Decode("PCA result has no explained_variance_ratio array".to_string())
        })?;

    let points = samples
        .iter()
        .map(|sample| {
            let fields = sample.as_object().ok_or_else(|| {
                NetaError::Decode("PCA sample entry is not an object".to_string())
            })?;
            Ok(PcaPoint {
                sample: SAMPLE_KEYS.iter().find_map(|key| label(fields, key)),
                group: color_by.and_then(|key| label(fields, key)),
                coordinates: (1..=num_components)
                    .map(|component| coordinate(fields, component))
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>, NetaError>>()?;

    let explained_variance_ratio = (0..num_components)
        .map(|index| ratios.get(index).and_then(Value::as_f64))
        .collect();

    Ok(PcaView {
        num_components,
        points,
        explained_variance_ratio,
    })
}

fn coordinate(fields: &Map<String, Value>, component: usize) -> Option<f64> {
    fields
        .get(&format!("PC{component}"))
        .or_else(|| fields.get(&format!("pc{component}")))
        .and_then(Value::as_f64)
}

fn label(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn payload() -> Value {
        json!({
            "pca_data": [
                {"sample": "GSM1", "PC1": 1.5, "PC2": 0.0, "tumor_type": "SCLC"},
                {"sample": "GSM2", "PC1": -2.0, "PC2": 0.25, "tumor_type": "NEPC"}
            ],
            "explained_variance_ratio": [0.42, 0.18]
        })
    }

    #[test]
    fn missing_third_component_is_absent_not_zero() {
        let view = shape_pca(&payload(), 3, Some("tumor_type")).unwrap();
        assert_eq!(view.points[0].pc1(), Some(1.5));
        assert_eq!(view.points[0].pc2(), Some(0.0));
        assert_eq!(view.points[0].pc3(), None);
        assert_eq!(view.points[0].coordinates.len(), 3);
        assert_eq!(view.explained_variance_ratio, vec![Some(0.42), Some(0.18), None]);
        assert_eq!(view.axis_label(3), "PC3 (n/a)");
    }

    #[test]
    fn extra_components_are_trimmed() {
        let raw = json!({
            "pca_data": [{"pc1": 1.0, "pc2": 2.0, "pc3": 3.0}],
            "explained_variance_ratio": [0.5, 0.3, 0.1]
        });
        let view = shape_pca(&raw, 2, None).unwrap();
        assert_eq!(view.points[0].coordinates, vec![Some(1.0), Some(2.0)]);
        assert_eq!(view.explained_variance_ratio, vec![Some(0.5), Some(0.3)]);
        assert_eq!(view.axis_label(1), "PC1 (50.0%)");
    }

    #[test]
    fn group_label_follows_color_by() {
        let view = shape_pca(&payload(), 2, Some("tumor_type")).unwrap();
        assert_eq!(view.points[1].group.as_deref(), Some("NEPC"));
        assert_eq!(view.points[1].sample.as_deref(), Some("GSM2"));
    }

    #[test]
    fn rederiving_is_structurally_equal() {
        let raw = payload();
        assert_eq!(
            shape_pca(&raw, 3, Some("tumor_type")).unwrap(),
            shape_pca(&raw, 3, Some("tumor_type")).unwrap()
        );
    }

    #[test]
    fn missing_points_array_is_decode_failure() {
        let raw = json!({"explained_variance_ratio": [0.4, 0.2]});
        assert_matches!(shape_pca(&raw, 2, None), Err(NetaError::Decode(_)));
    }
}
