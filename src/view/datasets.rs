use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Dataset, DatasetFilter};
use crate::error::NetaError;

/// Stable sort with RNA-seq datasets first; everything else keeps its
/// original relative order. The input is left untouched.
pub fn rank_datasets(datasets: &[Dataset]) -> Vec<Dataset> {
    let mut ranked = datasets.to_vec();
    ranked.sort_by_key(|dataset| if dataset.is_rna_seq() { 0u8 } else { 1 });
    ranked
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetCollection {
    pub datasets: Vec<Dataset>,
    /// Page count reported by the server, absent for bare arrays.
    pub pages: Option<usize>,
}

#[derive(Deserialize)]
struct WrappedDatasets {
    datasets: Vec<Dataset>,
    #[serde(default)]
    pages: Option<usize>,
}

/// Accepts both `{datasets, pages, ...}` and a bare array of datasets.
pub fn decode_datasets(raw: Value) -> Result<DatasetCollection, NetaError> {
    if raw.is_array() {
        let datasets = serde_json::from_value(raw).map_err(NetaError::decode)?;
        return Ok(DatasetCollection {
            datasets,
            pages: None,
        });
    }
    let wrapped: WrappedDatasets = serde_json::from_value(raw).map_err(NetaError::decode)?;
    Ok(DatasetCollection {
        datasets: wrapped.datasets,
        pages: wrapped.pages,
    })
}

/// Case-insensitive substring match on title or GEO accession, capped at
/// `limit`.
pub fn search_datasets(datasets: Vec<Dataset>, query: &str, limit: usize) -> Vec<Dataset> {
    let needle = query.trim().to_lowercase();
    datasets
        .into_iter()
        .filter(|dataset| {
            needle.is_empty()
                || dataset.geo_accession_id.to_lowercase().contains(&needle)
                || dataset
                    .title
                    .as_deref()
                    .is_some_and(|title| title.to_lowercase().contains(&needle))
        })
        .take(limit)
        .collect()
}

pub fn filter_datasets(datasets: Vec<Dataset>, filter: &DatasetFilter) -> Vec<Dataset> {
    datasets
        .into_iter()
        .filter(|dataset| filter.matches(dataset))
        .collect()
}

pub fn find_dataset(datasets: Vec<Dataset>, id: u64) -> Option<Dataset> {
    datasets.into_iter().find(|dataset| dataset.id == id)
}
