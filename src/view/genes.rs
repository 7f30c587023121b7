use serde::Deserialize;
use serde_json::Value;

use crate::domain::Gene;
use crate::error::NetaError;

/// Trimmed search term, or `None` when there is nothing worth sending.
pub fn normalize_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

pub fn shape_genes(raw: &Value) -> Result<Vec<Gene>, NetaError> {
    Vec::<Gene>::deserialize(raw).map_err(NetaError::decode)
}
