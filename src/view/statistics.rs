use serde::Serialize;

use crate::domain::{CountBucket, StatisticsSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsView {
    pub total_datasets: u64,
    pub total_samples: u64,
    pub total_genes: u64,
    pub total_expression_records: u64,
    pub expression_records_millions: f64,
    pub tissue_types: Vec<Breakdown>,
    pub tumor_types: Vec<Breakdown>,
    pub publication_years: Vec<Breakdown>,
}

/// Breakdowns keep the backend's order; unnamed buckets become `Unknown`.
pub fn shape_statistics(snapshot: &StatisticsSnapshot) -> StatisticsView {
    StatisticsView {
        total_datasets: snapshot.total_datasets,
        total_samples: snapshot.total_samples,
        total_genes: snapshot.total_genes,
        total_expression_records: snapshot.total_expressions,
        expression_records_millions: snapshot.total_expressions as f64 / 1_000_000.0,
        tissue_types: breakdown(&snapshot.tissue_types),
        tumor_types: breakdown(&snapshot.tumor_types),
        publication_years: breakdown(&snapshot.publication_years),
    }
}

fn breakdown(buckets: &[CountBucket]) -> Vec<Breakdown> {
    buckets
        .iter()
        .map(|bucket| Breakdown {
            label: bucket
                .name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            count: bucket.count,
        })
        .collect()
}
