use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::NetaError;

/// Measurement technology of a dataset. Only used as a display-ranking key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssayType {
    RnaSeq,
    Microarray,
    Other(String),
}

impl AssayType {
    pub fn as_str(&self) -> &str {
        match self {
            AssayType::RnaSeq => "RNA-seq",
            AssayType::Microarray => "Microarray",
            AssayType::Other(value) => value,
        }
    }
}

impl From<String> for AssayType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "RNA-seq" => AssayType::RnaSeq,
            "Microarray" => AssayType::Microarray,
            _ => AssayType::Other(value),
        }
    }
}

impl From<AssayType> for String {
    fn from(value: AssayType) -> Self {
        match value {
            AssayType::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AssayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: u64,
    #[serde(rename = "geo_id")]
    pub geo_accession_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tissue_type: Option<String>,
    #[serde(default)]
    pub tumor_type: Option<String>,
    #[serde(default)]
    pub assay_type: Option<AssayType>,
    #[serde(rename = "n_samples", default)]
    pub sample_count: Option<u64>,
    #[serde(rename = "n_genes", default)]
    pub gene_count: Option<u64>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_pmid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
}

impl Dataset {
    pub fn is_rna_seq(&self) -> bool {
        matches!(self.assay_type, Some(AssayType::RnaSeq))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    pub id: u64,
    pub gene_id: String,
    #[serde(rename = "gene_symbol", default)]
    pub symbol: Option<String>,
    #[serde(rename = "gene_name", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub chromosome: Option<String>,
    #[serde(default)]
    pub gene_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBucket {
    #[serde(default)]
    pub name: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub total_datasets: u64,
    pub total_samples: u64,
    pub total_genes: u64,
    #[serde(alias = "total_expression_records")]
    pub total_expressions: u64,
    #[serde(default)]
    pub tissue_types: Vec<CountBucket>,
    #[serde(default)]
    pub tumor_types: Vec<CountBucket>,
    #[serde(default)]
    pub publication_years: Vec<CountBucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Equality filter over dataset attributes. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetFilter {
    pub tissue_type: Option<String>,
    pub tumor_type: Option<String>,
    pub assay_type: Option<String>,
}

impl DatasetFilter {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        [
            ("tissue_type", &self.tissue_type),
            ("tumor_type", &self.tumor_type),
            ("assay_type", &self.assay_type),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
        .collect()
    }

    pub fn matches(&self, dataset: &Dataset) -> bool {
        field_matches(&self.tissue_type, dataset.tissue_type.as_deref())
            && field_matches(&self.tumor_type, dataset.tumor_type.as_deref())
            && field_matches(
                &self.assay_type,
                dataset.assay_type.as_ref().map(AssayType::as_str),
            )
    }
}

fn field_matches(wanted: &Option<String>, actual: Option<&str>) -> bool {
    match wanted {
        Some(wanted) => actual.is_some_and(|actual| actual.eq_ignore_ascii_case(wanted)),
        None => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClusteringMethod {
    Hierarchical,
    Kmeans,
    #[serde(rename = "none")]
    #[value(name = "none")]
    Unclustered,
}

impl fmt::Display for ClusteringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusteringMethod::Hierarchical => write!(f, "hierarchical"),
            ClusteringMethod::Kmeans => write!(f, "kmeans"),
            ClusteringMethod::Unclustered => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnrichmentDatabase {
    Go,
    Kegg,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcaRequest {
    pub dataset_id: u64,
    #[serde(rename = "n_components")]
    pub num_components: u8,
    pub color_by: String,
}

impl PcaRequest {
    pub fn validate(&self) -> Result<(), NetaError> {
        if !matches!(self.num_components, 2 | 3) {
            return Err(NetaError::InvalidRequest(format!(
                "n_components must be 2 or 3, got {}",
                self.num_components
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferentialExpressionRequest {
    pub dataset_id: u64,
    pub group1: String,
    pub group2: String,
    pub pvalue_cutoff: f64,
    #[serde(rename = "logfc_cutoff")]
    pub log2_fc_cutoff: f64,
}

impl DifferentialExpressionRequest {
    pub fn validate(&self) -> Result<(), NetaError> {
        if !(0.0..=1.0).contains(&self.pvalue_cutoff) {
            return Err(NetaError::InvalidRequest(format!(
                "pvalue_cutoff must be within [0, 1], got {}",
                self.pvalue_cutoff
            )));
        }
        if !self.log2_fc_cutoff.is_finite() || self.log2_fc_cutoff < 0.0 {
            return Err(NetaError::InvalidRequest(format!(
                "logfc_cutoff must be >= 0, got {}",
                self.log2_fc_cutoff
            )));
        }
        Ok(())
    }
}

pub const HEATMAP_GENES_MIN: u32 = 10;
pub const HEATMAP_GENES_MAX: u32 = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRequest {
    pub dataset_id: u64,
    /// Sent as the comma separated string the backend form field expects.
    #[serde(serialize_with = "join_gene_list")]
    pub gene_list: Vec<String>,
    #[serde(rename = "n_genes")]
    pub num_genes: u32,
    pub clustering_method: ClusteringMethod,
}

impl HeatmapRequest {
    pub fn validate(&self) -> Result<(), NetaError> {
        if !(HEATMAP_GENES_MIN..=HEATMAP_GENES_MAX).contains(&self.num_genes) {
            return Err(NetaError::InvalidRequest(format!(
                "n_genes must be within [{HEATMAP_GENES_MIN}, {HEATMAP_GENES_MAX}], got {}",
                self.num_genes
            )));
        }
        Ok(())
    }
}

fn join_gene_list<S: Serializer>(genes: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    let joined = genes
        .iter()
        .map(|gene| gene.trim())
        .filter(|gene| !gene.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    serializer.serialize_str(&joined)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentRequest {
    pub dataset_id: u64,
    pub gene_list: Vec<String>,
    pub database: EnrichmentDatabase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "analysis_type", rename_all = "snake_case")]
pub enum AnalysisRequest {
    Pca(PcaRequest),
    DifferentialExpression(DifferentialExpressionRequest),
    Heatmap(HeatmapRequest),
    Enrichment(EnrichmentRequest),
}

impl AnalysisRequest {
    pub fn validate(&self) -> Result<(), NetaError> {
        match self {
            AnalysisRequest::Pca(request) => request.validate(),
            AnalysisRequest::DifferentialExpression(request) => request.validate(),
            AnalysisRequest::Heatmap(request) => request.validate(),
            AnalysisRequest::Enrichment(_) => Ok(()),
        }
    }

    /// Backend route relative to the API base. The backend has no heatmap
    /// route; the heatmap form is served by the differential expression route.
    pub fn endpoint(&self) -> &'static str {
        match self {
            AnalysisRequest::Pca(_) => "analysis/pca",
            AnalysisRequest::DifferentialExpression(_) | AnalysisRequest::Heatmap(_) => {
                "analysis/differential_expression"
            }
            AnalysisRequest::Enrichment(_) => "analysis/enrichment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRequest {
    pub analyses: Vec<AnalysisRequest>,
}

impl BatchRequest {
    pub fn validate(&self) -> Result<(), NetaError> {
        if self.analyses.is_empty() {
            return Err(NetaError::InvalidRequest(
                "batch must contain at least one analysis".to_string(),
            ));
        }
        self.analyses.iter().try_for_each(AnalysisRequest::validate)
    }
}
