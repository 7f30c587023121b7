use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::domain::{
    AnalysisRequest, BatchRequest, Dataset, DatasetFilter, DifferentialExpressionRequest,
    EnrichmentRequest, Gene, HealthStatus, HeatmapRequest, PcaRequest, StatisticsSnapshot,
};
use crate::error::NetaError;
use crate::gateway::{FallbackGateway, Fetched, Provenance};
use crate::paginate::PageResult;
use crate::transport::{HttpTransport, RequestDescriptor, Transport};
use crate::view::datasets::{decode_datasets, filter_datasets, find_dataset, search_datasets};
use crate::view::genes::normalize_query;
use crate::view::{
    HeatmapView, PcaView, StatisticsView, VolcanoView, analysis_results, rank_datasets,
    shape_genes, shape_heatmap, shape_pca, shape_statistics, shape_volcano,
};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_DATASET_SEARCH_LIMIT: usize = 20;
pub const DEFAULT_GENE_SEARCH_LIMIT: usize = 50;

const DATASETS_SNAPSHOT: &str = "datasets.json";
const STATS_SNAPSHOT: &str = "stats.json";

/// Endpoint façade over the NETA API. Every method takes `&self` and keeps no
/// per-call state, so a client can be shared and invoked again before an
/// earlier call settles.
#[derive(Clone)]
pub struct NetaClient<T: Transport> {
    config: ClientConfig,
    gateway: FallbackGateway<T>,
}

impl NetaClient<HttpTransport> {
    pub fn from_config(config: ClientConfig) -> Result<Self, NetaError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> NetaClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            gateway: FallbackGateway::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        self.gateway.transport()
    }

    pub fn health(&self) -> Result<HealthStatus, NetaError> {
        let raw = self.gateway.fetch(&self.api("health"))?;
        decode(raw)
    }

    /// One page of datasets with RNA-seq first. The snapshot is the full
    /// collection, so it is ranked as a whole before being paged here; a live
    /// page is already cut by the server and can only be ranked within itself.
    pub fn list_datasets(
        &self,
        page: usize,
        per_page: usize,
    ) -> Result<Fetched<PageResult<Dataset>>, NetaError> {
        let primary = self
            .api("datasets")
            .with_query("page", page)
            .with_query("per_page", per_page);
        let fetched = self
            .gateway
            .fetch_with_fallback(&primary, &self.snapshot(DATASETS_SNAPSHOT))?;
        let provenance = fetched.provenance;
        let collection = decode_datasets(fetched.body)?;
        let body = match provenance {
            // Without page metadata the requested page is taken as the last one.
            Provenance::Live => PageResult::from_server(
                collection.datasets,
                collection.pages.unwrap_or(page),
                page,
            )
            .map_items(|items| rank_datasets(&items)),
            Provenance::Snapshot => {
                PageResult::slice(rank_datasets(&collection.datasets), per_page, page)
            }
        };
        Ok(Fetched { body, provenance })
    }

    pub fn dataset(&self, id: u64) -> Result<Fetched<Dataset>, NetaError> {
        let fetched = self.gateway.fetch_with_fallback(
            &self.api(&format!("datasets/{id}")),
            &self.snapshot(DATASETS_SNAPSHOT),
        )?;
        let provenance = fetched.provenance;
        fetched.try_map(|raw| match provenance {
            Provenance::Live => decode(raw),
            Provenance::Snapshot => find_dataset(decode_datasets(raw)?.datasets, id)
                .ok_or(NetaError::DatasetNotFound(id)),
        })
    }

    pub fn search_datasets(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Fetched<Vec<Dataset>>, NetaError> {
        let primary = self
            .api("datasets/search")
            .with_query("q", query)
            .with_query("limit", limit);
        let fetched = self
            .gateway
            .fetch_with_fallback(&primary, &self.snapshot(DATASETS_SNAPSHOT))?;
        let provenance = fetched.provenance;
        fetched.try_map(|raw| {
            let datasets = decode_datasets(raw)?.datasets;
            let datasets = match provenance {
                Provenance::Live => datasets,
                Provenance::Snapshot => search_datasets(datasets, query, limit),
            };
            Ok(rank_datasets(&datasets))
        })
    }

    pub fn filter_datasets(
        &self,
        filter: &DatasetFilter,
    ) -> Result<Fetched<Vec<Dataset>>, NetaError> {
        let primary = filter
            .query_pairs()
            .into_iter()
            .fold(self.api("datasets/filter"), |request, (key, value)| {
                request.with_query(&key, value)
            });
        let fetched = self
            .gateway
            .fetch_with_fallback(&primary, &self.snapshot(DATASETS_SNAPSHOT))?;
        let provenance = fetched.provenance;
        fetched.try_map(|raw| {
            let datasets = decode_datasets(raw)?.datasets;
            let datasets = match provenance {
                Provenance::Live => datasets,
                Provenance::Snapshot => filter_datasets(datasets, filter),
            };
            Ok(rank_datasets(&datasets))
        })
    }

    pub fn dataset_statistics(&self) -> Result<Fetched<StatisticsView>, NetaError> {
        let fetched = self.gateway.fetch_with_fallback(
            &self.api("datasets/statistics"),
            &self.snapshot(STATS_SNAPSHOT),
        )?;
        fetched.try_map(|raw| {
            let snapshot: StatisticsSnapshot = decode(raw)?;
            Ok(shape_statistics(&snapshot))
        })
    }

    pub fn statistics_overview(&self) -> Result<StatisticsView, NetaError> {
        let raw = self.gateway.fetch(&self.api("statistics/overview"))?;
        let snapshot: StatisticsSnapshot = decode(raw)?;
        Ok(shape_statistics(&snapshot))
    }

    /// A blank query returns no genes without touching the network.
    pub fn search_genes(&self, query: &str, limit: usize) -> Result<Vec<Gene>, NetaError> {
        let Some(query) = normalize_query(query) else {
            tracing::debug!("blank gene query, skipping request");
            return Ok(Vec::new());
        };
        let request = self
            .api("genes/search")
            .with_query("q", query)
            .with_query("limit", limit);
        shape_genes(&self.gateway.fetch(&request)?)
    }

    pub fn run_pca(&self, request: &PcaRequest) -> Result<PcaView, NetaError> {
        let results = self.run_analysis(&AnalysisRequest::Pca(request.clone()))?;
        shape_pca(
            &results,
            usize::from(request.num_components),
            Some(request.color_by.as_str()),
        )
    }

    pub fn run_differential_expression(
        &self,
        request: &DifferentialExpressionRequest,
    ) -> Result<VolcanoView, NetaError> {
        let results =
            self.run_analysis(&AnalysisRequest::DifferentialExpression(request.clone()))?;
        shape_volcano(&results)
    }

    pub fn run_heatmap(&self, request: &HeatmapRequest) -> Result<HeatmapView, NetaError> {
        let results = self.run_analysis(&AnalysisRequest::Heatmap(request.clone()))?;
        shape_heatmap(&results, request.clustering_method)
    }

    pub fn run_enrichment(&self, request: &EnrichmentRequest) -> Result<Value, NetaError> {
        self.run_analysis(&AnalysisRequest::Enrichment(request.clone()))
    }

    pub fn run_batch(&self, request: &BatchRequest) -> Result<Value, NetaError> {
        request.validate()?;
        let descriptor = RequestDescriptor::post(self.config.api_url("analysis/batch"), request)?;
        analysis_results(self.gateway.fetch(&descriptor)?)
    }

    /// Validates, posts the request body to its route and unwraps `results`.
    /// Analysis routes have no fallback.
    pub fn run_analysis(&self, request: &AnalysisRequest) -> Result<Value, NetaError> {
        request.validate()?;
        let url = self.config.api_url(request.endpoint());
        let descriptor = match request {
            AnalysisRequest::Pca(body) => RequestDescriptor::post(url, body)?,
            AnalysisRequest::DifferentialExpression(body) => RequestDescriptor::post(url, body)?,
            AnalysisRequest::Heatmap(body) => RequestDescriptor::post(url, body)?,
            AnalysisRequest::Enrichment(body) => RequestDescriptor::post(url, body)?,
        };
        analysis_results(self.gateway.fetch(&descriptor)?)
    }

    fn api(&self, path: &str) -> RequestDescriptor {
        RequestDescriptor::get(self.config.api_url(path))
    }

    fn snapshot(&self, file: &str) -> RequestDescriptor {
        RequestDescriptor::get(self.config.fallback_url(file))
    }
}

fn decode<D: DeserializeOwned>(raw: Value) -> Result<D, NetaError> {
    serde_json::from_value(raw).map_err(NetaError::decode)
}
