use std::fmt::{self, Write as _};
use std::io::{self, Write};

use serde::Serialize;

use crate::domain::{Dataset, Gene, HealthStatus};
use crate::gateway::{Fetched, Provenance};
use crate::paginate::PageResult;
use crate::view::{Breakdown, HeatmapImage, HeatmapView, PcaView, StatisticsView, VolcanoView};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Plain-text tables for terminals. Rendering goes to a `String` first so
/// it can be checked without capturing stdout.
pub struct TextOutput;

impl TextOutput {
    pub fn print(text: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(text.as_bytes())?;
        Ok(())
    }

    pub fn render_health(health: &HealthStatus) -> String {
        render(|out| {
            writeln!(out, "status: {}", health.status)?;
            if let Some(message) = &health.message {
                writeln!(out, "message: {message}")?;
            }
            if let Some(timestamp) = &health.timestamp {
                writeln!(out, "timestamp: {timestamp}")?;
            }
            Ok(())
        })
    }

    pub fn render_dataset_page(page: &Fetched<PageResult<Dataset>>) -> String {
        render(|out| {
            write_datasets(out, &page.body.items, page.provenance)?;
            writeln!(
                out,
                "page {}/{}{}{}",
                page.body.current_page,
                page.body.total_pages,
                if page.body.has_previous() { "  [prev]" } else { "" },
                if page.body.has_next() { "  [next]" } else { "" },
            )
        })
    }

    pub fn render_datasets(datasets: &[Dataset], provenance: Provenance) -> String {
        render(|out| write_datasets(out, datasets, provenance))
    }

    pub fn render_dataset(dataset: &Fetched<Dataset>) -> String {
        let d = &dataset.body;
        let rows = [
            ("id", Some(d.id.to_string())),
            ("geo", Some(d.geo_accession_id.clone())),
            ("title", d.title.clone()),
            ("description", d.description.clone()),
            ("tissue", d.tissue_type.clone()),
            ("tumor", d.tumor_type.clone()),
            ("assay", d.assay_type.as_ref().map(|assay| assay.to_string())),
            ("platform", d.platform.clone()),
            ("samples", d.sample_count.map(|v| v.to_string())),
            ("genes", d.gene_count.map(|v| v.to_string())),
            ("year", d.publication_year.map(|v| v.to_string())),
            ("pmid", d.reference_pmid.clone()),
            ("source", d.data_source.clone()),
        ];
        render(|out| {
            write_banner(out, dataset.provenance)?;
            for (key, value) in rows {
                if let Some(value) = value {
                    writeln!(out, "{key:<12} {value}")?;
                }
            }
            Ok(())
        })
    }

    pub fn render_statistics(stats: &StatisticsView, provenance: Option<Provenance>) -> String {
        render(|out| {
            if let Some(provenance) = provenance {
                write_banner(out, provenance)?;
            }
            writeln!(out, "datasets            {}", stats.total_datasets)?;
            writeln!(out, "samples             {}", stats.total_samples)?;
            writeln!(out, "genes               {}", stats.total_genes)?;
            writeln!(
                out,
                "expression records  {:.1}M",
                stats.expression_records_millions
            )?;
            write_breakdown(out, "tissue types", &stats.tissue_types)?;
            write_breakdown(out, "tumor types", &stats.tumor_types)?;
            write_breakdown(out, "publication years", &stats.publication_years)
        })
    }

    pub fn render_genes(genes: &[Gene]) -> String {
        render(|out| {
            writeln!(out, "{} gene(s)", genes.len())?;
            for gene in genes {
                writeln!(
                    out,
                    "{:<18} {:<10} {:<5} {:<16} {}",
                    gene.gene_id,
                    gene.symbol.as_deref().unwrap_or("-"),
                    gene.chromosome.as_deref().unwrap_or("-"),
                    gene.gene_type.as_deref().unwrap_or("-"),
                    gene.name.as_deref().unwrap_or(""),
                )?;
            }
            Ok(())
        })
    }

    pub fn render_pca(view: &PcaView) -> String {
        render(|out| {
            writeln!(out, "explained variance:")?;
            for component in 1..=view.num_components {
                writeln!(out, "  {}", view.axis_label(component))?;
            }
            writeln!(out, "{} sample(s)", view.points.len())?;
            for point in &view.points {
                let coords = point
                    .coordinates
                    .iter()
                    .map(|value| value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}")))
                    .collect::<Vec<_>>()
                    .join("  ");
                writeln!(
                    out,
                    "  {:<14} {:<12} {coords}",
                    point.sample.as_deref().unwrap_or("-"),
                    point.group.as_deref().unwrap_or("-"),
                )?;
            }
            Ok(())
        })
    }

    pub fn render_volcano(view: &VolcanoView) -> String {
        render(|out| {
            writeln!(out, "upregulated    {}", view.upregulated_count)?;
            writeln!(out, "downregulated  {}", view.downregulated_count)?;
            writeln!(out, "significant    {}", view.significant_count)?;
            writeln!(
                out,
                "points         {} ({} plottable)",
                view.points.len(),
                view.plottable().count()
            )
        })
    }

    pub fn render_heatmap(view: &HeatmapView) -> String {
        render(|out| {
            match &view.image {
                HeatmapImage::Ready { png_base64 } => {
                    writeln!(out, "image: ready ({} base64 chars)", png_base64.len())?
                }
                HeatmapImage::Pending => writeln!(out, "image: still rendering")?,
            }
            writeln!(out, "genes       {}", or_dash(view.gene_count))?;
            writeln!(out, "samples     {}", or_dash(view.sample_count))?;
            writeln!(out, "clustering  {}", view.clustering_method)
        })
    }
}

fn render<F>(write: F) -> String
where
    F: FnOnce(&mut String) -> fmt::Result,
{
    let mut out = String::new();
    // `fmt::Write` for `String` never returns an error.
    let _ = write(&mut out);
    out
}

fn write_datasets(out: &mut String, datasets: &[Dataset], provenance: Provenance) -> fmt::Result {
    write_banner(out, provenance)?;
    writeln!(
        out,
        "{:<12} {:<10} {:<16} {:<14} {:>8} {:>8} {:>6}  TITLE",
        "GEO", "ASSAY", "TISSUE", "TUMOR", "SAMPLES", "GENES", "YEAR"
    )?;
    for dataset in datasets {
        writeln!(
            out,
            "{:<12} {:<10} {:<16} {:<14} {:>8} {:>8} {:>6}  {}",
            dataset.geo_accession_id,
            dataset
                .assay_type
                .as_ref()
                .map(|assay| assay.as_str())
                .unwrap_or("-"),
            dataset.tissue_type.as_deref().unwrap_or("-"),
            dataset.tumor_type.as_deref().unwrap_or("-"),
            or_dash(dataset.sample_count),
            or_dash(dataset.gene_count),
            or_dash(dataset.publication_year),
            dataset.title.as_deref().unwrap_or(""),
        )?;
    }
    Ok(())
}

fn write_banner(out: &mut String, provenance: Provenance) -> fmt::Result {
    match provenance {
        Provenance::Live => Ok(()),
        Provenance::Snapshot => writeln!(out, "(offline snapshot)"),
    }
}

fn write_breakdown(out: &mut String, title: &str, buckets: &[Breakdown]) -> fmt::Result {
    if buckets.is_empty() {
        return Ok(());
    }
    writeln!(out, "{title}:")?;
    for bucket in buckets {
        writeln!(out, "  {:<28} {}", bucket.label, bucket.count)?;
    }
    Ok(())
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::view::shape_heatmap;

    #[test]
    fn snapshot_pages_are_labelled() {
        let datasets: Vec<Dataset> = serde_json::from_value(json!([
            {"id": 1, "geo_id": "GSE1", "assay_type": "RNA-seq", "n_samples": 12}
        ]))
        .unwrap();
        let page = Fetched {
            body: PageResult::slice(datasets, 20, 1),
            provenance: Provenance::Snapshot,
        };
        let text = TextOutput::render_dataset_page(&page);
        assert!(text.starts_with("(offline snapshot)"));
        assert!(text.contains("GSE1"));
        assert!(text.contains("page 1/1"));
    }

    #[test]
    fn pending_heatmap_says_so() {
        let view = shape_heatmap(
            &json!({"n_genes": 10}),
            crate::domain::ClusteringMethod::Hierarchical,
        )
        .unwrap();
        let text = TextOutput::render_heatmap(&view);
        assert!(text.contains("still rendering"));
        assert!(text.contains("samples     -"));
    }

    #[test]
    fn statistics_skip_empty_breakdowns() {
        let view = StatisticsView {
            total_datasets: 3,
            total_samples: 120,
            total_genes: 20000,
            total_expression_records: 1_500_000,
            expression_records_millions: 1.5,
            tissue_types: vec![Breakdown {
                label: "Unknown".to_string(),
                count: 1,
            }],
            tumor_types: Vec::new(),
            publication_years: Vec::new(),
        };
        let text = TextOutput::render_statistics(&view, Some(Provenance::Snapshot));
        assert!(text.starts_with("(offline snapshot)\n"));
        assert!(text.contains("expression records  1.5M"));
        assert!(text.contains("tissue types:"));
        assert!(!text.contains("tumor types:"));
    }
}
