//! CLI helper functions

use crate::{
    client::{Page, PageRequest},
    config::ExtractConfig,
    etl::{Extractor, PageSource, RunSummary},
    storage::{YearFileRotator, read_year_file},
};
use chrono::NaiveDate;
use eyre::{Context, Result, bail};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

/// Run the full extraction described by `config`.
///
/// Pipeline: RegistryClient → Extractor (date loop, pagination, retry) → YearFileRotator
pub async fn fetch(config: &ExtractConfig) -> Result<RunSummary> {
    config.validate()?;

    log::info!("Using resource {}", config.api_url.bright_black());
    if config.max_attempts.is_none() {
        log::debug!("Failed requests are retried without limit");
    }

    let client = config.client()?;
    let extractor = Extractor::new(client, config.extract_options());
    let mut rotator = YearFileRotator::new(&config.output_dir)?;

    extractor.run(config.range, &mut rotator).await
}

/// Fetch the first page for `date` once, without retrying.
///
/// Used to check connectivity and credentials before a long run.
pub async fn probe(config: &ExtractConfig, date: NaiveDate) -> Result<Page> {
    config.validate()?;

    let client = config.client()?;
    let req = PageRequest::first(date, config.page_size);
    let page = client
        .fetch_page(&req)
        .await
        .with_context(|| format!("Probe of {} failed", req))?;

    log::info!(
        "✓ {} returned {} record(s), advisory total {}",
        date.cyan(),
        page.len(),
        page.total
            .map(|t| t.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );

    Ok(page)
}

/// Check that each year file holds a complete JSON array.
///
/// Returns the record count per file. Every file is checked before the
/// first failure is reported.
pub fn verify(paths: &[PathBuf]) -> Result<Vec<(PathBuf, usize)>> {
    let mut counts = Vec::with_capacity(paths.len());
    let mut failed = 0;

    for path in paths {
        match verify_one(path) {
            Ok(count) => {
                log::info!("✓ {} {} record(s)", path.display().bright_black(), count);
                counts.push((path.clone(), count));
            }
            Err(e) => {
                log::error!("✗ {}: {:#}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} file(s) failed verification", failed, paths.len());
    }

    Ok(counts)
}

fn verify_one(path: &Path) -> Result<usize> {
    Ok(read_year_file(path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_verify_counts_records() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("2020.json");
        std::fs::write(&good, "[\n{\"a\":1},\n{\"a\":2}\n]").unwrap();
        let empty = temp.path().join("2021.json");
        std::fs::write(&empty, "[\n\n]").unwrap();

        let counts = verify(&[good.clone(), empty.clone()]).unwrap();
        assert_eq!(counts, vec![(good, 2), (empty, 0)]);
    }

    #[test]
    fn test_verify_reports_truncated_file() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("2020.json");
        std::fs::write(&good, "[\n1\n]").unwrap();
        let partial = temp.path().join("2021.json");
        std::fs::write(&partial, "[\n1,\n2").unwrap();

        let err = verify(&[good, partial]).unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
    }

    #[test]
    fn test_verify_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(verify(&[temp.path().join("1999.json")]).is_err());
    }
}
