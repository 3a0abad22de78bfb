use crate::kattis::scrape::{self, SolvedProblem, Stats};
use crate::kattis::Source;
use crate::output::{self, Report};
use log::{debug, info};
use scraper::Html;
use std::path::Path;

mod error {
    error_chain::error_chain! {}
}

use error::*;

// Pagination normally ends at the first page without solved rows long
// before this.
pub const DEFAULT_MAX_PAGES: u32 = 100;

pub fn collect_solved<S: Source>(src: &S, max_pages: u32) -> Result<Vec<SolvedProblem>> {
    let mut keys: Option<Vec<String>> = None;
    let mut solved = vec![];

    for page in 0..max_pages {
        let html = src
            .problems_page(page)
            .chain_err(|| format!("can not fetch page {} of the listing", page))?;
        let doc = Html::parse_document(&html);

        let cols = keys.get_or_insert_with(|| {
            let k = scrape::parse_headers(&doc);
            debug!("listing columns: {:?}", k);
            k
        });

        let rows = scrape::parse_solved(cols, &doc)
            .chain_err(|| format!("can not parse page {} of the listing", page))?;
        info!("page {}: {} solved problems", page, rows.len());
        if rows.is_empty() {
            return Ok(solved);
        }
        solved.extend(rows);
    }

    info!("stopped after {} pages", max_pages);
    Ok(solved)
}

pub fn collect_stats<S: Source>(src: &S, solved: Option<usize>) -> Result<Stats> {
    let html = src.profile().chain_err(|| "can not fetch profile")?;
    let doc = Html::parse_document(&html);
    scrape::parse_stats(&doc, solved).chain_err(|| "can not parse profile")
}

pub fn collect<S: Source>(src: &S, max_pages: u32) -> Result<Report> {
    let solved = collect_solved(src, max_pages)?;
    let stats = collect_stats(src, Some(solved.len()))?;
    if let Some(rank) = stats.get("Rank") {
        info!("rank {}", rank);
    }
    Ok(Report { stats, solved })
}

// Nothing is written unless every fetch succeeded.
pub fn export<S: Source, P: AsRef<Path>>(src: &S, max_pages: u32, path: P) -> Result<usize> {
    let report = collect(src, max_pages)?;
    output::write(&path, &report).chain_err(|| "can not save the report")?;
    Ok(report.solved.len())
}
