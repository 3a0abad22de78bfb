use crate::kattis::scrape::{SolvedProblem, Stats};
use serde::Serialize;
use std::path::{Path, PathBuf};

mod error {
    error_chain::error_chain! {}
}

use error::*;

#[derive(Serialize, Debug)]
pub struct Report {
    pub stats: Stats,
    pub solved: Vec<SolvedProblem>,
}

pub fn json_path<P: AsRef<Path>>(name: P) -> PathBuf {
    let mut p = name.as_ref().as_os_str().to_owned();
    p.push(".json");
    PathBuf::from(p)
}

// Indented by four spaces, replacing any file at `path`.
pub fn write<P: AsRef<Path>>(path: P, report: &Report) -> Result<()> {
    use std::io::{BufWriter, Write};
    let path = path.as_ref();
    let f = std::fs::File::create(path)
        .chain_err(|| format!("can not open {} for writing", path.display()))?;
    let mut w = BufWriter::new(f);

    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut w, fmt);
    report
        .serialize(&mut ser)
        .chain_err(|| "can not serialize report")?;
    w.flush()
        .chain_err(|| format!("can not write {}", path.display()))
}
