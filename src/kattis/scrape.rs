// HTML scraping of the problem listing and the profile page.  Everything
// here depends on the current markup of the site.

use scraper::{ElementRef, Html, Selector};
use serde::ser::{Serialize, SerializeMap, Serializer};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("solved row has no problem link")]
    NoProblemLink,
    #[error("can not find problem ID in link {0}")]
    BadProblemLink(String),
    #[error("profile page has no summary table")]
    NoSummary,
    #[error("summary table has {0} rows, expected 2")]
    ShortSummary(usize),
}

pub type Result<T> = std::result::Result<T, Error>;

// Label to value pairs, kept in the order they were scraped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record(Vec<(String, String)>);

pub type SolvedProblem = Record;
pub type Stats = Record;

impl Record {
    pub fn zip<K, V>(keys: K, values: V) -> Self
    where
        K: IntoIterator,
        K::Item: ToString,
        V: IntoIterator,
        V::Item: ToString,
    {
        Record(
            keys.into_iter()
                .zip(values)
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

fn selector(s: &str) -> Selector {
    Selector::parse(s).unwrap()
}

fn cell_text(e: ElementRef) -> String {
    e.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_sort_link(href: &str) -> bool {
    href.contains("?order=") || href.contains("&order=")
}

// The sortable column links, after a leading `ID` column for the problem ID
// taken from the row's link.
pub fn parse_headers(doc: &Html) -> Vec<String> {
    let a = selector("a[href]");
    let mut keys = vec![String::from("ID")];
    keys.extend(
        doc.select(&a)
            .filter(|e| e.value().attr("href").map_or(false, is_sort_link))
            .map(cell_text),
    );
    keys
}

// `/problems/<id>`
fn problem_id(href: &str) -> Result<String> {
    let path = match Url::parse(href) {
        Ok(u) => u.path().to_owned(),
        Err(_) => href.to_owned(),
    };
    path.split('/')
        .nth(2)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| Error::BadProblemLink(href.to_owned()))
}

fn parse_row(keys: &[String], row: ElementRef) -> Result<SolvedProblem> {
    let named = selector(".name_column a[href]");
    let any = selector("a[href]");
    let link = row
        .select(&named)
        .next()
        .or_else(|| row.select(&any).next())
        .and_then(|a| a.value().attr("href"))
        .ok_or(Error::NoProblemLink)?;

    let td = selector("td");
    let mut values = vec![problem_id(link)?];
    values.extend(row.select(&td).map(cell_text));
    Ok(Record::zip(keys, values))
}

pub fn parse_solved(keys: &[String], doc: &Html) -> Result<Vec<SolvedProblem>> {
    let rows = selector("tr.odd.solved, tr.even.solved");
    doc.select(&rows).map(|r| parse_row(keys, r)).collect()
}

pub fn merge_stats(mut labels: Vec<String>, mut values: Vec<String>, solved: Option<usize>) -> Stats {
    if let Some(n) = solved {
        labels.push(String::from("Solved"));
        values.push(n.to_string());
    }
    Record::zip(labels, values)
}

pub fn parse_stats(doc: &Html, solved: Option<usize>) -> Result<Stats> {
    let rank = selector("div.rank.clearfix");
    let tr = selector("tr");
    let td = selector("td");

    let block = doc.select(&rank).next().ok_or(Error::NoSummary)?;
    let mut rows = block
        .select(&tr)
        .map(|r| r.select(&td).map(cell_text).collect::<Vec<_>>());

    let (labels, values) = match (rows.next(), rows.next()) {
        (Some(l), Some(v)) => (l, v),
        (l, _) => return Err(Error::ShortSummary(l.map_or(0, |_| 1))),
    };
    Ok(merge_stats(labels, values, solved))
}
