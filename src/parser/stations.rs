use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use super::columns::{infer_columns, table_rows};
use super::dom::{parse_document, MarkupNode, Marker};
use super::normalize::{clean_station_code, clean_station_name};
use crate::records::StationRecord;

const STATION_TABLE: Marker = Marker::new("table", &["wikitable"]);
const MAX_CODE_LEN: usize = 6;

// "Nama Stasiun (KODE)" or "Nama Stasiun - KODE" in running text.
static TEXT_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"([A-Z][a-zA-Z\s]+(?:STASIUN|Stasiun)?)\s*[\(\-]\s*([A-Z]{2,5})\s*[\)]?")
            .unwrap(),
        Regex::new(r"([A-Z][a-zA-Z\s]+)\s*[\(\-]\s*([A-Z]{2,5})\s*[\)]?").unwrap(),
    ]
});

/// Station pairs from every recognisable table, or from the page text when
/// no table yields anything. Deduplicated, first occurrence kept.
pub fn extract_stations(html: &str) -> Vec<StationRecord> {
    let document = parse_document(html);
    let root = document.root_element();

    let mut stations = from_tables(&root);
    if stations.is_empty() {
        info!("No stations found in tables, scanning page text");
        stations = from_text(&root.text_fragments().concat());
    }
    dedup(stations)
}

pub fn from_tables<N: MarkupNode>(root: &N) -> Vec<StationRecord> {
    let tables = root.find_all(STATION_TABLE);
    info!("Found {} station tables", tables.len());

    let mut stations = Vec::new();
    for (idx, table) in tables.iter().enumerate() {
        let rows = table_rows(table);
        let Some(columns) = infer_columns(&rows) else {
            info!("Table {}: could not identify name and code columns", idx + 1);
            continue;
        };
        debug!(
            "Table {}: name in column {}, code in column {}",
            idx + 1,
            columns.name,
            columns.code
        );

        let before = stations.len();
        for row in rows.iter().skip(1).filter(|r| r.len() >= columns.min_cells()) {
            let name = clean_station_name(&row[columns.name]);
            let code = clean_station_code(&row[columns.code]);
            if !name.is_empty() && !code.is_empty() && code.len() <= MAX_CODE_LEN {
                debug!("  {} -> {}", name, code);
                stations.push(StationRecord { name, code });
            }
        }
        info!("Table {}: {} stations", idx + 1, stations.len() - before);
    }
    stations
}

/// Both patterns run over the whole text; matches accumulate in pattern order.
pub fn from_text(text: &str) -> Vec<StationRecord> {
    TEXT_PATTERNS
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| {
            let name = clean_station_name(&caps[1]);
            let code = clean_station_code(&caps[2]);
            (!name.is_empty() && !code.is_empty()).then_some(StationRecord { name, code })
        })
        .collect()
}

pub fn dedup(stations: Vec<StationRecord>) -> Vec<StationRecord> {
    let mut seen = HashSet::new();
    stations
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
