//! Decide which table column holds station names and which holds codes.
//!
//! Headers are tried first; when they don't settle both columns, a few
//! data rows are sampled for cells that look like a code (short, all caps)
//! or a name (longer, title case or mentioning a station).

use tracing::debug;

use super::dom::{MarkupNode, Marker};
use super::normalize::{is_all_upper, is_title_case};

const NAME_KEYWORDS: &[&str] = &["stasiun", "station", "nama", "name"];
const CODE_KEYWORDS: &[&str] = &["kode", "code", "singkatan", "abbreviation"];
const STATION_WORDS: &[&str] = &["stasiun", "station"];
const SAMPLE_ROWS: usize = 5;

const ROW: Marker = Marker::tag("tr");
const CELLS: [Marker; 2] = [Marker::tag("th"), Marker::tag("td")];

/// Column indices of a table once both are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: usize,
    pub code: usize,
}

impl ColumnMap {
    /// Rows need this many cells to cover both columns.
    pub fn min_cells(&self) -> usize {
        self.name.max(self.code) + 1
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Candidates {
    name: Option<usize>,
    code: Option<usize>,
}

impl Candidates {
    fn complete(&self) -> Option<ColumnMap> {
        Some(ColumnMap {
            name: self.name?,
            code: self.code?,
        })
    }
}

/// Flatten a table element into rows of stripped cell text.
pub fn table_rows<N: MarkupNode>(table: &N) -> Vec<Vec<String>> {
    table
        .find_all(ROW)
        .iter()
        .map(|row| {
            row.descendants_matching(&CELLS)
                .iter()
                .map(|cell| cell.stripped_text())
                .collect()
        })
        .collect()
}

/// Header pass, then content pass for whatever is still unknown. `None`
/// unless both columns end up identified.
pub fn infer_columns(rows: &[Vec<String>]) -> Option<ColumnMap> {
    let (header, data) = rows.split_first()?;
    let mut found = from_headers(header);
    if found.complete().is_none() {
        debug!("Headers inconclusive ({:?}), sampling rows", found);
        from_content(&data[..data.len().min(SAMPLE_ROWS)], &mut found);
    }
    found.complete()
}

/// First header naming a station wins the name column; first header naming
/// a code wins the code column. The two are decided independently.
fn from_headers(header: &[String]) -> Candidates {
    let labels: Vec<String> = header.iter().map(|h| h.to_lowercase()).collect();
    let position = |keywords: &[&str]| {
        labels
            .iter()
            .position(|label| keywords.iter().any(|k| label.contains(k)))
    };
    Candidates {
        name: position(NAME_KEYWORDS),
        code: position(CODE_KEYWORDS),
    }
}

fn from_content(sample: &[Vec<String>], found: &mut Candidates) {
    for row in sample.iter().filter(|r| r.len() >= 2) {
        for (idx, text) in row.iter().enumerate() {
            let len = text.chars().count();
            if (2..=5).contains(&len) && is_all_upper(text) && found.code.is_none() {
                debug!("Code column {} guessed from {:?}", idx, text);
                found.code = Some(idx);
            } else if len > 5 && found.name.is_none() && looks_like_station_name(text) {
                debug!("Name column {} guessed from {:?}", idx, text);
                found.name = Some(idx);
            }
        }
        if found.complete().is_some() {
            break;
        }
    }
}

fn looks_like_station_name(text: &str) -> bool {
    let lower = text.to_lowercase();
    STATION_WORDS.iter().any(|w| lower.contains(w)) || is_title_case(text)
}
