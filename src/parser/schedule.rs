//! Record blocks → `ScheduleRecord`s.
//!
//! Every field is looked up on its own. A field that needs more than one
//! attempt gets an ordered chain of strategies; the first one that yields a
//! value wins and an exhausted chain becomes `Field::Unavailable`.

use tracing::{debug, info};

use super::dom::{parse_document, MarkupNode, Marker};
use super::normalize::{has_currency_marker, parse_price};
use crate::records::{Field, Price, QueryContext, ScheduleRecord};

pub const RECORD_BLOCK: Marker = Marker::new("div", &["data-block", "list-kereta"]);

const NAME: Marker = Marker::new("div", &["name"]);
const NUMBER_LABEL: Marker = Marker::tag("span");
const LEFT_COLUMN: Marker = Marker::new("div", &["col-one"]);
const DIV: Marker = Marker::tag("div");
const DEPARTURE_STATION: Marker = Marker::new("div", &["station", "station-start"]);
const DEPARTURE_TIME: Marker = Marker::new("div", &["times", "time-start"]);
const DEPARTURE_DATE: Marker = Marker::new("div", &["station", "date-start"]);
const DURATION: Marker = Marker::new("div", &["long-time"]);
const ARRIVAL: Marker = Marker::new("div", &["card-arrival"]);
// Appears twice under ARRIVAL: station first, then date.
const STATION_END: Marker = Marker::new("div", &["station", "station-end"]);
const ARRIVAL_TIME: Marker = Marker::new("div", &["times", "time-end"]);
const PRICE: Marker = Marker::new("div", &["price"]);
const AVAILABILITY: Marker = Marker::new("small", &["sisa-kursi"]);

/// One way of recovering a field from a record block.
pub type Strategy<N> = fn(&N) -> Option<String>;

/// Run `chain` in order and keep the first value produced.
pub fn first_success<N: MarkupNode>(block: &N, chain: &[Strategy<N>]) -> Field {
    chain.iter().find_map(|strategy| strategy(block)).into()
}

/// Parse a results page. No record blocks means no schedules for the query,
/// which is a valid, empty result.
pub fn extract_schedules(html: &str, query: &QueryContext) -> Vec<ScheduleRecord> {
    let document = parse_document(html);
    let records = extract_from(&document.root_element(), query);
    if records.is_empty() {
        info!("No schedule blocks found in page");
    } else {
        info!("Extracted {} schedules from page", records.len());
    }
    records
}

pub fn extract_from<N: MarkupNode>(root: &N, query: &QueryContext) -> Vec<ScheduleRecord> {
    root.find_all(RECORD_BLOCK)
        .iter()
        .map(|block| extract_record(block, query))
        .collect()
}

pub fn extract_record<N: MarkupNode>(block: &N, query: &QueryContext) -> ScheduleRecord {
    let (train_name, train_number) = name_and_number(block);
    let class_chain: [Strategy<N>; 2] = [class_from_left_column::<N>, class_from_last_div::<N>];
    let (arrival_station, arrival_date, arrival_time) = arrival(block);

    let record = ScheduleRecord {
        train_name,
        train_number,
        train_class: first_success(block, &class_chain),
        departure_station: marker_text(block, DEPARTURE_STATION).into(),
        departure_time: marker_text(block, DEPARTURE_TIME).into(),
        departure_date: marker_text(block, DEPARTURE_DATE).into(),
        duration: marker_text(block, DURATION).into(),
        arrival_station,
        arrival_date,
        arrival_time,
        price: price(block),
        availability: marker_text(block, AVAILABILITY).into(),
        query: query.clone(),
    };
    debug!(
        "{} ({}) {} -> {}, {} fields unavailable",
        record.train_name,
        record.train_number,
        record.departure_time,
        record.arrival_time,
        record.unavailable_count()
    );
    record
}

fn marker_text<N: MarkupNode>(node: &N, marker: Marker) -> Option<String> {
    node.find(marker).map(|el| el.text_content())
}

/// Direct text of the name element is the train name, its `<span>` the
/// number in parentheses. Present-but-empty stays an empty value.
fn name_and_number<N: MarkupNode>(block: &N) -> (Field, Field) {
    let Some(name_el) = block.find(NAME) else {
        return (Field::Unavailable, Field::Unavailable);
    };
    let name = name_el.own_text().unwrap_or_default();
    let number = name_el
        .find(NUMBER_LABEL)
        .map(|span| {
            span.text_content()
                .trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace())
                .to_string()
        })
        .unwrap_or_default();
    (Field::Value(name), Field::Value(number))
}

/// First direct `<div>` of the left column, other than the name, with text.
fn class_from_left_column<N: MarkupNode>(block: &N) -> Option<String> {
    let column = block.find(LEFT_COLUMN)?;
    let name_el = block.find(NAME);
    column
        .element_children()
        .into_iter()
        .filter(|child| child.tag_name() == DIV.tag)
        .filter(|child| !name_el.is_some_and(|n| n.is_same(child)))
        .map(|child| child.text_content())
        .find(|text| !text.is_empty())
}

/// Last `<div>` anywhere in the left column, if there is more than one and
/// it isn't the name.
fn class_from_last_div<N: MarkupNode>(block: &N) -> Option<String> {
    let column = block.find(LEFT_COLUMN)?;
    let name_el = block.find(NAME);
    let divs = column.find_all(DIV);
    if divs.len() < 2 {
        return None;
    }
    let last = divs.last()?;
    if name_el.is_some_and(|n| n.is_same(last)) {
        return None;
    }
    Some(last.text_content())
}

fn arrival<N: MarkupNode>(block: &N) -> (Field, Field, Field) {
    let Some(container) = block.find(ARRIVAL) else {
        return (Field::Unavailable, Field::Unavailable, Field::Unavailable);
    };
    let mut ends = container
        .find_all(STATION_END)
        .into_iter()
        .map(|el| el.text_content());
    let station = ends.next().into();
    let date = ends.next().into();
    let time = marker_text(&container, ARRIVAL_TIME).into();
    (station, date, time)
}

/// Only text carrying the currency marker is treated as a price.
fn price<N: MarkupNode>(block: &N) -> Price {
    match block.find(PRICE).map(|el| el.text_content()) {
        Some(text) if !text.is_empty() && has_currency_marker(&text) => parse_price(&text),
        _ => Price::Unavailable,
    }
}
