pub mod columns;
pub mod dom;
pub mod normalize;
pub mod schedule;
pub mod stations;

use crate::records::{QueryContext, ScheduleRecord, StationRecord};

/// Results page → one record per schedule block, each tagged with `query`.
pub fn process_schedule_page(html: &str, query: &QueryContext) -> Vec<ScheduleRecord> {
    schedule::extract_schedules(html, query)
}

/// Encyclopedia page → tables → inferred columns → normalized, deduplicated pairs.
pub fn process_station_page(html: &str) -> Vec<StationRecord> {
    stations::extract_stations(html)
}
