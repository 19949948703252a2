use std::time::Duration;

use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::browser::PageFetcher;
use crate::dates::{calendar_string, date_range, MonthNames};
use crate::parser;
use crate::records::{QueryContext, ScheduleRecord, StationRef, UNKNOWN_URL};

/// One search: a route on a calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub origin: StationRef,
    pub destination: StationRef,
    pub date: NaiveDate,
    /// `date` as typed into the booking form.
    pub date_input: String,
}

impl Query {
    pub fn context(&self, url: Option<String>) -> QueryContext {
        QueryContext {
            url: url.unwrap_or_else(|| UNKNOWN_URL.to_string()),
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            date_calendar: calendar_string(self.date),
            date_input: self.date_input.clone(),
        }
    }
}

/// Every origin × destination × date, in that nesting order.
pub fn plan_queries(
    origins: &[StationRef],
    destinations: &[StationRef],
    start: NaiveDate,
    days: u32,
    months: &MonthNames,
) -> Vec<Query> {
    let dates = date_range(start, days);
    let mut queries = Vec::with_capacity(origins.len() * destinations.len() * dates.len());
    for origin in origins {
        for destination in destinations {
            for &date in &dates {
                queries.push(Query {
                    origin: origin.clone(),
                    destination: destination.clone(),
                    date,
                    date_input: months.format_form_date(date),
                });
            }
        }
    }
    queries
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub queries: usize,
    pub pages: usize,
    pub failed: usize,
    pub records: usize,
}

/// Run queries one at a time, pausing `pacing` between them. A query that
/// brings back no markup adds nothing and the batch moves on.
pub async fn run_batch<F: PageFetcher + ?Sized>(
    fetcher: &F,
    queries: &[Query],
    pacing: Duration,
) -> (Vec<ScheduleRecord>, BatchStats) {
    let pb = ProgressBar::new(queries.len() as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} (eta {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }

    let mut records = Vec::new();
    let mut stats = BatchStats {
        queries: queries.len(),
        ..Default::default()
    };
    let mut route: Option<(&StationRef, &StationRef)> = None;

    for (i, query) in queries.iter().enumerate() {
        if route != Some((&query.origin, &query.destination)) {
            info!(
                "Route: {} ({}) -> {} ({})",
                query.origin.name, query.origin.code, query.destination.name, query.destination.code
            );
            route = Some((&query.origin, &query.destination));
        }
        info!(
            "Searching {} (form date {})",
            calendar_string(query.date),
            query.date_input
        );

        let page = fetcher
            .fetch_page(&query.origin.name, &query.destination.name, &query.date_input)
            .await;
        match page.html {
            Some(html) => {
                stats.pages += 1;
                let context = query.context(page.url);
                let found = parser::process_schedule_page(&html, &context);
                records.extend(found);
            }
            None => {
                stats.failed += 1;
                warn!("No page content for this query, skipping");
            }
        }
        pb.inc(1);

        if i + 1 < queries.len() && !pacing.is_zero() {
            info!("Waiting {}s before the next search...", pacing.as_secs());
            tokio::time::sleep(pacing).await;
        }
    }

    pb.finish_and_clear();
    stats.records = records.len();
    info!(
        "Batch done: {} queries, {} pages, {} failed, {} schedules",
        stats.queries, stats.pages, stats.failed, stats.records
    );
    (records, stats)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::browser::FetchedPage;
    use crate::records::Field;

    /// Serves canned pages in order and records what was asked for.
    struct Scripted {
        pages: Mutex<VecDeque<FetchedPage>>,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl Scripted {
        fn new(pages: Vec<FetchedPage>) -> Self {
            Scripted {
                pages: Mutex::new(pages.into()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl PageFetcher for Scripted {
        async fn fetch_page(&self, origin: &str, destination: &str, date_input: &str) -> FetchedPage {
            self.calls.lock().unwrap().push((
                origin.to_string(),
                destination.to_string(),
                date_input.to_string(),
            ));
            self.pages.lock().unwrap().pop_front().unwrap_or_default()
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn fixture_page(url: Option<&str>) -> FetchedPage {
        FetchedPage {
            html: Some(std::fs::read_to_string("tests/fixtures/schedule.html").unwrap()),
            url: url.map(str::to_string),
        }
    }

    fn two_queries() -> Vec<Query> {
        plan_queries(
            &[StationRef::new("SURABAYA PASAR TURI", "SBI")],
            &[StationRef::new("GAMBIR", "GMR")],
            d(2025, 6, 2),
            2,
            &MonthNames::indonesian(),
        )
    }

    #[test]
    fn plan_is_cartesian_in_order() {
        let queries = plan_queries(
            &[StationRef::new("A", "AA"), StationRef::new("B", "BB")],
            &[StationRef::new("C", "CC"), StationRef::new("D", "DD"), StationRef::new("E", "EE")],
            d(2025, 6, 30),
            2,
            &MonthNames::indonesian(),
        );
        assert_eq!(queries.len(), 12);
        assert_eq!(queries[0].origin.name, "A");
        assert_eq!(queries[0].destination.name, "C");
        assert_eq!(queries[0].date_input, "30-Juni-2025");
        assert_eq!(queries[1].date_input, "01-Juli-2025");
        assert_eq!(queries[2].destination.name, "D");
        assert_eq!(queries[6].origin.name, "B");
    }

    #[test]
    fn context_defaults_url() {
        let q = &two_queries()[0];
        let ctx = q.context(None);
        assert_eq!(ctx.url, UNKNOWN_URL);
        assert_eq!(ctx.date_calendar, "2025-06-02");
        assert_eq!(ctx.date_input, "02-Juni-2025");
        assert_eq!(ctx.origin.code, "SBI");
        assert_eq!(ctx.destination.code, "GMR");
    }

    #[tokio::test]
    async fn failed_fetch_is_skipped() {
        let fetcher = Scripted::new(vec![
            FetchedPage::default(),
            fixture_page(Some("https://booking.kai.id/search?x=1")),
        ]);
        let (records, stats) = run_batch(&fetcher, &two_queries(), Duration::ZERO).await;

        assert_eq!(records.len(), 4);
        assert_eq!(
            stats,
            BatchStats {
                queries: 2,
                pages: 1,
                failed: 1,
                records: 4
            }
        );
        for r in &records {
            assert_eq!(r.query.date_calendar, "2025-06-03");
            assert_eq!(r.query.url, "https://booking.kai.id/search?x=1");
        }
        assert_eq!(records[0].train_name, Field::Value("ARGO BROMO ANGGREK".into()));
    }

    #[tokio::test]
    async fn every_query_is_attempted() {
        let fetcher = Scripted::new(vec![]);
        let (records, stats) = run_batch(&fetcher, &two_queries(), Duration::ZERO).await;
        assert!(records.is_empty());
        assert_eq!(stats.failed, 2);

        let call = |date: &str| ("SURABAYA PASAR TURI".to_string(), "GAMBIR".to_string(), date.to_string());
        let calls = fetcher.calls.lock().unwrap();
        assert_eq!(*calls, vec![call("02-Juni-2025"), call("03-Juni-2025")]);
    }

    #[tokio::test]
    async fn page_without_blocks_adds_nothing() {
        let fetcher = Scripted::new(vec![
            FetchedPage {
                html: Some("<html><body>Tidak ada jadwal</body></html>".into()),
                url: None,
            },
            fixture_page(None),
        ]);
        let (records, stats) = run_batch(&fetcher, &two_queries(), Duration::ZERO).await;
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.failed, 0);
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.query.url == UNKNOWN_URL));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_between_queries_only() {
        let fetcher = Scripted::new(vec![]);
        let start = tokio::time::Instant::now();
        run_batch(&fetcher, &two_queries(), Duration::from_secs(5)).await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(5) && waited < Duration::from_secs(10));
    }
}
