//! Dispatcher behaviour with recording fake collaborators

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bettificator_core::{
    DateRange, Dispatcher, FetchResult, PageParser, ParseFailure, PersistFailure, RecordSink,
    RunError, RunSettings, Target, parse_date,
};
use chrono::NaiveDate;

/// Parser that logs every call and yields one record per day
#[derive(Default)]
struct FakeParser {
    calls: Mutex<Vec<NaiveDate>>,
    fail_on: Option<NaiveDate>,
    panic_on: Option<NaiveDate>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeParser {
    fn failing_on(day: &str) -> Self {
        Self {
            fail_on: Some(parse_date(day).unwrap()),
            ..Default::default()
        }
    }

    /// Panics on `day`, sleeps `delay` on every other day
    fn panicking_on(day: &str, delay: Duration) -> Self {
        Self {
            panic_on: Some(parse_date(day).unwrap()),
            delay,
            ..Default::default()
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    fn sorted_calls(&self) -> Vec<NaiveDate> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

impl PageParser<NaiveDate> for FakeParser {
    type Record = String;

    fn parse(&self, key: &NaiveDate) -> Result<FetchResult<String>, ParseFailure> {
        if self.panic_on == Some(*key) {
            panic!("parser bug on {key}");
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.calls.lock().unwrap().push(*key);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_on == Some(*key) {
            return Err(ParseFailure::new(key, "malformed page"));
        }
        Ok(FetchResult::new(vec![format!("match on {key}")]))
    }
}

/// Sink that logs every insert
#[derive(Default)]
struct FakeSink {
    inserts: Mutex<Vec<(Target, Vec<String>)>>,
    fail: bool,
}

impl FakeSink {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.inserts.lock().unwrap().len()
    }
}

impl RecordSink<String> for FakeSink {
    fn insert(&self, target: &Target, records: &[String]) -> Result<usize, PersistFailure> {
        if self.fail {
            return Err(PersistFailure::new(target, "connection refused"));
        }
        self.inserts
            .lock()
            .unwrap()
            .push((target.clone(), records.to_vec()));
        Ok(records.len())
    }
}

fn range(start: &str, end: &str) -> DateRange {
    DateRange::parse(start, end).unwrap()
}

fn settings() -> RunSettings {
    RunSettings::new(Target::new("test", "matches"))
}

#[test]
fn dry_run_three_days() {
    let settings = settings().with_dry_run(true);
    let parser = FakeParser::default();
    let sink = FakeSink::default();

    let outcome = Dispatcher::new(&settings, &parser, &sink)
        .run(range("2020-01-01", "2020-01-03").days())
        .unwrap();

    assert_eq!(outcome.completed, 3);
    assert_eq!(
        parser.sorted_calls(),
        range("2020-01-01", "2020-01-03").days().collect::<Vec<_>>()
    );
    assert_eq!(sink.calls(), 0);
    assert_eq!(outcome.persisted_batches, 0);
}

#[test]
fn single_day_persists_once() {
    let settings = settings();
    let parser = FakeParser::default();
    let sink = FakeSink::default();

    let outcome = Dispatcher::new(&settings, &parser, &sink)
        .run(range("2020-01-05", "2020-01-05").days())
        .unwrap();

    assert_eq!(outcome.issued, 1);
    assert_eq!(outcome.completed, 1);
    assert_eq!(parser.sorted_calls(), vec![parse_date("2020-01-05").unwrap()]);

    let inserts = sink.inserts.lock().unwrap();
    assert_eq!(inserts.len(), 1);
    assert_eq!(inserts[0].0, Target::new("test", "matches"));
    assert_eq!(inserts[0].1, vec!["match on 2020-01-05".to_string()]);
}

#[test]
fn one_insert_per_day() {
    let settings = settings().with_workers(4);
    let parser = FakeParser::default();
    let sink = FakeSink::default();
    let days = range("2019-12-15", "2020-01-14");

    let outcome = Dispatcher::new(&settings, &parser, &sink)
        .run(days.days())
        .unwrap();

    assert_eq!(outcome.completed, days.len());
    assert_eq!(sink.calls(), days.len());
    assert_eq!(parser.sorted_calls(), days.days().collect::<Vec<_>>());
}

#[test]
fn completion_count_matches_units_for_any_pool_size() {
    let start = parse_date("2020-03-01").unwrap();
    for workers in [1, 2, 3, 8, 32] {
        for k in [0u64, 1, 2, 7, 20] {
            let end = start + chrono::Days::new(k) - chrono::Days::new(1);
            let days = DateRange::new(start, end);
            assert_eq!(days.len() as u64, k);

            let settings = settings().with_workers(workers);
            let parser = FakeParser::default();
            let sink = FakeSink::default();
            let outcome = Dispatcher::new(&settings, &parser, &sink)
                .run(days.days())
                .unwrap();

            assert_eq!(outcome.issued, k as usize, "workers={workers} k={k}");
            assert_eq!(outcome.completed, k as usize, "workers={workers} k={k}");
            assert_eq!(sink.calls(), k as usize, "workers={workers} k={k}");
        }
    }
}

#[test]
fn in_flight_bounded_by_pool_size() {
    let settings = settings().with_workers(3).with_dry_run(true);
    let parser = FakeParser::slow(Duration::from_millis(20));
    let sink = FakeSink::default();

    Dispatcher::new(&settings, &parser, &sink)
        .run(range("2021-01-01", "2021-01-12").days())
        .unwrap();

    let max = parser.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 3, "saw {max} concurrent parses with 3 workers");
    assert!(max >= 2, "expected overlapping parses, saw {max}");
}

#[test]
fn parse_failure_is_reported() {
    let settings = settings().with_workers(2);
    let parser = FakeParser::failing_on("2020-01-04");
    let sink = FakeSink::default();

    let err = Dispatcher::new(&settings, &parser, &sink)
        .run(range("2020-01-01", "2020-01-10").days())
        .unwrap_err();

    match err {
        RunError::Parse(failure) => {
            assert_eq!(failure.key, "2020-01-04");
            assert_eq!(failure.message, "malformed page");
        }
        other => panic!("expected parse failure, got {other}"),
    }
    assert!(sink.calls() < 10);
}

#[test]
fn parse_failure_on_only_day() {
    let settings = settings();
    let parser = FakeParser::failing_on("2020-01-05");
    let sink = FakeSink::default();

    let err = Dispatcher::new(&settings, &parser, &sink)
        .run(range("2020-01-05", "2020-01-05").days())
        .unwrap_err();

    assert!(matches!(err, RunError::Parse(_)));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(sink.calls(), 0);
}

#[test]
fn persist_failure_is_reported() {
    let settings = settings().with_workers(3);
    let parser = FakeParser::default();
    let sink = FakeSink::failing();

    let err = Dispatcher::new(&settings, &parser, &sink)
        .run(range("2020-01-01", "2020-01-06").days())
        .unwrap_err();

    match err {
        RunError::Persist { source, .. } => {
            assert_eq!(source.target, "test.matches");
        }
        other => panic!("expected persist failure, got {other}"),
    }
}

#[test]
fn dry_run_ignores_failing_sink() {
    let settings = settings().with_dry_run(true);
    let parser = FakeParser::default();
    let sink = FakeSink::failing();

    let outcome = Dispatcher::new(&settings, &parser, &sink)
        .run(range("2020-01-01", "2020-01-04").days())
        .unwrap();
    assert_eq!(outcome.completed, 4);
}

#[test]
fn reversed_range_is_a_no_op() {
    let settings = settings();
    let parser = FakeParser::default();
    let sink = FakeSink::default();

    let outcome = Dispatcher::new(&settings, &parser, &sink)
        .run(range("2020-01-05", "2020-01-01").days())
        .unwrap();

    assert_eq!(outcome.issued, 0);
    assert!(parser.sorted_calls().is_empty());
    assert_eq!(sink.calls(), 0);
}

#[test]
fn single_worker_stops_at_first_parse_failure() {
    let settings = settings().with_workers(1);
    let parser = FakeParser::failing_on("2020-01-03");
    let sink = FakeSink::default();

    let err = Dispatcher::new(&settings, &parser, &sink)
        .run(range("2020-01-01", "2020-01-10").days())
        .unwrap_err();

    assert!(matches!(err, RunError::Parse(ref f) if f.key == "2020-01-03"));
    assert_eq!(parser.call_count(), 3);
    assert_eq!(sink.calls(), 2);
}

#[test]
fn worker_panic_is_an_error() {
    let settings = settings().with_workers(2);
    let parser = FakeParser::panicking_on("2020-01-02", Duration::ZERO);
    let sink = FakeSink::default();

    let err = Dispatcher::new(&settings, &parser, &sink)
        .run(range("2020-01-01", "2020-01-03").days())
        .unwrap_err();
    assert!(matches!(err, RunError::WorkerPanicked));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn worker_panic_stops_the_run_early() {
    let settings = settings().with_workers(2);
    let parser = FakeParser::panicking_on("2020-01-01", Duration::from_millis(5));
    let sink = FakeSink::default();
    let year = range("2020-01-01", "2020-12-31");

    let err = Dispatcher::new(&settings, &parser, &sink)
        .run(year.days())
        .unwrap_err();

    assert!(matches!(err, RunError::WorkerPanicked));
    let inserts = sink.calls();
    assert!(
        inserts < 20,
        "{inserts} of {} days persisted after the panic",
        year.len()
    );
}
