//! Bounded worker pool over a job queue, with completion aggregation
//!
//! The dispatcher pushes every unit of work into a queue sized to the whole
//! run, closes it, then waits for one completion signal per unit. Workers
//! are `settings.workers` loops on a dedicated rayon pool; they race for
//! units, so processing order is unspecified. The first fatal error (a
//! panicking collaborator included) raises a stop flag: in-flight calls
//! finish, nothing new is started and the error is returned to the caller.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use indicatif::ProgressBar;

use crate::error::RunError;
use crate::outcome::{DayReport, RunOutcome};
use crate::ports::{PageParser, RecordSink, UnitOfWork};
use crate::settings::RunSettings;
use crate::shutdown::is_shutdown_requested;

type Completion = Result<DayReport, RunError>;

/// Fans units of work out to a fixed pool of workers
pub struct Dispatcher<'a, P, S> {
    settings: &'a RunSettings,
    parser: &'a P,
    sink: &'a S,
    progress: ProgressBar,
}

impl<'a, P, S> Dispatcher<'a, P, S> {
    pub fn new(settings: &'a RunSettings, parser: &'a P, sink: &'a S) -> Self {
        Self {
            settings,
            parser,
            sink,
            progress: ProgressBar::hidden(),
        }
    }

    /// Advance `progress` once per completed unit
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl<P, S> Dispatcher<'_, P, S> {
    /// Process every unit and wait for all of them, or for the first failure
    pub fn run<K>(&self, units: impl IntoIterator<Item = K>) -> Result<RunOutcome, RunError>
    where
        K: Display + Send,
        P: PageParser<K>,
        S: RecordSink<P::Record>,
    {
        self.settings.validate()?;
        let start = Instant::now();
        let units: Vec<K> = units.into_iter().collect();
        let total = units.len();

        let mut outcome = RunOutcome::empty(self.settings.dry_run);
        outcome.issued = total;
        if total == 0 {
            log::warn!("No units of work to process");
            return Ok(outcome);
        }

        let workers = self.settings.workers;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("bettificator-worker-{i}"))
            .build()
            .map_err(|e| RunError::ThreadPool(e.to_string()))?;

        log::info!(
            "Processing {} units with {} workers{}",
            total,
            workers,
            if self.settings.dry_run { " (dry run)" } else { "" }
        );
        self.progress.set_length(total as u64);

        // Both channels hold the whole run, so neither side blocks on capacity
        let (job_tx, job_rx) = sync_channel::<UnitOfWork<K>>(total);
        let (done_tx, done_rx) = sync_channel::<Completion>(total);
        let jobs = Mutex::new(job_rx);
        let stop = AtomicBool::new(false);
        let mut first_error: Option<RunError> = None;

        // The aggregator runs on this thread; only the worker loops occupy the pool
        let scoped = panic::catch_unwind(AssertUnwindSafe(|| {
            pool.in_place_scope(|s| {
                for id in 0..workers {
                    let done = done_tx.clone();
                    let (jobs, stop) = (&jobs, &stop);
                    s.spawn(move |_| self.worker_loop(id, jobs, done, stop));
                }
                drop(done_tx);

                for (seq, key) in units.into_iter().enumerate() {
                    if job_tx.send(UnitOfWork { seq, key }).is_err() {
                        break;
                    }
                }
                drop(job_tx);

                while outcome.completed < total {
                    match done_rx.recv() {
                        Ok(Ok(report)) => {
                            log::debug!(
                                "#{} {}: {} records{}",
                                report.seq,
                                report.key,
                                report.records,
                                if report.persisted { " inserted" } else { "" }
                            );
                            outcome.record(&report);
                            self.progress.inc(1);
                        }
                        Ok(Err(e)) => {
                            log::error!("{e}");
                            stop.store(true, Ordering::Relaxed);
                            first_error = Some(e);
                            break;
                        }
                        // Every worker has exited early
                        Err(_) => break,
                    }
                }
            })
        }));
        if scoped.is_err() && first_error.is_none() {
            first_error = Some(RunError::WorkerPanicked);
        }

        // Failures from siblings that were already in flight
        for late in done_rx.try_iter().filter_map(Result::err) {
            log::debug!("Dropping later failure: {late}");
        }

        outcome.elapsed = start.elapsed();
        if let Some(e) = first_error {
            self.progress.abandon();
            return Err(e);
        }
        if !outcome.is_complete() {
            self.progress.abandon();
            return Err(RunError::Interrupted {
                completed: outcome.completed,
                total,
            });
        }
        self.progress.finish_with_message("done");
        Ok(outcome)
    }

    fn worker_loop<K>(
        &self,
        id: usize,
        jobs: &Mutex<Receiver<UnitOfWork<K>>>,
        done: SyncSender<Completion>,
        stop: &AtomicBool,
    ) where
        K: Display,
        P: PageParser<K>,
        S: RecordSink<P::Record>,
    {
        let halted = || stop.load(Ordering::Relaxed) || is_shutdown_requested();
        loop {
            if halted() {
                break;
            }
            let unit = {
                let rx = jobs.lock().unwrap_or_else(PoisonError::into_inner);
                match rx.recv() {
                    Ok(unit) => unit,
                    Err(_) => break,
                }
            };
            if halted() {
                break;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                self.process_unit(&unit, &halted)
            }))
            .unwrap_or_else(|payload| {
                log::error!(
                    "worker {id} panicked on {}: {}",
                    unit.key,
                    panic_message(payload.as_ref())
                );
                Err(RunError::WorkerPanicked)
            });

            match result {
                Ok(Some(report)) => {
                    if done.send(Ok(report)).is_err() {
                        break;
                    }
                }
                // Parsed after a stop was requested; not persisted, not reported
                Ok(None) => break,
                Err(e) => {
                    stop.store(true, Ordering::Relaxed);
                    let _ = done.send(Err(e));
                    break;
                }
            }
        }
        log::trace!("worker {id} exiting");
    }

    fn process_unit<K>(
        &self,
        unit: &UnitOfWork<K>,
        halted: &dyn Fn() -> bool,
    ) -> Result<Option<DayReport>, RunError>
    where
        K: Display,
        P: PageParser<K>,
        S: RecordSink<P::Record>,
    {
        let fetched = self.parser.parse(&unit.key).map_err(RunError::Parse)?;
        let records = fetched.len();

        if self.settings.dry_run {
            return Ok(Some(DayReport {
                seq: unit.seq,
                key: unit.key.to_string(),
                records,
                persisted: false,
            }));
        }
        if halted() {
            return Ok(None);
        }

        self.sink
            .insert(&self.settings.target, &fetched.records)
            .map_err(|source| RunError::Persist {
                key: unit.key.to_string(),
                source,
            })?;

        Ok(Some(DayReport {
            seq: unit.seq,
            key: unit.key.to_string(),
            records,
            persisted: true,
        }))
    }
}
