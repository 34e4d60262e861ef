//! Aggregate completion state of one run

use std::time::Duration;

use crate::progress::fmt_num;

/// Sent by a worker after a unit was parsed (and persisted unless dry-run)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReport {
    pub seq: usize,
    pub key: String,
    pub records: usize,
    pub persisted: bool,
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub issued: usize,
    pub completed: usize,
    pub records: usize,
    pub persisted_batches: usize,
    pub dry_run: bool,
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn empty(dry_run: bool) -> Self {
        Self {
            issued: 0,
            completed: 0,
            records: 0,
            persisted_batches: 0,
            dry_run,
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn record(&mut self, report: &DayReport) {
        self.completed += 1;
        self.records += report.records;
        if report.persisted {
            self.persisted_batches += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.issued
    }

    pub fn log(&self) {
        log::info!("=== Retrieval Summary ===");
        log::info!("Units: {}/{} completed", self.completed, self.issued);
        if self.dry_run {
            log::info!("Records: {} parsed (dry run, nothing inserted)", fmt_num(self.records));
        } else {
            log::info!(
                "Records: {} in {} inserts",
                fmt_num(self.records),
                self.persisted_batches
            );
        }
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
        if self.completed > 0 && !self.elapsed.is_zero() {
            let rate = self.completed as f64 / self.elapsed.as_secs_f64();
            log::info!("Throughput: {rate:.1} units/sec");
        }
    }
}
