//! Parallel precomputation over every origin.
//!
//! A dispatcher hands origins to a pool of scoped worker threads that share
//! the read-only [`ScheduleIndex`]. Workers pull: each announces it is ready,
//! then receives either the next origin or a stop message. An origin's
//! patterns are stored only once its whole day of scans is done.

use chrono::NaiveDate;
use crossbeam::channel::{self, Receiver, Sender};
use tracing::{info, warn};

use crate::planner::{CalendarFilter, ScheduleIndex, StopIdx};

use super::error::PatternError;
use super::generator::TransferPatternGenerator;
use super::repository::PatternRepository;
use super::strings::PatternStringGenerator;

/// What a completed run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecomputeSummary {
    pub origins: usize,
    pub workers: usize,
}

enum Job {
    Origin(StopIdx),
    Stop,
}

enum Report {
    Ready {
        worker: usize,
        finished: Option<StopIdx>,
    },
    Failed {
        worker: usize,
        origin: StopIdx,
        error: PatternError,
    },
}

/// Every stop in the index, in index order.
pub fn all_origins(index: &ScheduleIndex) -> Vec<StopIdx> {
    (0..index.stop_count()).map(StopIdx).collect()
}

/// Compute and store the transfer patterns of each origin on `date`.
///
/// # Errors
///
/// Returns `Err` if any origin's patterns could not be stored, or if a worker
/// panicked. Origins not yet handed out when a failure is reported are never
/// started.
pub fn precompute(
    index: &ScheduleIndex,
    date: NaiveDate,
    filter: CalendarFilter,
    origins: Vec<StopIdx>,
    workers: usize,
    repository: &dyn PatternRepository,
) -> Result<PrecomputeSummary, PatternError> {
    let total = origins.len();
    let workers = workers.clamp(1, total.max(1));
    info!(origins = total, workers, %date, "precomputing transfer patterns");

    let outcome = crossbeam::scope(|scope| {
        let (report_tx, report_rx) = channel::unbounded();
        let mut job_txs = Vec::with_capacity(workers);
        for worker in 0..workers {
            let (job_tx, job_rx) = channel::bounded(1);
            job_txs.push(job_tx);
            let reports = report_tx.clone();
            scope.spawn(move |_| run_worker(worker, index, date, filter, repository, job_rx, reports));
        }
        drop(report_tx);

        dispatch(index, origins, &job_txs, &report_rx)
    });

    let completed = outcome.map_err(|_| PatternError::Panicked)??;
    info!(origins = completed, "transfer patterns stored");
    Ok(PrecomputeSummary {
        origins: completed,
        workers,
    })
}

fn dispatch(
    index: &ScheduleIndex,
    origins: Vec<StopIdx>,
    jobs: &[Sender<Job>],
    reports: &Receiver<Report>,
) -> Result<usize, PatternError> {
    let total = origins.len();
    let mut pending = origins.into_iter();
    let mut active = jobs.len();
    let mut completed = 0;
    let mut failure = None;

    // Ends early if every worker has gone, including by panic
    while active > 0 {
        let Ok(report) = reports.recv() else {
            break;
        };
        match report {
            Report::Ready { worker, finished } => {
                if let Some(origin) = finished {
                    completed += 1;
                    info!(
                        origin = %index.stop_id(origin),
                        completed,
                        total,
                        "origin complete"
                    );
                }
                let job = match pending.next() {
                    Some(origin) if failure.is_none() => Job::Origin(origin),
                    _ => Job::Stop,
                };
                let stopping = matches!(job, Job::Stop);
                if jobs[worker].send(job).is_err() || stopping {
                    active -= 1;
                }
            }
            Report::Failed { worker, origin, error } => {
                warn!(worker, origin = %index.stop_id(origin), error = %error, "worker failed");
                if failure.is_none() {
                    failure = Some(PatternError::Worker {
                        worker,
                        origin: index.stop_id(origin).clone(),
                        source: Box::new(error),
                    });
                }
                active -= 1;
            }
        }
    }

    match failure {
        Some(error) => Err(error),
        None => Ok(completed),
    }
}

fn run_worker(
    worker: usize,
    index: &ScheduleIndex,
    date: NaiveDate,
    filter: CalendarFilter,
    repository: &dyn PatternRepository,
    jobs: Receiver<Job>,
    reports: Sender<Report>,
) {
    let generator = TransferPatternGenerator::new(index, filter);
    let mut finished = None;

    loop {
        if reports.send(Report::Ready { worker, finished }).is_err() {
            return;
        }
        let origin = match jobs.recv() {
            Ok(Job::Origin(origin)) => origin,
            Ok(Job::Stop) | Err(_) => return,
        };

        let patterns = generator.create(origin, date, PatternStringGenerator::new(index, origin));
        if let Err(error) = repository.store(&patterns) {
            let _ = reports.send(Report::Failed { worker, origin, error });
            return;
        }
        finished = Some(origin);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{Calendar, ServiceId, StopId, StopTime, Time, Transfer, Trip, TripId};
    use crate::patterns::{JsonDirectoryRepository, TransferPatterns};
    use tempfile::tempdir;

    #[derive(Default)]
    struct Recording {
        stored: Mutex<BTreeMap<StopId, TransferPatterns>>,
        fail_on: Option<StopId>,
    }

    impl PatternRepository for Recording {
        fn store(&self, patterns: &TransferPatterns) -> Result<(), PatternError> {
            if self.fail_on.as_ref() == Some(&patterns.origin) {
                return Err(PatternError::Io {
                    path: "unwritable".into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.stored
                .lock()
                .unwrap()
                .insert(patterns.origin.clone(), patterns.clone());
            Ok(())
        }
    }

    fn trip(id: &str, calls: &[(&str, u32)]) -> Trip {
        Trip {
            id: TripId::new(id),
            stop_times: calls
                .iter()
                .map(|&(stop, time)| StopTime::new(stop, Time::from_seconds(time), Time::from_seconds(time)))
                .collect(),
            service_id: ServiceId::new("1"),
            train_uid: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 10, 16).unwrap()
    }

    fn index() -> ScheduleIndex {
        let end = NaiveDate::from_ymd_opt(2099, 12, 31).unwrap();
        ScheduleIndex::build(
            vec![
                trip("T1", &[("A", 1000), ("B", 1100), ("C", 1200)]),
                trip("T2", &[("B", 1110), ("D", 1150)]),
                trip("T3", &[("D", 1200), ("A", 1300)]),
                trip("T4", &[("C", 1300), ("E", 1400)]),
            ],
            vec![Transfer::new("E", "F", 60)],
            HashMap::new(),
            vec![Calendar::daily("1", date(), end)],
        )
        .unwrap()
    }

    fn run(workers: usize) -> BTreeMap<StopId, TransferPatterns> {
        let index = index();
        let repository = Recording::default();
        let summary = precompute(
            &index,
            date(),
            CalendarFilter::Bypass,
            all_origins(&index),
            workers,
            &repository,
        )
        .unwrap();
        assert_eq!(summary.origins, index.stop_count());
        repository.stored.into_inner().unwrap()
    }

    #[test]
    fn stores_every_origin() {
        let stored = run(2);

        assert_eq!(stored.len(), 6);
        let from_a = &stored[&StopId::new("A")];
        assert!(from_a.patterns[&StopId::new("D")].contains("A>B>D"));
        assert!(from_a.patterns[&StopId::new("F")].contains("A>C>E>F"));
        assert!(stored[&StopId::new("F")].patterns.is_empty());
    }

    #[test]
    fn worker_count_does_not_change_results() {
        assert_eq!(run(1), run(4));
    }

    #[test]
    fn more_workers_than_origins() {
        let index = index();
        let repository = Recording::default();
        let origin = index.stop_idx("A").unwrap();

        let summary =
            precompute(&index, date(), CalendarFilter::Enforce, vec![origin], 8, &repository).unwrap();

        assert_eq!(summary, PrecomputeSummary { origins: 1, workers: 1 });
    }

    #[test]
    fn no_origins() {
        let index = index();
        let repository = Recording::default();

        let summary = precompute(&index, date(), CalendarFilter::Enforce, vec![], 0, &repository).unwrap();

        assert_eq!(summary, PrecomputeSummary { origins: 0, workers: 1 });
    }

    #[test]
    fn store_failure_aborts_the_run() {
        let index = index();
        let repository = Recording {
            fail_on: Some(StopId::new("B")),
            ..Recording::default()
        };

        let result = precompute(
            &index,
            date(),
            CalendarFilter::Enforce,
            all_origins(&index),
            1,
            &repository,
        );

        match result {
            Err(PatternError::Worker { worker, origin, .. }) => {
                assert_eq!(worker, 0);
                assert_eq!(origin.as_str(), "B");
            }
            other => panic!("expected worker failure, got {other:?}"),
        }
        let stored = repository.stored.into_inner().unwrap();
        assert!(!stored.contains_key(&StopId::new("B")));
        assert!(stored.len() < index.stop_count());
    }

    #[test]
    fn writes_json_files() {
        let index = index();
        let dir = tempdir().unwrap();
        let repository = JsonDirectoryRepository::new(dir.path());

        precompute(
            &index,
            date(),
            CalendarFilter::Enforce,
            all_origins(&index),
            3,
            &repository,
        )
        .unwrap();

        for stop in ["A", "B", "C", "D", "E", "F"] {
            assert!(dir.path().join(format!("{stop}.json")).exists(), "{stop}.json missing");
        }
        let loaded = repository.load(&StopId::new("B")).unwrap().unwrap();
        assert!(loaded.patterns[&StopId::new("D")].contains("B>D"));
    }
}
