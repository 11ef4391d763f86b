//! Runs and their lifecycle.
//!
//! A run is created in [`RunStatus::Init`], moves to
//! [`RunStatus::InProgress`] when started and to [`RunStatus::Finished`]
//! when stopped. Transitions never skip a status and never go back.
//! Stopping a run computes its distance, duration and average speed from
//! the recorded positions and then awards any challenges the athlete
//! has earned.

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::challenge::{self, Badge};
use crate::db::Db;
use crate::errors::BackendError;
use crate::great_circle::{path_kilometers, round_to};
use crate::position::Position;
use crate::user;
use crate::Id;

pub const MAX_COMMENT_LENGTH: usize = 255;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Init,
    InProgress,
    Finished,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Init => "init",
            RunStatus::InProgress => "in_progress",
            RunStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(RunStatus::Init),
            "in_progress" => Ok(RunStatus::InProgress),
            "finished" => Ok(RunStatus::Finished),
            _ => Err(BackendError::UnknownRunStatus(s.to_owned())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Run {
    pub(crate) id: Id,
    #[serde(rename = "athlete")]
    pub(crate) athlete_id: Id,
    pub(crate) comment: String,
    pub(crate) status: RunStatus,
    #[serde(with = "time::serde::timestamp")]
    pub(crate) created_at: OffsetDateTime,
    /// Kilometers; unset until the run is finished.
    pub(crate) distance: Option<f64>,
    pub(crate) run_time_seconds: i32,
    pub(crate) speed: f64,
}

impl Run {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn athlete_id(&self) -> Id {
        self.athlete_id
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn distance(&self) -> Option<f64> {
        self.distance
    }

    pub fn run_time_seconds(&self) -> i32 {
        self.run_time_seconds
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn expect_status(&self, expected: RunStatus) -> Result<(), BackendError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(BackendError::InvalidRunStatus {
                id: self.id,
                expected,
                actual: self.status,
            })
        }
    }

    pub fn start(&mut self) -> Result<(), BackendError> {
        self.expect_status(RunStatus::Init)?;
        self.status = RunStatus::InProgress;

        Ok(())
    }

    pub fn finish(&mut self, summary: RunSummary) -> Result<(), BackendError> {
        self.expect_status(RunStatus::InProgress)?;

        self.status = RunStatus::Finished;
        self.distance = Some(summary.distance);
        self.run_time_seconds = summary.run_time_seconds;
        self.speed = summary.speed;

        Ok(())
    }
}

/// The metrics of a finished run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub distance: f64,
    pub run_time_seconds: i32,
    pub speed: f64,
}

impl RunSummary {
    /// Summarizes positions given in chronological order.
    pub fn from_positions(positions: &[Position]) -> Self {
        let coordinates: Vec<_> = positions.iter().map(Position::coordinates).collect();
        let distance = round_to(path_kilometers(&coordinates), 3);

        let run_time_seconds = match (positions.first(), positions.last()) {
            (Some(first), Some(last)) => {
                let seconds = (last.date_time - first.date_time).whole_seconds();
                i32::try_from(seconds.max(0)).unwrap_or(i32::MAX)
            }
            _ => 0,
        };

        let speed = if positions.is_empty() {
            0.0
        } else {
            positions.iter().map(|p| p.speed).sum::<f64>() / positions.len() as f64
        };

        RunSummary {
            distance,
            run_time_seconds,
            speed,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewRun {
    pub athlete: Id,
    pub comment: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RunUpdate {
    pub comment: String,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
pub struct RunFilter {
    pub athlete: Option<Id>,
    pub status: Option<RunStatus>,
}

/// A run that was just stopped, along with the badges it earned.
#[derive(Clone, Debug)]
pub struct Stopped {
    pub run: Run,
    pub awarded: Vec<Badge>,
}

fn validate_comment(comment: &str) -> Result<(), BackendError> {
    let length = comment.chars().count();

    if length == 0 || length > MAX_COMMENT_LENGTH {
        return Err(BackendError::InvalidLength {
            field: "comment",
            min: 1,
            max: MAX_COMMENT_LENGTH,
        });
    }

    Ok(())
}

pub async fn create(db: &dyn Db, new_run: NewRun) -> Result<Run, BackendError> {
    validate_comment(&new_run.comment)?;

    let mut tx = db.begin().await?;
    user::require_athlete(&mut *tx, new_run.athlete).await?;
    let run = tx.insert_run(new_run.athlete, &new_run.comment).await?;
    tx.commit().await?;

    Ok(run)
}

pub async fn retrieve(db: &dyn Db, id: Id) -> Result<Run, BackendError> {
    let mut tx = db.begin().await?;
    let run = tx.retrieve_run(id).await?.ok_or(BackendError::NonExistentRun(id))?;
    tx.commit().await?;

    Ok(run)
}

pub async fn list(db: &dyn Db, filter: RunFilter) -> Result<Vec<Run>, BackendError> {
    let mut tx = db.begin().await?;
    let runs = tx.list_runs(filter).await?;
    tx.commit().await?;

    Ok(runs)
}

/// Replaces the comment. Status and metrics can only change through the
/// lifecycle operations.
pub async fn update(db: &dyn Db, id: Id, update: RunUpdate) -> Result<Run, BackendError> {
    validate_comment(&update.comment)?;

    let mut tx = db.begin().await?;
    let mut run = tx.lock_run(id).await?.ok_or(BackendError::NonExistentRun(id))?;
    run.comment = update.comment;
    tx.save_run(&run).await?;
    tx.commit().await?;

    Ok(run)
}

pub async fn start(db: &dyn Db, id: Id) -> Result<Run, BackendError> {
    let mut tx = db.begin().await?;
    let mut run = tx.lock_run(id).await?.ok_or(BackendError::NonExistentRun(id))?;
    run.start()?;
    tx.save_run(&run).await?;
    tx.commit().await?;

    Ok(run)
}

pub async fn stop(db: &dyn Db, id: Id) -> Result<Stopped, BackendError> {
    let mut tx = db.begin().await?;
    let mut run = tx.lock_run(id).await?.ok_or(BackendError::NonExistentRun(id))?;
    run.expect_status(RunStatus::InProgress)?;

    let positions = tx.list_positions(Some(id)).await?;
    run.finish(RunSummary::from_positions(&positions))?;
    tx.save_run(&run).await?;

    let awarded = challenge::award(&mut *tx, &run).await?;
    tx.commit().await?;

    Ok(Stopped { run, awarded })
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::{create, list, retrieve, start, stop, update, NewRun, RunFilter, RunStatus, RunSummary, RunUpdate};
    use crate::challenge::Badge;
    use crate::db::mock::MockDb;
    use crate::errors::{BackendError, ErrorKind};
    use crate::position::{self, PositionSample};
    use crate::Id;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000 + seconds)
    }

    async fn new_run(db: &MockDb, athlete: Id) -> Id {
        create(
            db,
            NewRun {
                athlete,
                comment: "morning".to_owned(),
            },
        )
        .await
        .expect("create run")
        .id()
    }

    async fn record(db: &MockDb, run: Id, latitude: f64, longitude: f64, seconds: i64) {
        position::record(
            db,
            PositionSample {
                run,
                latitude,
                longitude,
                date_time: at(seconds),
            },
        )
        .await
        .expect("record position");
    }

    #[test]
    fn statuses_round_trip_through_text() {
        for status in &[RunStatus::Init, RunStatus::InProgress, RunStatus::Finished] {
            assert_eq!(status.as_str().parse::<RunStatus>().ok(), Some(*status));
        }

        assert!(matches!(
            "paused".parse::<RunStatus>(),
            Err(BackendError::UnknownRunStatus(_))
        ));
    }

    #[test]
    fn empty_runs_summarize_to_zero() {
        let summary = RunSummary::from_positions(&[]);

        assert_eq!(summary.distance, 0.0);
        assert_eq!(summary.run_time_seconds, 0);
        assert_eq!(summary.speed, 0.0);
    }

    #[tokio::test]
    async fn runs_start_only_from_init() {
        let db = MockDb::default();
        let athlete = db.add_athlete("athlete").await;
        let id = new_run(&db, athlete).await;

        let run = start(&db, id).await.expect("start run");
        assert_eq!(run.status(), RunStatus::InProgress);

        let error = start(&db, id).await.expect_err("second start must fail");
        assert_eq!(error.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn runs_stop_only_from_in_progress() {
        let db = MockDb::default();
        let athlete = db.add_athlete("athlete").await;
        let id = new_run(&db, athlete).await;

        let error = stop(&db, id).await.expect_err("stopping a new run must fail");
        assert!(matches!(
            error,
            BackendError::InvalidRunStatus {
                expected: RunStatus::InProgress,
                actual: RunStatus::Init,
                ..
            }
        ));

        start(&db, id).await.expect("start run");
        let stopped = stop(&db, id).await.expect("stop run");
        assert_eq!(stopped.run.status(), RunStatus::Finished);

        let error = stop(&db, id).await.expect_err("stopping twice must fail");
        assert_eq!(error.kind(), ErrorKind::InvalidState);
        assert_eq!(
            retrieve(&db, id).await.expect("retrieve run").status(),
            RunStatus::Finished
        );
    }

    #[tokio::test]
    async fn runs_without_positions_finish_with_zero_metrics() {
        let db = MockDb::default();
        let athlete = db.add_athlete("athlete").await;
        let id = new_run(&db, athlete).await;

        start(&db, id).await.expect("start run");
        let stopped = stop(&db, id).await.expect("stop run");

        assert_eq!(stopped.run.distance(), Some(0.0));
        assert_eq!(stopped.run.run_time_seconds(), 0);
        assert_eq!(stopped.run.speed(), 0.0);
        assert!(stopped.awarded.is_empty());
    }

    #[tokio::test]
    async fn two_kilometers_in_under_ten_minutes() {
        let db = MockDb::default();
        let athlete = db.add_athlete("athlete").await;
        let id = new_run(&db, athlete).await;

        start(&db, id).await.expect("start run");
        record(&db, id, 0.0, 0.0, 0).await;
        record(&db, id, 0.018087, 0.0, 550).await;

        let stopped = stop(&db, id).await.expect("stop run");

        assert_eq!(stopped.run.run_time_seconds(), 550);
        assert_eq!(stopped.run.distance(), Some(2.0));
        assert_eq!(stopped.awarded, vec![Badge::TwoKilometersInTenMinutes]);

        // the speed is the mean of 0 for the first sample and ~3.64 m/s
        assert!((stopped.run.speed() - 1.82).abs() < 0.01, "{}", stopped.run.speed());
    }

    #[tokio::test]
    async fn ten_short_runs_earn_the_volume_badge_only() {
        let db = MockDb::default();
        let athlete = db.add_athlete("athlete").await;

        let mut awarded = vec![];

        for _ in 0..10 {
            let id = new_run(&db, athlete).await;
            start(&db, id).await.expect("start run");
            record(&db, id, 0.0, 0.0, 0).await;
            record(&db, id, 0.009044, 0.0, 900).await;

            let stopped = stop(&db, id).await.expect("stop run");
            assert_eq!(stopped.run.distance(), Some(1.0));
            awarded.extend(stopped.awarded);
        }

        assert_eq!(awarded, vec![Badge::TenRuns]);
        assert_eq!(db.challenge_names(athlete).await, vec![Badge::TenRuns.full_name()]);
    }

    #[tokio::test]
    async fn coaches_cannot_create_runs() {
        let db = MockDb::default();
        let coach = db.add_coach("coach").await;

        let result = create(
            &db,
            NewRun {
                athlete: coach,
                comment: "no".to_owned(),
            },
        )
        .await;

        assert!(matches!(result, Err(BackendError::NotAnAthlete(_))));
        assert!(matches!(
            create(
                &db,
                NewRun {
                    athlete: 99,
                    comment: "no".to_owned()
                }
            )
            .await,
            Err(BackendError::NonExistentUser(99))
        ));
    }

    #[tokio::test]
    async fn comments_are_validated_and_updated() {
        let db = MockDb::default();
        let athlete = db.add_athlete("athlete").await;
        let id = new_run(&db, athlete).await;

        let long = "x".repeat(256);
        assert!(matches!(
            update(&db, id, RunUpdate { comment: long }).await,
            Err(BackendError::InvalidLength { field: "comment", .. })
        ));

        let run = update(
            &db,
            id,
            RunUpdate {
                comment: "evening".to_owned(),
            },
        )
        .await
        .expect("update run");

        assert_eq!(run.comment(), "evening");
        assert_eq!(run.status(), RunStatus::Init);
        assert_eq!(retrieve(&db, id).await.expect("retrieve run").comment(), "evening");
    }

    #[tokio::test]
    async fn listing_filters_runs() {
        let db = MockDb::default();
        let first = db.add_athlete("first").await;
        let second = db.add_athlete("second").await;

        let a = new_run(&db, first).await;
        let b = new_run(&db, first).await;
        let c = new_run(&db, second).await;
        start(&db, b).await.expect("start run");

        let ids = |runs: Vec<super::Run>| runs.iter().map(|r| r.id()).collect::<Vec<_>>();

        assert_eq!(ids(list(&db, RunFilter::default()).await.expect("list")), vec![a, b, c]);
        assert_eq!(
            ids(list(&db, RunFilter { athlete: Some(first), status: None }).await.expect("list")),
            vec![a, b]
        );
        assert_eq!(
            ids(list(
                &db,
                RunFilter {
                    athlete: Some(first),
                    status: Some(RunStatus::Init)
                }
            )
            .await
            .expect("list")),
            vec![a]
        );
    }

    #[tokio::test]
    async fn missing_runs_are_not_found() {
        let db = MockDb::default();

        assert!(matches!(start(&db, 5).await, Err(BackendError::NonExistentRun(5))));
        assert!(matches!(stop(&db, 5).await, Err(BackendError::NonExistentRun(5))));
        assert!(matches!(retrieve(&db, 5).await, Err(BackendError::NonExistentRun(5))));
    }
}
