use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db::Db;
use crate::errors::BackendError;
use crate::great_circle::{round_to, Coordinates};
use crate::item;
use crate::run::RunStatus;
use crate::Id;

/// A GPS sample recorded during a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Position {
    pub(crate) id: Id,
    #[serde(rename = "run")]
    pub(crate) run_id: Id,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    #[serde(with = "time::serde::timestamp")]
    pub(crate) date_time: OffsetDateTime,
    /// Kilometers covered since the first sample of the run.
    pub(crate) distance: f64,
    /// Meters per second since the previous sample.
    pub(crate) speed: f64,
}

impl Position {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn run_id(&self) -> Id {
        self.run_id
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::unchecked(self.latitude, self.longitude)
    }

    pub fn date_time(&self) -> OffsetDateTime {
        self.date_time
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }
}

/// A sample as submitted by a client. Distance and speed are always
/// computed, so there is nowhere to put them.
#[derive(Clone, Debug, Deserialize)]
pub struct PositionSample {
    pub run: Id,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(with = "time::serde::timestamp")]
    pub date_time: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewPosition {
    pub(crate) run_id: Id,
    pub(crate) coordinates: Coordinates,
    pub(crate) date_time: OffsetDateTime,
    pub(crate) metrics: Metrics,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metrics {
    pub distance: f64,
    pub speed: f64,
}

impl Metrics {
    pub fn first() -> Self {
        Metrics {
            distance: 0.0,
            speed: 0.0,
        }
    }

    /// Computes the metrics of a sample taken after `previous`.
    pub fn following(
        previous: &Position,
        coordinates: &Coordinates,
        date_time: OffsetDateTime,
    ) -> Result<Self, BackendError> {
        let elapsed = (date_time - previous.date_time).as_seconds_f64();

        if elapsed <= 0.0 {
            return Err(BackendError::NonChronologicalPosition {
                run: previous.run_id,
                latest: previous.date_time.unix_timestamp(),
            });
        }

        let step = round_to(previous.coordinates().meters_to(coordinates), 2);

        Ok(Metrics {
            distance: previous.distance + step / 1000.0,
            speed: round_to(step / elapsed, 2),
        })
    }
}

/// The stored sample and the items it brought within reach.
#[derive(Clone, Debug)]
pub struct Ingestion {
    pub position: Position,
    pub collected: Vec<Id>,
}

pub async fn record(db: &dyn Db, sample: PositionSample) -> Result<Ingestion, BackendError> {
    let coordinates = Coordinates::new(sample.latitude, sample.longitude)?;

    let mut tx = db.begin().await?;

    let run = tx
        .lock_run(sample.run)
        .await?
        .ok_or(BackendError::NonExistentRun(sample.run))?;

    if run.status() != RunStatus::InProgress {
        return Err(BackendError::RunNotInProgress {
            id: run.id(),
            status: run.status(),
        });
    }

    let metrics = match tx.latest_position(run.id()).await? {
        Some(previous) => Metrics::following(&previous, &coordinates, sample.date_time)?,
        None => Metrics::first(),
    };

    let collected = item::collect_nearby(&mut *tx, run.athlete_id(), &coordinates).await?;

    let position = tx
        .insert_position(&NewPosition {
            run_id: run.id(),
            coordinates,
            date_time: sample.date_time,
            metrics,
        })
        .await?;

    tx.commit().await?;

    Ok(Ingestion {
        position,
        collected,
    })
}

pub async fn list(db: &dyn Db, run: Option<Id>) -> Result<Vec<Position>, BackendError> {
    let mut tx = db.begin().await?;
    let positions = tx.list_positions(run).await?;
    tx.commit().await?;

    Ok(positions)
}
