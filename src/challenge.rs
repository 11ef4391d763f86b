//! Badges awarded automatically when a run is finished.

use serde::Serialize;

use crate::db::{Db, Tx};
use crate::errors::BackendError;
use crate::run::Run;
use crate::user::User;
use crate::Id;

pub const VOLUME_RUNS: i64 = 10;
pub const DISTANCE_KILOMETERS: f64 = 50.0;
pub const BURST_KILOMETERS: f64 = 2.0;
pub const BURST_SECONDS: i32 = 600;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Badge {
    TenRuns,
    FiftyKilometers,
    TwoKilometersInTenMinutes,
}

impl Badge {
    pub const ALL: [Badge; 3] = [
        Badge::TenRuns,
        Badge::FiftyKilometers,
        Badge::TwoKilometersInTenMinutes,
    ];

    /// The name shown to users, which is also what gets stored.
    pub fn full_name(self) -> &'static str {
        match self {
            Badge::TenRuns => "Сделай 10 Забегов!",
            Badge::FiftyKilometers => "Пробеги 50 километров!",
            Badge::TwoKilometersInTenMinutes => "2 километра за 10 минут!",
        }
    }
}

/// Totals over all finished runs of one athlete.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunTotals {
    pub finished_runs: i64,
    /// Kilometers; unset when there are no finished runs.
    pub distance: Option<f64>,
}

/// Returns the badges whose conditions hold, whether or not the athlete
/// already has them.
pub fn qualifying(totals: &RunTotals, run: &Run) -> Vec<Badge> {
    Badge::ALL
        .iter()
        .copied()
        .filter(|badge| match badge {
            Badge::TenRuns => totals.finished_runs >= VOLUME_RUNS,
            Badge::FiftyKilometers => totals.distance.unwrap_or(0.0) >= DISTANCE_KILOMETERS,
            Badge::TwoKilometersInTenMinutes => {
                run.distance.unwrap_or(0.0) >= BURST_KILOMETERS
                    && run.run_time_seconds <= BURST_SECONDS
            }
        })
        .collect()
}

/// Awards the badges the athlete of `run` has earned and doesn’t hold
/// yet. Returns the newly awarded badges.
pub(crate) async fn award(tx: &mut dyn Tx, run: &Run) -> Result<Vec<Badge>, BackendError> {
    let totals = tx.finished_run_totals(run.athlete_id).await?;
    let mut awarded = vec![];

    for badge in qualifying(&totals, run) {
        if tx.has_challenge(run.athlete_id, badge).await? {
            continue;
        }

        // the insert is a no-op if a concurrent stop got there first
        if tx.insert_challenge(run.athlete_id, badge).await? {
            awarded.push(badge);
        }
    }

    Ok(awarded)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Challenge {
    pub(crate) id: Id,
    pub(crate) full_name: String,
    #[serde(rename = "athlete")]
    pub(crate) athlete_id: Id,
}

impl Challenge {
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn athlete_id(&self) -> Id {
        self.athlete_id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BadgeSummary {
    name_to_display: String,
    athletes: Vec<Holder>,
}

impl BadgeSummary {
    pub fn name(&self) -> &str {
        &self.name_to_display
    }

    pub fn holders(&self) -> &[Holder] {
        &self.athletes
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Holder {
    pub id: Id,
    pub full_name: String,
    pub username: String,
}

impl From<&User> for Holder {
    fn from(user: &User) -> Self {
        Holder {
            id: user.id(),
            full_name: user.full_name(),
            username: user.username().to_owned(),
        }
    }
}

/// Groups holders under each challenge name, keeping the order in which
/// names first appear.
pub fn summarize(holders: Vec<(String, User)>) -> Vec<BadgeSummary> {
    let mut summaries: Vec<BadgeSummary> = vec![];

    for (name, user) in holders {
        match summaries.iter_mut().find(|s| s.name_to_display == name) {
            Some(summary) => summary.athletes.push(Holder::from(&user)),
            None => summaries.push(BadgeSummary {
                name_to_display: name,
                athletes: vec![Holder::from(&user)],
            }),
        }
    }

    summaries
}

pub async fn list(db: &dyn Db, athlete: Option<Id>) -> Result<Vec<Challenge>, BackendError> {
    let mut tx = db.begin().await?;
    let challenges = tx.list_challenges(athlete).await?;
    tx.commit().await?;

    Ok(challenges)
}

pub async fn summary(db: &dyn Db) -> Result<Vec<BadgeSummary>, BackendError> {
    let mut tx = db.begin().await?;
    let holders = tx.challenge_holders().await?;
    tx.commit().await?;

    Ok(summarize(holders))
}
