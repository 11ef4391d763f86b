use serde::Serialize;

use crate::db::Db;
use crate::errors::BackendError;
use crate::user;
use crate::Id;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatingOutcome {
    Created,
    Updated,
}

/// Finished-run figures of one athlete subscribed to a coach. The
/// figures are unset when the athlete has no finished runs.
#[derive(Clone, Debug, PartialEq)]
pub struct AthleteAggregate {
    pub athlete_id: Id,
    pub longest_run: Option<f64>,
    pub total_distance: Option<f64>,
    pub finished_runs: i64,
    pub speed_avg: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CoachAnalytics {
    pub longest_run_user: Option<Id>,
    pub longest_run_value: Option<f64>,
    pub total_run_user: Option<Id>,
    pub total_run_value: Option<f64>,
    pub speed_avg_user: Option<Id>,
    pub speed_avg_value: Option<f64>,
}

impl CoachAnalytics {
    /// Picks the leader of each dimension independently. Ties go to the
    /// athlete with the lowest id.
    pub fn from_aggregates(aggregates: &[AthleteAggregate]) -> Self {
        let (longest_run_user, longest_run_value) = leader(aggregates, |a| a.longest_run);
        let (total_run_user, total_run_value) = leader(aggregates, |a| a.total_distance);
        let (speed_avg_user, speed_avg_value) = leader(aggregates, |a| a.speed_avg);

        CoachAnalytics {
            longest_run_user,
            longest_run_value,
            total_run_user,
            total_run_value,
            speed_avg_user,
            speed_avg_value,
        }
    }
}

fn leader(
    aggregates: &[AthleteAggregate],
    value: impl Fn(&AthleteAggregate) -> Option<f64>,
) -> (Option<Id>, Option<f64>) {
    let mut best: Option<(Id, f64)> = None;

    for aggregate in aggregates {
        let candidate = match value(aggregate) {
            Some(v) if aggregate.finished_runs > 0 => (aggregate.athlete_id, v),
            _ => continue,
        };

        best = match best {
            Some((id, v)) if v > candidate.1 || (v == candidate.1 && id < candidate.0) => {
                Some((id, v))
            }
            _ => Some(candidate),
        };
    }

    (best.map(|(id, _)| id), best.map(|(_, v)| v))
}

pub async fn subscribe(db: &dyn Db, athlete_id: Id, coach_id: Id) -> Result<(), BackendError> {
    let mut tx = db.begin().await?;

    user::require_athlete(&mut *tx, athlete_id).await?;
    user::require_coach(&mut *tx, coach_id).await?;

    if tx.subscription_exists(athlete_id, coach_id).await? {
        return Err(BackendError::AlreadySubscribed {
            athlete: athlete_id,
            coach: coach_id,
        });
    }

    tx.insert_subscription(athlete_id, coach_id).await?;
    tx.commit().await?;

    Ok(())
}

/// Records the athlete’s rating of a coach they’re subscribed to. An
/// athlete has one rating at a time, so rating any coach replaces the
/// previous rating.
pub async fn rate(
    db: &dyn Db,
    athlete_id: Id,
    coach_id: Id,
    rating: i64,
) -> Result<RatingOutcome, BackendError> {
    if rating < MIN_RATING || rating > MAX_RATING {
        return Err(BackendError::InvalidRating(rating));
    }

    let mut tx = db.begin().await?;

    user::require_athlete(&mut *tx, athlete_id).await?;
    user::require_coach(&mut *tx, coach_id).await?;

    if !tx.subscription_exists(athlete_id, coach_id).await? {
        return Err(BackendError::NotSubscribed {
            athlete: athlete_id,
            coach: coach_id,
        });
    }

    let outcome = tx.upsert_rating(athlete_id, coach_id, rating as i16).await?;
    tx.commit().await?;

    Ok(outcome)
}

pub async fn analytics(db: &dyn Db, coach_id: Id) -> Result<CoachAnalytics, BackendError> {
    let mut tx = db.begin().await?;

    user::require_coach(&mut *tx, coach_id).await?;
    let aggregates = tx.athlete_aggregates(coach_id).await?;
    tx.commit().await?;

    Ok(CoachAnalytics::from_aggregates(&aggregates))
}
