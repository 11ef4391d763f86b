use futures::future::BoxFuture;

use crate::athlete::AthleteInfo;
use crate::challenge::{Badge, Challenge, RunTotals};
use crate::coaching::{AthleteAggregate, RatingOutcome};
use crate::errors::BackendError;
use crate::item::{CollectibleItem, NewItem};
use crate::position::{NewPosition, Position};
use crate::run::{Run, RunFilter};
use crate::user::{User, UserKind, UserSummary};
use crate::Id;

#[cfg(test)]
pub(crate) mod mock;

pub trait Db: Send + Sync {
    /// Opens a transaction. Nothing written through it is kept unless
    /// [`Tx::commit`] succeeds.
    fn begin(&self) -> BoxFuture<Result<Box<dyn Tx>, BackendError>>;
}

/// The operations available inside a transaction.
pub trait Tx: Send {
    fn commit(self: Box<Self>) -> BoxFuture<'static, Result<(), BackendError>>;

    fn retrieve_user(&mut self, id: Id) -> BoxFuture<Result<Option<User>, BackendError>>;

    fn retrieve_user_summary(
        &mut self,
        id: Id,
    ) -> BoxFuture<Result<Option<UserSummary>, BackendError>>;

    fn list_user_summaries(
        &mut self,
        kind: Option<UserKind>,
    ) -> BoxFuture<Result<Vec<UserSummary>, BackendError>>;

    fn insert_run(&mut self, athlete_id: Id, comment: &str) -> BoxFuture<Result<Run, BackendError>>;

    fn retrieve_run(&mut self, id: Id) -> BoxFuture<Result<Option<Run>, BackendError>>;

    /// Like `retrieve_run`, but holds the run until the transaction ends.
    fn lock_run(&mut self, id: Id) -> BoxFuture<Result<Option<Run>, BackendError>>;

    fn list_runs(&mut self, filter: RunFilter) -> BoxFuture<Result<Vec<Run>, BackendError>>;

    fn save_run(&mut self, run: &Run) -> BoxFuture<Result<(), BackendError>>;

    fn finished_run_totals(&mut self, athlete_id: Id) -> BoxFuture<Result<RunTotals, BackendError>>;

    /// Lists positions in chronological order.
    fn list_positions(&mut self, run_id: Option<Id>) -> BoxFuture<Result<Vec<Position>, BackendError>>;

    fn latest_position(&mut self, run_id: Id) -> BoxFuture<Result<Option<Position>, BackendError>>;

    fn insert_position(&mut self, position: &NewPosition) -> BoxFuture<Result<Position, BackendError>>;

    fn insert_item(&mut self, item: &NewItem) -> BoxFuture<Result<CollectibleItem, BackendError>>;

    fn list_items(&mut self) -> BoxFuture<Result<Vec<CollectibleItem>, BackendError>>;

    fn uncollected_items(
        &mut self,
        athlete_id: Id,
    ) -> BoxFuture<Result<Vec<CollectibleItem>, BackendError>>;

    fn collected_items(&mut self, athlete_id: Id) -> BoxFuture<Result<Vec<CollectibleItem>, BackendError>>;

    /// Returns whether the item was newly collected.
    fn collect_item(&mut self, athlete_id: Id, item_id: Id) -> BoxFuture<Result<bool, BackendError>>;

    fn has_challenge(&mut self, athlete_id: Id, badge: Badge) -> BoxFuture<Result<bool, BackendError>>;

    /// Returns whether the challenge was newly created.
    fn insert_challenge(&mut self, athlete_id: Id, badge: Badge) -> BoxFuture<Result<bool, BackendError>>;

    fn list_challenges(&mut self, athlete_id: Option<Id>) -> BoxFuture<Result<Vec<Challenge>, BackendError>>;

    /// Lists every challenge name along with the user holding it.
    fn challenge_holders(&mut self) -> BoxFuture<Result<Vec<(String, User)>, BackendError>>;

    /// Returns the athlete information for the user, creating an empty
    /// record first if there is none.
    fn ensure_athlete_info(&mut self, user_id: Id) -> BoxFuture<Result<AthleteInfo, BackendError>>;

    fn upsert_athlete_info(&mut self, info: &AthleteInfo) -> BoxFuture<Result<AthleteInfo, BackendError>>;

    fn subscription_exists(&mut self, athlete_id: Id, coach_id: Id) -> BoxFuture<Result<bool, BackendError>>;

    fn insert_subscription(&mut self, athlete_id: Id, coach_id: Id) -> BoxFuture<Result<(), BackendError>>;

    /// Returns the coach of the athlete’s earliest subscription.
    fn coach_of(&mut self, athlete_id: Id) -> BoxFuture<Result<Option<Id>, BackendError>>;

    fn athletes_of(&mut self, coach_id: Id) -> BoxFuture<Result<Vec<Id>, BackendError>>;

    /// Inserts or replaces the single rating given by the athlete.
    fn upsert_rating(
        &mut self,
        athlete_id: Id,
        coach_id: Id,
        rating: i16,
    ) -> BoxFuture<Result<RatingOutcome, BackendError>>;

    /// Aggregates the finished runs of every athlete subscribed to the coach.
    fn athlete_aggregates(&mut self, coach_id: Id) -> BoxFuture<Result<Vec<AthleteAggregate>, BackendError>>;
}

pub use self::postgres::*;

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::{
        self,
        postgres::{PgPool, PgRow},
        Postgres, Transaction,
    };

    use crate::athlete::AthleteInfo;
    use crate::challenge::{Badge, Challenge, RunTotals};
    use crate::coaching::{AthleteAggregate, RatingOutcome};
    use crate::errors::BackendError;
    use crate::item::{CollectibleItem, NewItem};
    use crate::position::{NewPosition, Position};
    use crate::run::{Run, RunFilter, RunStatus};
    use crate::user::{User, UserKind, UserSummary};
    use crate::Id;

    const SUBSCRIPTIONS_CONSTRAINT: &str = "subscriptions_athlete_coach";

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }
    }

    impl super::Db for PgDb {
        fn begin(&self) -> BoxFuture<Result<Box<dyn super::Tx>, BackendError>> {
            async move {
                let tx = self.pool.begin().await.map_err(map_sqlx_error)?;

                Ok(Box::new(PgTx { tx }) as Box<dyn super::Tx>)
            }
            .boxed()
        }
    }

    pub struct PgTx {
        tx: Transaction<'static, Postgres>,
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Tx for PgTx {
        fn commit(self: Box<Self>) -> BoxFuture<'static, Result<(), BackendError>> {
            async move { self.tx.commit().await.map_err(map_sqlx_error) }.boxed()
        }

        fn retrieve_user(&mut self, id: Id) -> BoxFuture<Result<Option<User>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/retrieve_user.sql"));

                let user = query
                    .bind(id)
                    .try_map(|row: PgRow| user_from_row(&row))
                    .fetch_optional(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(user)
            }
            .boxed()
        }

        fn retrieve_user_summary(
            &mut self,
            id: Id,
        ) -> BoxFuture<Result<Option<UserSummary>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/retrieve_user_summary.sql"));

                let summary = query
                    .bind(id)
                    .try_map(|row: PgRow| user_summary_from_row(&row))
                    .fetch_optional(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(summary)
            }
            .boxed()
        }

        fn list_user_summaries(
            &mut self,
            kind: Option<UserKind>,
        ) -> BoxFuture<Result<Vec<UserSummary>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_user_summaries.sql"));

                let summaries = query
                    .bind(kind.map(|kind| kind == UserKind::Coach))
                    .try_map(|row: PgRow| user_summary_from_row(&row))
                    .fetch_all(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(summaries)
            }
            .boxed()
        }

        fn insert_run(&mut self, athlete_id: Id, comment: &str) -> BoxFuture<Result<Run, BackendError>> {
            let comment = comment.to_owned();

            async move {
                let query = sqlx::query(include_str!("queries/insert_run.sql"));

                let run = query
                    .bind(athlete_id)
                    .bind(comment)
                    .try_map(|row: PgRow| run_from_row(&row))
                    .fetch_one(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(run)
            }
            .boxed()
        }

        fn retrieve_run(&mut self, id: Id) -> BoxFuture<Result<Option<Run>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/retrieve_run.sql"));

                let run = query
                    .bind(id)
                    .try_map(|row: PgRow| run_from_row(&row))
                    .fetch_optional(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(run)
            }
            .boxed()
        }

        fn lock_run(&mut self, id: Id) -> BoxFuture<Result<Option<Run>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/lock_run.sql"));

                let run = query
                    .bind(id)
                    .try_map(|row: PgRow| run_from_row(&row))
                    .fetch_optional(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(run)
            }
            .boxed()
        }

        fn list_runs(&mut self, filter: RunFilter) -> BoxFuture<Result<Vec<Run>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_runs.sql"));

                let runs = query
                    .bind(filter.athlete)
                    .bind(filter.status.map(RunStatus::as_str))
                    .try_map(|row: PgRow| run_from_row(&row))
                    .fetch_all(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(runs)
            }
            .boxed()
        }

        fn save_run(&mut self, run: &Run) -> BoxFuture<Result<(), BackendError>> {
            let run = run.clone();

            async move {
                let query = sqlx::query(include_str!("queries/update_run.sql"));

                query
                    .bind(run.id)
                    .bind(&run.comment)
                    .bind(run.status.as_str())
                    .bind(run.distance)
                    .bind(run.run_time_seconds)
                    .bind(run.speed)
                    .execute(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(())
            }
            .boxed()
        }

        fn finished_run_totals(&mut self, athlete_id: Id) -> BoxFuture<Result<RunTotals, BackendError>> {
            async move {
                let query = sqlx::query_as(include_str!("queries/finished_run_totals.sql"));

                let (finished_runs, distance): (i64, Option<f64>) = query
                    .bind(athlete_id)
                    .fetch_one(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(RunTotals {
                    finished_runs,
                    distance,
                })
            }
            .boxed()
        }

        fn list_positions(&mut self, run_id: Option<Id>) -> BoxFuture<Result<Vec<Position>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_positions.sql"));

                let positions = query
                    .bind(run_id)
                    .try_map(|row: PgRow| position_from_row(&row))
                    .fetch_all(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(positions)
            }
            .boxed()
        }

        fn latest_position(&mut self, run_id: Id) -> BoxFuture<Result<Option<Position>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/latest_position.sql"));

                let position = query
                    .bind(run_id)
                    .try_map(|row: PgRow| position_from_row(&row))
                    .fetch_optional(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(position)
            }
            .boxed()
        }

        fn insert_position(&mut self, position: &NewPosition) -> BoxFuture<Result<Position, BackendError>> {
            let position = position.clone();

            async move {
                let query = sqlx::query(include_str!("queries/insert_position.sql"));

                let inserted = query
                    .bind(position.run_id)
                    .bind(position.coordinates.latitude())
                    .bind(position.coordinates.longitude())
                    .bind(position.date_time)
                    .bind(position.metrics.distance)
                    .bind(position.metrics.speed)
                    .try_map(|row: PgRow| position_from_row(&row))
                    .fetch_one(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(inserted)
            }
            .boxed()
        }

        fn insert_item(&mut self, item: &NewItem) -> BoxFuture<Result<CollectibleItem, BackendError>> {
            let item = item.clone();

            async move {
                let query = sqlx::query(include_str!("queries/insert_item.sql"));

                let inserted = query
                    .bind(&item.name)
                    .bind(&item.uid)
                    .bind(item.coordinates.latitude())
                    .bind(item.coordinates.longitude())
                    .bind(item.picture.as_str())
                    .bind(item.value)
                    .try_map(|row: PgRow| item_from_row(&row))
                    .fetch_one(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(inserted)
            }
            .boxed()
        }

        fn list_items(&mut self) -> BoxFuture<Result<Vec<CollectibleItem>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_items.sql"));

                let items = query
                    .try_map(|row: PgRow| item_from_row(&row))
                    .fetch_all(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(items)
            }
            .boxed()
        }

        fn uncollected_items(
            &mut self,
            athlete_id: Id,
        ) -> BoxFuture<Result<Vec<CollectibleItem>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/uncollected_items.sql"));

                let items = query
                    .bind(athlete_id)
                    .try_map(|row: PgRow| item_from_row(&row))
                    .fetch_all(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(items)
            }
            .boxed()
        }

        fn collected_items(&mut self, athlete_id: Id) -> BoxFuture<Result<Vec<CollectibleItem>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/collected_items.sql"));

                let items = query
                    .bind(athlete_id)
                    .try_map(|row: PgRow| item_from_row(&row))
                    .fetch_all(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(items)
            }
            .boxed()
        }

        fn collect_item(&mut self, athlete_id: Id, item_id: Id) -> BoxFuture<Result<bool, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/collect_item.sql"));

                let count = query
                    .bind(athlete_id)
                    .bind(item_id)
                    .execute(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                Ok(count > 0)
            }
            .boxed()
        }

        fn has_challenge(&mut self, athlete_id: Id, badge: Badge) -> BoxFuture<Result<bool, BackendError>> {
            async move {
                let query = sqlx::query_as(include_str!("queries/has_challenge.sql"));

                let (exists,): (bool,) = query
                    .bind(athlete_id)
                    .bind(badge.full_name())
                    .fetch_one(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(exists)
            }
            .boxed()
        }

        fn insert_challenge(&mut self, athlete_id: Id, badge: Badge) -> BoxFuture<Result<bool, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/insert_challenge.sql"));

                let count = query
                    .bind(athlete_id)
                    .bind(badge.full_name())
                    .execute(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?
                    .rows_affected();

                Ok(count > 0)
            }
            .boxed()
        }

        fn list_challenges(&mut self, athlete_id: Option<Id>) -> BoxFuture<Result<Vec<Challenge>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/list_challenges.sql"));

                let challenges = query
                    .bind(athlete_id)
                    .try_map(|row: PgRow| {
                        Ok(Challenge {
                            id: try_get(&row, "id")?,
                            full_name: try_get(&row, "full_name")?,
                            athlete_id: try_get(&row, "athlete_id")?,
                        })
                    })
                    .fetch_all(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(challenges)
            }
            .boxed()
        }

        fn challenge_holders(&mut self) -> BoxFuture<Result<Vec<(String, User)>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/challenge_holders.sql"));

                let holders = query
                    .try_map(|row: PgRow| {
                        let full_name: String = try_get(&row, "full_name")?;

                        Ok((full_name, user_from_row(&row)?))
                    })
                    .fetch_all(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(holders)
            }
            .boxed()
        }

        fn ensure_athlete_info(&mut self, user_id: Id) -> BoxFuture<Result<AthleteInfo, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/ensure_athlete_info.sql"));

                let info = query
                    .bind(user_id)
                    .try_map(|row: PgRow| athlete_info_from_row(&row))
                    .fetch_one(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(info)
            }
            .boxed()
        }

        fn upsert_athlete_info(&mut self, info: &AthleteInfo) -> BoxFuture<Result<AthleteInfo, BackendError>> {
            let info = info.clone();

            async move {
                let query = sqlx::query(include_str!("queries/upsert_athlete_info.sql"));

                let saved = query
                    .bind(info.user_id)
                    .bind(&info.goals)
                    .bind(info.weight)
                    .try_map(|row: PgRow| athlete_info_from_row(&row))
                    .fetch_one(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(saved)
            }
            .boxed()
        }

        fn subscription_exists(&mut self, athlete_id: Id, coach_id: Id) -> BoxFuture<Result<bool, BackendError>> {
            async move {
                let query = sqlx::query_as(include_str!("queries/subscription_exists.sql"));

                let (exists,): (bool,) = query
                    .bind(athlete_id)
                    .bind(coach_id)
                    .fetch_one(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(exists)
            }
            .boxed()
        }

        fn insert_subscription(&mut self, athlete_id: Id, coach_id: Id) -> BoxFuture<Result<(), BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/insert_subscription.sql"));

                query
                    .bind(athlete_id)
                    .bind(coach_id)
                    .execute(&mut *self.tx)
                    .await
                    .map_err(|error| match error {
                        sqlx::Error::Database(ref e)
                            if e.constraint() == Some(SUBSCRIPTIONS_CONSTRAINT) =>
                        {
                            BackendError::AlreadySubscribed {
                                athlete: athlete_id,
                                coach: coach_id,
                            }
                        }
                        _ => map_sqlx_error(error),
                    })?;

                Ok(())
            }
            .boxed()
        }

        fn coach_of(&mut self, athlete_id: Id) -> BoxFuture<Result<Option<Id>, BackendError>> {
            async move {
                let query = sqlx::query_as(include_str!("queries/coach_of.sql"));

                let coach: Option<(Id,)> = query
                    .bind(athlete_id)
                    .fetch_optional(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(coach.map(|(id,)| id))
            }
            .boxed()
        }

        fn athletes_of(&mut self, coach_id: Id) -> BoxFuture<Result<Vec<Id>, BackendError>> {
            async move {
                let query = sqlx::query_as(include_str!("queries/athletes_of.sql"));

                let athletes: Vec<(Id,)> = query
                    .bind(coach_id)
                    .fetch_all(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(athletes.into_iter().map(|(id,)| id).collect())
            }
            .boxed()
        }

        fn upsert_rating(
            &mut self,
            athlete_id: Id,
            coach_id: Id,
            rating: i16,
        ) -> BoxFuture<Result<RatingOutcome, BackendError>> {
            async move {
                let query = sqlx::query_as(include_str!("queries/upsert_rating.sql"));

                let (created,): (bool,) = query
                    .bind(athlete_id)
                    .bind(coach_id)
                    .bind(rating)
                    .fetch_one(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(if created {
                    RatingOutcome::Created
                } else {
                    RatingOutcome::Updated
                })
            }
            .boxed()
        }

        fn athlete_aggregates(&mut self, coach_id: Id) -> BoxFuture<Result<Vec<AthleteAggregate>, BackendError>> {
            async move {
                let query = sqlx::query(include_str!("queries/athlete_aggregates.sql"));

                let aggregates = query
                    .bind(coach_id)
                    .try_map(|row: PgRow| {
                        Ok(AthleteAggregate {
                            athlete_id: try_get(&row, "athlete_id")?,
                            longest_run: try_get(&row, "longest_run")?,
                            total_distance: try_get(&row, "total_distance")?,
                            finished_runs: try_get(&row, "finished_runs")?,
                            speed_avg: try_get(&row, "speed_avg")?,
                        })
                    })
                    .fetch_all(&mut *self.tx)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(aggregates)
            }
            .boxed()
        }
    }

    fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
        Ok(User {
            id: try_get(row, "id")?,
            username: try_get(row, "username")?,
            first_name: try_get(row, "first_name")?,
            last_name: try_get(row, "last_name")?,
            is_staff: try_get(row, "is_staff")?,
            date_joined: try_get(row, "date_joined")?,
        })
    }

    fn user_summary_from_row(row: &PgRow) -> Result<UserSummary, sqlx::Error> {
        let user = user_from_row(row)?;
        let runs_finished: i64 = try_get(row, "runs_finished")?;
        let rating: Option<f64> = try_get(row, "rating")?;

        Ok(UserSummary::new(user, runs_finished, rating))
    }

    fn run_from_row(row: &PgRow) -> Result<Run, sqlx::Error> {
        let status: String = try_get(row, "status")?;
        // only the application writes this column, but the constraint
        // could drift from `RunStatus`
        let status: RunStatus = status
            .parse()
            .map_err(|e: BackendError| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Run {
            id: try_get(row, "id")?,
            athlete_id: try_get(row, "athlete_id")?,
            comment: try_get(row, "comment")?,
            status,
            created_at: try_get(row, "created_at")?,
            distance: try_get(row, "distance")?,
            run_time_seconds: try_get(row, "run_time_seconds")?,
            speed: try_get(row, "speed")?,
        })
    }

    fn position_from_row(row: &PgRow) -> Result<Position, sqlx::Error> {
        Ok(Position {
            id: try_get(row, "id")?,
            run_id: try_get(row, "run_id")?,
            latitude: try_get(row, "latitude")?,
            longitude: try_get(row, "longitude")?,
            date_time: try_get(row, "date_time")?,
            distance: try_get(row, "distance")?,
            speed: try_get(row, "speed")?,
        })
    }

    fn item_from_row(row: &PgRow) -> Result<CollectibleItem, sqlx::Error> {
        Ok(CollectibleItem {
            id: try_get(row, "id")?,
            name: try_get(row, "name")?,
            uid: try_get(row, "uid")?,
            latitude: try_get(row, "latitude")?,
            longitude: try_get(row, "longitude")?,
            picture: try_get(row, "picture")?,
            value: try_get(row, "value")?,
        })
    }

    fn athlete_info_from_row(row: &PgRow) -> Result<AthleteInfo, sqlx::Error> {
        Ok(AthleteInfo {
            user_id: try_get(row, "user_id")?,
            goals: try_get(row, "goals")?,
            weight: try_get(row, "weight")?,
        })
    }

    fn try_get<'a, T: sqlx::Type<sqlx::Postgres> + sqlx::decode::Decode<'a, sqlx::Postgres>>(
        row: &'a PgRow,
        column: &str,
    ) -> Result<T, sqlx::Error> {
        use sqlx::prelude::*;

        row.try_get(column)
    }

    fn map_sqlx_error(error: sqlx::Error) -> BackendError {
        BackendError::Sqlx { source: error }
    }
}
