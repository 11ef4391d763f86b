use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Db, Tx};
use crate::athlete::AthleteInfo;
use crate::challenge::{Badge, Challenge, RunTotals};
use crate::coaching::{AthleteAggregate, RatingOutcome};
use crate::errors::BackendError;
use crate::item::{CollectibleItem, NewItem};
use crate::position::{NewPosition, Position};
use crate::run::{Run, RunFilter, RunStatus};
use crate::user::{User, UserKind, UserSummary};
use crate::Id;

#[derive(Clone, Default)]
struct State {
    last_id: Id,
    users: Vec<StoredUser>,
    runs: Vec<Run>,
    positions: Vec<Position>,
    items: Vec<CollectibleItem>,
    collected: BTreeSet<(Id, Id)>,
    infos: BTreeMap<Id, AthleteInfo>,
    challenges: Vec<Challenge>,
    subscriptions: Vec<Subscription>,
    ratings: Vec<Rating>,
}

#[derive(Clone)]
struct StoredUser {
    user: User,
    is_superuser: bool,
}

#[derive(Clone)]
struct Subscription {
    id: Id,
    athlete_id: Id,
    coach_id: Id,
}

#[derive(Clone)]
struct Rating {
    athlete_id: Id,
    coach_id: Id,
    rating: i16,
}

impl State {
    fn next_id(&mut self) -> Id {
        self.last_id += 1;
        self.last_id
    }

    fn visible_user(&self, id: Id) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.user.id == id && !u.is_superuser)
            .map(|u| &u.user)
    }

    fn summarize(&self, user: &User) -> UserSummary {
        let runs_finished = self
            .runs
            .iter()
            .filter(|r| r.athlete_id == user.id && r.status == RunStatus::Finished)
            .count() as i64;

        let received: Vec<f64> = self
            .ratings
            .iter()
            .filter(|r| r.coach_id == user.id)
            .map(|r| f64::from(r.rating))
            .collect();

        UserSummary::new(user.clone(), runs_finished, mean(&received))
    }

    fn finished_runs(&self, athlete_id: Id) -> impl Iterator<Item = &Run> {
        self.runs
            .iter()
            .filter(move |r| r.athlete_id == athlete_id && r.status == RunStatus::Finished)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// An in-memory [`Db`]. Transactions run one at a time against a copy of
/// the state, which replaces the shared state on commit.
#[derive(Clone, Default)]
pub(crate) struct MockDb {
    state: Arc<Mutex<State>>,
}

impl MockDb {
    pub(crate) fn user(id: Id, username: &str, is_staff: bool) -> User {
        User {
            id,
            username: username.to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff,
            date_joined: OffsetDateTime::unix_epoch(),
        }
    }

    async fn add_user(&self, username: &str, is_staff: bool, is_superuser: bool) -> Id {
        self.add_user_with(username, "", "", is_staff, is_superuser).await
    }

    async fn add_user_with(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
        is_staff: bool,
        is_superuser: bool,
    ) -> Id {
        let mut state = self.state.lock().await;
        let id = state.next_id();

        let mut user = Self::user(id, username, is_staff);
        user.first_name = first_name.to_owned();
        user.last_name = last_name.to_owned();

        state.users.push(StoredUser { user, is_superuser });

        id
    }

    pub(crate) async fn add_athlete(&self, username: &str) -> Id {
        self.add_user(username, false, false).await
    }

    pub(crate) async fn add_named_athlete(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
    ) -> Id {
        self.add_user_with(username, first_name, last_name, false, false)
            .await
    }

    pub(crate) async fn add_coach(&self, username: &str) -> Id {
        self.add_user(username, true, false).await
    }

    pub(crate) async fn add_superuser(&self, username: &str) -> Id {
        self.add_user(username, true, true).await
    }

    pub(crate) async fn add_item(&self, name: &str, latitude: f64, longitude: f64) -> Id {
        let mut state = self.state.lock().await;
        let id = state.next_id();

        state.items.push(CollectibleItem {
            id,
            name: name.to_owned(),
            uid: format!("uid{}", id),
            latitude,
            longitude,
            picture: format!("https://example.com/{}.png", id),
            value: 1,
        });

        id
    }

    pub(crate) async fn add_finished_run(&self, athlete_id: Id, distance: f64, run_time_seconds: i32) -> Id {
        self.add_finished_run_with_speed(athlete_id, distance, run_time_seconds, 0.0)
            .await
    }

    pub(crate) async fn add_finished_run_with_speed(
        &self,
        athlete_id: Id,
        distance: f64,
        run_time_seconds: i32,
        speed: f64,
    ) -> Id {
        let mut state = self.state.lock().await;
        let id = state.next_id();

        state.runs.push(Run {
            id,
            athlete_id,
            comment: "finished".to_owned(),
            status: RunStatus::Finished,
            created_at: OffsetDateTime::now_utc(),
            distance: Some(distance),
            run_time_seconds,
            speed,
        });

        id
    }

    pub(crate) async fn challenge_names(&self, athlete_id: Id) -> Vec<String> {
        let state = self.state.lock().await;

        state
            .challenges
            .iter()
            .filter(|c| c.athlete_id == athlete_id)
            .map(|c| c.full_name.clone())
            .collect()
    }

    pub(crate) async fn ratings(&self) -> Vec<(Id, Id, i16)> {
        let state = self.state.lock().await;

        state
            .ratings
            .iter()
            .map(|r| (r.athlete_id, r.coach_id, r.rating))
            .collect()
    }
}

impl Db for MockDb {
    fn begin(&self) -> BoxFuture<Result<Box<dyn Tx>, BackendError>> {
        let state = self.state.clone();

        async move {
            let guard = state.lock_owned().await;
            let working = (*guard).clone();

            Ok(Box::new(MockTx { guard, working }) as Box<dyn Tx>)
        }
        .boxed()
    }
}

/// Holds the lock for its whole lifetime; dropping it without committing
/// discards every change.
struct MockTx {
    guard: OwnedMutexGuard<State>,
    working: State,
}

fn ready<'a, T: Send + 'a>(value: T) -> BoxFuture<'a, Result<T, BackendError>> {
    future::ready(Ok(value)).boxed()
}

impl Tx for MockTx {
    fn commit(self: Box<Self>) -> BoxFuture<'static, Result<(), BackendError>> {
        let MockTx { mut guard, working } = *self;
        *guard = working;

        ready(())
    }

    fn retrieve_user(&mut self, id: Id) -> BoxFuture<Result<Option<User>, BackendError>> {
        ready(self.working.visible_user(id).cloned())
    }

    fn retrieve_user_summary(
        &mut self,
        id: Id,
    ) -> BoxFuture<Result<Option<UserSummary>, BackendError>> {
        let state = &self.working;

        ready(state.visible_user(id).map(|user| state.summarize(user)))
    }

    fn list_user_summaries(
        &mut self,
        kind: Option<UserKind>,
    ) -> BoxFuture<Result<Vec<UserSummary>, BackendError>> {
        let state = &self.working;

        let summaries = state
            .users
            .iter()
            .filter(|u| !u.is_superuser)
            .filter(|u| kind.map_or(true, |kind| u.user.kind() == kind))
            .map(|u| state.summarize(&u.user))
            .collect();

        ready(summaries)
    }

    fn insert_run(&mut self, athlete_id: Id, comment: &str) -> BoxFuture<Result<Run, BackendError>> {
        let id = self.working.next_id();

        let run = Run {
            id,
            athlete_id,
            comment: comment.to_owned(),
            status: RunStatus::Init,
            created_at: OffsetDateTime::now_utc(),
            distance: None,
            run_time_seconds: 0,
            speed: 0.0,
        };

        self.working.runs.push(run.clone());

        ready(run)
    }

    fn retrieve_run(&mut self, id: Id) -> BoxFuture<Result<Option<Run>, BackendError>> {
        ready(self.working.runs.iter().find(|r| r.id == id).cloned())
    }

    fn lock_run(&mut self, id: Id) -> BoxFuture<Result<Option<Run>, BackendError>> {
        self.retrieve_run(id)
    }

    fn list_runs(&mut self, filter: RunFilter) -> BoxFuture<Result<Vec<Run>, BackendError>> {
        let runs = self
            .working
            .runs
            .iter()
            .filter(|r| filter.athlete.map_or(true, |a| r.athlete_id == a))
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();

        ready(runs)
    }

    fn save_run(&mut self, run: &Run) -> BoxFuture<Result<(), BackendError>> {
        if let Some(stored) = self.working.runs.iter_mut().find(|r| r.id == run.id) {
            *stored = run.clone();
        }

        ready(())
    }

    fn finished_run_totals(&mut self, athlete_id: Id) -> BoxFuture<Result<RunTotals, BackendError>> {
        let distances: Vec<f64> = self
            .working
            .finished_runs(athlete_id)
            .map(|r| r.distance.unwrap_or(0.0))
            .collect();

        let distance = if distances.is_empty() {
            None
        } else {
            Some(distances.iter().sum())
        };

        ready(RunTotals {
            finished_runs: distances.len() as i64,
            distance,
        })
    }

    fn list_positions(&mut self, run_id: Option<Id>) -> BoxFuture<Result<Vec<Position>, BackendError>> {
        let mut positions: Vec<Position> = self
            .working
            .positions
            .iter()
            .filter(|p| run_id.map_or(true, |id| p.run_id == id))
            .cloned()
            .collect();

        positions.sort_by_key(|p| (p.date_time, p.id));

        ready(positions)
    }

    fn latest_position(&mut self, run_id: Id) -> BoxFuture<Result<Option<Position>, BackendError>> {
        let latest = self
            .working
            .positions
            .iter()
            .filter(|p| p.run_id == run_id)
            .max_by_key(|p| (p.date_time, p.id))
            .cloned();

        ready(latest)
    }

    fn insert_position(&mut self, position: &NewPosition) -> BoxFuture<Result<Position, BackendError>> {
        let id = self.working.next_id();

        let stored = Position {
            id,
            run_id: position.run_id,
            latitude: position.coordinates.latitude(),
            longitude: position.coordinates.longitude(),
            date_time: position.date_time,
            distance: position.metrics.distance,
            speed: position.metrics.speed,
        };

        self.working.positions.push(stored.clone());

        ready(stored)
    }

    fn insert_item(&mut self, item: &NewItem) -> BoxFuture<Result<CollectibleItem, BackendError>> {
        let id = self.working.next_id();

        let stored = CollectibleItem {
            id,
            name: item.name.clone(),
            uid: item.uid.clone(),
            latitude: item.coordinates.latitude(),
            longitude: item.coordinates.longitude(),
            picture: item.picture.to_string(),
            value: item.value,
        };

        self.working.items.push(stored.clone());

        ready(stored)
    }

    fn list_items(&mut self) -> BoxFuture<Result<Vec<CollectibleItem>, BackendError>> {
        ready(self.working.items.clone())
    }

    fn uncollected_items(
        &mut self,
        athlete_id: Id,
    ) -> BoxFuture<Result<Vec<CollectibleItem>, BackendError>> {
        let state = &self.working;

        let items = state
            .items
            .iter()
            .filter(|i| !state.collected.contains(&(athlete_id, i.id)))
            .cloned()
            .collect();

        ready(items)
    }

    fn collected_items(&mut self, athlete_id: Id) -> BoxFuture<Result<Vec<CollectibleItem>, BackendError>> {
        let state = &self.working;

        let items = state
            .items
            .iter()
            .filter(|i| state.collected.contains(&(athlete_id, i.id)))
            .cloned()
            .collect();

        ready(items)
    }

    fn collect_item(&mut self, athlete_id: Id, item_id: Id) -> BoxFuture<Result<bool, BackendError>> {
        ready(self.working.collected.insert((athlete_id, item_id)))
    }

    fn has_challenge(&mut self, athlete_id: Id, badge: Badge) -> BoxFuture<Result<bool, BackendError>> {
        let exists = self
            .working
            .challenges
            .iter()
            .any(|c| c.athlete_id == athlete_id && c.full_name == badge.full_name());

        ready(exists)
    }

    fn insert_challenge(&mut self, athlete_id: Id, badge: Badge) -> BoxFuture<Result<bool, BackendError>> {
        let exists = self
            .working
            .challenges
            .iter()
            .any(|c| c.athlete_id == athlete_id && c.full_name == badge.full_name());

        if !exists {
            let id = self.working.next_id();

            self.working.challenges.push(Challenge {
                id,
                full_name: badge.full_name().to_owned(),
                athlete_id,
            });
        }

        ready(!exists)
    }

    fn list_challenges(&mut self, athlete_id: Option<Id>) -> BoxFuture<Result<Vec<Challenge>, BackendError>> {
        let challenges = self
            .working
            .challenges
            .iter()
            .filter(|c| athlete_id.map_or(true, |id| c.athlete_id == id))
            .cloned()
            .collect();

        ready(challenges)
    }

    fn challenge_holders(&mut self) -> BoxFuture<Result<Vec<(String, User)>, BackendError>> {
        let state = &self.working;

        let mut challenges: Vec<&Challenge> = state.challenges.iter().collect();
        challenges.sort_by(|a, b| (&a.full_name, a.id).cmp(&(&b.full_name, b.id)));

        let holders = challenges
            .into_iter()
            .filter_map(|c| {
                state
                    .users
                    .iter()
                    .find(|u| u.user.id == c.athlete_id)
                    .map(|u| (c.full_name.clone(), u.user.clone()))
            })
            .collect();

        ready(holders)
    }

    fn ensure_athlete_info(&mut self, user_id: Id) -> BoxFuture<Result<AthleteInfo, BackendError>> {
        let info = self
            .working
            .infos
            .entry(user_id)
            .or_insert_with(|| AthleteInfo::empty(user_id))
            .clone();

        ready(info)
    }

    fn upsert_athlete_info(&mut self, info: &AthleteInfo) -> BoxFuture<Result<AthleteInfo, BackendError>> {
        self.working.infos.insert(info.user_id, info.clone());

        ready(info.clone())
    }

    fn subscription_exists(&mut self, athlete_id: Id, coach_id: Id) -> BoxFuture<Result<bool, BackendError>> {
        let exists = self
            .working
            .subscriptions
            .iter()
            .any(|s| s.athlete_id == athlete_id && s.coach_id == coach_id);

        ready(exists)
    }

    fn insert_subscription(&mut self, athlete_id: Id, coach_id: Id) -> BoxFuture<Result<(), BackendError>> {
        let exists = self
            .working
            .subscriptions
            .iter()
            .any(|s| s.athlete_id == athlete_id && s.coach_id == coach_id);

        if exists {
            return future::ready(Err(BackendError::AlreadySubscribed {
                athlete: athlete_id,
                coach: coach_id,
            }))
            .boxed();
        }

        let id = self.working.next_id();

        self.working.subscriptions.push(Subscription {
            id,
            athlete_id,
            coach_id,
        });

        ready(())
    }

    fn coach_of(&mut self, athlete_id: Id) -> BoxFuture<Result<Option<Id>, BackendError>> {
        let coach = self
            .working
            .subscriptions
            .iter()
            .filter(|s| s.athlete_id == athlete_id)
            .min_by_key(|s| s.id)
            .map(|s| s.coach_id);

        ready(coach)
    }

    fn athletes_of(&mut self, coach_id: Id) -> BoxFuture<Result<Vec<Id>, BackendError>> {
        let mut athletes: Vec<Id> = self
            .working
            .subscriptions
            .iter()
            .filter(|s| s.coach_id == coach_id)
            .map(|s| s.athlete_id)
            .collect();

        athletes.sort_unstable();

        ready(athletes)
    }

    fn upsert_rating(
        &mut self,
        athlete_id: Id,
        coach_id: Id,
        rating: i16,
    ) -> BoxFuture<Result<RatingOutcome, BackendError>> {
        let ratings = &mut self.working.ratings;

        let outcome = match ratings.iter_mut().find(|r| r.athlete_id == athlete_id) {
            Some(existing) => {
                existing.coach_id = coach_id;
                existing.rating = rating;

                RatingOutcome::Updated
            }
            None => {
                ratings.push(Rating {
                    athlete_id,
                    coach_id,
                    rating,
                });

                RatingOutcome::Created
            }
        };

        ready(outcome)
    }

    fn athlete_aggregates(&mut self, coach_id: Id) -> BoxFuture<Result<Vec<AthleteAggregate>, BackendError>> {
        let state = &self.working;

        let mut athletes: Vec<Id> = state
            .subscriptions
            .iter()
            .filter(|s| s.coach_id == coach_id)
            .map(|s| s.athlete_id)
            .collect();
        athletes.sort_unstable();

        let aggregates = athletes
            .into_iter()
            .map(|athlete_id| {
                let runs: Vec<&Run> = state.finished_runs(athlete_id).collect();
                let distances: Vec<f64> = runs.iter().filter_map(|r| r.distance).collect();
                let speeds: Vec<f64> = runs.iter().map(|r| r.speed).collect();

                AthleteAggregate {
                    athlete_id,
                    longest_run: distances.iter().copied().fold(None, |max, d| match max {
                        Some(m) if m >= d => Some(m),
                        _ => Some(d),
                    }),
                    total_distance: if distances.is_empty() {
                        None
                    } else {
                        Some(distances.iter().sum())
                    },
                    finished_runs: runs.len() as i64,
                    speed_avg: mean(&speeds),
                }
            })
            .collect();

        ready(aggregates)
    }
}
