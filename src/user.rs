use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db::{Db, Tx};
use crate::errors::BackendError;
use crate::item::CollectibleItem;
use crate::Id;

/// A registered user. Coaches are the staff users; everyone else is an
/// athlete.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
    pub(crate) id: Id,
    pub(crate) username: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    #[serde(skip)]
    pub(crate) is_staff: bool,
    #[serde(with = "time::serde::timestamp")]
    pub(crate) date_joined: OffsetDateTime,
}

impl User {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn kind(&self) -> UserKind {
        if self.is_staff {
            UserKind::Coach
        } else {
            UserKind::Athlete
        }
    }

    /// Returns "first last", or an empty string unless both parts are set.
    pub fn full_name(&self) -> String {
        if self.first_name.is_empty() || self.last_name.is_empty() {
            String::new()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserKind {
    Athlete,
    Coach,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserSummary {
    #[serde(flatten)]
    user: User,
    #[serde(rename = "type")]
    kind: UserKind,
    runs_finished: i64,
    rating: Option<f64>,
}

impl UserSummary {
    pub fn new(user: User, runs_finished: i64, rating: Option<f64>) -> Self {
        let kind = user.kind();

        UserSummary {
            user,
            kind,
            runs_finished,
            rating,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn runs_finished(&self) -> i64 {
        self.runs_finished
    }

    pub fn rating(&self) -> Option<f64> {
        self.rating
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    summary: UserSummary,
    items: Vec<CollectibleItem>,
    #[serde(flatten)]
    relation: Relation,
}

impl UserDetail {
    pub fn summary(&self) -> &UserSummary {
        &self.summary
    }

    pub fn items(&self) -> &[CollectibleItem] {
        &self.items
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }
}

/// Who a user trains with.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Relation {
    Athlete { coach: Option<Id> },
    Coach { athletes: Vec<Id> },
}

pub async fn list(db: &dyn Db, kind: Option<UserKind>) -> Result<Vec<UserSummary>, BackendError> {
    let mut tx = db.begin().await?;
    let summaries = tx.list_user_summaries(kind).await?;
    tx.commit().await?;

    Ok(summaries)
}

pub async fn detail(db: &dyn Db, id: Id) -> Result<UserDetail, BackendError> {
    let mut tx = db.begin().await?;

    let summary = tx
        .retrieve_user_summary(id)
        .await?
        .ok_or(BackendError::NonExistentUser(id))?;
    let items = tx.collected_items(id).await?;

    let relation = match summary.kind {
        UserKind::Athlete => Relation::Athlete {
            coach: tx.coach_of(id).await?,
        },
        UserKind::Coach => Relation::Coach {
            athletes: tx.athletes_of(id).await?,
        },
    };

    tx.commit().await?;

    Ok(UserDetail {
        summary,
        items,
        relation,
    })
}

/// Retrieves the user, failing unless it exists and is an athlete.
pub(crate) async fn require_athlete(tx: &mut dyn Tx, id: Id) -> Result<User, BackendError> {
    let user = require_user(tx, id).await?;

    match user.kind() {
        UserKind::Athlete => Ok(user),
        UserKind::Coach => Err(BackendError::NotAnAthlete(id)),
    }
}

/// Retrieves the user, failing unless it exists and is a coach.
pub(crate) async fn require_coach(tx: &mut dyn Tx, id: Id) -> Result<User, BackendError> {
    let user = require_user(tx, id).await?;

    match user.kind() {
        UserKind::Coach => Ok(user),
        UserKind::Athlete => Err(BackendError::NotACoach(id)),
    }
}

pub(crate) async fn require_user(tx: &mut dyn Tx, id: Id) -> Result<User, BackendError> {
    tx.retrieve_user(id)
        .await?
        .ok_or(BackendError::NonExistentUser(id))
}
