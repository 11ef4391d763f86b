use serde::{Deserialize, Serialize};

use crate::db::Db;
use crate::errors::BackendError;
use crate::user;
use crate::Id;

pub const MAX_GOALS_LENGTH: usize = 255;

/// Weights must lie strictly between zero and this.
pub const WEIGHT_LIMIT: i64 = 900;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AthleteInfo {
    pub(crate) user_id: Id,
    pub(crate) goals: Option<String>,
    pub(crate) weight: Option<i16>,
}

impl AthleteInfo {
    pub fn empty(user_id: Id) -> Self {
        AthleteInfo {
            user_id,
            goals: None,
            weight: None,
        }
    }

    pub fn goals(&self) -> Option<&str> {
        self.goals.as_deref()
    }

    pub fn weight(&self) -> Option<i16> {
        self.weight
    }
}

/// Replaces both fields; leaving one out clears it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AthleteInfoUpdate {
    pub goals: Option<String>,
    pub weight: Option<i64>,
}

impl AthleteInfoUpdate {
    pub fn validate(self, user_id: Id) -> Result<AthleteInfo, BackendError> {
        if let Some(goals) = &self.goals {
            if goals.chars().count() > MAX_GOALS_LENGTH {
                return Err(BackendError::InvalidLength {
                    field: "goals",
                    min: 0,
                    max: MAX_GOALS_LENGTH,
                });
            }
        }

        let weight = match self.weight {
            Some(weight) if weight <= 0 || weight >= WEIGHT_LIMIT => {
                return Err(BackendError::InvalidWeight(weight))
            }
            Some(weight) => Some(weight as i16),
            None => None,
        };

        Ok(AthleteInfo {
            user_id,
            goals: self.goals,
            weight,
        })
    }
}

/// Returns the user’s athlete information, creating an empty record on
/// first access.
pub async fn retrieve(db: &dyn Db, user_id: Id) -> Result<AthleteInfo, BackendError> {
    let mut tx = db.begin().await?;

    user::require_user(&mut *tx, user_id).await?;
    let info = tx.ensure_athlete_info(user_id).await?;
    tx.commit().await?;

    Ok(info)
}

pub async fn update(
    db: &dyn Db,
    user_id: Id,
    update: AthleteInfoUpdate,
) -> Result<AthleteInfo, BackendError> {
    let info = update.validate(user_id)?;

    let mut tx = db.begin().await?;

    user::require_user(&mut *tx, user_id).await?;
    let info = tx.upsert_athlete_info(&info).await?;
    tx.commit().await?;

    Ok(info)
}
