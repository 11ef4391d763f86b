//! Parameters read from query strings and request bodies.

use serde::Deserialize;

use crate::user::UserKind;
use crate::Id;

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct PositionQuery {
    pub run: Option<Id>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "type")]
    pub kind: Option<UserKind>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct ChallengeQuery {
    pub athlete: Option<Id>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub athlete: Id,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct RatingRequest {
    pub athlete: Id,
    pub rating: i64,
}
