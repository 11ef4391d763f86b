use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;
use crate::run::{RunFilter, RunStatus};
use crate::user::UserKind;
use crate::Id;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

/// Describes the request that failed. Every variant has named fields so
/// that it can be flattened into the error body.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    Runs {
        athlete: Option<Id>,
        status: Option<RunStatus>,
    },
    Run {
        run: Id,
        action: &'static str,
    },
    Positions {
        run: Option<Id>,
    },
    Users {
        #[serde(rename = "type")]
        kind: Option<UserKind>,
    },
    User {
        user: Id,
        action: &'static str,
    },
    Challenges {
        athlete: Option<Id>,
    },
    Items {
        action: &'static str,
    },
    Coach {
        coach: Id,
        athlete: Option<Id>,
        action: &'static str,
    },
}

impl Context {
    pub fn runs(filter: RunFilter) -> Context {
        Context::Runs {
            athlete: filter.athlete,
            status: filter.status,
        }
    }

    pub fn create_run(athlete: Id) -> Context {
        Context::Runs {
            athlete: Some(athlete),
            status: None,
        }
    }

    pub fn run(run: Id, action: &'static str) -> Context {
        Context::Run { run, action }
    }

    pub fn positions(run: Option<Id>) -> Context {
        Context::Positions { run }
    }

    pub fn users(kind: Option<UserKind>) -> Context {
        Context::Users { kind }
    }

    pub fn user(user: Id, action: &'static str) -> Context {
        Context::User { user, action }
    }

    pub fn challenges(athlete: Option<Id>) -> Context {
        Context::Challenges { athlete }
    }

    pub fn items(action: &'static str) -> Context {
        Context::Items { action }
    }

    pub fn coach(coach: Id, athlete: Option<Id>, action: &'static str) -> Context {
        Context::Coach {
            coach,
            athlete,
            action,
        }
    }
}
