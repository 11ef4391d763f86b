use std::sync::Arc;

use log::Logger;

use crate::config::CompanyDetails;
use crate::db::Db;
use crate::urls::Urls;

/// Everything a route handler needs.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub db: Arc<dyn Db>,
    pub urls: Arc<Urls>,
    pub config: Arc<Config>,
}

impl Environment {
    pub fn new(logger: Arc<Logger>, db: Arc<dyn Db>, urls: Arc<Urls>, config: Config) -> Self {
        Self {
            logger,
            db,
            urls,
            config: Arc::new(config),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) company: CompanyDetails,
}

impl Config {
    pub fn new(company: CompanyDetails) -> Self {
        Self { company }
    }
}
