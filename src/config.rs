use std::env;

use serde::Serialize;

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// What the service tells clients about the company running it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompanyDetails {
    pub company_name: String,
    pub slogan: String,
    pub contacts: String,
}

impl CompanyDetails {
    pub fn from_env() -> Self {
        CompanyDetails {
            company_name: get_variable("STRIDE_COMPANY_NAME"),
            slogan: get_variable("STRIDE_SLOGAN"),
            contacts: get_variable("STRIDE_CONTACTS"),
        }
    }
}
