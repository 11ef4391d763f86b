use url::Url;

use crate::errors::BackendError;
use crate::Id;

/// Convenience wrapper for URL generation functions.
#[derive(Clone, Debug)]
pub struct Urls {
    /// Top-level URL, including trailing slash.
    base: Url,

    /// Path under which every API route lives.
    pub(crate) api_path: String,

    /// Prefix for all API routes.
    api_prefix: String,
}

impl Urls {
    /// Create a new instance. `api_path` should *not* include a trailing slash.
    pub fn new(base: impl AsRef<str>, api_path: impl Into<String>) -> Result<Self, BackendError> {
        let base = parse(base.as_ref())?;
        let api_path = api_path.into();
        let api_prefix = format!("{}/", api_path);

        Ok(Urls {
            base,
            api_path,
            api_prefix,
        })
    }

    pub fn api(&self) -> Result<Url, BackendError> {
        join(&self.base, &self.api_prefix)
    }

    pub fn runs(&self) -> Result<Url, BackendError> {
        join(&self.api()?, "runs/")
    }

    pub fn run(&self, id: Id) -> Result<Url, BackendError> {
        join(&self.runs()?, &id.to_string())
    }
}

fn parse(url: &str) -> Result<Url, BackendError> {
    Url::parse(url).map_err(|source| BackendError::UnableToParseUrl {
        url: url.to_owned(),
        source,
    })
}

fn join(base: &Url, path: &str) -> Result<Url, BackendError> {
    base.join(path)
        .map_err(|source| BackendError::UnableToParseUrl {
            url: format!("{}{}", base, path),
            source,
        })
}
