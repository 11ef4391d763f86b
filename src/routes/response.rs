use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
    },
    Message {
        message: String,
    },
    Upload {
        failed: Vec<Vec<String>>,
    },
}
