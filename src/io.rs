use bytes::Buf;
use futures::stream::TryStreamExt;
use warp::multipart::{FormData, Part};

use crate::errors::BackendError;

/// The name of the form field carrying an uploaded file.
pub const FILE_PART: &str = "file";

/// Extracts the contents of the file part of a form submission. Other
/// parts are read and discarded.
pub async fn parse_upload(mut form: FormData) -> Result<Vec<u8>, BackendError> {
    // Parts share the body stream, so each one has to be consumed before
    // the next is requested.
    while let Some(part) = form
        .try_next()
        .await
        .map_err(|_| BackendError::MalformedFormSubmission)?
    {
        let is_file = part.name() == FILE_PART;
        let data = read_part(part).await?;

        if is_file {
            return Ok(data);
        }
    }

    Err(BackendError::PartsMissing)
}

async fn read_part(part: Part) -> Result<Vec<u8>, BackendError> {
    part.stream()
        .map_err(|_| BackendError::MalformedFormSubmission)
        .try_fold(Vec::new(), |mut data, mut chunk| async move {
            while chunk.has_remaining() {
                let read = {
                    let bytes = chunk.chunk();
                    data.extend_from_slice(bytes);
                    bytes.len()
                };

                chunk.advance(read);
            }

            Ok(data)
        })
        .await
}
