use thiserror::Error;

use crate::clockify::{TrackerError, UpdatedEntry};
use crate::models::TagSet;

/// Ways a tag push can diverge from what was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error("Cannot update time entry: {0}")]
    UpdateFailed(TrackerError),
    #[error("Inaccurate number of tags after time entry update: expected {expected}, got {actual}")]
    InaccurateTagCount { expected: usize, actual: usize },
    #[error("Incorrect tags after time entry update, missing: {missing:?}")]
    TagsIncorrect { missing: Vec<String> },
}

pub fn validate(expected: &TagSet, remote_tag_ids: &[String]) -> Result<(), UpdateError> {
    if expected.len() != remote_tag_ids.len() {
        return Err(UpdateError::InaccurateTagCount {
            expected: expected.len(),
            actual: remote_tag_ids.len(),
        });
    }

    let missing: Vec<String> = expected
        .iter()
        .filter(|tag| !remote_tag_ids.contains(&tag.id))
        .map(|tag| tag.name.clone())
        .collect();

    if !missing.is_empty() {
        return Err(UpdateError::TagsIncorrect { missing });
    }

    Ok(())
}

/// Checks the tracker's answer to a tag push. The echo is only compared, never adopted:
/// the locally tagged entry stays authoritative.
pub fn confirm_update(
    expected: &TagSet,
    result: Result<UpdatedEntry, TrackerError>,
) -> Result<(), UpdateError> {
    let updated = result.map_err(UpdateError::UpdateFailed)?;
    validate(expected, &updated.tag_ids)
}
