// SPDX-License-Identifier: MIT

//! Job manager errors and their wire mapping.

use ov_core::{JobEvent, JobId, JobStatus};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job is {status}, event {event} conflicts")]
    StatusConflict { status: JobStatus, event: JobEvent },
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<&JobError> for ov_wire::Status {
    fn from(err: &JobError) -> Self {
        match err {
            JobError::NotFound(_) => ov_wire::Status::JobNotFound,
            JobError::StatusConflict { .. } => ov_wire::Status::StatusConflict,
            JobError::Internal(_) => ov_wire::Status::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_mapping() {
        assert_eq!(
            ov_wire::Status::from(&JobError::NotFound(JobId::from("j1"))),
            ov_wire::Status::JobNotFound
        );
        assert_eq!(
            ov_wire::Status::from(&JobError::StatusConflict {
                status: JobStatus::Destroying,
                event: JobEvent::Update,
            }),
            ov_wire::Status::StatusConflict
        );
        assert_eq!(
            ov_wire::Status::from(&JobError::Internal("boom".to_string())),
            ov_wire::Status::Error
        );
    }

    #[test]
    fn conflict_message_names_both_sides() {
        let err = JobError::StatusConflict {
            status: JobStatus::Destroying,
            event: JobEvent::Update,
        };
        assert_eq!(err.to_string(), "job is destroying, event update conflicts");
    }
}
