//! Error types for the repository scanning engine

use thiserror::Error;

/// Errors raised by [`crate::tracker::KeyTracker`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
	/// Tracker construction with an unrecognized kind tag
	#[error("invalid tracker kind: {0}")]
	InvalidKind(String),

	/// A state code outside the recognized {-2..2} range
	#[error("invalid tracker key code: {0}")]
	InvalidCode(i32),

	/// Update called with an empty key
	#[error("cannot update tracker data for an empty key")]
	KeyEmpty,
}

/// Errors raised by the checkpoint store.
#[derive(Debug, Error)]
pub enum CheckpointError {
	/// Checkpoint path could not be derived from the inputs
	#[error("failed to lookup checkpoint path: {0}")]
	PathLookup(String),

	/// Filesystem error while reading or writing the checkpoint file
	#[error("checkpoint I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Checkpoint file content is not valid base64
	#[error("failed to decode checkpoint data: {0}")]
	Decode(#[from] base64::DecodeError),

	/// Checkpoint JSON does not match the expected wire shape
	#[error("failed to unmarshal checkpoint data: {0}")]
	Json(#[from] serde_json::Error),

	/// Delete requested for a checkpoint that could not be removed
	#[error("failed to delete checkpoint file: {0}")]
	Delete(String),
}

/// Errors raised while constructing requests or chunking file content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
	#[error("cannot create a request with an empty repository ID")]
	EmptyRepositoryId,

	#[error("cannot create a request with an empty commit ID")]
	EmptyCommitId,

	#[error("cannot create a request with an empty object ID")]
	EmptyObjectId,

	#[error("cannot create a request with empty text")]
	EmptyText,

	/// A non-empty file produced zero chunks
	#[error("no requests generated for file ID={0}")]
	NoChunks(String),

	/// File content is not valid UTF-8 text
	#[error("file content is not valid text: {0}")]
	NotText(String),
}

/// Top-level error type flowing through the scan pipeline's error channel.
#[derive(Debug, Error)]
pub enum ScanError {
	#[error("cannot process a request without a valid ID")]
	ProcessRequestNoId,

	#[error("cannot process a response without a valid ID")]
	ProcessResponseNoId,

	#[error("failed to iterate commits in repository: {0}")]
	Repository(String),

	#[error("failed to update tracker for commit {id}: {source}")]
	TrackerUpdateCommit { id: String, source: TrackerError },

	#[error("failed to update tracker for file {id}: {source}")]
	TrackerUpdateFile { id: String, source: TrackerError },

	#[error(transparent)]
	Tracker(#[from] TrackerError),

	#[error(transparent)]
	Request(#[from] RequestError),

	/// Checkpoint write failures retry on the next tick
	#[error("failed to update scan progress checkpoint: {0}")]
	Checkpoint(#[from] CheckpointError),

	/// Sink write failures do not abort the scan
	#[error("failed to write result records: {0}")]
	ResultWrite(String),
}

impl ScanError {
	/// Whether the error forwarder should unwind the pipeline for this error.
	/// Checkpoint and sink write errors are surfaced but the scan continues.
	pub fn is_fatal(&self) -> bool {
		!matches!(self, ScanError::Checkpoint(_) | ScanError::ResultWrite(_))
	}
}

pub type TrackerResult<T> = Result<T, TrackerError>;
pub type CheckpointResult<T> = Result<T, CheckpointError>;
pub type RequestResult<T> = Result<T, RequestError>;
pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test_log::test]
	fn test_error_display() {
		let err = TrackerError::InvalidKind("widget".to_string());
		assert_eq!(err.to_string(), "invalid tracker kind: widget");

		let err = TrackerError::InvalidCode(3);
		assert_eq!(err.to_string(), "invalid tracker key code: 3");

		let err = ScanError::TrackerUpdateCommit {
			id: "abc123".to_string(),
			source: TrackerError::KeyEmpty,
		};
		assert_eq!(
			err.to_string(),
			"failed to update tracker for commit abc123: cannot update tracker data for an empty key"
		);
	}

	#[test_log::test]
	fn test_fatal_classification() {
		assert!(ScanError::ProcessRequestNoId.is_fatal());
		assert!(ScanError::ProcessResponseNoId.is_fatal());
		assert!(ScanError::Repository("nil handle".into()).is_fatal());
		assert!(!ScanError::ResultWrite("disk full".into()).is_fatal());
		assert!(
			!ScanError::Checkpoint(CheckpointError::PathLookup("work_dir is empty".into()))
				.is_fatal()
		);
	}

	#[test_log::test]
	fn test_error_conversion() {
		let tracker_err = TrackerError::InvalidCode(9);
		let scan_err: ScanError = tracker_err.into();
		assert!(matches!(scan_err, ScanError::Tracker(_)));

		let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
		let cp_err: CheckpointError = io_err.into();
		assert!(matches!(cp_err, CheckpointError::Io(_)));
	}
}
