//! # phi-scan - repository history scanning for sensitive content
//!
//! Scans the full history of a version-controlled repository for sensitive
//! textual content (PHI/PII): every commit is walked, every tracked file is
//! chunked into bounded text requests, requests are dispatched to an external
//! detection service, and the detected findings are persisted. Scans are
//! resumable across process restarts, and no file or commit is reported
//! complete while any constituent request is still outstanding.
//!
//! ## Architecture
//!
//! - **Lifecycle tracking**: [`tracker`] - concurrency-safe maps of
//!   commit / file / request state with parent/child completion semantics
//! - **Checkpointing**: [`checkpoint`] - periodic snapshots of the three
//!   trackers, restored on restart to resume a scan
//! - **Detection units**: [`request`] - deterministic request fingerprints,
//!   file-to-chunk decomposition, response-to-record projection
//! - **Ignore policy**: [`ignore`] - ordered rules deciding which files are
//!   scanned, with typed reasons
//! - **Pipeline**: [`scanner`] - the workers of one scan (walker, request and
//!   response processors, reconciler, tickers) wired over bounded channels
//! - **Seams**: [`repo`], [`detector`], [`sink`] - the repository handle,
//!   detection backend, and results sink the pipeline collaborates with
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_channel as channel;
//! use phi_scan::{
//! 	CancelToken, Detector, DryRunDetector, MemoryRepository, MemoryResultSink, ScanConfig,
//! 	ScanInput, Scanner,
//! };
//!
//! smol::block_on(async {
//! 	let sink = Arc::new(MemoryResultSink::new());
//! 	let scanner = Arc::new(Scanner::new(ScanConfig::default(), sink.clone()).unwrap());
//!
//! 	let (errors_tx, errors_rx) = channel::bounded(64);
//! 	let (requests_tx, requests_rx) = channel::bounded(64);
//! 	let (responses_tx, responses_rx) = channel::bounded(64);
//! 	let cancel = CancelToken::new();
//!
//! 	// the detector consumes requests until the scan closes the channel
//! 	let detector = DryRunDetector::new();
//! 	let detector_cancel = cancel.clone();
//! 	smol::spawn(async move {
//! 		detector.run(detector_cancel, requests_rx, responses_tx).await;
//! 	})
//! 	.detach();
//!
//! 	scanner
//! 		.scan(ScanInput {
//! 			repo_url: "git@github.com:acme/records.git".to_string(),
//! 			repository: Arc::new(MemoryRepository::new()),
//! 			errors_out: errors_tx,
//! 			requests_out: requests_tx,
//! 			responses_in: responses_rx,
//! 			cancel,
//! 		})
//! 		.await;
//!
//! 	while let Ok(e) = errors_rx.try_recv() {
//! 		eprintln!("scan error: {e}");
//! 	}
//! });
//! ```
//!
//! The production repository handle (clone and authentication) and the live
//! detection backend are external collaborators; they plug into the
//! [`repo::RepositoryHandle`] and [`detector::Detector`] seams.

/// Checkpoint persistence for resumable scans.
pub mod checkpoint;

/// Configuration recognized by the scanning core.
pub mod config;

/// Detection service seam and the dry-run implementation.
pub mod detector;

/// Error taxonomy for trackers, checkpoints, requests, and the pipeline.
pub mod error;

/// Clone-URL parsing helpers (org and repository names).
pub mod giturl;

/// File ignore policy with typed reasons.
pub mod ignore;

/// Repository handle seam and the in-memory implementation.
pub mod repo;

/// Request/response model: fingerprints, chunking, result records.
pub mod request;

/// Pipeline coordinator for one repository scan.
pub mod scanner;

/// Results sink seam and the in-memory implementation.
pub mod sink;

/// Concurrency-safe lifecycle tracking with parent/child completion.
pub mod tracker;

mod walker;

pub use checkpoint::{Checkpoint, CheckpointStore};
pub use config::ScanConfig;
pub use detector::{Detector, DryRunDetector};
pub use error::{
	CheckpointError, RequestError, ScanError, ScanResult, TrackerError, TrackerResult,
};
pub use repo::{CommitIter, CommitObject, FileObject, MemoryRepository, RepositoryHandle};
pub use request::{
	records_from_response, DetectionResult, Envelope, Request, RequestInput, Response,
	ResultRecord,
};
pub use scanner::{CancelToken, ScanInput, Scanner};
pub use sink::{MemoryResultSink, ResultSink};
pub use tracker::{
	KeyData, KeyDataCounts, KeyDataMap, KeyTracker, KEY_CODE_COMPLETE, KEY_CODE_ERROR,
	KEY_CODE_IGNORE, KEY_CODE_INIT, KEY_CODE_PENDING, KIND_COMMIT, KIND_FILE,
	KIND_REQUEST_RESPONSE,
};
