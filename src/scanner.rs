//! Pipeline coordinator for one repository scan.
//!
//! [`Scanner::scan`] wires the repository walker, the request and response
//! processors, the error forwarder, the reconciler/progress tracker, and the
//! checkpoint ticker together over bounded channels, then blocks until the
//! quit signal unwinds the pipeline. Workers never call each other; they
//! share only the trackers and the channels.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_channel as channel;
use futures_lite::future;
use smol::Timer;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};
use crate::repo::RepositoryHandle;
use crate::request::{records_from_response, Request, Response};
use crate::sink::ResultSink;
use crate::tracker::{
	KeyTracker, KEY_CODE_COMPLETE, KEY_CODE_PENDING, KIND_COMMIT, KIND_FILE,
	KIND_REQUEST_RESPONSE,
};
use crate::walker::Walker;

/// Cancellation handle threaded through every worker. Cancelling stops the
/// walker from enqueuing; processors drain but stop on their next receive;
/// the checkpoint ticker writes one final snapshot and exits.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}
}

/// Input parameters for [`Scanner::scan`].
pub struct ScanInput {
	/// Clone URL of the repository; doubles as the stable repository ID baked
	/// into request fingerprints and as the checkpoint key
	pub repo_url: String,
	/// Open repository handle, owned by the caller's clone layer
	pub repository: Arc<dyn RepositoryHandle>,
	/// Fatal and surfaced errors are forwarded here
	pub errors_out: channel::Sender<ScanError>,
	/// Requests ready for the detection backend
	pub requests_out: channel::Sender<Request>,
	/// Responses arriving from the detection backend
	pub responses_in: channel::Receiver<Response>,
	pub cancel: CancelToken,
}

/// Scans the full history of one repository for sensitive content, tracking
/// commit / file / request lifecycles and checkpointing progress so a scan
/// can resume across process restarts.
pub struct Scanner {
	pub id: String,
	pub tracker_commits: Arc<KeyTracker>,
	pub tracker_files: Arc<KeyTracker>,
	pub tracker_requests: Arc<KeyTracker>,
	pub(crate) config: Arc<ScanConfig>,
	pub(crate) is_scan_complete: Arc<AtomicBool>,
	scan_succeeded: Arc<AtomicBool>,
	sink: Arc<dyn ResultSink>,
}

impl Scanner {
	pub fn new(config: ScanConfig, sink: Arc<dyn ResultSink>) -> ScanResult<Scanner> {
		Ok(Scanner {
			id: Uuid::new_v4().to_string(),
			tracker_commits: Arc::new(KeyTracker::new(KIND_COMMIT)?),
			tracker_files: Arc::new(KeyTracker::new(KIND_FILE)?),
			tracker_requests: Arc::new(KeyTracker::new(KIND_REQUEST_RESPONSE)?),
			config: Arc::new(config),
			is_scan_complete: Arc::new(AtomicBool::new(false)),
			scan_succeeded: Arc::new(AtomicBool::new(false)),
			sink,
		})
	}

	pub fn config(&self) -> &ScanConfig {
		&self.config
	}

	/// Run the scan to completion (or cancellation / fatal error). Returns
	/// when the quit signal closes.
	pub async fn scan(self: Arc<Self>, input: ScanInput) {
		debug!(scanner = %self.id, repo = %input.repo_url, "started scanner run");

		let store = CheckpointStore::new(self.config.work_dir.clone());
		self.restore_from_checkpoint(&store, &input.repo_url);

		// the first snapshot lands before any worker starts, so even an early
		// crash leaves a resumable state
		if let Err(e) = self.set_checkpoint(&store, &input.repo_url) {
			warn!(error = %e, "failed to write initial scan checkpoint");
		}

		let capacity = self.config.channel_capacity;
		let (errors_in_tx, errors_in_rx) = channel::bounded::<ScanError>(capacity);
		let (requests_in_tx, requests_in_rx) = channel::bounded::<Request>(capacity);
		let (scan_done_tx, scan_done_rx) = channel::bounded::<()>(1);
		let (quit_tx, quit_rx) = channel::bounded::<()>(1);

		let progress = smol::spawn(Arc::clone(&self).track_scan_progress(
			input.repo_url.clone(),
			store.clone(),
			scan_done_rx,
			quit_tx.clone(),
			input.cancel.clone(),
		));
		let forwarder = smol::spawn(process_errors(
			quit_rx.clone(),
			errors_in_rx,
			input.errors_out,
			quit_tx.clone(),
		));
		let requests = smol::spawn(Arc::clone(&self).process_requests(
			quit_rx.clone(),
			requests_in_rx,
			input.requests_out,
			errors_in_tx.clone(),
		));
		let responses = smol::spawn(Arc::clone(&self).process_responses(
			quit_rx.clone(),
			input.responses_in,
			errors_in_tx.clone(),
		));
		let checkpoints = smol::spawn(Arc::clone(&self).checkpoint_scan(
			input.repo_url.clone(),
			store,
			quit_rx.clone(),
			errors_in_tx.clone(),
			input.cancel.clone(),
		));
		let walker = smol::spawn(
			Walker {
				scanner: Arc::clone(&self),
				repo_url: input.repo_url.clone(),
				repository: input.repository,
				requests_out: requests_in_tx,
				errors_out: errors_in_tx,
				scan_done: scan_done_tx,
				cancel: input.cancel,
			}
			.run(),
		);

		// wait for the progress tracker or the error forwarder to close quit
		let _ = quit_rx.recv().await;

		for task in [progress, forwarder, requests, responses, checkpoints, walker] {
			task.cancel().await;
		}

		// a checkpoint tick can race the completion delete; with the workers
		// gone, sweep any leftover file from a successful scan
		if self.scan_succeeded.load(Ordering::SeqCst) {
			let store = CheckpointStore::new(self.config.work_dir.clone());
			if store.exists(&input.repo_url, None) {
				if let Err(e) = store.delete(&input.repo_url, None) {
					error!(error = %e, "scanner failed to delete checkpoint file");
				}
			}
		}
		debug!(scanner = %self.id, repo = %input.repo_url, "finished scanner run");
	}

	// Restore tracker state from a previous run's checkpoint, if one exists.
	// A corrupt checkpoint is logged and the scan starts empty rather than
	// seeding the trackers with garbage.
	fn restore_from_checkpoint(&self, store: &CheckpointStore, repo_url: &str) {
		match store.get(repo_url, None) {
			Ok(Some(checkpoint)) => {
				info!(
					repo = repo_url,
					created_at = checkpoint.created_at,
					"resuming scan from checkpoint"
				);
				self.tracker_commits.restore(checkpoint.tracker_commits);
				self.tracker_files.restore(checkpoint.tracker_files);
				self.tracker_requests.restore(checkpoint.tracker_requests);
			}
			Ok(None) => {}
			Err(e) => {
				error!(
					repo = repo_url,
					error = %e,
					"failed to initialize scan trackers with checkpoint data"
				);
			}
		}
	}

	/// Track a single request before it leaves for the detection backend.
	/// Requests already marked complete are skipped; anything else (new or
	/// restored PENDING) is tracked and re-issued.
	pub(crate) async fn process_request(
		&self,
		request: Request,
		requests_out: &channel::Sender<Request>,
		errors_out: &channel::Sender<ScanError>,
	) {
		if request.id().is_empty() {
			let _ = errors_out.send(ScanError::ProcessRequestNoId).await;
			return;
		}
		if let Some(data) = self.tracker_requests.get(request.id()) {
			if data.code == KEY_CODE_COMPLETE {
				debug!(id = request.id(), "skipping processing for completed request");
				return;
			}
		}
		if let Err(e) = self
			.tracker_requests
			.update(request.id(), KEY_CODE_PENDING, "", &[])
		{
			let _ = errors_out.send(e.into()).await;
			return;
		}
		let _ = requests_out.send(request).await;
	}

	async fn process_requests(
		self: Arc<Self>,
		quit: channel::Receiver<()>,
		requests_in: channel::Receiver<Request>,
		requests_out: channel::Sender<Request>,
		errors_out: channel::Sender<ScanError>,
	) {
		debug!("started requests processor");
		loop {
			let next = future::or(
				async {
					let _ = quit.recv().await;
					None
				},
				async { Some(requests_in.recv().await) },
			)
			.await;
			match next {
				None | Some(Err(_)) => break,
				Some(Ok(request)) => {
					self.process_request(request, &requests_out, &errors_out)
						.await;
				}
			}
		}
		debug!("finished requests processor");
	}

	/// Apply one response: persist any results, complete the request, and
	/// cascade completion to the file and (when the file settles) the commit.
	/// Both leaf and parent transitions happen inside this step, so a
	/// response can never complete the enclosing file before its own request
	/// record.
	pub(crate) async fn process_response(
		&self,
		response: Response,
		errors_out: &channel::Sender<ScanError>,
	) {
		if response.id().is_empty() {
			let _ = errors_out.send(ScanError::ProcessResponseNoId).await;
			return;
		}
		trace!(
			id = response.id(),
			results = response.results.len(),
			commit = %response.meta.commit.id,
			object = %response.meta.object.id,
			"processing response"
		);

		if !response.results.is_empty() {
			let records = records_from_response(&response);
			if let Err(e) = self.sink.write(records).await {
				let _ = errors_out
					.send(ScanError::ResultWrite(e.to_string()))
					.await;
			}
		}

		if let Err(e) =
			self.tracker_requests
				.update(response.id(), KEY_CODE_COMPLETE, "", &[])
		{
			let _ = errors_out.send(e.into()).await;
		}

		let file_code = match self.tracker_files.update(
			&response.meta.object.id,
			KEY_CODE_COMPLETE,
			"",
			&[response.meta.id.clone()],
		) {
			Ok(code) => code,
			Err(source) => {
				let _ = errors_out
					.send(ScanError::TrackerUpdateFile {
						id: response.meta.object.id.clone(),
						source,
					})
					.await;
				return;
			}
		};

		// the commit only advances once the file is fully settled
		if file_code == KEY_CODE_COMPLETE {
			if let Err(source) = self.tracker_commits.update(
				&response.meta.commit.id,
				KEY_CODE_COMPLETE,
				"",
				&[response.meta.object.id.clone()],
			) {
				let _ = errors_out
					.send(ScanError::TrackerUpdateCommit {
						id: response.meta.commit.id.clone(),
						source,
					})
					.await;
			}
		}
	}

	async fn process_responses(
		self: Arc<Self>,
		quit: channel::Receiver<()>,
		responses_in: channel::Receiver<Response>,
		errors_out: channel::Sender<ScanError>,
	) {
		debug!("started response processor");
		loop {
			let next = future::or(
				async {
					let _ = quit.recv().await;
					None
				},
				async { Some(responses_in.recv().await) },
			)
			.await;
			match next {
				None | Some(Err(_)) => break,
				Some(Ok(response)) => {
					self.process_response(response, &errors_out).await;
				}
			}
		}
		debug!("finished response processor");
	}

	/// Promote parents whose children silently became complete. The walker
	/// and the response processor race on child registration, so a request
	/// can finish before its file's PENDING update lands; this pass drives
	/// the trackers to a fixed point and is idempotent.
	pub(crate) fn reconcile_pending(&self) {
		trace!("started scanner reconciler");

		let pending_files = match self.tracker_files.keys_data_for_code(KEY_CODE_PENDING) {
			Ok(files) => files,
			Err(e) => {
				error!(error = %e, "error getting pending files");
				return;
			}
		};
		for (file_key, file_data) in pending_files {
			let mut requests_complete: Vec<String> = Vec::new();
			for (request_id, is_complete) in &file_data.children {
				if *is_complete {
					continue;
				}
				match self.tracker_requests.get(request_id) {
					None => {
						warn!(request = %request_id, "pending file references unknown request");
					}
					Some(request_data) => {
						if request_data.code == KEY_CODE_COMPLETE {
							requests_complete.push(request_id.clone());
						}
					}
				}
			}
			if !requests_complete.is_empty() {
				if let Err(e) =
					self.tracker_files
						.update(&file_key, KEY_CODE_COMPLETE, "", &requests_complete)
				{
					error!(file = %file_key, error = %e, "error updating file tracker");
				}
			}
		}

		let pending_commits = match self.tracker_commits.keys_data_for_code(KEY_CODE_PENDING) {
			Ok(commits) => commits,
			Err(e) => {
				error!(error = %e, "error getting pending commits");
				return;
			}
		};
		for (commit_key, commit_data) in pending_commits {
			let mut files_complete: Vec<String> = Vec::new();
			for (file_key, is_complete) in &commit_data.children {
				if *is_complete {
					continue;
				}
				match self.tracker_files.get(file_key) {
					None => {
						warn!(file = %file_key, "pending commit references unknown file");
					}
					Some(file_data) => {
						if file_data.code == KEY_CODE_COMPLETE {
							files_complete.push(file_key.clone());
						}
					}
				}
			}
			if !files_complete.is_empty() {
				if let Err(e) =
					self.tracker_commits
						.update(&commit_key, KEY_CODE_COMPLETE, "", &files_complete)
				{
					error!(commit = %commit_key, error = %e, "error updating commit tracker");
				}
			}
		}
	}

	// Emit counts, and once the walk has finished, reconcile and test for
	// overall completion. Returns true when the scan is done and quit should
	// close.
	fn track_scan_counts(&self, repo_url: &str, store: &CheckpointStore) -> bool {
		self.tracker_commits.log_counts();
		self.tracker_files.log_counts();
		self.tracker_requests.log_counts();

		if !self.is_scan_complete.load(Ordering::SeqCst) {
			debug!(repo = repo_url, "tracking scan: walk in progress");
			return false;
		}

		self.reconcile_pending();

		if !self.tracker_files.check_all_complete() {
			debug!(repo = repo_url, "tracking scan: not all files complete");
			return false;
		}
		if !self.tracker_commits.check_all_complete() {
			debug!(repo = repo_url, "tracking scan: not all commits complete");
			return false;
		}
		if !self.tracker_requests.check_all_complete() {
			debug!(repo = repo_url, "tracking scan: not all requests complete");
			return false;
		}

		if let Err(e) = store.delete(repo_url, None) {
			error!(error = %e, "scanner failed to delete checkpoint file");
		}

		self.tracker_commits.log_counts();
		self.tracker_files.log_counts();
		self.tracker_requests.log_counts();
		info!(repo = repo_url, "scan complete");
		self.scan_succeeded.store(true, Ordering::SeqCst);
		true
	}

	async fn track_scan_progress(
		self: Arc<Self>,
		repo_url: String,
		store: CheckpointStore,
		scan_done: channel::Receiver<()>,
		quit_tx: channel::Sender<()>,
		cancel: CancelToken,
	) {
		debug!("started scan progress tracker");
		let mut scan_done_seen = false;
		loop {
			if scan_done_seen {
				Timer::after(self.config.scan_refresh_interval).await;
			} else {
				let done = future::or(
					async {
						Timer::after(self.config.scan_refresh_interval).await;
						false
					},
					async {
						let _ = scan_done.recv().await;
						true
					},
				)
				.await;
				if done {
					debug!("received scan done signal");
					scan_done_seen = true;
				}
			}

			if cancel.is_cancelled() {
				info!(repo = %repo_url, "scan cancelled");
				quit_tx.close();
				break;
			}
			if self.track_scan_counts(&repo_url, &store) {
				quit_tx.close();
				break;
			}
			// a fatal error elsewhere already unwound the pipeline
			if quit_tx.is_closed() {
				break;
			}
		}
		debug!("finished scan progress tracker");
	}

	fn set_checkpoint(&self, store: &CheckpointStore, repo_url: &str) -> ScanResult<()> {
		store.set(
			repo_url,
			None,
			&Checkpoint::new(
				self.tracker_commits.keys_data(),
				self.tracker_files.keys_data(),
				self.tracker_requests.keys_data(),
			),
		)?;
		Ok(())
	}

	async fn checkpoint_scan(
		self: Arc<Self>,
		repo_url: String,
		store: CheckpointStore,
		quit: channel::Receiver<()>,
		errors_out: channel::Sender<ScanError>,
		cancel: CancelToken,
	) {
		debug!("started scan progress checkpoint processor");
		loop {
			let quit_now = future::or(
				async {
					Timer::after(self.config.checkpoint_refresh_interval).await;
					false
				},
				async {
					let _ = quit.recv().await;
					true
				},
			)
			.await;

			if quit_now {
				if cancel.is_cancelled() {
					// one final snapshot so the cancelled scan can resume
					if let Err(e) = self.set_checkpoint(&store, &repo_url) {
						error!(error = %e, "failed to write final checkpoint");
					}
				}
				break;
			}

			if let Err(e) = self.set_checkpoint(&store, &repo_url) {
				let _ = errors_out.send(e).await;
			}
		}
		debug!("finished scan progress checkpoint processor");
	}
}

/// Forward errors to the caller. The first fatal error closes `quit`,
/// unwinding the pipeline; non-fatal errors (checkpoint and sink writes) are
/// surfaced and the scan continues.
async fn process_errors(
	quit: channel::Receiver<()>,
	errors_in: channel::Receiver<ScanError>,
	errors_out: channel::Sender<ScanError>,
	quit_tx: channel::Sender<()>,
) {
	debug!("started error processor");
	loop {
		let next = future::or(
			async {
				let _ = quit.recv().await;
				None
			},
			async { Some(errors_in.recv().await) },
		)
		.await;
		match next {
			None | Some(Err(_)) => break,
			Some(Ok(e)) => {
				error!(error = %e, "error running scanner");
				let fatal = e.is_fatal();
				let _ = errors_out.send(e).await;
				if fatal {
					quit_tx.close();
					break;
				}
			}
		}
	}
	debug!("finished error processor");
}
