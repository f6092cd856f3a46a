//! Repository walker: turns commits and files into a stream of detection
//! requests, updating the trackers as it goes.
//!
//! One walker runs per scan. Commits are fanned out to their own tasks; file
//! updates within a commit follow tree iteration order, while cross-commit
//! ordering is unconstrained. Commits and files whose tracker entries are
//! already past INIT were handled by a previous run (restored from a
//! checkpoint) and are skipped; restored PENDING entries regress to INIT and
//! are walked again.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_channel as channel;
use tracing::{debug, trace, warn};

use crate::error::{RequestError, ScanError};
use crate::ignore::ignore_file_object;
use crate::repo::{CommitObject, FileObject, RepositoryHandle};
use crate::request::{chunk_file_to_requests, ChunkFileInput, Request};
use crate::scanner::{CancelToken, Scanner};
use crate::tracker::{
	KEY_CODE_COMPLETE, KEY_CODE_ERROR, KEY_CODE_IGNORE, KEY_CODE_INIT, KEY_CODE_PENDING,
};

pub(crate) struct Walker {
	pub scanner: Arc<Scanner>,
	pub repo_url: String,
	pub repository: Arc<dyn RepositoryHandle>,
	pub requests_out: channel::Sender<Request>,
	pub errors_out: channel::Sender<ScanError>,
	pub scan_done: channel::Sender<()>,
	pub cancel: CancelToken,
}

impl Walker {
	/// Walk every commit in the repository, fan each one out to its own task,
	/// and signal `scan_done` once the iterator and all commit tasks drain.
	pub(crate) async fn run(self) {
		debug!(repo = %self.repo_url, "started scan of repository");

		let commit_iter = match self.repository.commit_objects() {
			Ok(iter) => iter,
			Err(msg) => {
				let _ = self.errors_out.send(ScanError::Repository(msg)).await;
				self.scan_done.close();
				return;
			}
		};

		let capacity = self.scanner.config.channel_capacity;
		let (commits_tx, commits_rx) = channel::bounded::<CommitObject>(capacity);

		let worker = CommitWorker {
			scanner: Arc::clone(&self.scanner),
			repo_url: self.repo_url.clone(),
			requests_out: self.requests_out.clone(),
			errors_out: self.errors_out.clone(),
			cancel: self.cancel.clone(),
		};
		let pool = smol::spawn(process_commits(worker, commits_rx));

		for commit in commit_iter {
			if self.cancel.is_cancelled() {
				break;
			}
			match commit {
				Ok(commit) => {
					if let Err(e) = self.scan_commit(commit, &commits_tx).await {
						let _ = self.errors_out.send(e).await;
					}
				}
				Err(msg) => {
					// surface and keep iterating; queued commits still drain
					let _ = self.errors_out.send(ScanError::Repository(msg)).await;
				}
			}
		}

		commits_tx.close();
		pool.await;

		self.scanner.is_scan_complete.store(true, Ordering::SeqCst);
		self.scan_done.close();
		debug!(repo = %self.repo_url, "finished scan of repository");
	}

	/// Track the commit and enqueue it for processing unless a previous run
	/// already moved it past INIT.
	async fn scan_commit(
		&self,
		commit: CommitObject,
		commits_tx: &channel::Sender<CommitObject>,
	) -> Result<(), ScanError> {
		let code = self
			.scanner
			.tracker_commits
			.update(&commit.id, KEY_CODE_INIT, "", &[])
			.map_err(|source| ScanError::TrackerUpdateCommit {
				id: commit.id.clone(),
				source,
			})?;

		if code > KEY_CODE_INIT {
			trace!(
				repo = %self.repo_url,
				commit = %commit.id,
				"skipping previously scanned commit"
			);
			return Ok(());
		}

		let _ = commits_tx.send(commit).await;
		Ok(())
	}
}

/// Drain the commits channel, spawning one task per commit, and wait for all
/// of them before returning.
async fn process_commits(worker: CommitWorker, commits_rx: channel::Receiver<CommitObject>) {
	let mut tasks = Vec::new();
	while let Ok(commit) = commits_rx.recv().await {
		let worker = worker.clone();
		tasks.push(smol::spawn(async move {
			worker.process_commit(commit).await;
		}));
	}
	for task in tasks {
		task.await;
	}
}

#[derive(Clone)]
struct CommitWorker {
	scanner: Arc<Scanner>,
	repo_url: String,
	requests_out: channel::Sender<Request>,
	errors_out: channel::Sender<ScanError>,
	cancel: CancelToken,
}

impl CommitWorker {
	async fn process_commit(&self, commit: CommitObject) {
		debug!(repo = %self.repo_url, commit = %commit.id, "scanning commit");

		let files: Vec<FileObject> = match commit.tree() {
			Ok(files) => files.to_vec(),
			Err(msg) => {
				if let Err(source) =
					self.scanner
						.tracker_commits
						.update(&commit.id, KEY_CODE_ERROR, msg, &[])
				{
					let _ = self
						.errors_out
						.send(ScanError::TrackerUpdateCommit {
							id: commit.id.clone(),
							source,
						})
						.await;
				}
				return;
			}
		};

		for file in &files {
			if self.cancel.is_cancelled() {
				return;
			}
			self.scan_file(&commit, file).await;
		}

		// Attempt completion; the tracker holds the commit at PENDING while
		// any child file is still outstanding, and commits with no scannable
		// files complete here immediately.
		if let Err(source) =
			self.scanner
				.tracker_commits
				.update(&commit.id, KEY_CODE_COMPLETE, "", &[])
		{
			let _ = self
				.errors_out
				.send(ScanError::TrackerUpdateCommit {
					id: commit.id.clone(),
					source,
				})
				.await;
		}
	}

	async fn scan_file(&self, commit: &CommitObject, file: &FileObject) {
		let code = match self
			.scanner
			.tracker_files
			.update(&file.id, KEY_CODE_INIT, "", &[])
		{
			Ok(code) => code,
			Err(source) => {
				let _ = self
					.errors_out
					.send(ScanError::TrackerUpdateFile {
						id: file.id.clone(),
						source,
					})
					.await;
				return;
			}
		};

		// the same object in a later commit was already scanned or ignored
		if code > KEY_CODE_INIT {
			trace!(
				commit = %commit.id,
				file = %file.id,
				code,
				"skipping previously scanned file"
			);
			return;
		}

		let config = &self.scanner.config;
		let (should_ignore, ignore_reason) = ignore_file_object(
			Some(file),
			&config.extensions,
			&config.ignore_extensions,
		);
		if should_ignore {
			trace!(
				commit = %commit.id,
				file = %file.id,
				reason = ignore_reason,
				"skipping scan of file"
			);
			if let Err(source) =
				self.scanner
					.tracker_files
					.update(&file.id, KEY_CODE_IGNORE, ignore_reason, &[])
			{
				let _ = self
					.errors_out
					.send(ScanError::TrackerUpdateFile {
						id: file.id.clone(),
						source,
					})
					.await;
			}
			return;
		}

		debug!(commit = %commit.id, file = %file.id, name = %file.name, "scanning file");

		let requests = match chunk_file_to_requests(ChunkFileInput {
			commit_id: &commit.id,
			file,
			max_chunk_size: config.max_request_chunk_size,
			repo_id: &self.repo_url,
			repo_url: &self.repo_url,
		}) {
			Ok(requests) => requests,
			Err(e) => {
				warn!(
					commit = %commit.id,
					file = %file.id,
					error = %e,
					"failed to generate requests for file"
				);
				let _ = self
					.scanner
					.tracker_files
					.update(&file.id, KEY_CODE_ERROR, &e.to_string(), &[]);
				return;
			}
		};

		// a zero-size file should have been caught by the ignore policy
		if requests.is_empty() && file.size > 0 {
			let e = RequestError::NoChunks(file.id.clone());
			warn!(
				commit = %commit.id,
				name = %file.name,
				size = file.size,
				"{e}"
			);
			let _ = self
				.scanner
				.tracker_files
				.update(&file.id, KEY_CODE_ERROR, &e.to_string(), &[]);
			return;
		}

		let mut child_keys = Vec::with_capacity(requests.len());
		for request in requests {
			child_keys.push(request.id().to_string());
			let _ = self.requests_out.send(request).await;
		}

		if let Err(source) =
			self.scanner
				.tracker_files
				.update(&file.id, KEY_CODE_PENDING, "", &child_keys)
		{
			let _ = self
				.errors_out
				.send(ScanError::TrackerUpdateFile {
					id: file.id.clone(),
					source,
				})
				.await;
			return;
		}
		if let Err(source) = self.scanner.tracker_commits.update(
			&commit.id,
			KEY_CODE_PENDING,
			"",
			&[file.id.clone()],
		) {
			let _ = self
				.errors_out
				.send(ScanError::TrackerUpdateCommit {
					id: commit.id.clone(),
					source,
				})
				.await;
		}
	}
}
