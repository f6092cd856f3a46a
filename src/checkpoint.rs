//! Checkpoint persistence for resumable scans.
//!
//! A [`Checkpoint`] snapshots the three tracker maps of one scan. It lives at
//! `<work_dir>/checkpoints/<org>_<repo>[_<commit>].checkpoint` as
//! base64-wrapped JSON; that wire shape is load-bearing for files written by
//! earlier versions, so it must not change. Writes go through a temp file and
//! an atomic rename so a crash mid-write never leaves a truncated checkpoint.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CheckpointError, CheckpointResult};
use crate::giturl::{parse_org_name, parse_repo_name};
use crate::request::timestamp_now;
use crate::tracker::KeyDataMap;

const CHECKPOINT_DIR: &str = "checkpoints";
const CHECKPOINT_FILE_EXTENSION: &str = ".checkpoint";

/// Snapshot of the scanner's three trackers at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
	pub created_at: i64,
	#[serde(rename = "commits")]
	pub tracker_commits: KeyDataMap,
	#[serde(rename = "files")]
	pub tracker_files: KeyDataMap,
	#[serde(rename = "requests")]
	pub tracker_requests: KeyDataMap,
}

impl Checkpoint {
	pub fn new(commits: KeyDataMap, files: KeyDataMap, requests: KeyDataMap) -> Checkpoint {
		Checkpoint {
			created_at: timestamp_now(),
			tracker_commits: commits,
			tracker_files: files,
			tracker_requests: requests,
		}
	}
}

/// Filesystem store for checkpoints, rooted at a work directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
	work_dir: PathBuf,
}

impl CheckpointStore {
	pub fn new(work_dir: impl Into<PathBuf>) -> Self {
		Self {
			work_dir: work_dir.into(),
		}
	}

	/// Expected path of the checkpoint file for a repository and optional
	/// commit.
	pub fn checkpoint_path(
		&self,
		repo_url: &str,
		commit_id: Option<&str>,
	) -> CheckpointResult<PathBuf> {
		if self.work_dir.as_os_str().is_empty() {
			return Err(CheckpointError::PathLookup("work_dir is empty".to_string()));
		}
		if repo_url.is_empty() {
			return Err(CheckpointError::PathLookup("repo_url is empty".to_string()));
		}

		let org_name =
			parse_org_name(repo_url).map_err(|e| CheckpointError::PathLookup(e.to_string()))?;
		let repo_name =
			parse_repo_name(repo_url).map_err(|e| CheckpointError::PathLookup(e.to_string()))?;

		let mut name_parts = vec![org_name, repo_name];
		if let Some(commit_id) = commit_id.filter(|c| !c.is_empty()) {
			name_parts.push(commit_id.to_string());
		}
		let file_name = format!("{}{}", name_parts.join("_"), CHECKPOINT_FILE_EXTENSION);

		Ok(self.work_dir.join(CHECKPOINT_DIR).join(file_name))
	}

	/// Read the checkpoint for a repository. `Ok(None)` when no checkpoint
	/// file exists; an error when the file exists but cannot be decoded.
	pub fn get(
		&self,
		repo_url: &str,
		commit_id: Option<&str>,
	) -> CheckpointResult<Option<Checkpoint>> {
		let path = self.checkpoint_path(repo_url, commit_id)?;
		if !path.exists() {
			return Ok(None);
		}

		let encoded = fs::read(&path)?;
		let trimmed: Vec<u8> = encoded
			.into_iter()
			.filter(|b| !b.is_ascii_whitespace())
			.collect();
		let data = STANDARD.decode(&trimmed)?;
		let checkpoint: Checkpoint = serde_json::from_slice(&data)?;

		info!(path = %path.display(), "retrieved scan checkpoint data");
		Ok(Some(checkpoint))
	}

	/// Write the checkpoint for a repository, creating parent directories as
	/// needed.
	pub fn set(
		&self,
		repo_url: &str,
		commit_id: Option<&str>,
		checkpoint: &Checkpoint,
	) -> CheckpointResult<()> {
		let path = self.checkpoint_path(repo_url, commit_id)?;
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}

		let data = serde_json::to_vec(checkpoint)?;
		let encoded = STANDARD.encode(&data);
		atomic_write(&path, encoded.as_bytes())?;

		debug!(path = %path.display(), "saved scan checkpoint");
		Ok(())
	}

	/// Remove the checkpoint file for a repository.
	pub fn delete(&self, repo_url: &str, commit_id: Option<&str>) -> CheckpointResult<()> {
		let path = self.checkpoint_path(repo_url, commit_id)?;
		fs::remove_file(&path)
			.map_err(|e| CheckpointError::Delete(format!("{}: {e}", path.display())))?;
		info!(path = %path.display(), "deleted scan checkpoint file");
		Ok(())
	}

	/// Whether a checkpoint file exists for a repository.
	pub fn exists(&self, repo_url: &str, commit_id: Option<&str>) -> bool {
		self.checkpoint_path(repo_url, commit_id)
			.map(|path| path.exists())
			.unwrap_or(false)
	}
}

// write-to-temp-then-rename; rename is atomic on the same filesystem
fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
	let tmp = path.with_extension("checkpoint.tmp");
	fs::write(&tmp, bytes)?;
	fs::rename(&tmp, path)
}
