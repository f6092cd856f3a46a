//! Clone-URL parsing helpers for deriving org and repository names.
//!
//! Both https (`https://github.com/org/repo.git`) and scp-like ssh
//! (`git@github.com:org/repo.git`) forms are recognized. The parsed names feed
//! the checkpoint path scheme and the per-repository clone directory layout.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GitUrlError {
	#[error("URL is empty")]
	Empty,

	#[error("invalid path in URL")]
	InvalidPath,
}

/// Parse the organization (first path segment) from a clone URL.
pub fn parse_org_name(repo_url: &str) -> Result<String, GitUrlError> {
	let segments = path_segments(repo_url)?;
	Ok(segments[0].to_string())
}

/// Parse the repository name (last path segment, `.git` suffix stripped) from
/// a clone URL.
pub fn parse_repo_name(repo_url: &str) -> Result<String, GitUrlError> {
	let segments = path_segments(repo_url)?;
	let last = segments[segments.len() - 1];
	let name = last.strip_suffix(".git").unwrap_or(last);
	if name.is_empty() {
		return Err(GitUrlError::InvalidPath);
	}
	Ok(name.to_string())
}

// Extract the org/.../repo path segments common to both URL forms.
fn path_segments(repo_url: &str) -> Result<Vec<&str>, GitUrlError> {
	let url = repo_url.trim();
	if url.is_empty() {
		return Err(GitUrlError::Empty);
	}

	let path = if let Some((_, rest)) = url.split_once("://") {
		// scheme form: path starts after the host
		match rest.split_once('/') {
			Some((_, path)) => path,
			None => return Err(GitUrlError::InvalidPath),
		}
	} else if url.contains('@') && url.contains(':') {
		// scp-like form: path starts after the colon
		match url.split_once(':') {
			Some((_, path)) => path,
			None => return Err(GitUrlError::InvalidPath),
		}
	} else {
		return Err(GitUrlError::InvalidPath);
	};

	let segments: Vec<&str> = path
		.trim_matches('/')
		.split('/')
		.filter(|s| !s.is_empty())
		.collect();
	if segments.len() < 2 {
		return Err(GitUrlError::InvalidPath);
	}
	Ok(segments)
}
