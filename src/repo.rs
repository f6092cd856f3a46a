//! Repository handle seam between the scan engine and the clone layer.
//!
//! The engine never talks to git directly. A [`RepositoryHandle`] yields
//! commits, each commit yields its tree of [`FileObject`]s, and each file
//! object exposes its blob bytes. The production git backend (clone and
//! authentication) implements this trait outside the crate;
//! [`MemoryRepository`] is the in-process implementation used by tests and
//! dry runs.

use std::collections::BTreeMap;
use std::sync::Arc;

/// A single file (blob) reachable from a commit tree.
///
/// The `id` is the content hash of the blob, stable across commits that share
/// the file's bytes. `name` is the path of the file within the tree.
#[derive(Debug, Clone)]
pub struct FileObject {
	pub id: String,
	pub name: String,
	pub size: i64,
	bytes: Arc<[u8]>,
}

impl FileObject {
	pub fn new(id: impl Into<String>, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
		let bytes: Vec<u8> = bytes.into();
		Self {
			id: id.into(),
			name: name.into(),
			size: bytes.len() as i64,
			bytes: bytes.into(),
		}
	}

	/// Raw blob bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Blob bytes decoded as UTF-8 text.
	pub fn contents(&self) -> Result<&str, std::str::Utf8Error> {
		std::str::from_utf8(&self.bytes)
	}

	/// Extension of the file name, including the leading dot, lowercased.
	/// `None` when the name has no extension.
	pub fn extension(&self) -> Option<String> {
		let base = self.name.rsplit('/').next().unwrap_or(&self.name);
		match base.rfind('.') {
			Some(idx) if idx > 0 => Some(base[idx..].to_ascii_lowercase()),
			_ => None,
		}
	}
}

/// A commit and its (possibly unavailable) tree of file objects.
#[derive(Debug, Clone)]
pub struct CommitObject {
	pub id: String,
	tree: Result<Vec<FileObject>, String>,
}

impl CommitObject {
	pub fn new(id: impl Into<String>, files: Vec<FileObject>) -> Self {
		Self {
			id: id.into(),
			tree: Ok(files),
		}
	}

	/// A commit whose tree lookup fails, for exercising error paths.
	pub fn with_tree_error(id: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			tree: Err(message.into()),
		}
	}

	/// The tree of files for this commit, in tree iteration order.
	pub fn tree(&self) -> Result<&[FileObject], &str> {
		match &self.tree {
			Ok(files) => Ok(files),
			Err(msg) => Err(msg.as_str()),
		}
	}
}

/// Iterator over the commits of a repository.
pub type CommitIter<'a> = Box<dyn Iterator<Item = Result<CommitObject, String>> + Send + 'a>;

/// Read-only view of a version-controlled repository, shared across the scan
/// workers for the duration of one scan.
pub trait RepositoryHandle: Send + Sync {
	/// Iterator over every commit in the repository history. The iteration
	/// order is the handle's to choose; the engine only requires that each
	/// commit appears once.
	fn commit_objects(&self) -> Result<CommitIter<'_>, String>;
}

/// In-memory repository fixture: an ordered map of commit ID to file list.
#[derive(Debug, Default)]
pub struct MemoryRepository {
	commits: BTreeMap<String, CommitObject>,
}

impl MemoryRepository {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a commit with the given files.
	pub fn add_commit(&mut self, commit_id: impl Into<String>, files: Vec<FileObject>) -> &mut Self {
		let id = commit_id.into();
		self.commits.insert(id.clone(), CommitObject::new(id, files));
		self
	}

	/// Add a commit whose tree lookup fails.
	pub fn add_broken_commit(
		&mut self,
		commit_id: impl Into<String>,
		message: impl Into<String>,
	) -> &mut Self {
		let id = commit_id.into();
		self.commits
			.insert(id.clone(), CommitObject::with_tree_error(id, message));
		self
	}

	pub fn len(&self) -> usize {
		self.commits.len()
	}

	pub fn is_empty(&self) -> bool {
		self.commits.is_empty()
	}
}

impl RepositoryHandle for MemoryRepository {
	fn commit_objects(&self) -> Result<CommitIter<'_>, String> {
		Ok(Box::new(self.commits.values().cloned().map(Ok)))
	}
}
