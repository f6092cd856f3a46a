//! Request/response model for detection units.
//!
//! A [`Request`] is one bounded chunk of file text to be scanned by the
//! detection service; its [`Response`] echoes the identifying envelope and
//! carries the detected [`DetectionResult`]s. [`ResultRecord`] is the
//! persisted projection of a single result, fingerprinted so that re-writes
//! are idempotent.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::{RequestError, RequestResult};
use crate::repo::FileObject;

/// Separator joining fingerprint tuple elements before hashing.
pub const FINGERPRINT_SEPARATOR: &str = "__";

/// Current time as epoch milliseconds.
pub fn timestamp_now() -> i64 {
	Utc::now().timestamp_millis()
}

/// Lowercase-hex SHA-1 over the elements joined by [`FINGERPRINT_SEPARATOR`].
pub fn fingerprint(elements: &[&str]) -> String {
	let mut hasher = Sha1::new();
	hasher.update(elements.join(FINGERPRINT_SEPARATOR).as_bytes());
	hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitMeta {
	pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
	/// Content hash of the source file
	pub id: String,
	/// Number of characters in the source text
	pub length: usize,
	/// Starting character position of the source text within the file
	pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryMeta {
	pub id: String,
	pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeMeta {
	/// When the request was created
	pub start: i64,
	/// When the request finished processing; zero until then
	pub stop: i64,
}

/// Identifying envelope shared verbatim between a request and its response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
	pub id: String,
	pub commit: CommitMeta,
	pub object: ObjectMeta,
	pub repository: RepositoryMeta,
	pub time: TimeMeta,
}

/// A unit of text to be scanned for sensitive content.
///
/// The source text lives only in the request, never in the response, to limit
/// its exposure once detection has run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
	#[serde(flatten)]
	pub meta: Envelope,
	pub text: String,
}

/// Input parameters for [`Request::new`].
#[derive(Debug, Clone, Default)]
pub struct RequestInput {
	pub commit_id: String,
	pub length: usize,
	pub object_id: String,
	pub offset: usize,
	pub repo_id: String,
	pub repo_url: String,
	pub text: String,
}

impl Request {
	/// Build a request with a deterministic fingerprint ID over
	/// `(repo_id, commit_id, object_id, text)`. Empty identifying inputs are
	/// rejected.
	pub fn new(input: RequestInput) -> RequestResult<Request> {
		if input.repo_id.is_empty() {
			return Err(RequestError::EmptyRepositoryId);
		}
		if input.object_id.is_empty() {
			return Err(RequestError::EmptyObjectId);
		}
		if input.commit_id.is_empty() {
			return Err(RequestError::EmptyCommitId);
		}
		if input.text.is_empty() {
			return Err(RequestError::EmptyText);
		}

		let id = fingerprint(&[&input.repo_id, &input.commit_id, &input.object_id, &input.text]);

		Ok(Request {
			meta: Envelope {
				id,
				commit: CommitMeta {
					id: input.commit_id,
				},
				object: ObjectMeta {
					id: input.object_id,
					length: input.length,
					offset: input.offset,
				},
				repository: RepositoryMeta {
					id: input.repo_id,
					url: input.repo_url,
				},
				time: TimeMeta {
					start: timestamp_now(),
					stop: 0,
				},
			},
			text: input.text,
		})
	}

	pub fn id(&self) -> &str {
		&self.meta.id
	}
}

/// Detection results for one request, carrying the request's envelope minus
/// its source text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
	#[serde(flatten)]
	pub meta: Envelope,
	pub results: Vec<DetectionResult>,
}

impl Response {
	/// Echo the request's envelope with an empty result list.
	pub fn from_request(request: &Request) -> Response {
		Response {
			meta: request.meta.clone(),
			results: Vec::new(),
		}
	}

	pub fn id(&self) -> &str {
		&self.meta.id
	}
}

/// A single detected entity within a request's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
	pub category: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subcategory: Option<String>,
	/// Confidence score in [0, 1]
	pub confidence_score: f64,
	/// Character offset within the request text
	pub offset: usize,
	/// Character length of the matched text
	pub length: usize,
	/// Name of the detecting service
	pub service: String,
	/// The matched text
	pub text: String,
}

/// Persisted projection of one [`DetectionResult`], with enough context to
/// reconstruct its origin. The record ID fingerprints the identifying fields
/// so repeated writes of the same detection collapse to one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
	pub id: String,
	pub repository_id: String,
	pub repository_url: String,
	pub commit_id: String,
	pub object_id: String,
	pub request_id: String,
	pub category: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subcategory: Option<String>,
	pub confidence_score: f64,
	/// Absolute character offset within the source file
	pub offset: usize,
	pub length: usize,
	pub service: String,
	pub text: String,
	pub timestamp: i64,
}

impl ResultRecord {
	pub fn new(meta: &Envelope, result: &DetectionResult) -> ResultRecord {
		// position the match within the file, not the chunk
		let offset = meta.object.offset + result.offset;
		let id = fingerprint(&[
			&meta.repository.id,
			&meta.commit.id,
			&meta.object.id,
			&meta.id,
			&result.category,
			&offset.to_string(),
			&result.length.to_string(),
			&result.text,
		]);
		ResultRecord {
			id,
			repository_id: meta.repository.id.clone(),
			repository_url: meta.repository.url.clone(),
			commit_id: meta.commit.id.clone(),
			object_id: meta.object.id.clone(),
			request_id: meta.id.clone(),
			category: result.category.clone(),
			subcategory: result.subcategory.clone(),
			confidence_score: result.confidence_score,
			offset,
			length: result.length,
			service: result.service.clone(),
			text: result.text.clone(),
			timestamp: timestamp_now(),
		}
	}
}

/// Project every result of a response into its persisted record form.
pub fn records_from_response(response: &Response) -> Vec<ResultRecord> {
	response
		.results
		.iter()
		.map(|result| ResultRecord::new(&response.meta, result))
		.collect()
}

/// Input parameters for [`chunk_file_to_requests`].
#[derive(Debug, Clone)]
pub struct ChunkFileInput<'a> {
	pub commit_id: &'a str,
	pub file: &'a FileObject,
	pub max_chunk_size: usize,
	pub repo_id: &'a str,
	pub repo_url: &'a str,
}

/// Split a file's text into contiguous chunks of at most `max_chunk_size`
/// characters, one request per chunk. Offsets and lengths are character
/// counts, so multi-byte content never splits mid-character.
pub fn chunk_file_to_requests(input: ChunkFileInput<'_>) -> RequestResult<Vec<Request>> {
	if input.max_chunk_size == 0 {
		return Err(RequestError::NoChunks(input.file.id.clone()));
	}

	let text = input
		.file
		.contents()
		.map_err(|e| RequestError::NotText(e.to_string()))?;

	let chars: Vec<char> = text.chars().collect();
	let mut requests = Vec::with_capacity(chars.len().div_ceil(input.max_chunk_size.max(1)));
	for (index, chunk) in chars.chunks(input.max_chunk_size).enumerate() {
		let chunk_text: String = chunk.iter().collect();
		let request = Request::new(RequestInput {
			commit_id: input.commit_id.to_string(),
			length: chunk.len(),
			object_id: input.file.id.clone(),
			offset: index * input.max_chunk_size,
			repo_id: input.repo_id.to_string(),
			repo_url: input.repo_url.to_string(),
			text: chunk_text,
		})?;
		requests.push(request);
	}

	Ok(requests)
}
