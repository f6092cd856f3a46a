//! Results sink seam: where detected records are persisted.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::ScanResult;
use crate::request::ResultRecord;

/// Destination for detection records. Implementations must be idempotent by
/// [`ResultRecord::id`] and safe for concurrent writes from the response
/// processor.
#[async_trait]
pub trait ResultSink: Send + Sync {
	async fn write(&self, records: Vec<ResultRecord>) -> ScanResult<()>;
}

/// In-memory sink keyed by record fingerprint; used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryResultSink {
	records: Mutex<HashMap<String, ResultRecord>>,
}

impl MemoryResultSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.records
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn get(&self, id: &str) -> Option<ResultRecord> {
		self.records
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.get(id)
			.cloned()
	}

	pub fn records(&self) -> Vec<ResultRecord> {
		self.records
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.values()
			.cloned()
			.collect()
	}
}

#[async_trait]
impl ResultSink for MemoryResultSink {
	async fn write(&self, records: Vec<ResultRecord>) -> ScanResult<()> {
		let mut map = self.records.lock().unwrap_or_else(PoisonError::into_inner);
		for record in records {
			map.insert(record.id.clone(), record);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::request::{records_from_response, DetectionResult, Request, RequestInput, Response};

	fn sample_records() -> Vec<ResultRecord> {
		let request = Request::new(RequestInput {
			commit_id: "c1".to_string(),
			length: 5,
			object_id: "o1".to_string(),
			offset: 0,
			repo_id: "r1".to_string(),
			repo_url: String::new(),
			text: "hello".to_string(),
		})
		.unwrap();
		let mut response = Response::from_request(&request);
		response.results.push(DetectionResult {
			category: "Person".to_string(),
			subcategory: None,
			confidence_score: 0.8,
			offset: 0,
			length: 5,
			service: "test-service".to_string(),
			text: "hello".to_string(),
		});
		records_from_response(&response)
	}

	#[test_log::test]
	fn test_write_is_idempotent_by_id() {
		smol::block_on(async {
			let sink = MemoryResultSink::new();
			let records = sample_records();
			let id = records[0].id.clone();

			sink.write(records.clone()).await.unwrap();
			sink.write(records).await.unwrap();

			assert_eq!(sink.len(), 1);
			assert!(sink.get(&id).is_some());
		});
	}

	#[test_log::test]
	fn test_empty_write() {
		smol::block_on(async {
			let sink = MemoryResultSink::new();
			sink.write(Vec::new()).await.unwrap();
			assert!(sink.is_empty());
		});
	}
}
