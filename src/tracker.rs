//! Concurrency-safe lifecycle tracking for commits, files, and requests.
//!
//! A [`KeyTracker`] maps identifiers to [`KeyData`] lifecycle records with
//! parent/child completion semantics: a parent update that names children
//! merges them into the parent's children map, and a COMPLETE update is held
//! at PENDING while any child remains incomplete. Completion is monotonic —
//! once a key reaches COMPLETE no later update can regress it. All other
//! transitions, including re-INIT, are allowed; regressing a restored PENDING
//! key back to INIT is how a resumed scan re-enters unfinished work.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::error::{TrackerError, TrackerResult};
use crate::request::timestamp_now;

pub const KEY_CODE_INIT: i32 = -2;
pub const KEY_CODE_ERROR: i32 = -1;
pub const KEY_CODE_IGNORE: i32 = 0;
pub const KEY_CODE_PENDING: i32 = 1;
pub const KEY_CODE_COMPLETE: i32 = 2;

pub const KEY_STATE_INIT: &str = "init";
pub const KEY_STATE_ERROR: &str = "error";
pub const KEY_STATE_IGNORE: &str = "ignore";
pub const KEY_STATE_PENDING: &str = "pending";
pub const KEY_STATE_COMPLETE: &str = "complete";

/// Recognized tracker kinds.
pub const KIND_COMMIT: &str = "commit";
pub const KIND_FILE: &str = "file";
pub const KIND_REQUEST_RESPONSE: &str = "request_response";

/// Canonical state label for a code. Unknown codes map to the init label.
pub fn key_code_to_state(code: i32) -> &'static str {
	match code {
		KEY_CODE_ERROR => KEY_STATE_ERROR,
		KEY_CODE_IGNORE => KEY_STATE_IGNORE,
		KEY_CODE_PENDING => KEY_STATE_PENDING,
		KEY_CODE_COMPLETE => KEY_STATE_COMPLETE,
		_ => KEY_STATE_INIT,
	}
}

/// Reject codes outside the recognized {-2..2} range.
pub fn key_code_validate(code: i32) -> TrackerResult<()> {
	if !(KEY_CODE_INIT..=KEY_CODE_COMPLETE).contains(&code) {
		return Err(TrackerError::InvalidCode(code));
	}
	Ok(())
}

/// Per-identifier lifecycle record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyData {
	pub code: i32,
	pub state: String,
	#[serde(default)]
	pub message: String,
	/// child identifier -> child is complete
	#[serde(default)]
	pub children: HashMap<String, bool>,
	pub timestamp_first: i64,
	pub timestamp_latest: i64,
}

impl KeyData {
	/// New record for a key first seen with `code`. Children named by a
	/// COMPLETE update are recorded as already complete; any other code
	/// records them as outstanding.
	pub fn new(code: i32, message: &str, children: &[String]) -> TrackerResult<KeyData> {
		key_code_validate(code)?;
		let now = timestamp_now();
		let complete = code == KEY_CODE_COMPLETE;
		Ok(KeyData {
			code,
			state: key_code_to_state(code).to_string(),
			message: message.to_string(),
			children: children.iter().map(|c| (c.clone(), complete)).collect(),
			timestamp_first: now,
			timestamp_latest: now,
		})
	}
}

/// Snapshot form of a tracker: the whole key map.
pub type KeyDataMap = HashMap<String, KeyData>;

/// Population counts by state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDataCounts {
	pub complete: usize,
	pub error: usize,
	pub ignore: usize,
	pub init: usize,
	pub pending: usize,
}

/// A kind-tagged map of identifier -> [`KeyData`], safe for many concurrent
/// writers. All mutation is serialized by the internal readers-writer lock.
#[derive(Debug)]
pub struct KeyTracker {
	kind: String,
	keys: RwLock<KeyDataMap>,
}

impl KeyTracker {
	pub fn new(kind: &str) -> TrackerResult<KeyTracker> {
		match kind {
			KIND_COMMIT | KIND_FILE | KIND_REQUEST_RESPONSE => Ok(KeyTracker {
				kind: kind.to_string(),
				keys: RwLock::new(KeyDataMap::new()),
			}),
			_ => Err(TrackerError::InvalidKind(kind.to_string())),
		}
	}

	pub fn kind(&self) -> &str {
		&self.kind
	}

	/// Data for a single key, if tracked.
	pub fn get(&self, key: &str) -> Option<KeyData> {
		self.keys
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(key)
			.cloned()
	}

	/// All tracked keys.
	pub fn keys(&self) -> Vec<String> {
		self.keys
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.keys()
			.cloned()
			.collect()
	}

	/// Snapshot of the full key map.
	pub fn keys_data(&self) -> KeyDataMap {
		self.keys
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	/// Snapshot of the keys currently at `code`.
	pub fn keys_data_for_code(&self, code: i32) -> TrackerResult<KeyDataMap> {
		key_code_validate(code)?;
		Ok(self
			.keys
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.iter()
			.filter(|(_, data)| data.code == code)
			.map(|(key, data)| (key.clone(), data.clone()))
			.collect())
	}

	/// Apply a state transition to `key`, returning the code that actually
	/// took effect.
	///
	/// Children named by the update are merged into the key's children map;
	/// a COMPLETE update marks the named children complete, any other update
	/// inserts missing children as outstanding. Existing complete flags are
	/// never demoted. A COMPLETE update on a key with outstanding children
	/// takes effect as PENDING. Once a key is COMPLETE its code and message
	/// are frozen.
	pub fn update(
		&self,
		key: &str,
		code: i32,
		message: &str,
		children: &[String],
	) -> TrackerResult<i32> {
		key_code_validate(code)?;
		if key.is_empty() {
			return Err(TrackerError::KeyEmpty);
		}

		let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
		match keys.get_mut(key) {
			None => {
				let data = KeyData::new(code, message, children)?;
				let effective = data.code;
				trace!(kind = %self.kind, key, code, "tracking new key");
				keys.insert(key.to_string(), data);
				Ok(effective)
			}
			Some(data) => {
				for child in children {
					let flag = data.children.entry(child.clone()).or_insert(false);
					if code == KEY_CODE_COMPLETE {
						*flag = true;
					}
				}

				if data.code == KEY_CODE_COMPLETE {
					if code != KEY_CODE_COMPLETE {
						debug!(
							kind = %self.kind,
							key,
							requested = code,
							"ignoring update for completed key"
						);
					}
					return Ok(KEY_CODE_COMPLETE);
				}

				let effective =
					if code == KEY_CODE_COMPLETE && data.children.values().any(|done| !done) {
						KEY_CODE_PENDING
					} else {
						code
					};
				data.code = effective;
				data.state = key_code_to_state(effective).to_string();
				data.message = message.to_string();
				data.timestamp_latest = timestamp_now();
				Ok(effective)
			}
		}
	}

	/// True iff every key has reached a terminal state. COMPLETE, ERROR and
	/// IGNORE are terminal; an empty tracker is complete by vacuity.
	pub fn check_all_complete(&self) -> bool {
		self.keys
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.values()
			.all(|data| {
				matches!(
					data.code,
					KEY_CODE_COMPLETE | KEY_CODE_ERROR | KEY_CODE_IGNORE
				)
			})
	}

	/// Population counts by state.
	pub fn counts(&self) -> KeyDataCounts {
		let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
		let mut counts = KeyDataCounts::default();
		for data in keys.values() {
			match data.code {
				KEY_CODE_COMPLETE => counts.complete += 1,
				KEY_CODE_ERROR => counts.error += 1,
				KEY_CODE_IGNORE => counts.ignore += 1,
				KEY_CODE_PENDING => counts.pending += 1,
				_ => counts.init += 1,
			}
		}
		counts
	}

	/// Log and return the current population counts.
	pub fn log_counts(&self) -> KeyDataCounts {
		let counts = self.counts();
		info!(
			kind = %self.kind,
			complete = counts.complete,
			error = counts.error,
			ignore = counts.ignore,
			init = counts.init,
			pending = counts.pending,
			"tracker counts"
		);
		counts
	}

	/// Atomically replace the entire key map with a restored snapshot.
	pub fn restore(&self, snapshot: KeyDataMap) {
		let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
		*keys = snapshot;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;

	const MSG_COMPLETE: &str = "test message complete";
	const MSG_ERROR: &str = "test message error";
	const MSG_IGNORE: &str = "test message ignore";
	const MSG_PENDING: &str = "test message pending";

	fn children(names: &[&str]) -> Vec<String> {
		names.iter().map(|s| s.to_string()).collect()
	}

	#[test_log::test]
	fn test_key_code_to_state() {
		assert_eq!(key_code_to_state(KEY_CODE_COMPLETE), KEY_STATE_COMPLETE);
		assert_eq!(key_code_to_state(KEY_CODE_IGNORE), KEY_STATE_IGNORE);
		assert_eq!(key_code_to_state(KEY_CODE_INIT), KEY_STATE_INIT);
		assert_eq!(key_code_to_state(KEY_CODE_ERROR), KEY_STATE_ERROR);
		assert_eq!(key_code_to_state(KEY_CODE_PENDING), KEY_STATE_PENDING);
		// unknown codes map to the init label
		assert_eq!(key_code_to_state(123), KEY_STATE_INIT);
	}

	#[test_log::test]
	fn test_key_code_validate() {
		for code in KEY_CODE_INIT..=KEY_CODE_COMPLETE {
			assert!(key_code_validate(code).is_ok());
		}
		assert_eq!(
			key_code_validate(KEY_CODE_INIT - 1),
			Err(TrackerError::InvalidCode(KEY_CODE_INIT - 1))
		);
		assert_eq!(
			key_code_validate(KEY_CODE_COMPLETE + 1),
			Err(TrackerError::InvalidCode(KEY_CODE_COMPLETE + 1))
		);
	}

	#[test_log::test]
	fn test_new_key_data() {
		let before = timestamp_now();
		let data = KeyData::new(KEY_CODE_PENDING, MSG_PENDING, &[]).unwrap();
		let after = timestamp_now();
		assert_eq!(data.code, KEY_CODE_PENDING);
		assert_eq!(data.state, KEY_STATE_PENDING);
		assert_eq!(data.message, MSG_PENDING);
		assert!(data.timestamp_first >= before && data.timestamp_first <= after);
		assert_eq!(
			data.timestamp_first, data.timestamp_latest,
			"first and latest timestamps should match for a new record"
		);

		assert!(KeyData::new(KEY_CODE_INIT - 1, "", &[]).is_err());
		assert!(KeyData::new(KEY_CODE_COMPLETE + 1, "", &[]).is_err());
	}

	#[test_log::test]
	fn test_new_key_tracker() {
		for kind in [KIND_COMMIT, KIND_FILE, KIND_REQUEST_RESPONSE] {
			let tracker = KeyTracker::new(kind).unwrap();
			assert_eq!(tracker.kind(), kind);
			assert!(tracker.keys().is_empty());
		}
		assert_eq!(
			KeyTracker::new("InvalidKind").unwrap_err(),
			TrackerError::InvalidKind("InvalidKind".to_string())
		);
	}

	#[test_log::test]
	fn test_update_rejects_bad_inputs() {
		let tracker = KeyTracker::new(KIND_FILE).unwrap();
		assert_eq!(
			tracker.update("A", KEY_CODE_INIT - 1, "", &[]),
			Err(TrackerError::InvalidCode(KEY_CODE_INIT - 1))
		);
		assert_eq!(
			tracker.update("A", KEY_CODE_COMPLETE + 1, "", &[]),
			Err(TrackerError::InvalidCode(KEY_CODE_COMPLETE + 1))
		);
		assert_eq!(
			tracker.update("", KEY_CODE_COMPLETE, "", &[]),
			Err(TrackerError::KeyEmpty)
		);
		assert!(tracker.keys().is_empty());
	}

	#[test_log::test]
	fn test_update_progression() {
		let tracker = KeyTracker::new(KIND_FILE).unwrap();
		let steps = [
			(KEY_CODE_INIT, "", vec![], KEY_CODE_INIT),
			(KEY_CODE_ERROR, MSG_ERROR, vec![], KEY_CODE_ERROR),
			(KEY_CODE_IGNORE, MSG_IGNORE, vec![], KEY_CODE_IGNORE),
			(
				KEY_CODE_PENDING,
				MSG_PENDING,
				children(&["child1", "child2"]),
				KEY_CODE_PENDING,
			),
			(
				KEY_CODE_COMPLETE,
				MSG_COMPLETE,
				children(&["child1", "child2"]),
				KEY_CODE_COMPLETE,
			),
		];
		for (code, message, kids, expect) in steps {
			let got = tracker.update("A", code, message, &kids).unwrap();
			assert_eq!(got, expect);
		}

		let data = tracker.get("A").unwrap();
		assert_eq!(data.code, KEY_CODE_COMPLETE);
		assert_eq!(data.state, KEY_STATE_COMPLETE);
		assert_eq!(data.message, MSG_COMPLETE);
		assert!(data.children.values().all(|done| *done));
	}

	#[test_log::test]
	fn test_update_monotonic_complete() {
		let tracker = KeyTracker::new(KIND_FILE).unwrap();
		tracker
			.update("A", KEY_CODE_COMPLETE, MSG_COMPLETE, &[])
			.unwrap();

		// regressions are observed but not applied
		for code in [
			KEY_CODE_PENDING,
			KEY_CODE_IGNORE,
			KEY_CODE_ERROR,
			KEY_CODE_INIT,
		] {
			let got = tracker.update("A", code, "regression attempt", &[]).unwrap();
			assert_eq!(got, KEY_CODE_COMPLETE);
		}

		let data = tracker.get("A").unwrap();
		assert_eq!(data.code, KEY_CODE_COMPLETE);
		assert_eq!(data.message, MSG_COMPLETE, "message frozen at completion");
	}

	#[test_log::test]
	fn test_update_reinit_below_complete() {
		let tracker = KeyTracker::new(KIND_COMMIT).unwrap();
		tracker.update("A", KEY_CODE_ERROR, MSG_ERROR, &[]).unwrap();
		// re-INIT below COMPLETE is allowed; this is the resume path
		let got = tracker.update("A", KEY_CODE_INIT, "", &[]).unwrap();
		assert_eq!(got, KEY_CODE_INIT);
		assert_eq!(tracker.get("A").unwrap().code, KEY_CODE_INIT);
	}

	#[test_log::test]
	fn test_update_demotes_complete_with_outstanding_children() {
		let tracker = KeyTracker::new(KIND_FILE).unwrap();
		tracker
			.update("F", KEY_CODE_PENDING, MSG_PENDING, &children(&["r1", "r2"]))
			.unwrap();

		// only r1 done: held at pending, message still updated
		let got = tracker
			.update("F", KEY_CODE_COMPLETE, "partial update", &children(&["r1"]))
			.unwrap();
		assert_eq!(got, KEY_CODE_PENDING);
		let data = tracker.get("F").unwrap();
		assert_eq!(data.state, KEY_STATE_PENDING);
		assert_eq!(data.message, "partial update");
		assert_eq!(data.children["r1"], true);
		assert_eq!(data.children["r2"], false);

		// r2 done: promotion to complete
		let got = tracker
			.update("F", KEY_CODE_COMPLETE, "", &children(&["r2"]))
			.unwrap();
		assert_eq!(got, KEY_CODE_COMPLETE);
		let data = tracker.get("F").unwrap();
		assert!(data.children.values().all(|done| *done));
	}

	#[test_log::test]
	fn test_update_repeat_pending_accumulates_children() {
		let tracker = KeyTracker::new(KIND_FILE).unwrap();
		for i in 1..=10 {
			let got = tracker
				.update("F", KEY_CODE_PENDING, MSG_PENDING, &[format!("child{i}")])
				.unwrap();
			assert_eq!(got, KEY_CODE_PENDING);
		}
		let data = tracker.get("F").unwrap();
		assert_eq!(data.children.len(), 10);
		assert!(data.children.values().all(|done| !*done));
	}

	#[test_log::test]
	fn test_update_complete_marks_named_children() {
		let tracker = KeyTracker::new(KIND_FILE).unwrap();
		for i in 1..=10 {
			let got = tracker
				.update("F", KEY_CODE_COMPLETE, MSG_COMPLETE, &[format!("child{i}")])
				.unwrap();
			assert_eq!(got, KEY_CODE_COMPLETE);
		}
		let data = tracker.get("F").unwrap();
		assert_eq!(data.children.len(), 10);
		assert!(data.children.values().all(|done| *done));
	}

	#[test_log::test]
	fn test_check_all_complete() {
		let cases: &[(&[(&str, &[i32])], bool)] = &[
			(&[("A", &[KEY_CODE_INIT])], false),
			(&[("A", &[KEY_CODE_PENDING])], false),
			(&[("A", &[KEY_CODE_COMPLETE])], true),
			(&[("A", &[KEY_CODE_ERROR])], true),
			(&[("A", &[KEY_CODE_IGNORE])], true),
			(
				&[
					("A", &[KEY_CODE_INIT]),
					("B", &[KEY_CODE_INIT, KEY_CODE_ERROR, KEY_CODE_INIT]),
					("C", &[KEY_CODE_IGNORE]),
					("D", &[KEY_CODE_INIT, KEY_CODE_PENDING, KEY_CODE_ERROR]),
					("E", &[KEY_CODE_INIT, KEY_CODE_ERROR, KEY_CODE_COMPLETE]),
				],
				false,
			),
			(
				&[(
					"A",
					&[
						KEY_CODE_INIT,
						KEY_CODE_ERROR,
						KEY_CODE_IGNORE,
						KEY_CODE_PENDING,
						KEY_CODE_COMPLETE,
					],
				)],
				true,
			),
			(
				// completion is monotonic, so the reversed sequence also ends complete
				&[(
					"A",
					&[
						KEY_CODE_COMPLETE,
						KEY_CODE_PENDING,
						KEY_CODE_IGNORE,
						KEY_CODE_ERROR,
						KEY_CODE_INIT,
					],
				)],
				true,
			),
		];

		for (data, expect) in cases {
			let tracker = KeyTracker::new(KIND_COMMIT).unwrap();
			for (key, codes) in *data {
				for code in *codes {
					tracker.update(key, *code, "", &[]).unwrap();
				}
			}
			assert_eq!(tracker.check_all_complete(), *expect);
		}

		// empty tracker is complete by vacuity
		let tracker = KeyTracker::new(KIND_COMMIT).unwrap();
		assert!(tracker.check_all_complete());
	}

	#[test_log::test]
	fn test_counts() {
		let tracker = KeyTracker::new(KIND_FILE).unwrap();
		tracker.update("A", KEY_CODE_INIT, "", &[]).unwrap();
		tracker.update("B", KEY_CODE_ERROR, MSG_ERROR, &[]).unwrap();
		tracker.update("C", KEY_CODE_IGNORE, MSG_IGNORE, &[]).unwrap();
		tracker.update("D", KEY_CODE_PENDING, MSG_PENDING, &[]).unwrap();
		tracker
			.update("E", KEY_CODE_COMPLETE, MSG_COMPLETE, &[])
			.unwrap();

		let counts = tracker.log_counts();
		assert_eq!(
			counts,
			KeyDataCounts {
				complete: 1,
				error: 1,
				ignore: 1,
				init: 1,
				pending: 1,
			}
		);
	}

	#[test_log::test]
	fn test_get_and_snapshots() {
		let tracker = KeyTracker::new(KIND_FILE).unwrap();
		tracker.update("key1", KEY_CODE_INIT, "", &[]).unwrap();
		tracker
			.update("key2", KEY_CODE_COMPLETE, MSG_COMPLETE, &[])
			.unwrap();
		tracker.update("key3", KEY_CODE_ERROR, MSG_ERROR, &[]).unwrap();

		assert!(tracker.get("key1").is_some());
		assert!(tracker.get("nonexistent").is_none());
		assert!(tracker.get("").is_none());

		let mut keys = tracker.keys();
		keys.sort();
		assert_eq!(keys, vec!["key1", "key2", "key3"]);

		let all = tracker.keys_data();
		assert_eq!(all.len(), 3);

		let errors = tracker.keys_data_for_code(KEY_CODE_ERROR).unwrap();
		assert_eq!(errors.len(), 1);
		assert_eq!(errors["key3"].message, MSG_ERROR);

		assert!(tracker.keys_data_for_code(KEY_CODE_INIT - 1).is_err());
		assert!(tracker.keys_data_for_code(KEY_CODE_COMPLETE + 1).is_err());
	}

	#[test_log::test]
	fn test_restore_replaces_map() {
		let source = KeyTracker::new(KIND_FILE).unwrap();
		source.update("A", KEY_CODE_COMPLETE, MSG_COMPLETE, &[]).unwrap();
		source
			.update("B", KEY_CODE_PENDING, MSG_PENDING, &children(&["r1"]))
			.unwrap();

		let target = KeyTracker::new(KIND_FILE).unwrap();
		// pre-existing data must be overwritten by the restore
		target.update("C", KEY_CODE_COMPLETE, "", &[]).unwrap();

		let snapshot = source.keys_data();
		target.restore(snapshot.clone());
		assert_eq!(target.keys_data(), snapshot);
		assert!(target.get("C").is_none());
	}

	#[test_log::test]
	fn test_snapshot_restore_round_trip() {
		let tracker = KeyTracker::new(KIND_REQUEST_RESPONSE).unwrap();
		tracker.update("A", KEY_CODE_PENDING, "", &children(&["x"])).unwrap();
		tracker.update("B", KEY_CODE_COMPLETE, "", &[]).unwrap();

		let snapshot = tracker.keys_data();
		let restored = KeyTracker::new(KIND_REQUEST_RESPONSE).unwrap();
		restored.restore(snapshot);
		assert_eq!(restored.keys_data(), tracker.keys_data());
	}

	#[test_log::test]
	fn test_key_data_wire_shape() {
		let mut data = KeyData::new(KEY_CODE_PENDING, MSG_PENDING, &children(&["r1"])).unwrap();
		data.timestamp_first = 1;
		data.timestamp_latest = 2;

		let json = serde_json::to_value(&data).unwrap();
		assert_eq!(json["code"], 1);
		assert_eq!(json["state"], "pending");
		assert_eq!(json["message"], MSG_PENDING);
		assert_eq!(json["children"]["r1"], false);
		assert_eq!(json["timestamp_first"], 1);
		assert_eq!(json["timestamp_latest"], 2);

		let back: KeyData = serde_json::from_value(json).unwrap();
		assert_eq!(back, data);
	}

	#[test_log::test]
	fn test_concurrent_updates_converge() {
		let tracker = Arc::new(KeyTracker::new(KIND_FILE).unwrap());

		let handles: Vec<_> = (1..=30)
			.map(|i| {
				let tracker = Arc::clone(&tracker);
				std::thread::spawn(move || {
					let got = tracker
						.update(
							"K",
							KEY_CODE_COMPLETE,
							MSG_COMPLETE,
							&[format!("child{i}")],
						)
						.unwrap();
					assert_eq!(got, KEY_CODE_COMPLETE);
				})
			})
			.collect();
		for handle in handles {
			handle.join().unwrap();
		}

		let data = tracker.get("K").unwrap();
		assert_eq!(data.code, KEY_CODE_COMPLETE);
		assert_eq!(data.message, MSG_COMPLETE);
		assert_eq!(data.children.len(), 30);
		assert!(data.children.values().all(|done| *done));
	}

	#[test_log::test]
	fn test_concurrent_pending_updates_lose_nothing() {
		let tracker = Arc::new(KeyTracker::new(KIND_FILE).unwrap());

		let handles: Vec<_> = (1..=30)
			.map(|i| {
				let tracker = Arc::clone(&tracker);
				std::thread::spawn(move || {
					let got = tracker
						.update("K", KEY_CODE_PENDING, MSG_PENDING, &[format!("child{i}")])
						.unwrap();
					assert_eq!(got, KEY_CODE_PENDING);
				})
			})
			.collect();
		for handle in handles {
			handle.join().unwrap();
		}

		let data = tracker.get("K").unwrap();
		assert_eq!(data.code, KEY_CODE_PENDING);
		assert_eq!(data.children.len(), 30);
		assert!(data.children.values().all(|done| !*done));
	}
}
