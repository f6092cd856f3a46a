//! Configuration recognized by the scanning core.

use std::path::PathBuf;
use std::time::Duration;

/// Allowed file extensions when none are configured.
pub const DEFAULT_SCAN_FILE_EXTENSIONS: &[&str] = &[
	".c", ".cc", ".cfg", ".conf", ".cpp", ".cs", ".css", ".csv", ".go", ".h", ".hpp", ".html",
	".ini", ".java", ".js", ".json", ".jsx", ".kt", ".md", ".php", ".pl", ".properties", ".py",
	".rb", ".rs", ".scala", ".sh", ".sql", ".swift", ".toml", ".ts", ".tsx", ".tsv", ".txt",
	".xml", ".yaml", ".yml",
];

/// Maximum characters per detection request when not configured.
pub const DEFAULT_MAX_REQUEST_CHUNK_SIZE: usize = 5120;

/// Progress-tracking cadence when not configured.
pub const DEFAULT_SCAN_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Checkpoint cadence when not configured: twice the scan refresh interval.
pub const DEFAULT_CHECKPOINT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Settings consumed by [`crate::scanner::Scanner`] and the walker.
#[derive(Debug, Clone)]
pub struct ScanConfig {
	/// Base directory for checkpoints (and clone working trees, which are
	/// managed outside this crate)
	pub work_dir: PathBuf,
	/// File extensions eligible for scanning
	pub extensions: Vec<String>,
	/// File extensions skipped regardless of the allowed list
	pub ignore_extensions: Vec<String>,
	/// Maximum characters per detection request
	pub max_request_chunk_size: usize,
	/// Cadence of the progress tracker and reconciler
	pub scan_refresh_interval: Duration,
	/// Cadence of the checkpoint ticker
	pub checkpoint_refresh_interval: Duration,
	/// Capacity of the bounded internal queues; provides backpressure from
	/// the detector back to the walker
	pub channel_capacity: usize,
}

impl Default for ScanConfig {
	fn default() -> Self {
		Self {
			work_dir: std::env::temp_dir().join("phi-scan"),
			extensions: DEFAULT_SCAN_FILE_EXTENSIONS
				.iter()
				.map(|s| s.to_string())
				.collect(),
			ignore_extensions: Vec::new(),
			max_request_chunk_size: DEFAULT_MAX_REQUEST_CHUNK_SIZE,
			scan_refresh_interval: DEFAULT_SCAN_REFRESH_INTERVAL,
			checkpoint_refresh_interval: DEFAULT_CHECKPOINT_REFRESH_INTERVAL,
			channel_capacity: 64,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config() {
		let config = ScanConfig::default();
		assert!(config.extensions.iter().any(|e| e == ".txt"));
		assert!(config.ignore_extensions.is_empty());
		assert_eq!(config.max_request_chunk_size, DEFAULT_MAX_REQUEST_CHUNK_SIZE);
		assert_eq!(
			config.checkpoint_refresh_interval,
			config.scan_refresh_interval * 2
		);
		assert!(config.channel_capacity > 0);
	}
}
