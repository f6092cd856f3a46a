//! File ignore policy: decides whether a file object is scanned or skipped.
//!
//! Rules are evaluated strictly in order; the first matching rule wins and
//! supplies the typed reason recorded against the file's tracker entry.

use crate::repo::FileObject;

pub const IGNORE_REASON_DIR_PATH: &str = "directory_path";
pub const IGNORE_REASON_FILE_EXTENSION_IGNORED_BY_CONFIG: &str =
	"file_extension_ignored_by_config";
pub const IGNORE_REASON_FILE_EXTENSION_IGNORED_BY_POLICY: &str =
	"file_extension_ignored_by_policy";
pub const IGNORE_REASON_FILE_EXTENSION_NOT_INCLUDED: &str = "file_extension_not_included";
pub const IGNORE_REASON_FILE_IS_BINARY: &str = "file_is_binary";
pub const IGNORE_REASON_FILE_IS_EMPTY: &str = "file_is_empty";
pub const IGNORE_REASON_FILE_NAME: &str = "file_name";
pub const IGNORE_REASON_FILE_OBJECT_POINTER_NIL: &str = "file_object_pointer_nil";
pub const IGNORE_REASON_FILE_PATH: &str = "file_path";

/// Directory prefixes never scanned regardless of configuration.
const IGNORED_DIR_PREFIXES: &[&str] = &["vendor/", "node_modules/", "third_party/"];

/// Exact paths (or path roots) never scanned.
const IGNORED_PATHS: &[&str] = &[".git"];

/// Base file names never scanned.
const IGNORED_FILE_NAMES: &[&str] = &[".gitignore", ".gitattributes", ".gitmodules", "LOCK"];

/// Extensions refused by built-in policy: binary and media formats that never
/// contain scannable text.
const POLICY_IGNORED_EXTENSIONS: &[&str] = &[
	".7z", ".avi", ".bin", ".bmp", ".class", ".dll", ".ear", ".exe", ".gif", ".gz", ".ico",
	".jar", ".jpeg", ".jpg", ".mov", ".mp3", ".mp4", ".mpeg", ".o", ".pdf", ".png", ".so",
	".tar", ".tgz", ".tif", ".tiff", ".war", ".wav", ".webm", ".webp", ".woff", ".woff2",
	".zip",
];

// window examined by the binary content sniff
const BINARY_SNIFF_WINDOW: usize = 8000;

/// Decide whether `file` should be skipped, and why.
///
/// Rule order: missing object, empty file, ignored path rules, extension
/// ignored by config, extension ignored by policy, extension not included,
/// binary content sniff.
pub fn ignore_file_object(
	file: Option<&FileObject>,
	allowed_extensions: &[String],
	ignored_extensions: &[String],
) -> (bool, &'static str) {
	let file = match file {
		Some(file) => file,
		None => return (true, IGNORE_REASON_FILE_OBJECT_POINTER_NIL),
	};

	if file.size == 0 {
		return (true, IGNORE_REASON_FILE_IS_EMPTY);
	}

	let (ignore, reason) = ignore_file_path(&file.name);
	if ignore {
		return (ignore, reason);
	}

	let extension = file.extension().unwrap_or_default();
	if ignored_extensions.iter().any(|e| *e == extension) {
		return (true, IGNORE_REASON_FILE_EXTENSION_IGNORED_BY_CONFIG);
	}
	if POLICY_IGNORED_EXTENSIONS.contains(&extension.as_str()) {
		return (true, IGNORE_REASON_FILE_EXTENSION_IGNORED_BY_POLICY);
	}
	if !allowed_extensions.iter().any(|e| *e == extension) {
		return (true, IGNORE_REASON_FILE_EXTENSION_NOT_INCLUDED);
	}

	if is_binary(file.bytes()) {
		return (true, IGNORE_REASON_FILE_IS_BINARY);
	}

	(false, "")
}

/// Path-level ignore rules: ignored directory prefixes, ignored exact paths,
/// and ignored base names.
pub fn ignore_file_path(path: &str) -> (bool, &'static str) {
	for prefix in IGNORED_DIR_PREFIXES {
		if path.starts_with(prefix) {
			return (true, IGNORE_REASON_DIR_PATH);
		}
	}

	for ignored in IGNORED_PATHS {
		if path == *ignored || path.starts_with(&format!("{ignored}/")) {
			return (true, IGNORE_REASON_FILE_PATH);
		}
	}

	let base = path.rsplit('/').next().unwrap_or(path);
	if IGNORED_FILE_NAMES.contains(&base) {
		return (true, IGNORE_REASON_FILE_NAME);
	}

	(false, "")
}

// Git's text heuristic: a NUL byte in the leading window marks the content
// binary.
fn is_binary(bytes: &[u8]) -> bool {
	let window = &bytes[..bytes.len().min(BINARY_SNIFF_WINDOW)];
	window.contains(&0)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn allowed() -> Vec<String> {
		vec![".go".to_string(), ".json".to_string(), ".txt".to_string()]
	}

	fn file(name: &str, bytes: &[u8]) -> FileObject {
		FileObject::new("object-id", name, bytes.to_vec())
	}

	#[test_log::test]
	fn test_ignore_missing_file_object() {
		let (ignore, reason) = ignore_file_object(None, &allowed(), &[]);
		assert!(ignore);
		assert_eq!(reason, IGNORE_REASON_FILE_OBJECT_POINTER_NIL);
	}

	#[test_log::test]
	fn test_ignore_empty_file() {
		let f = file("a.json", b"");
		let (ignore, reason) = ignore_file_object(Some(&f), &allowed(), &[]);
		assert!(ignore);
		assert_eq!(reason, IGNORE_REASON_FILE_IS_EMPTY);
	}

	#[test_log::test]
	fn test_ignore_extension_by_config() {
		let f = file("test.json", b"FOO");
		let ignored = vec![".json".to_string()];
		let (ignore, reason) = ignore_file_object(Some(&f), &allowed(), &ignored);
		assert!(ignore);
		assert_eq!(reason, IGNORE_REASON_FILE_EXTENSION_IGNORED_BY_CONFIG);
	}

	#[test_log::test]
	fn test_ignore_extension_by_policy() {
		let f = file("test.png", b"FOO");
		let (ignore, reason) = ignore_file_object(Some(&f), &allowed(), &[]);
		assert!(ignore);
		assert_eq!(reason, IGNORE_REASON_FILE_EXTENSION_IGNORED_BY_POLICY);
	}

	#[test_log::test]
	fn test_ignore_extension_not_included() {
		let f = file("test.random_extension_not_included", b"FOO");
		let (ignore, reason) = ignore_file_object(Some(&f), &allowed(), &[]);
		assert!(ignore);
		assert_eq!(reason, IGNORE_REASON_FILE_EXTENSION_NOT_INCLUDED);
	}

	#[test_log::test]
	fn test_ignore_vendor_directory() {
		let f = file("vendor/foo.go", b"package main\n");
		let (ignore, reason) = ignore_file_object(Some(&f), &allowed(), &[]);
		assert!(ignore);
		assert_eq!(reason, IGNORE_REASON_DIR_PATH);
	}

	#[test_log::test]
	fn test_ignore_file_name() {
		let f = file(".gitignore", b"*.class\n");
		let (ignore, reason) = ignore_file_object(Some(&f), &allowed(), &[]);
		assert!(ignore);
		assert_eq!(reason, IGNORE_REASON_FILE_NAME);
	}

	#[test_log::test]
	fn test_ignore_binary_content() {
		let mut bytes = b"text with a hole ".to_vec();
		bytes.push(0);
		bytes.extend_from_slice(b" more");
		let f = file("blob.txt", &bytes);
		let (ignore, reason) = ignore_file_object(Some(&f), &allowed(), &[]);
		assert!(ignore);
		assert_eq!(reason, IGNORE_REASON_FILE_IS_BINARY);
	}

	#[test_log::test]
	fn test_scannable_file_passes() {
		let f = file("json/short.json", b"{\"glossary\": {}}");
		let (ignore, reason) = ignore_file_object(Some(&f), &allowed(), &[]);
		assert!(!ignore);
		assert_eq!(reason, "");
	}

	#[test_log::test]
	fn test_rule_order_empty_before_extension() {
		// empty wins over the extension rules even for a denied extension
		let f = file("a.png", b"");
		let (ignore, reason) = ignore_file_object(Some(&f), &allowed(), &[]);
		assert!(ignore);
		assert_eq!(reason, IGNORE_REASON_FILE_IS_EMPTY);
	}

	#[test_log::test]
	fn test_ignore_file_path_rules() {
		let cases = [
			("/full/path/to/file.txt", false, ""),
			("relative/path/to/file.txt", false, ""),
			("LOCK", true, IGNORE_REASON_FILE_NAME),
			("vendor/path/to/ignored_file.txt", true, IGNORE_REASON_DIR_PATH),
			(".git", true, IGNORE_REASON_FILE_PATH),
			(".git/config", true, IGNORE_REASON_FILE_PATH),
			("node_modules/pkg/index.js", true, IGNORE_REASON_DIR_PATH),
		];
		for (path, expect_ignore, expect_reason) in cases {
			let (ignore, reason) = ignore_file_path(path);
			assert_eq!(ignore, expect_ignore, "path {path}");
			assert_eq!(reason, expect_reason, "path {path}");
		}
	}
}
