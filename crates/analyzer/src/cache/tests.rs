use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weave_registry::fingerprint::hash_bytes;

use super::*;

struct Fixture {
	dir: TempDir,
}

impl Fixture {
	fn new() -> Self {
		let dir = tempfile::tempdir().expect("tempdir");
		fs::write(dir.path().join("Cargo.lock"), "version = 4\n").expect("lock file");
		Self { dir }
	}

	fn cache(&self) -> DirtyCache {
		DirtyCache::new(self.cache_file(), self.lock_file())
	}

	fn cache_file(&self) -> PathBuf {
		self.dir.path().join("state").join(CACHE_FILE_NAME)
	}

	fn lock_file(&self) -> PathBuf {
		self.dir.path().join("Cargo.lock")
	}

	fn stored(&self) -> Vec<String> {
		let bytes = fs::read(self.cache_file()).expect("cache file");
		serde_json::from_slice(&bytes).expect("cache json")
	}
}

/// A fresh fingerprint is dirty once, then clean.
#[test]
fn test_first_check_is_dirty_second_is_clean() {
	let fx = Fixture::new();
	let mut cache = fx.cache();

	assert!(cache.is_dirty("abc"));
	assert!(!cache.is_dirty("abc"));

	let indicator = hash_bytes("version = 4\n");
	assert_eq!(fx.stored(), vec![indicator, "abc".to_string()]);
}

/// The file outlives the in-memory cache.
#[test]
fn test_state_survives_reopen() {
	let fx = Fixture::new();
	assert!(fx.cache().is_dirty("abc"));

	let mut reopened = fx.cache();
	assert!(!reopened.is_dirty("abc"));
	assert!(reopened.is_dirty("def"));
}

/// Changing the lock artifact forgets every fingerprint.
#[test]
fn test_lock_change_flushes() {
	let fx = Fixture::new();
	let mut cache = fx.cache();
	assert!(cache.is_dirty("abc"));

	fs::write(fx.lock_file(), "version = 4\n# bumped\n").expect("rewrite lock");

	assert!(cache.is_dirty("abc"));
	assert_eq!(fx.stored().len(), 2);
	assert_eq!(fx.stored()[0], hash_bytes("version = 4\n# bumped\n"));
}

/// No lock artifact: always dirty and the cache file is never created.
#[test]
fn test_missing_lock_is_dirty_without_storage() {
	let fx = Fixture::new();
	fs::remove_file(fx.lock_file()).expect("remove lock");
	let mut cache = fx.cache();

	assert!(cache.is_dirty("abc"));
	assert!(cache.is_dirty("abc"));
	assert!(!fx.cache_file().exists());
	assert!(!cache.is_degraded());
}

#[test]
fn test_corrupt_file_is_discarded() {
	let fx = Fixture::new();
	fs::create_dir_all(fx.cache_file().parent().unwrap()).unwrap();
	fs::write(fx.cache_file(), "{not json").unwrap();
	let mut cache = fx.cache();

	assert!(cache.is_dirty("abc"));
	assert!(!cache.is_dirty("abc"));
	assert!(!cache.is_degraded());
}

/// An unwritable location degrades to always-dirty instead of failing.
#[test]
fn test_write_fault_degrades() {
	let fx = Fixture::new();
	// A regular file where the cache directory should be.
	let blocker = fx.dir.path().join("blocked");
	fs::write(&blocker, "").unwrap();
	let mut cache = DirtyCache::new(blocker.join(CACHE_FILE_NAME), fx.lock_file());

	assert!(cache.is_dirty("abc"));
	assert!(cache.is_degraded());
	assert!(cache.is_dirty("abc"));
}

#[test]
fn test_forget_makes_fingerprint_dirty_again() {
	let fx = Fixture::new();
	let mut cache = fx.cache();
	assert!(cache.is_dirty("abc"));
	assert!(cache.contains("abc").unwrap());

	cache.forget("abc").unwrap();

	assert!(!cache.contains("abc").unwrap());
	assert!(cache.is_dirty("abc"));
}

#[test]
fn test_flush_removes_file() {
	let fx = Fixture::new();
	let mut cache = fx.cache();
	assert!(cache.is_dirty("abc"));

	cache.flush().unwrap();

	assert!(!fx.cache_file().exists());
	assert!(!cache.contains("abc").unwrap());
	assert_eq!(cache.path(), fx.cache_file().as_path());
}

#[test]
fn test_default_cache_file_is_under_temp() {
	let path = default_cache_file();
	assert!(path.starts_with(std::env::temp_dir()));
	assert!(path.ends_with(CACHE_FILE_NAME));
}
