//! Speech clip cache with LRU eviction.
//!
//! Provides in-memory lookup of synthesized clips by their deterministic
//! clip_id, so repeated identical requests reuse the WAV already on disk.

use std::collections::HashMap;
use std::time::Instant;

use crate::types::Clip;

/// Maximum number of clips to keep in cache.
const DEFAULT_MAX_ENTRIES: usize = 100;

/// Clip cache with LRU eviction policy.
pub struct ClipCache {
    /// Clips indexed by clip_id.
    clips: HashMap<String, CacheEntry>,
    /// Maximum number of entries to keep.
    max_entries: usize,
}

/// A cached clip with access timestamp.
struct CacheEntry {
    clip: Clip,
    last_accessed: Instant,
}

impl ClipCache {
    /// Creates a new cache with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Creates a new cache with specified capacity.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            clips: HashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Returns a clip by ID, updating its access time.
    ///
    /// Entries whose file has been deleted are dropped and reported as misses.
    pub fn get(&mut self, clip_id: &str) -> Option<&Clip> {
        let stale = self.clips.get(clip_id).map(|e| !e.clip.exists())?;
        if stale {
            self.clips.remove(clip_id);
            return None;
        }

        let entry = self.clips.get_mut(clip_id)?;
        entry.last_accessed = Instant::now();
        Some(&entry.clip)
    }

    /// Inserts a clip into the cache.
    ///
    /// If the cache is full, the least recently used entry is evicted first.
    pub fn put(&mut self, clip: Clip) {
        if self.clips.len() >= self.max_entries && !self.clips.contains_key(&clip.clip_id) {
            self.evict_lru();
        }

        self.clips.insert(
            clip.clip_id.clone(),
            CacheEntry {
                clip,
                last_accessed: Instant::now(),
            },
        );
    }

    /// Checks if a clip ID exists in the cache.
    pub fn contains(&self, clip_id: &str) -> bool {
        self.clips.contains_key(clip_id)
    }

    /// Returns the number of clips in the cache.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Evicts the least recently used entry.
    ///
    /// Returns the evicted clip if any. The file on disk is left alone.
    pub fn evict_lru(&mut self) -> Option<Clip> {
        let oldest_key = self
            .clips
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(k, _)| k.clone())?;

        self.clips.remove(&oldest_key).map(|entry| entry.clip)
    }
}

impl Default for ClipCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::thread;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn make_clip(dir: &Path, id: &str) -> Clip {
        let path = dir.join(format!("{}.wav", id));
        std::fs::write(&path, b"RIFF").unwrap();
        Clip {
            clip_id: id.to_string(),
            path,
            text: "test text".to_string(),
            voice: "Kore".to_string(),
            sample_rate: 24000,
            duration_sec: 1.0,
            model: "tts".to_string(),
            created_at: SystemTime::now(),
        }
    }

    #[test]
    fn new_cache_is_empty() {
        let cache = ClipCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn put_and_get() {
        let dir = tempdir().unwrap();
        let mut cache = ClipCache::new();
        cache.put(make_clip(dir.path(), "abc123"));

        assert!(cache.contains("abc123"));
        assert_eq!(cache.get("abc123").unwrap().clip_id, "abc123");
        assert!(cache.get("nonexistent").is_none());
    }

    #[test]
    fn deleted_file_is_a_miss() {
        let dir = tempdir().unwrap();
        let mut cache = ClipCache::new();
        let clip = make_clip(dir.path(), "gone");
        std::fs::remove_file(&clip.path).unwrap();
        cache.put(clip);

        assert!(cache.get("gone").is_none());
        assert!(!cache.contains("gone"));
    }

    #[test]
    fn evict_lru_removes_oldest() {
        let dir = tempdir().unwrap();
        let mut cache = ClipCache::with_capacity(2);

        cache.put(make_clip(dir.path(), "first"));
        thread::sleep(Duration::from_millis(10));
        cache.put(make_clip(dir.path(), "second"));

        // Touch first so second becomes least recent
        cache.get("first");
        thread::sleep(Duration::from_millis(10));

        cache.put(make_clip(dir.path(), "third"));

        assert!(cache.contains("first"));
        assert!(!cache.contains("second"));
        assert!(cache.contains("third"));
    }
}
