//! Cache module for synthesized speech.
//!
//! Provides LRU-based caching of speech clips.

pub mod clips;

// Re-export commonly used types
pub use clips::ClipCache;
