//! Optional memoization in front of the chat API

pub mod answer_cache;

pub use answer_cache::{AnswerCache, CacheStats, CachedAnswer, CachingLlm};
