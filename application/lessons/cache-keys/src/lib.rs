use std::{borrow::Cow, hash::Hasher};

use fnv::FnvHasher;
use serde::Deserialize;
use tiered_cache::{CacheKey, TtlPolicy, cache_key};
use uuid::Uuid;

cache_key!(TopicsCacheKey => "topics"[difficulty: Option<String>, language: String, viewer: String]);
cache_key!(TopicCacheKey => "topic"[topic_id: String, viewer: String]);
cache_key!(LessonsCacheKey => "lessons"[topic_id: String, published_only: bool]);
cache_key!(LessonCacheKey => "lesson"[lesson_id: String]);
cache_key!(LessonCountsCacheKey => "lesson_counts"[topic_ids_hash: String]);
cache_key!(TopicProgressCacheKey => "progress"[user_id: String, topic_ids_hash: String]);

const ANONYMOUS: &str = "anon";

/// Key segment for whoever the cached view was decorated for.
pub fn viewer_segment(user_id: Option<Uuid>) -> String {
    user_id.map_or_else(|| ANONYMOUS.to_string(), |id| id.to_string())
}

impl TopicsCacheKey {
    pub fn new(
        difficulty: Option<&str>, language: &str, user_id: Option<Uuid>,
    ) -> Self {
        Self {
            difficulty: difficulty.map(str::to_lowercase),
            language: language.to_string(),
            viewer: viewer_segment(user_id),
        }
    }
}

impl TopicCacheKey {
    pub fn new(topic_id: Uuid, user_id: Option<Uuid>) -> Self {
        Self {
            topic_id: topic_id.to_string(),
            viewer: viewer_segment(user_id),
        }
    }
}

impl LessonsCacheKey {
    pub fn new(topic_id: Uuid, published_only: bool) -> Self {
        Self {
            topic_id: topic_id.to_string(),
            published_only,
        }
    }
}

impl LessonCacheKey {
    pub fn new(lesson_id: Uuid) -> Self {
        Self {
            lesson_id: lesson_id.to_string(),
        }
    }
}

impl LessonCountsCacheKey {
    pub fn new(topic_ids: &[Uuid]) -> Self {
        Self {
            topic_ids_hash: topic_ids_hash(topic_ids),
        }
    }
}

impl TopicProgressCacheKey {
    pub fn new(user_id: Uuid, topic_ids: &[Uuid]) -> Self {
        Self {
            user_id: user_id.to_string(),
            topic_ids_hash: topic_ids_hash(topic_ids),
        }
    }
}

/// FNV-1a over the sorted, de-duplicated ids joined by `,`, in hex.
///
/// Identical id sets hash identically whatever the input order.
pub fn topic_ids_hash(topic_ids: &[Uuid]) -> String {
    let mut ids: Vec<Uuid> = topic_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let joined = ids
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let mut hasher = FnvHasher::default();
    hasher.write(joined.as_bytes());
    format!("{:016x}", hasher.finish())
}

/// A group of cached views dropped together after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationScope {
    AllTopics,
    /// Every single-topic view. A topic's lock depends on its siblings,
    /// so progress or count changes reach beyond the touched topic.
    EveryTopic,
    Topic(Uuid),
    Lessons(Uuid),
    Lesson(Uuid),
    LessonCounts,
    UserProgress(Uuid),
    Everything,
}

impl InvalidationScope {
    /// Key prefix covered by the scope; `None` means every key.
    pub fn prefix(&self) -> Option<Cow<'static, str>> {
        match self {
            Self::AllTopics => Some(format!("{}_", TopicsCacheKey::PREFIX).into()),
            Self::EveryTopic => Some(format!("{}_", TopicCacheKey::PREFIX).into()),
            Self::Topic(id) => Some(format!("{}_{id}", TopicCacheKey::PREFIX).into()),
            Self::Lessons(topic_id) => {
                Some(format!("{}_{topic_id}_", LessonsCacheKey::PREFIX).into())
            }
            Self::Lesson(id) => Some(format!("{}_{id}", LessonCacheKey::PREFIX).into()),
            Self::LessonCounts => {
                Some(format!("{}_", LessonCountsCacheKey::PREFIX).into())
            }
            Self::UserProgress(user_id) => Some(
                format!("{}_{user_id}_", TopicProgressCacheKey::PREFIX).into(),
            ),
            Self::Everything => None,
        }
    }
}

/// Memory and persistent TTLs per cached resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CachePolicies {
    #[serde(default = "topics_default")]
    pub topics: TtlPolicy,
    #[serde(default = "lessons_default")]
    pub lessons: TtlPolicy,
    #[serde(default = "lesson_counts_default")]
    pub lesson_counts: TtlPolicy,
    #[serde(default = "topic_progress_default")]
    pub topic_progress: TtlPolicy,
    #[serde(default = "topic_default")]
    pub topic: TtlPolicy,
}

fn topics_default() -> TtlPolicy { TtlPolicy::from_secs(300, 30) }
fn lessons_default() -> TtlPolicy { TtlPolicy::from_secs(600, 3600) }
fn lesson_counts_default() -> TtlPolicy { TtlPolicy::from_secs(600, 3600) }
fn topic_progress_default() -> TtlPolicy { TtlPolicy::from_secs(120, 30) }
fn topic_default() -> TtlPolicy { TtlPolicy::from_secs(300, 60) }

impl Default for CachePolicies {
    fn default() -> Self {
        Self {
            topics: topics_default(),
            lessons: lessons_default(),
            lesson_counts: lesson_counts_default(),
            topic_progress: topic_progress_default(),
            topic: topic_default(),
        }
    }
}
