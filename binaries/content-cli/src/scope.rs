use anyhow::{Context, Result, bail};
use lesson_cache_keys::InvalidationScope;
use uuid::Uuid;

/// Parses `topics`, `every-topic`, `counts`, `all` or `<kind>:<uuid>` where kind is one of
/// `topic`, `lessons`, `lesson` and `progress`.
pub fn parse_scope(raw: &str) -> Result<InvalidationScope> {
    let (kind, id) = match raw.split_once(':') {
        Some((kind, id)) => (kind, Some(id)),
        None => (raw, None),
    };

    let id = || -> Result<Uuid> {
        let id = id.with_context(|| format!("scope `{kind}` needs an id"))?;
        Uuid::parse_str(id).with_context(|| format!("invalid id `{id}`"))
    };

    Ok(match kind {
        "topics" => InvalidationScope::AllTopics,
        "every-topic" => InvalidationScope::EveryTopic,
        "counts" => InvalidationScope::LessonCounts,
        "all" => InvalidationScope::Everything,
        "topic" => InvalidationScope::Topic(id()?),
        "lessons" => InvalidationScope::Lessons(id()?),
        "lesson" => InvalidationScope::Lesson(id()?),
        "progress" => InvalidationScope::UserProgress(id()?),
        other => bail!("unknown scope `{other}`"),
    })
}
