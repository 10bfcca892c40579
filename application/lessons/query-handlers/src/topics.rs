use lesson_cache_keys::{TopicCacheKey, TopicsCacheKey};
use lesson_errors::LessonResult;
use lesson_models::{
    LanguageTag, Topic, TopicRecord, apply_progression, sort_for_progression,
    tables::LESSON_TOPICS,
};
use lesson_queries::{GetTopicQuery, GetTopicsQuery};
use origin_source::{OriginQuery, decode_rows};
use tiered_cache::CacheKey;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    lesson_counts::LessonCountsRepository, services::ContentServices,
    topic_progress::TopicProgressRepository,
};

/// Decorates topics with the user's counts and progress.
#[derive(Clone)]
struct TopicDecorator {
    counts: LessonCountsRepository,
    progress: TopicProgressRepository,
}

impl TopicDecorator {
    fn new(services: &ContentServices) -> Self {
        Self {
            counts: LessonCountsRepository::new(services.clone()),
            progress: TopicProgressRepository::new(services.clone()),
        }
    }

    async fn decorate(
        &self, topics: Vec<Topic>, user_id: Uuid, force_refresh: bool,
    ) -> LessonResult<Vec<Topic>> {
        let ids: Vec<Uuid> = topics.iter().map(|t| t.id).collect();
        let counts = self.counts.counts(&ids, force_refresh).await?;
        let progress = self
            .progress
            .completed(user_id, &ids, force_refresh)
            .await?;

        Ok(topics
            .into_iter()
            .map(|topic| {
                let topic_counts = counts.get(&topic.id).copied().unwrap_or_default();
                let topic_progress =
                    progress.get(&topic.id).copied().unwrap_or_default();
                topic.with_progress(topic_counts, topic_progress)
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct TopicsQueryHandler {
    services: ContentServices,
    decorator: TopicDecorator,
}

impl TopicsQueryHandler {
    pub fn new(services: ContentServices) -> Self {
        Self {
            decorator: TopicDecorator::new(&services),
            services,
        }
    }

    /// Published topics for a language in progression order.
    ///
    /// With a signed-in user each topic carries its lesson counts, the
    /// user's progress and a lock flag. Without one every topic is
    /// unlocked with zero progress.
    #[instrument(skip(self))]
    pub async fn execute(&self, query: GetTopicsQuery) -> LessonResult<Vec<Topic>> {
        let user_id = self.services.identity.current_user().await?;
        let language = LanguageTag::parse(&query.language).name();
        let difficulty = query.difficulty.as_deref().map(str::to_lowercase);

        let key = TopicsCacheKey::new(difficulty.as_deref(), &language, user_id);
        self.services
            .cache
            .get_or_fetch(
                &key.render(),
                &self.services.policies.topics,
                query.force_refresh,
                || {
                    self.load(
                        &language,
                        difficulty.as_deref(),
                        user_id,
                        query.force_refresh,
                    )
                },
            )
            .await
    }

    async fn load(
        &self, language: &str, difficulty: Option<&str>, user_id: Option<Uuid>,
        force_refresh: bool,
    ) -> LessonResult<Vec<Topic>> {
        let mut request = OriginQuery::table(LESSON_TOPICS)
            .eq("language", language)
            .eq("is_published", true);
        if let Some(difficulty) = difficulty {
            request = request.eq("difficulty", difficulty);
        }
        let request = request
            .order_by("sort_order", true, true)
            .order_by("lesson_number", true, true);

        let rows = self.services.origin.select(&request).await?;
        let mut topics: Vec<Topic> = decode_rows::<TopicRecord>(LESSON_TOPICS, rows)?
            .into_iter()
            .map(Topic::from_record)
            .collect();

        let Some(user_id) = user_id else {
            debug!(topics = topics.len(), "no signed-in user, topics left unlocked");
            sort_for_progression(&mut topics);
            return Ok(topics);
        };

        let mut topics = self
            .decorator
            .decorate(topics, user_id, force_refresh)
            .await?;
        apply_progression(&mut topics);
        Ok(topics)
    }
}

#[derive(Clone)]
pub struct TopicQueryHandler {
    services: ContentServices,
    decorator: TopicDecorator,
    sequence: TopicsQueryHandler,
}

impl TopicQueryHandler {
    pub fn new(services: ContentServices) -> Self {
        Self {
            decorator: TopicDecorator::new(&services),
            sequence: TopicsQueryHandler::new(services.clone()),
            services,
        }
    }

    /// One topic with counts and progress. Its lock comes from the
    /// progression of its language, so it matches the topics list.
    #[instrument(skip(self))]
    pub async fn execute(&self, query: GetTopicQuery) -> LessonResult<Option<Topic>> {
        let user_id = self.services.identity.current_user().await?;
        let key = TopicCacheKey::new(query.topic_id, user_id);

        self.services
            .cache
            .get_or_fetch(
                &key.render(),
                &self.services.policies.topic,
                query.force_refresh,
                || self.load(query.topic_id, user_id, query.force_refresh),
            )
            .await
    }

    async fn load(
        &self, topic_id: Uuid, user_id: Option<Uuid>, force_refresh: bool,
    ) -> LessonResult<Option<Topic>> {
        let rows = self
            .services
            .origin
            .select(
                &OriginQuery::table(LESSON_TOPICS)
                    .eq("id", topic_id.to_string())
                    .limit(1),
            )
            .await?;

        let Some(record) = decode_rows::<TopicRecord>(LESSON_TOPICS, rows)?
            .into_iter()
            .next()
        else {
            debug!(%topic_id, "topic not found");
            return Ok(None);
        };

        let Some(user_id) = user_id else {
            return Ok(Some(Topic::from_record(record)));
        };

        let sequence = self
            .sequence
            .execute(GetTopicsQuery {
                difficulty: None,
                language: record.language.clone(),
                force_refresh,
            })
            .await?;
        if let Some(topic) = sequence.into_iter().find(|t| t.id == topic_id) {
            return Ok(Some(topic));
        }

        // Unpublished topics sit outside the progression and are never locked.
        debug!(%topic_id, "topic outside the published sequence");
        Ok(self
            .decorator
            .decorate(vec![Topic::from_record(record)], user_id, force_refresh)
            .await?
            .pop())
    }
}
