//! Mutation handlers. Each one writes to the origin and then drops every
//! cached view the write can make stale.

pub mod lesson;
pub mod progress;
pub mod topic;

pub use lesson::{CreateLessonHandler, DeleteLessonHandler, UpdateLessonHandler};
pub use progress::CompleteLessonHandler;
pub use topic::{CreateTopicHandler, DeleteTopicHandler, UpdateTopicHandler};

use origin_source::Filter;
use uuid::Uuid;

pub(crate) fn by_id(id: Uuid) -> Filter {
    Filter::Eq {
        column: "id".to_string(),
        value: id.to_string().into(),
    }
}
