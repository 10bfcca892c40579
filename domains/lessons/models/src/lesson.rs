use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, TypedBuilder,
)]
pub struct Lesson {
    pub id: Uuid,
    pub topic_id: Uuid,
    #[builder(setter(into))]
    pub title: String,
    #[serde(default)]
    #[builder(default)]
    pub content: Option<String>,
    #[serde(default)]
    #[builder(default)]
    pub lesson_number: Option<i32>,
    #[serde(default)]
    #[builder(default)]
    pub sort_order: i32,
    #[serde(default = "published_default")]
    #[builder(default = true)]
    pub is_published: bool,
}

fn published_default() -> bool { true }
