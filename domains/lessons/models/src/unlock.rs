//! Sequential unlock of topics.
//!
//! A topic is locked while any earlier lesson-bearing topic is incomplete.
//! Topics without lessons are never locked and never block later topics,
//! so the chain runs through the nearest previous lesson-bearing topic
//! rather than the immediate predecessor.

use std::cmp::Ordering;

use crate::topic::Topic;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TopicWithCounts {
    pub total_lessons: u32,
    pub completed_lessons: u32,
}

impl TopicWithCounts {
    pub fn new(total_lessons: u32, completed_lessons: u32) -> Self {
        Self {
            total_lessons,
            completed_lessons,
        }
    }

    fn blocks_progression(&self) -> bool {
        self.total_lessons > 0 && self.completed_lessons < self.total_lessons
    }
}

impl From<&Topic> for TopicWithCounts {
    fn from(topic: &Topic) -> Self {
        Self::new(topic.total_lessons_count, topic.completed_lessons_count)
    }
}

/// Lock flags parallel to `ordered`, which must already be in progression
/// order (see [`sort_for_progression`]).
pub fn compute_locks(ordered: &[TopicWithCounts]) -> Vec<bool> {
    let mut blocked = false;
    ordered
        .iter()
        .map(|topic| {
            let locked = topic.total_lessons > 0 && blocked;
            blocked |= topic.blocks_progression();
            locked
        })
        .collect()
}

fn progression_order(a: &Topic, b: &Topic) -> Ordering {
    a.sort_order.cmp(&b.sort_order).then_with(|| {
        match (a.lesson_number, b.lesson_number) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    })
}

/// Orders by `sort_order` ascending, then `lesson_number` ascending with
/// missing numbers last. Stable for ties.
pub fn sort_for_progression(topics: &mut [Topic]) {
    topics.sort_by(progression_order);
}

/// Sorts `topics` and recomputes every lock flag from its counts.
pub fn apply_progression(topics: &mut [Topic]) {
    sort_for_progression(topics);
    let counts: Vec<TopicWithCounts> =
        topics.iter().map(TopicWithCounts::from).collect();
    for (topic, locked) in topics.iter_mut().zip(compute_locks(&counts)) {
        topic.is_locked = locked;
    }
}
