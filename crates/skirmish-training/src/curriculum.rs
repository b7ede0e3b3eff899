//! Episode-indexed curriculum.
//!
//! A curriculum is an ordered list of [`Lesson`]s. Each lesson becomes current once
//! the episode counter reaches its `min_episode` and stays current until the next
//! lesson takes over. The values of the current lesson are served to the settings
//! resolver by name; names the lesson does not mention fall back to the resolver's
//! value.
//!
//! ```
//! use skirmish_engine::ParameterSource as _;
//! use skirmish_training::curriculum::{Curriculum, Lesson};
//!
//! let mut curriculum = Curriculum::new(vec![
//!     Lesson::new("basics", 0).with_value("arena_size", 30.0),
//!     Lesson::new("open", 100).with_value("arena_size", 80.0),
//! ]);
//!
//! curriculum.prepare(0);
//! assert_eq!(curriculum.scalar("arena_size", 50.0), 30.0);
//! curriculum.prepare(150);
//! assert_eq!(curriculum.scalar("arena_size", 50.0), 80.0);
//! assert_eq!(curriculum.scalar("obstacle_density", 0.5), 0.5);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use skirmish_engine::ParameterSource;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub name: String,
    /// First episode index at which the lesson applies.
    pub min_episode: u64,
    #[serde(default)]
    pub values: BTreeMap<String, f32>,
}

impl Lesson {
    #[must_use]
    pub fn new(name: impl Into<String>, min_episode: u64) -> Self {
        Self {
            name: name.into(),
            min_episode,
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: f32) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Curriculum {
    lessons: Vec<Lesson>,
    current: Option<usize>,
}

impl Curriculum {
    /// Builds a curriculum. Lessons are ordered by `min_episode`; ties keep their
    /// given order and the later one wins.
    #[must_use]
    pub fn new(mut lessons: Vec<Lesson>) -> Self {
        lessons.sort_by_key(|lesson| lesson.min_episode);
        Self {
            lessons,
            current: None,
        }
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn current_lesson(&self) -> Option<&Lesson> {
        self.lessons.get(self.current?)
    }

    /// Index of the lesson that applies to `episode`.
    #[must_use]
    pub fn lesson_index(&self, episode: u64) -> Option<usize> {
        self.lessons
            .iter()
            .rposition(|lesson| lesson.min_episode <= episode)
    }
}

impl ParameterSource for Curriculum {
    fn scalar(&self, name: &str, default: f32) -> f32 {
        self.current_lesson()
            .and_then(|lesson| lesson.values.get(name))
            .copied()
            .unwrap_or(default)
    }

    fn prepare(&mut self, episode: u64) {
        let next = self.lesson_index(episode);
        if next != self.current {
            self.current = next;
            if let Some(lesson) = self.current_lesson() {
                info!(episode, lesson = %lesson.name, "curriculum lesson changed");
            }
        }
    }
}
