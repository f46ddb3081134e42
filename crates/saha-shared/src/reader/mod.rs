//! Learner-side view of a training: which slides to show and where the
//! learner is in them.

mod fallback;

use serde::{Deserialize, Serialize};

use crate::models::{Slide, Training};

pub use fallback::FallbackSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "set", rename_all = "snake_case")]
pub enum ContentSource {
    /// The training's own authored slides.
    Structured,
    Fallback(FallbackSet),
    /// Nothing to show yet.
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContent {
    pub source: ContentSource,
    pub slides: Vec<Slide>,
}

pub fn resolve_content(training: &Training) -> ResolvedContent {
    if !training.slides.is_empty() {
        return ResolvedContent {
            source: ContentSource::Structured,
            slides: training.slides.clone(),
        };
    }

    match FallbackSet::match_title(&training.title) {
        Some(set) => ResolvedContent {
            source: ContentSource::Fallback(set),
            slides: set.slides(),
        },
        None => ResolvedContent {
            source: ContentSource::Pending,
            slides: Vec::new(),
        },
    }
}

/// Paginated walk through resolved slides. Navigation clamps at both ends.
#[derive(Debug, Clone)]
pub struct TrainingReader {
    slides: Vec<Slide>,
    current: usize,
}

impl TrainingReader {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self { slides, current: 0 }
    }

    pub fn from_training(training: &Training) -> (ContentSource, Self) {
        let resolved = resolve_content(training);
        (resolved.source, Self::new(resolved.slides))
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Slide> {
        self.slides.get(self.current)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) {
        if self.current + 1 < self.slides.len() {
            self.current += 1;
        }
    }

    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn jump_to(&mut self, index: usize) {
        self.current = index.min(self.slides.len().saturating_sub(1));
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.slides.len()
    }

    /// Share of slides reached so far, 0..=100.
    pub fn progress_percent(&self) -> u8 {
        if self.slides.is_empty() {
            return 0;
        }
        let percent = 100.0 * (self.current + 1) as f64 / self.slides.len() as f64;
        percent.round() as u8
    }

    pub fn syllabus(&self) -> Vec<&str> {
        self.slides.iter().map(|s| s.title.as_str()).collect()
    }
}
