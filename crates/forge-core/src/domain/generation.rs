//! Generation requests - ephemeral input to the generation workflow.

use super::Category;

/// Model used when the caller does not name one.
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";

/// A prompt submitted for generation. Never persisted on its own.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub category: Category,
    pub title: Option<String>,
    pub model: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            category: Category::default(),
            title: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}
