use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, Identifiable};

/// Who can see a post. Everything starts private.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Public => "public",
        }
    }

    /// Unrecognized values are treated as private.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "public" => Visibility::Public,
            _ => Visibility::Private,
        }
    }
}

/// Post entity - generated or hand-written content owned by one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub category: Category,
    pub tags: Vec<String>,
    /// Always derived from `body`, see [`word_count`].
    pub word_count: i64,
    /// Originating prompt; `None` for manually created posts.
    pub prompt: Option<String>,
    pub model_used: Option<String>,
    pub tokens_used: Option<i64>,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Provenance of a generated post.
#[derive(Debug, Clone)]
pub struct Generated {
    pub prompt: String,
    pub model: String,
    pub tokens_used: i64,
}

/// Partial edit applied by the owner. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PostEdit {
    pub title: Option<String>,
    pub body: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<Visibility>,
}

impl Post {
    /// Create a post written directly by its owner.
    pub fn new(user_id: Uuid, title: String, body: String, category: Category) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            word_count: word_count(&body),
            body,
            category,
            tags: Vec::new(),
            prompt: None,
            model_used: None,
            tokens_used: None,
            visibility: Visibility::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a post from generator output.
    pub fn generated(
        user_id: Uuid,
        title: String,
        body: String,
        category: Category,
        origin: Generated,
    ) -> Self {
        let mut post = Self::new(user_id, title, body, category);
        post.prompt = Some(origin.prompt);
        post.model_used = Some(origin.model);
        post.tokens_used = Some(origin.tokens_used);
        post
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Apply an edit, recomputing the word count and bumping `updated_at`.
    pub fn apply(&mut self, edit: PostEdit) {
        if let Some(title) = edit.title {
            self.title = title;
        }
        if let Some(body) = edit.body {
            self.word_count = word_count(&body);
            self.body = body;
        }
        if let Some(category) = edit.category {
            self.category = category;
        }
        if let Some(tags) = edit.tags {
            self.tags = tags;
        }
        if let Some(visibility) = edit.visibility {
            self.visibility = visibility;
        }
        self.updated_at = Utc::now();
    }
}

impl Identifiable<Uuid> for Post {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Number of whitespace-delimited tokens in `text`.
pub fn word_count(text: &str) -> i64 {
    text.split_whitespace().count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
        assert_eq!(word_count("one two\nthree\tfour  five"), 5);
    }

    #[test]
    fn test_new_post_computes_word_count() {
        let post = Post::new(
            Uuid::new_v4(),
            "Title".to_string(),
            "a b c".to_string(),
            Category::Blog,
        );

        assert_eq!(post.word_count, 3);
        assert_eq!(post.visibility, Visibility::Private);
        assert!(post.prompt.is_none());
    }

    #[test]
    fn test_apply_edit_recomputes_word_count() {
        let mut post = Post::new(
            Uuid::new_v4(),
            "Title".to_string(),
            "a b c".to_string(),
            Category::Blog,
        );
        let before = post.updated_at;

        post.apply(PostEdit {
            body: Some("just two".to_string()),
            tags: Some(vec!["rust".to_string()]),
            ..Default::default()
        });

        assert_eq!(post.word_count, 2);
        assert_eq!(post.title, "Title");
        assert_eq!(post.tags, vec!["rust".to_string()]);
        assert!(post.updated_at >= before);
    }

    #[test]
    fn test_apply_edit_without_body_keeps_word_count() {
        let mut post = Post::new(
            Uuid::new_v4(),
            "Title".to_string(),
            "a b c".to_string(),
            Category::Blog,
        );

        post.apply(PostEdit {
            title: Some("Renamed".to_string()),
            category: Some(Category::Social),
            ..Default::default()
        });

        assert_eq!(post.word_count, 3);
        assert_eq!(post.title, "Renamed");
        assert_eq!(post.category, Category::Social);
    }
}
