//! Content categories and their instruction profiles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of generated content. Each variant carries a fixed role instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Marketing,
    Product,
    Blog,
    Technical,
    Creative,
    Social,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::General,
        Category::Marketing,
        Category::Product,
        Category::Blog,
        Category::Technical,
        Category::Creative,
        Category::Social,
    ];

    /// Resolve a caller-supplied tag. Unknown tags resolve to `General`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "marketing" => Category::Marketing,
            "product" => Category::Product,
            "blog" => Category::Blog,
            "technical" => Category::Technical,
            "creative" => Category::Creative,
            "social" => Category::Social,
            _ => Category::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Marketing => "marketing",
            Category::Product => "product",
            Category::Blog => "blog",
            Category::Technical => "technical",
            Category::Creative => "creative",
            Category::Social => "social",
        }
    }

    /// Role instruction sent to the text generator for this category.
    pub fn instruction(&self) -> &'static str {
        match self {
            Category::General => {
                "You are a versatile content writer. Create engaging and informative content \
                 that is well-structured and easy to read."
            }
            Category::Marketing => {
                "You are an expert marketing copywriter. Create persuasive content that \
                 highlights value propositions and drives engagement. Focus on benefits and \
                 clear calls to action."
            }
            Category::Product => {
                "You are a professional product content writer. Create detailed, accurate, and \
                 user-focused content that explains features and benefits clearly."
            }
            Category::Blog => {
                "You are an experienced blogger. Create engaging, conversational content with a \
                 clear narrative structure. Include relevant examples and maintain a consistent \
                 tone."
            }
            Category::Technical => {
                "You are a technical writer. Create precise, well-structured content with \
                 accurate terminology and clear explanations."
            }
            Category::Creative => {
                "You are a creative writer. Create engaging, imaginative content with vivid \
                 descriptions and compelling narrative."
            }
            Category::Social => {
                "You are a social media content creator. Create concise, engaging content that \
                 sparks interaction and fits platform-specific best practices."
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
