//! Site layout blocks edited by admins: the home banner, the FAQ and the
//! course categories. There is at most one document per kind, stored under
//! the kind's name.

use learnhub_storage::Document;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutKind {
    Banner,
    #[serde(rename = "FAQ")]
    Faq,
    Categories,
}

impl LayoutKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Banner => "Banner",
            Self::Faq => "FAQ",
            Self::Categories => "Categories",
        }
    }
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    /// Image URL. Uploading the image is up to the client.
    pub image: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayoutKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faq: Vec<FaqItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<Banner>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Document for Layout {
    const COLLECTION: &'static str = "layouts";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Body of create-layout and edit-layout. Only the fields of `kind` are
/// read.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutInput {
    #[serde(rename = "type")]
    pub kind: LayoutKind,
    #[serde(default)]
    pub faq: Vec<FaqItem>,
    #[serde(default)]
    pub categories: Vec<Category>,
    pub image: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

impl LayoutInput {
    /// Builds the layout document, or says what is missing.
    pub fn into_layout(self, now: OffsetDateTime) -> Result<Layout, String> {
        let mut layout = Layout {
            id: self.kind.as_str().to_string(),
            kind: self.kind,
            faq: Vec::new(),
            categories: Vec::new(),
            banner: None,
            updated_at: now,
        };

        match self.kind {
            LayoutKind::Banner => {
                let image = self.image.filter(|s| !s.trim().is_empty());
                let title = self.title.filter(|s| !s.trim().is_empty());
                let (Some(image), Some(title)) = (image, title) else {
                    return Err("A banner needs an image and a title".into());
                };
                layout.banner = Some(Banner {
                    image,
                    title,
                    subtitle: self.subtitle.unwrap_or_default(),
                });
            }
            LayoutKind::Faq => {
                if self
                    .faq
                    .iter()
                    .any(|item| item.question.trim().is_empty() || item.answer.trim().is_empty())
                {
                    return Err("Every FAQ item needs a question and an answer".into());
                }
                layout.faq = self.faq;
            }
            LayoutKind::Categories => {
                if self.categories.iter().any(|c| c.title.trim().is_empty()) {
                    return Err("Every category needs a title".into());
                }
                layout.categories = self.categories;
            }
        }

        Ok(layout)
    }
}
