//! Category model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;
use crate::models::UserId;

/// A unique identifier for a category, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(Uuid);

impl CategoryId {
    /// Create a new unique category ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Fixed palette for category badges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Blue,
    Pink,
    Orange,
    Cyan,
    Purple,
    Gold,
    Crimson,
    Yellow,
}

impl Color {
    /// Every palette value, in display order
    pub const ALL: [Self; 10] = [
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::Pink,
        Self::Orange,
        Self::Cyan,
        Self::Purple,
        Self::Gold,
        Self::Crimson,
        Self::Yellow,
    ];

    /// Lowercase CSS color name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Pink => "pink",
            Self::Orange => "orange",
            Self::Cyan => "cyan",
            Self::Purple => "purple",
            Self::Gold => "gold",
            Self::Crimson => "crimson",
            Self::Yellow => "yellow",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|color| color.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| Error::Validation(format!("Unknown color: {s}")))
    }
}

/// A user-defined category for organizing notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,
    /// Display label, never empty
    pub name: String,
    /// Badge color from the fixed palette
    pub color: Color,
    /// Identity of the creating user
    pub owner: UserId,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl Category {
    /// Create a new category owned by `owner`
    #[must_use]
    pub fn new(name: impl Into<String>, color: Color, owner: UserId) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            color,
            owner,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// The denormalized copy embedded in notes
    #[must_use]
    pub fn snapshot(&self) -> CategorySnapshot {
        CategorySnapshot {
            name: self.name.clone(),
            color: self.color,
        }
    }
}

/// Denormalized copy of a category embedded in each note.
///
/// A note keeps displaying this snapshot even after the category itself is
/// renamed or deleted; the snapshot goes stale rather than cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    /// Category name at embed time
    pub name: String,
    /// Badge color at embed time
    pub color: Color,
}

impl From<&Category> for CategorySnapshot {
    fn from(category: &Category) -> Self {
        category.snapshot()
    }
}

/// New-category form state, reset to empty after a successful creation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDraft {
    /// Entered name, may still be blank
    pub name: String,
    /// Chosen palette color, `None` until the user picks one
    pub color: Option<Color>,
}

impl CategoryDraft {
    /// Check the draft is complete: trimmed non-empty name and a chosen color
    pub fn validate(&self) -> crate::Result<(String, Color)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::Validation(
                "Category name cannot be empty".to_string(),
            ));
        }
        let color = self
            .color
            .ok_or_else(|| Error::Validation("A category color must be selected".to_string()))?;
        Ok((name.to_string(), color))
    }
}

/// Partial category update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPatch {
    /// New name, if changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New color, if changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl CategoryPatch {
    /// Reject patches that would blank out the name
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::Validation(
                    "Category name cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_id_unique() {
        let id1 = CategoryId::new();
        let id2 = CategoryId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_category_id_parse() {
        let id = CategoryId::new();
        let parsed: CategoryId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_color_parse_roundtrip() {
        for color in Color::ALL {
            let parsed: Color = color.as_str().parse().unwrap();
            assert_eq!(parsed, color);
        }
    }

    #[test]
    fn test_color_parse_rejects_unknown() {
        let err = "magenta".parse::<Color>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_color_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Color::Crimson).unwrap(), "\"crimson\"");
    }

    #[test]
    fn test_palette_has_ten_colors() {
        assert_eq!(Color::ALL.len(), 10);
    }

    #[test]
    fn test_category_new() {
        let category = Category::new("Work", Color::Blue, UserId::new("uid-1"));
        assert_eq!(category.name, "Work");
        assert_eq!(category.color, Color::Blue);
        assert_eq!(category.owner.as_str(), "uid-1");
        assert!(category.created_at > 0);
    }

    #[test]
    fn test_snapshot_copies_name_and_color() {
        let category = Category::new("Work", Color::Gold, UserId::new("uid-1"));
        let snapshot = category.snapshot();
        assert_eq!(snapshot.name, "Work");
        assert_eq!(snapshot.color, Color::Gold);
    }

    #[test]
    fn test_draft_validate_rejects_blank_name() {
        let draft = CategoryDraft {
            name: "   ".to_string(),
            color: Some(Color::Red),
        };
        assert!(matches!(draft.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_draft_validate_requires_color() {
        let draft = CategoryDraft {
            name: "Work".to_string(),
            color: None,
        };
        assert!(matches!(draft.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_draft_validate_trims_name() {
        let draft = CategoryDraft {
            name: "  Work  ".to_string(),
            color: Some(Color::Red),
        };
        let (name, color) = draft.validate().unwrap();
        assert_eq!(name, "Work");
        assert_eq!(color, Color::Red);
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = CategoryPatch {
            name: Some("Personal".to_string()),
            color: None,
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({ "name": "Personal" }));
    }

    #[test]
    fn test_patch_rejects_blank_name() {
        let patch = CategoryPatch {
            name: Some("  ".to_string()),
            color: None,
        };
        assert!(matches!(patch.validate(), Err(Error::Validation(_))));
    }
}
