//! Reading Item - the unit the scheduler works on
//!
//! Each item carries:
//! - Identity and presentation metadata (title, kind, category)
//! - Queue priority (0-100)
//! - Memory-model state (absent until the first rating)
//! - Scheduling timestamps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fsrs::MemoryState;

/// Item identifier assigned by the item store
pub type ItemId = i64;

/// Highest queue priority
pub const MAX_PRIORITY: u8 = 100;

/// Priority given to imported items when none is specified
pub const DEFAULT_PRIORITY: u8 = 50;

// ============================================================================
// ITEM KINDS
// ============================================================================

/// What kind of content an item points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A whole imported document
    Document,
    /// A passage extracted from a document
    Extract,
    /// A question/answer or cloze item
    #[default]
    LearningItem,
}

impl ItemKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Document => "document",
            ItemKind::Extract => "extract",
            ItemKind::LearningItem => "learning_item",
        }
    }

    /// Parse from string name, falling back to [`ItemKind::LearningItem`]
    pub fn parse_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "document" => ItemKind::Document,
            "extract" => ItemKind::Extract,
            _ => ItemKind::LearningItem,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "document" => Ok(ItemKind::Document),
            "extract" => Ok(ItemKind::Extract),
            "learning_item" | "item" => Ok(ItemKind::LearningItem),
            _ => Err(format!("Unknown item kind: {}", s)),
        }
    }
}

// ============================================================================
// ITEM
// ============================================================================

/// A schedulable reading/learning item
///
/// `stability` and `difficulty` are `None` while the item is new; the first
/// processed rating sets both and `next_due_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Store-assigned identifier
    pub id: ItemId,
    /// Display title
    pub title: String,
    /// Content kind
    pub kind: ItemKind,
    /// Queue priority (0-100)
    pub priority: u8,
    /// Owning category, if any
    pub category_id: Option<i64>,
    /// Marked as favorite by the reader
    pub favorite: bool,
    /// When the item was imported
    pub created_at: DateTime<Utc>,
    /// When the last rating was processed
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// When the item is next due (`None` = new)
    pub next_due_at: Option<DateTime<Utc>>,
    /// Number of processed ratings
    pub review_count: u32,
    /// Memory stability in days (> 0 once set)
    pub stability: Option<f64>,
    /// Intrinsic difficulty (within the model bounds once set)
    pub difficulty: Option<f64>,
}

impl Item {
    /// Create a new, never-reviewed item
    pub fn new(id: ItemId, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            kind: ItemKind::default(),
            priority: DEFAULT_PRIORITY,
            category_id: None,
            favorite: false,
            created_at,
            last_reviewed_at: None,
            next_due_at: None,
            review_count: 0,
            stability: None,
            difficulty: None,
        }
    }

    /// Whether the item has never been scheduled
    pub fn is_new(&self) -> bool {
        self.next_due_at.is_none()
    }

    /// Memory-model state, if the item has been rated at least once
    pub fn memory_state(&self) -> Option<MemoryState> {
        match (self.stability, self.difficulty) {
            (Some(stability), Some(difficulty)) => Some(MemoryState {
                stability,
                difficulty,
            }),
            _ => None,
        }
    }
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Input for importing a new item
///
/// Uses `deny_unknown_fields` to reject misspelled import fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewItem {
    /// Display title
    pub title: String,
    /// Content kind
    #[serde(default)]
    pub kind: ItemKind,
    /// Queue priority (0-100)
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Owning category
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Favorite flag
    #[serde(default)]
    pub favorite: bool,
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

impl NewItem {
    /// New item with default kind and priority
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: ItemKind::default(),
            priority: DEFAULT_PRIORITY,
            category_id: None,
            favorite: false,
        }
    }
}

impl Default for NewItem {
    fn default() -> Self {
        Self::new(String::new())
    }
}

// ============================================================================
// TESTS
// ============================================================================
