//! Habits, categories, sub-categories, and the per-owner catalog.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{LevelbookError, Result};
use crate::owner::OwnerId;

static CATALOG_SEQ: AtomicU64 = AtomicU64::new(0);

fn derive_id(prefix: &str, owner: &OwnerId, name: &str) -> String {
    let seq = CATALOG_SEQ.fetch_add(1, Ordering::Relaxed);
    let input = format!("{}:{name}:{}:{seq}", owner.0, crate::time::now_micros());
    let hash = Sha256::digest(input.as_bytes());
    format!("{prefix}_{}", bs58::encode(&hash[..16]).into_string())
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Unique identifier for a category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a sub-category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubCategoryId(pub String);

impl std::fmt::Display for SubCategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a habit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HabitId(pub String);

impl std::fmt::Display for HabitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Category / SubCategory
// ---------------------------------------------------------------------------

/// A top-level grouping key for habits and XP entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub owner: OwnerId,
    pub name: String,
    pub sort_order: u32,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// A second-level grouping key, owned by exactly one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: SubCategoryId,
    pub owner: OwnerId,
    pub category: CategoryId,
    pub name: String,
    pub sort_order: u32,
}

// ---------------------------------------------------------------------------
// Habit
// ---------------------------------------------------------------------------

/// How a habit is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitKind {
    /// Done or not done; one completion per call.
    Binary,
    /// Logged with a count; the reward multiplies.
    Counter,
}

/// A habit definition. Completing it produces one XP ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub owner: OwnerId,
    pub name: String,
    pub kind: HabitKind,
    pub xp_reward: i64,
    pub category: CategoryId,
    pub sub_category: Option<SubCategoryId>,
    pub active: bool,
    pub created_at: u64,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The per-owner collection of categories, sub-categories, and habits.
///
/// Stored as a single document per owner. All referential checks for
/// ledger entries go through here: a manual XP log may only name grouping
/// keys that exist in the owner's catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub owner: OwnerId,
    pub categories: Vec<Category>,
    pub sub_categories: Vec<SubCategory>,
    pub habits: Vec<Habit>,
}

impl Catalog {
    /// Create an empty catalog for an owner.
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            categories: Vec::new(),
            sub_categories: Vec::new(),
            habits: Vec::new(),
        }
    }

    /// Add a category. Names are unique per owner.
    pub fn add_category(
        &mut self,
        name: &str,
        color: Option<String>,
        icon: Option<String>,
    ) -> Result<CategoryId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LevelbookError::Validation(
                "category name must not be empty".into(),
            ));
        }
        if self.categories.iter().any(|c| c.name == name) {
            return Err(LevelbookError::Validation(format!(
                "category '{name}' already exists"
            )));
        }

        let id = CategoryId(derive_id("cat", &self.owner, name));
        self.categories.push(Category {
            id: id.clone(),
            owner: self.owner.clone(),
            name: name.to_string(),
            sort_order: self.categories.len() as u32,
            color,
            icon,
        });
        Ok(id)
    }

    /// Add a sub-category under an existing category. Names are unique
    /// per owner.
    pub fn add_sub_category(&mut self, category: &CategoryId, name: &str) -> Result<SubCategoryId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LevelbookError::Validation(
                "sub-category name must not be empty".into(),
            ));
        }
        if self.category(category).is_none() {
            return Err(LevelbookError::NotFound(format!("category {category}")));
        }
        if self.sub_categories.iter().any(|s| s.name == name) {
            return Err(LevelbookError::Validation(format!(
                "sub-category '{name}' already exists"
            )));
        }

        let id = SubCategoryId(derive_id("sub", &self.owner, name));
        self.sub_categories.push(SubCategory {
            id: id.clone(),
            owner: self.owner.clone(),
            category: category.clone(),
            name: name.to_string(),
            sort_order: self.sub_categories.len() as u32,
        });
        Ok(id)
    }

    /// Add a habit. The category (and sub-category, when given) must
    /// already exist and agree with each other.
    pub fn add_habit(
        &mut self,
        name: &str,
        kind: HabitKind,
        xp_reward: i64,
        category: &CategoryId,
        sub_category: Option<&SubCategoryId>,
    ) -> Result<HabitId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LevelbookError::Validation(
                "habit name must not be empty".into(),
            ));
        }
        self.check_grouping(category, sub_category)?;

        let id = HabitId(derive_id("hab", &self.owner, name));
        self.habits.push(Habit {
            id: id.clone(),
            owner: self.owner.clone(),
            name: name.to_string(),
            kind,
            xp_reward,
            category: category.clone(),
            sub_category: sub_category.cloned(),
            active: true,
            created_at: crate::time::now_micros(),
        });
        Ok(id)
    }

    /// Activate or deactivate a habit.
    pub fn set_habit_active(&mut self, habit: &HabitId, active: bool) -> Result<()> {
        match self.habits.iter_mut().find(|h| &h.id == habit) {
            Some(h) => {
                h.active = active;
                Ok(())
            }
            None => Err(LevelbookError::NotFound(format!("habit {habit}"))),
        }
    }

    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    pub fn sub_category(&self, id: &SubCategoryId) -> Option<&SubCategory> {
        self.sub_categories.iter().find(|s| &s.id == id)
    }

    pub fn habit(&self, id: &HabitId) -> Option<&Habit> {
        self.habits.iter().find(|h| &h.id == id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn sub_category_by_name(&self, name: &str) -> Option<&SubCategory> {
        self.sub_categories.iter().find(|s| s.name == name)
    }

    pub fn habit_by_name(&self, name: &str) -> Option<&Habit> {
        self.habits.iter().find(|h| h.name == name)
    }

    /// Sub-categories belonging to a category, in sort order.
    pub fn sub_categories_of(&self, category: &CategoryId) -> Vec<&SubCategory> {
        self.sub_categories
            .iter()
            .filter(|s| &s.category == category)
            .collect()
    }

    /// Count of active habits mapped to a category.
    pub fn active_habit_count(&self, category: &CategoryId) -> u32 {
        self.habits
            .iter()
            .filter(|h| h.active && &h.category == category)
            .count() as u32
    }

    /// Count of active habits mapped to a sub-category.
    pub fn active_habit_count_sub(&self, sub_category: &SubCategoryId) -> u32 {
        self.habits
            .iter()
            .filter(|h| h.active && h.sub_category.as_ref() == Some(sub_category))
            .count() as u32
    }

    /// Check that a (category, sub-category) pair is valid for this
    /// owner: both exist and the sub-category belongs to the category.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing key, `Validation` for a mismatched pair.
    pub fn check_grouping(
        &self,
        category: &CategoryId,
        sub_category: Option<&SubCategoryId>,
    ) -> Result<()> {
        if self.category(category).is_none() {
            return Err(LevelbookError::NotFound(format!("category {category}")));
        }
        if let Some(sub_id) = sub_category {
            match self.sub_category(sub_id) {
                None => return Err(LevelbookError::NotFound(format!("sub-category {sub_id}"))),
                Some(sub) if &sub.category != category => {
                    return Err(LevelbookError::Validation(format!(
                        "sub-category {sub_id} does not belong to category {category}"
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
