use std::{fmt, str::FromStr};

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Recipe record in the database, serialized as-is to clients.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub ingredients: serde_json::Value,
    pub instructions: String,
    pub category: String,
    pub preparation_time: i32, // minutes
    pub cooking_time: i32,     // minutes
    pub servings: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "user")]
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Dessert,
    MainCourse,
    Appetizer,
    Beverage,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Dessert,
        Category::MainCourse,
        Category::Appetizer,
        Category::Beverage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Dessert => "Dessert",
            Category::MainCourse => "Main Course",
            Category::Appetizer => "Appetizer",
            Category::Beverage => "Beverage",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct InvalidCategory(pub String);

/// Exact, case-sensitive match on the display name.
impl FromStr for Category {
    type Err = InvalidCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| InvalidCategory(s.to_string()))
    }
}

/// Validated recipe fields, ready to insert or to overwrite an existing row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub description: String,
    pub ingredients: serde_json::Value,
    pub instructions: String,
    pub category: Category,
    pub preparation_time: i32,
    pub cooking_time: i32,
    pub servings: i32,
    pub user_id: Uuid,
}
