//! Filtering and ordering for recipe listings.
//!
//! Query parameters are parsed into a [`RecipeQuery`] up front, so every
//! validation failure is reported before the store is touched. The query then
//! renders itself into `COUNT` and page `SELECT` statements that share one
//! `WHERE` clause.

use std::str::FromStr;

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::dto::RecipeListParams;
use crate::error::{ApiError, ApiResult};

pub(super) const RECIPE_COLUMNS: &str = "id, title, description, ingredients, instructions, category, \
                              preparation_time, cooking_time, servings, created_at, user_id";

/// Base collection a listing starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    OwnedBy(Uuid),
}

/// Fields a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    PreparationTime,
    CookingTime,
    Servings,
    CreatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::PreparationTime => "preparation_time",
            SortField::CookingTime => "cooking_time",
            SortField::Servings => "servings",
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: SortField,
    pub descending: bool,
}

impl FromStr for Ordering {
    type Err = ApiError;

    /// `servings` sorts ascending, `-servings` descending.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let field = match name {
            "preparation_time" => SortField::PreparationTime,
            "cooking_time" => SortField::CookingTime,
            "servings" => SortField::Servings,
            "created_at" => SortField::CreatedAt,
            _ => return Err(ApiError::field("ordering", "Invalid ordering field")),
        };
        Ok(Ordering { field, descending })
    }
}

/// Optional filters, applied in declaration order and combined with `AND`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilters {
    pub title: Option<String>,
    pub category: Option<String>,
    pub ingredients: Option<String>,
    pub cooking_time: Option<i32>,
    pub servings: Option<i32>,
    pub preparation_time: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeQuery {
    pub scope: Scope,
    pub filters: RecipeFilters,
    pub ordering: Option<Ordering>,
}

/// Empty parameters count as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn int_param(name: &str, value: &Option<String>) -> ApiResult<Option<i32>> {
    present(value)
        .map(|v| {
            v.trim()
                .parse::<i32>()
                .map_err(|_| ApiError::field(name, "A valid integer is required."))
        })
        .transpose()
}

/// `%` and `_` in user text match literally; the result is wrapped for a
/// substring match.
pub fn contains_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

impl RecipeQuery {
    pub fn from_params(scope: Scope, params: &RecipeListParams) -> ApiResult<Self> {
        let filters = RecipeFilters {
            title: present(&params.title).map(str::to_owned),
            category: present(&params.category).map(str::to_owned),
            ingredients: present(&params.ingredients).map(str::to_owned),
            cooking_time: int_param("cooking_time", &params.cooking_time)?,
            servings: int_param("servings", &params.servings)?,
            preparation_time: int_param("preparation_time", &params.preparation_time)?,
        };
        let ordering = present(&params.ordering)
            .map(str::parse::<Ordering>)
            .transpose()?;
        Ok(Self {
            scope,
            filters,
            ordering,
        })
    }

    fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        let mut clause = Clause::new(qb);

        if let Scope::OwnedBy(owner) = self.scope {
            clause.and("user_id = ").push_bind(owner);
        }

        let f = &self.filters;
        if let Some(title) = &f.title {
            clause.and("title ILIKE ").push_bind(contains_pattern(title));
        }
        if let Some(category) = &f.category {
            clause
                .and("LOWER(category) = LOWER(")
                .push_bind(category.clone())
                .push(")");
        }
        if let Some(ingredients) = &f.ingredients {
            clause
                .and("ingredients::text ILIKE ")
                .push_bind(contains_pattern(ingredients));
        }
        if let Some(minutes) = f.cooking_time {
            clause.and("cooking_time = ").push_bind(minutes);
        }
        if let Some(servings) = f.servings {
            clause.and("servings = ").push_bind(servings);
        }
        if let Some(minutes) = f.preparation_time {
            clause.and("preparation_time = ").push_bind(minutes);
        }
    }

    fn push_order_by(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        let (column, direction) = match self.ordering {
            Some(o) => (o.field.column(), if o.descending { "DESC" } else { "ASC" }),
            None => (SortField::CreatedAt.column(), "ASC"),
        };
        qb.push(format_args!(" ORDER BY {column} {direction}, id ASC"));
    }

    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM recipes");
        self.push_where(&mut qb);
        qb
    }

    pub fn page_query(&self, limit: i64, offset: i64) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes"));
        self.push_where(&mut qb);
        self.push_order_by(&mut qb);
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        qb
    }
}

/// Emits `WHERE` before the first condition and `AND` before the rest.
struct Clause<'a> {
    qb: &'a mut QueryBuilder<'static, Postgres>,
    first: bool,
}

impl<'a> Clause<'a> {
    fn new(qb: &'a mut QueryBuilder<'static, Postgres>) -> Self {
        Self { qb, first: true }
    }

    fn and(&mut self, sql: &str) -> &mut QueryBuilder<'static, Postgres> {
        self.qb.push(if self.first { " WHERE " } else { " AND " });
        self.first = false;
        self.qb.push(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RecipeListParams {
        RecipeListParams::default()
    }

    #[test]
    fn ordering_accepts_allowed_fields() {
        let o: Ordering = "servings".parse().unwrap();
        assert_eq!(o, Ordering { field: SortField::Servings, descending: false });

        let o: Ordering = "-created_at".parse().unwrap();
        assert_eq!(o, Ordering { field: SortField::CreatedAt, descending: true });

        let o: Ordering = "-preparation_time".parse().unwrap();
        assert_eq!(o.field.column(), "preparation_time");
    }

    #[test]
    fn ordering_rejects_unknown_fields() {
        for raw in ["bogus_field", "title", "--servings", "servings-", "-", "SERVINGS"] {
            let err = raw.parse::<Ordering>().unwrap_err();
            match err {
                ApiError::Validation(errs) => {
                    assert_eq!(errs[0].field, "ordering");
                    assert_eq!(errs[0].message, "Invalid ordering field");
                }
                other => panic!("{raw}: expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_params_are_ignored() {
        let p = RecipeListParams {
            title: Some(String::new()),
            servings: Some(String::new()),
            ordering: Some(String::new()),
            ..params()
        };
        let q = RecipeQuery::from_params(Scope::All, &p).unwrap();
        assert_eq!(q.filters, RecipeFilters::default());
        assert_eq!(q.ordering, None);
    }

    #[test]
    fn numeric_filters_must_be_integers() {
        let p = RecipeListParams {
            cooking_time: Some("ten".into()),
            ..params()
        };
        match RecipeQuery::from_params(Scope::All, &p).unwrap_err() {
            ApiError::Validation(errs) => assert_eq!(errs[0].field, "cooking_time"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("egg"), "%egg%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\"), "%c:\\\\%");
    }

    #[test]
    fn unfiltered_public_query() {
        let q = RecipeQuery::from_params(Scope::All, &params()).unwrap();
        assert_eq!(q.count_query().sql(), "SELECT COUNT(*) FROM recipes");
        assert!(q
            .page_query(10, 0)
            .sql()
            .ends_with("FROM recipes ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn filters_apply_in_fixed_order() {
        let p = RecipeListParams {
            preparation_time: Some("15".into()),
            title: Some("Pie".into()),
            servings: Some("4".into()),
            category: Some("dessert".into()),
            cooking_time: Some("30".into()),
            ingredients: Some("apple".into()),
            ..params()
        };
        let owner = Uuid::new_v4();
        let q = RecipeQuery::from_params(Scope::OwnedBy(owner), &p).unwrap();

        assert_eq!(
            q.count_query().sql(),
            "SELECT COUNT(*) FROM recipes WHERE user_id = $1 \
             AND title ILIKE $2 \
             AND LOWER(category) = LOWER($3) \
             AND ingredients::text ILIKE $4 \
             AND cooking_time = $5 \
             AND servings = $6 \
             AND preparation_time = $7"
        );
    }

    #[test]
    fn ordering_renders_with_tie_breaker() {
        let p = RecipeListParams {
            category: Some("Dessert".into()),
            ordering: Some("-servings".into()),
            ..params()
        };
        let q = RecipeQuery::from_params(Scope::All, &p).unwrap();
        assert!(q.page_query(10, 20).sql().ends_with(
            "WHERE LOWER(category) = LOWER($1) ORDER BY servings DESC, id ASC LIMIT $2 OFFSET $3"
        ));
    }
}
