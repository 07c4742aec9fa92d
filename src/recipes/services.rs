use axum::http::Uri;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{
    dto::{RecipeListParams, RecipePayload},
    pagination::{Page, PageRequest},
    query::{RecipeQuery, Scope},
    repo_types::{Category, NewRecipe, Recipe},
};
use crate::error::{ApiError, ApiResult, FieldError};

const MAX_TITLE_LEN: usize = 255;
const REQUIRED: &str = "This field is required.";

/// Filter, sort and paginate `scope`. Parameter errors surface before any query runs.
pub async fn fetch_page(
    db: &PgPool,
    scope: Scope,
    params: &RecipeListParams,
    uri: &Uri,
) -> ApiResult<Page<Recipe>> {
    let query = RecipeQuery::from_params(scope, params)?;
    let request = PageRequest::from_params(params.page.as_deref(), params.page_size.as_deref())?;

    let count = Recipe::count(db, &query).await?;
    let window = request.resolve(count)?;
    let results = Recipe::list(db, &query, window.limit, window.offset).await?;
    debug!(count, page = window.number, returned = results.len(), "recipe page");

    Ok(Page::new(uri, &window, count, results))
}

/// Writes through the owned-recipe endpoints may only name the caller as owner.
pub fn ensure_owner(recipe: &NewRecipe, caller: Uuid) -> ApiResult<()> {
    if recipe.user_id != caller {
        return Err(ApiError::field("user", "The user must be you!"));
    }
    Ok(())
}

/// Check every field of `payload`, reporting all failures together.
pub fn validate_recipe(payload: RecipePayload) -> ApiResult<NewRecipe> {
    let mut errors = Vec::new();

    let title = text_field("title", payload.title, Some(MAX_TITLE_LEN), &mut errors);
    let description = text_field("description", payload.description, None, &mut errors);
    let ingredients = ingredients_field(payload.ingredients, &mut errors);
    let instructions = text_field("instructions", payload.instructions, None, &mut errors);
    let category = match payload.category {
        None => {
            errors.push(FieldError::new("category", REQUIRED));
            None
        }
        Some(raw) => match raw.parse::<Category>() {
            Ok(c) => Some(c),
            Err(e) => {
                errors.push(FieldError::new("category", e.to_string()));
                None
            }
        },
    };
    let preparation_time = int_field("preparation_time", payload.preparation_time, 0, &mut errors);
    let cooking_time = int_field("cooking_time", payload.cooking_time, 0, &mut errors);
    let servings = int_field("servings", payload.servings, 1, &mut errors);
    let user_id = match payload.user.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("user", REQUIRED));
            None
        }
        Some(raw) => match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push(FieldError::new("user", "Must be a valid UUID."));
                None
            }
        },
    };

    match (
        title,
        description,
        ingredients,
        instructions,
        category,
        preparation_time,
        cooking_time,
        servings,
        user_id,
    ) {
        (
            Some(title),
            Some(description),
            Some(ingredients),
            Some(instructions),
            Some(category),
            Some(preparation_time),
            Some(cooking_time),
            Some(servings),
            Some(user_id),
        ) if errors.is_empty() => Ok(NewRecipe {
            title,
            description,
            ingredients,
            instructions,
            category,
            preparation_time,
            cooking_time,
            servings,
            user_id,
        }),
        _ => Err(ApiError::Validation(errors)),
    }
}

fn text_field(
    name: &str,
    value: Option<String>,
    max_len: Option<usize>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let Some(value) = value else {
        errors.push(FieldError::new(name, REQUIRED));
        return None;
    };
    let value = value.trim().to_string();
    if value.is_empty() {
        errors.push(FieldError::new(name, "This field may not be blank."));
        return None;
    }
    if let Some(max) = max_len {
        if value.chars().count() > max {
            errors.push(FieldError::new(
                name,
                format!("Ensure this field has no more than {max} characters."),
            ));
            return None;
        }
    }
    Some(value)
}

fn ingredients_field(value: Option<Value>, errors: &mut Vec<FieldError>) -> Option<Value> {
    let message = match value {
        None => REQUIRED,
        Some(Value::Null) => "This field may not be null.",
        Some(v) if is_empty_value(&v) => "This field may not be empty.",
        Some(v) => return Some(v),
    };
    errors.push(FieldError::new("ingredients", message));
    None
}

/// `""`, `[]`, `{}`, `0` and `false` carry no ingredients.
fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn int_field(
    name: &str,
    value: Option<Value>,
    min: i32,
    errors: &mut Vec<FieldError>,
) -> Option<i32> {
    let parsed = match value {
        None => Err(REQUIRED.to_string()),
        Some(Value::Null) => Err("This field may not be null.".to_string()),
        Some(v) => integer_from(&v).ok_or_else(|| "A valid integer is required.".to_string()),
    };
    let checked = parsed.and_then(|n| {
        if n < i64::from(min) {
            Err(format!("Ensure this value is greater than or equal to {min}."))
        } else {
            i32::try_from(n)
                .map_err(|_| format!("Ensure this value is less than or equal to {}.", i32::MAX))
        }
    });
    match checked {
        Ok(n) => Some(n),
        Err(message) => {
            errors.push(FieldError::new(name, message));
            None
        }
    }
}

/// Integers, integral floats (`30.0`) and numeric strings (`"30"`).
fn integer_from(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
