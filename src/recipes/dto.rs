use serde::Deserialize;
use serde_json::Value;

/// Query string of the list endpoints. Kept as raw strings so that bad values
/// turn into field errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListParams {
    pub title: Option<String>,
    pub category: Option<String>,
    pub ingredients: Option<String>,
    pub cooking_time: Option<String>,
    pub servings: Option<String>,
    pub preparation_time: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Body of create and update requests.
#[derive(Debug, Default, Deserialize)]
pub struct RecipePayload {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present_value")]
    pub ingredients: Option<Value>,
    pub instructions: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "present_value")]
    pub preparation_time: Option<Value>,
    #[serde(default, deserialize_with = "present_value")]
    pub cooking_time: Option<Value>,
    #[serde(default, deserialize_with = "present_value")]
    pub servings: Option<Value>,
    pub user: Option<String>,
}

/// Keeps an explicit `null` as `Some(Value::Null)` so it can be told apart
/// from a missing key.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
