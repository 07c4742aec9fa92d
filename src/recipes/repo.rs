use sqlx::PgPool;
use uuid::Uuid;

use super::{
    query::{RecipeQuery, Scope, RECIPE_COLUMNS},
    repo_types::{NewRecipe, Recipe},
};

impl Recipe {
    pub async fn count(db: &PgPool, query: &RecipeQuery) -> Result<i64, sqlx::Error> {
        let mut qb = query.count_query();
        let (count,) = qb.build_query_as::<(i64,)>().fetch_one(db).await?;
        Ok(count)
    }

    pub async fn list(
        db: &PgPool,
        query: &RecipeQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Recipe>, sqlx::Error> {
        let mut qb = query.page_query(limit, offset);
        qb.build_query_as::<Recipe>().fetch_all(db).await
    }

    /// Look up one recipe inside `scope`. A recipe owned by someone else is
    /// reported exactly like a missing one.
    pub async fn find(db: &PgPool, scope: Scope, id: Uuid) -> Result<Option<Recipe>, sqlx::Error> {
        match scope {
            Scope::All => {
                sqlx::query_as::<_, Recipe>(&format!(
                    "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
                ))
                .bind(id)
                .fetch_optional(db)
                .await
            }
            Scope::OwnedBy(owner) => {
                sqlx::query_as::<_, Recipe>(&format!(
                    "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND user_id = $2"
                ))
                .bind(id)
                .bind(owner)
                .fetch_optional(db)
                .await
            }
        }
    }

    /// Insert a recipe. A duplicate title surfaces as a unique violation.
    pub async fn create(db: &PgPool, new: &NewRecipe) -> Result<Recipe, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(&format!(
            r#"
            INSERT INTO recipes (title, description, ingredients, instructions, category,
                                 preparation_time, cooking_time, servings, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.ingredients)
        .bind(&new.instructions)
        .bind(new.category.as_str())
        .bind(new.preparation_time)
        .bind(new.cooking_time)
        .bind(new.servings)
        .bind(new.user_id)
        .fetch_one(db)
        .await
    }

    /// Overwrite every editable column of a recipe `owner` owns. `created_at`
    /// and the owner stay as they are.
    pub async fn update_owned(
        db: &PgPool,
        owner: Uuid,
        id: Uuid,
        new: &NewRecipe,
    ) -> Result<Option<Recipe>, sqlx::Error> {
        sqlx::query_as::<_, Recipe>(&format!(
            r#"
            UPDATE recipes
               SET title = $3,
                   description = $4,
                   ingredients = $5,
                   instructions = $6,
                   category = $7,
                   preparation_time = $8,
                   cooking_time = $9,
                   servings = $10
             WHERE id = $1 AND user_id = $2
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.ingredients)
        .bind(&new.instructions)
        .bind(new.category.as_str())
        .bind(new.preparation_time)
        .bind(new.cooking_time)
        .bind(new.servings)
        .fetch_optional(db)
        .await
    }

    pub async fn delete_owned(db: &PgPool, owner: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
