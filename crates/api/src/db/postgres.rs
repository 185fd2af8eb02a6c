//! `PostgreSQL` storage adapter.
//!
//! Queries are checked at runtime (`sqlx::query_as` with `FromRow` rows) so
//! the crate builds without a live database.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use saraphan_core::{
    Amount, CartLineId, CategoryId, GoodId, Price, Slug, SubcategoryId, UserId, Username,
};

use super::{
    CartStore, CatalogStore, PageRequest, PageSlice, RepositoryError, Store, UserStore,
};
use crate::models::{
    CartItem, CartLine, Category, Good, NewCategory, NewGood, NewSubcategory, Subcategory, User,
};

// =============================================================================
// Row types
// =============================================================================

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: Slug,
    image: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            image: row.image,
        }
    }
}

#[derive(Debug, FromRow)]
struct SubcategoryRow {
    id: SubcategoryId,
    name: String,
    slug: Slug,
    image: Option<String>,
    category_id: CategoryId,
    category_name: String,
    category_slug: Slug,
    category_image: Option<String>,
}

impl From<SubcategoryRow> for Subcategory {
    fn from(row: SubcategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            image: row.image,
            category: Category {
                id: row.category_id,
                name: row.category_name,
                slug: row.category_slug,
                image: row.category_image,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct GoodRow {
    id: GoodId,
    name: String,
    slug: Slug,
    price: i32,
    image_large: Option<String>,
    image_medium: Option<String>,
    image_small: Option<String>,
    subcategory_id: SubcategoryId,
    subcategory_name: String,
    subcategory_slug: Slug,
    subcategory_image: Option<String>,
    category_id: CategoryId,
    category_name: String,
    category_slug: Slug,
    category_image: Option<String>,
}

impl TryFrom<GoodRow> for Good {
    type Error = RepositoryError;

    fn try_from(row: GoodRow) -> Result<Self, Self::Error> {
        let price = Price::new(i64::from(row.price)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for good {}: {e}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            price,
            subcategory: Subcategory {
                id: row.subcategory_id,
                name: row.subcategory_name,
                slug: row.subcategory_slug,
                image: row.subcategory_image,
                category: Category {
                    id: row.category_id,
                    name: row.category_name,
                    slug: row.category_slug,
                    image: row.category_image,
                },
            },
            image_large: row.image_large,
            image_medium: row.image_medium,
            image_small: row.image_small,
        })
    }
}

#[derive(Debug, FromRow)]
struct CartLineRow {
    id: CartLineId,
    good_id: GoodId,
    good_name: String,
    price: i32,
    amount: i32,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let price = Price::new(i64::from(row.price)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for good {}: {e}", row.good_id))
        })?;
        let amount = Amount::new(i64::from(row.amount)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid amount in cart line {}: {e}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            good_id: row.good_id,
            good_name: row.good_name,
            price,
            amount,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            username,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

// =============================================================================
// Queries
// =============================================================================

const SUBCATEGORY_SELECT: &str = r"
    SELECT s.id, s.name, s.slug, s.image,
           c.id AS category_id, c.name AS category_name,
           c.slug AS category_slug, c.image AS category_image
    FROM shop.subcategory s
    JOIN shop.category c ON c.id = s.category_id
";

const GOOD_SELECT: &str = r"
    SELECT g.id, g.name, g.slug, g.price,
           g.image_large, g.image_medium, g.image_small,
           s.id AS subcategory_id, s.name AS subcategory_name,
           s.slug AS subcategory_slug, s.image AS subcategory_image,
           c.id AS category_id, c.name AS category_name,
           c.slug AS category_slug, c.image AS category_image
    FROM shop.good g
    JOIN shop.subcategory s ON s.id = g.subcategory_id
    JOIN shop.category c ON c.id = s.category_id
";

const USER_COLUMNS: &str = "id, username, is_active, created_at";

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Translate constraint violations on writes into domain errors.
fn map_write_error(entity: &str) -> impl Fn(sqlx::Error) -> RepositoryError + '_ {
    move |e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return RepositoryError::Conflict(format!("{entity} already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return RepositoryError::InvalidReference(format!(
                    "{entity} references a missing row"
                ));
            }
        }
        RepositoryError::Database(e)
    }
}

/// Translate a restricted foreign key on delete into `Protected`.
fn map_delete_error(entity: &str) -> impl Fn(sqlx::Error) -> RepositoryError + '_ {
    move |e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return RepositoryError::Protected(format!("{entity} is still referenced"));
        }
        RepositoryError::Database(e)
    }
}

/// [`Store`] backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn count(&self, table: &str) -> Result<u64, RepositoryError> {
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM shop.{table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(to_u64(total))
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_categories(
        &self,
        page: PageRequest,
    ) -> Result<PageSlice<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, image
            FROM shop.category
            ORDER BY name, id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(to_i64(page.limit))
        .bind(to_i64(page.offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(PageSlice {
            items: rows.into_iter().map(Category::from).collect(),
            total: self.count("category").await?,
        })
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, image FROM shop.category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn category_by_slug(&self, slug: &Slug) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, image FROM shop.category WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn list_subcategories(
        &self,
        page: PageRequest,
    ) -> Result<PageSlice<Subcategory>, RepositoryError> {
        let sql = format!("{SUBCATEGORY_SELECT} ORDER BY s.name, s.id LIMIT $1 OFFSET $2");
        let rows = sqlx::query_as::<_, SubcategoryRow>(&sql)
            .bind(to_i64(page.limit))
            .bind(to_i64(page.offset))
            .fetch_all(&self.pool)
            .await?;

        Ok(PageSlice {
            items: rows.into_iter().map(Subcategory::from).collect(),
            total: self.count("subcategory").await?,
        })
    }

    async fn get_subcategory(
        &self,
        id: SubcategoryId,
    ) -> Result<Option<Subcategory>, RepositoryError> {
        let sql = format!("{SUBCATEGORY_SELECT} WHERE s.id = $1");
        let row = sqlx::query_as::<_, SubcategoryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Subcategory::from))
    }

    async fn subcategory_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Subcategory>, RepositoryError> {
        let sql = format!("{SUBCATEGORY_SELECT} WHERE s.slug = $1");
        let row = sqlx::query_as::<_, SubcategoryRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Subcategory::from))
    }

    async fn list_goods(&self, page: PageRequest) -> Result<PageSlice<Good>, RepositoryError> {
        let sql = format!("{GOOD_SELECT} ORDER BY g.name, g.id LIMIT $1 OFFSET $2");
        let rows = sqlx::query_as::<_, GoodRow>(&sql)
            .bind(to_i64(page.limit))
            .bind(to_i64(page.offset))
            .fetch_all(&self.pool)
            .await?;

        Ok(PageSlice {
            items: rows
                .into_iter()
                .map(Good::try_from)
                .collect::<Result<_, _>>()?,
            total: self.count("good").await?,
        })
    }

    async fn get_good(&self, id: GoodId) -> Result<Option<Good>, RepositoryError> {
        let sql = format!("{GOOD_SELECT} WHERE g.id = $1");
        let row = sqlx::query_as::<_, GoodRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Good::try_from).transpose()
    }

    async fn good_by_slug(&self, slug: &Slug) -> Result<Option<Good>, RepositoryError> {
        let sql = format!("{GOOD_SELECT} WHERE g.slug = $1");
        let row = sqlx::query_as::<_, GoodRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Good::try_from).transpose()
    }

    async fn existing_goods(&self, ids: &[GoodId]) -> Result<HashSet<GoodId>, RepositoryError> {
        let raw: Vec<i64> = ids.iter().map(GoodId::as_i64).collect();
        let found: Vec<GoodId> =
            sqlx::query_scalar("SELECT id FROM shop.good WHERE id = ANY($1)")
                .bind(&raw)
                .fetch_all(&self.pool)
                .await?;
        Ok(found.into_iter().collect())
    }

    async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.category (name, slug, image)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, image
            ",
        )
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.image)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error("category"))?;
        Ok(row.into())
    }

    async fn create_subcategory(
        &self,
        new: &NewSubcategory,
    ) -> Result<Subcategory, RepositoryError> {
        let id: SubcategoryId = sqlx::query_scalar(
            r"
            INSERT INTO shop.subcategory (name, slug, image, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.image)
        .bind(new.category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error("subcategory"))?;

        self.get_subcategory(id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn create_good(&self, new: &NewGood) -> Result<Good, RepositoryError> {
        let id: GoodId = sqlx::query_scalar(
            r"
            INSERT INTO shop.good
                (name, slug, price, subcategory_id, image_large, image_medium, image_small)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&new.name)
        .bind(&new.slug)
        .bind(new.price.as_i32())
        .bind(new.subcategory_id)
        .bind(&new.image_large)
        .bind(&new.image_medium)
        .bind(&new.image_small)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error("good"))?;

        self.get_good(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_delete_error("category"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_subcategory(&self, id: SubcategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.subcategory WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_delete_error("subcategory"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_good(&self, id: GoodId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.good WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Cart
// =============================================================================

const CART_LINES_SELECT: &str = r"
    SELECT l.id, l.good_id, g.name AS good_name, g.price, l.amount
    FROM shop.cart_line l
    JOIN shop.good g ON g.id = l.good_id
    WHERE l.user_id = $1
    ORDER BY l.id
";

#[async_trait]
impl CartStore for PgStore {
    async fn cart_lines(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(CART_LINES_SELECT)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(CartLine::try_from).collect()
    }

    async fn replace_cart(
        &self,
        user: UserId,
        items: &[CartItem],
    ) -> Result<Vec<CartLine>, RepositoryError> {
        let goods: Vec<i64> = items.iter().map(|item| item.good.as_i64()).collect();
        let amounts: Vec<i32> = items.iter().map(|item| item.amount.as_i32()).collect();

        let mut tx = self.pool.begin().await?;

        // Serializes concurrent replaces for the same user.
        sqlx::query("SELECT id FROM shop.app_user WHERE id = $1 FOR UPDATE")
            .bind(user)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        sqlx::query("DELETE FROM shop.cart_line WHERE user_id = $1")
            .bind(user)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"
            INSERT INTO shop.cart_line (user_id, good_id, amount)
            SELECT $1, t.good_id, t.amount
            FROM UNNEST($2::BIGINT[], $3::INTEGER[]) WITH ORDINALITY AS t(good_id, amount, ord)
            ORDER BY t.ord
            ",
        )
        .bind(user)
        .bind(&goods)
        .bind(&amounts)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error("cart line"))?;

        let rows = sqlx::query_as::<_, CartLineRow>(CART_LINES_SELECT)
            .bind(user)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    async fn clear_cart(&self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_line WHERE user_id = $1")
            .bind(user)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO shop.app_user (username, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("username already exists".to_owned());
                }
                RepositoryError::Database(e)
            })?;
        row.try_into()
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM shop.app_user WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_user_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM shop.app_user WHERE username = $1"
        );
        let row = sqlx::query_as::<_, CredentialsRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Ok((User::try_from(r.user)?, r.password_hash)))
            .transpose()
    }

    async fn set_user_active(
        &self,
        username: &Username,
        is_active: bool,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE shop.app_user SET is_active = $2 WHERE username = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        row.try_into()
    }

    async fn delete_user(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.app_user WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
