//! In-memory storage adapter.
//!
//! All tables live behind one `RwLock`, so every write (including a whole
//! cart replace) is atomic with respect to every other operation. Data is
//! lost when the process exits.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use saraphan_core::{
    Amount, CartLineId, CategoryId, GoodId, Price, Slug, SubcategoryId, UserId, Username,
};

use super::{
    CartStore, CatalogStore, PageRequest, PageSlice, RepositoryError, Store, UserStore,
};
use crate::models::{
    CartItem, CartLine, Category, Good, NewCategory, NewGood, NewSubcategory, Subcategory, User,
};

#[derive(Debug, Clone)]
struct SubcategoryRecord {
    name: String,
    slug: Slug,
    image: Option<String>,
    category_id: CategoryId,
}

#[derive(Debug, Clone)]
struct GoodRecord {
    name: String,
    slug: Slug,
    price: Price,
    subcategory_id: SubcategoryId,
    image_large: Option<String>,
    image_medium: Option<String>,
    image_small: Option<String>,
}

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
}

#[derive(Debug, Clone, Copy)]
struct CartLineRecord {
    user_id: UserId,
    good_id: GoodId,
    amount: Amount,
}

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    subcategories: BTreeMap<SubcategoryId, SubcategoryRecord>,
    goods: BTreeMap<GoodId, GoodRecord>,
    users: BTreeMap<UserId, UserRecord>,
    cart_lines: BTreeMap<CartLineId, CartLineRecord>,
    sequences: Sequences,
}

/// Last issued ID per table, like a `BIGSERIAL` column each.
#[derive(Debug, Default)]
struct Sequences {
    category: i64,
    subcategory: i64,
    good: i64,
    user: i64,
    cart_line: i64,
}

const fn next_id(sequence: &mut i64) -> i64 {
    *sequence += 1;
    *sequence
}

impl Tables {

    fn subcategory(&self, id: SubcategoryId) -> Result<Option<Subcategory>, RepositoryError> {
        let Some(record) = self.subcategories.get(&id) else {
            return Ok(None);
        };
        let category = self
            .categories
            .get(&record.category_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!("subcategory {id} has no category"))
            })?;
        Ok(Some(Subcategory {
            id,
            name: record.name.clone(),
            slug: record.slug.clone(),
            image: record.image.clone(),
            category,
        }))
    }

    fn good(&self, id: GoodId) -> Result<Option<Good>, RepositoryError> {
        let Some(record) = self.goods.get(&id) else {
            return Ok(None);
        };
        let subcategory = self.subcategory(record.subcategory_id)?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("good {id} has no subcategory"))
        })?;
        Ok(Some(Good {
            id,
            name: record.name.clone(),
            slug: record.slug.clone(),
            price: record.price,
            subcategory,
            image_large: record.image_large.clone(),
            image_medium: record.image_medium.clone(),
            image_small: record.image_small.clone(),
        }))
    }

    fn cart_lines(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        self.cart_lines
            .iter()
            .filter(|(_, line)| line.user_id == user)
            .map(|(id, line)| {
                let good = self.goods.get(&line.good_id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!("cart line {id} has no good"))
                })?;
                Ok(CartLine {
                    id: *id,
                    good_id: line.good_id,
                    good_name: good.name.clone(),
                    price: good.price,
                    amount: line.amount,
                })
            })
            .collect()
    }
}

/// Sort by name then ID and cut out one page.
fn paginate<T>(
    mut items: Vec<T>,
    page: PageRequest,
    key: impl Fn(&T) -> (String, i64),
) -> PageSlice<T> {
    items.sort_by_key(|item| key(item));
    let total = items.len() as u64;
    let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    PageSlice {
        items: items.into_iter().skip(offset).take(limit).collect(),
        total,
    }
}

fn check_unique<'a>(
    mut existing: impl Iterator<Item = (&'a str, &'a Slug)>,
    name: &str,
    slug: &Slug,
    entity: &str,
) -> Result<(), RepositoryError> {
    if existing.any(|(n, s)| n == name || s == slug) {
        return Err(RepositoryError::Conflict(format!(
            "{entity} name or slug already exists"
        )));
    }
    Ok(())
}

/// Process-local [`Store`] implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(
        &self,
        page: PageRequest,
    ) -> Result<PageSlice<Category>, RepositoryError> {
        let tables = self.tables.read().await;
        let items = tables.categories.values().cloned().collect();
        Ok(paginate(items, page, |c: &Category| {
            (c.name.clone(), c.id.as_i64())
        }))
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn category_by_slug(&self, slug: &Slug) -> Result<Option<Category>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .find(|c| &c.slug == slug)
            .cloned())
    }

    async fn list_subcategories(
        &self,
        page: PageRequest,
    ) -> Result<PageSlice<Subcategory>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut items = Vec::with_capacity(tables.subcategories.len());
        for id in tables.subcategories.keys() {
            if let Some(subcategory) = tables.subcategory(*id)? {
                items.push(subcategory);
            }
        }
        Ok(paginate(items, page, |s: &Subcategory| {
            (s.name.clone(), s.id.as_i64())
        }))
    }

    async fn get_subcategory(
        &self,
        id: SubcategoryId,
    ) -> Result<Option<Subcategory>, RepositoryError> {
        self.tables.read().await.subcategory(id)
    }

    async fn subcategory_by_slug(
        &self,
        slug: &Slug,
    ) -> Result<Option<Subcategory>, RepositoryError> {
        let tables = self.tables.read().await;
        let id = tables
            .subcategories
            .iter()
            .find(|(_, s)| &s.slug == slug)
            .map(|(id, _)| *id);
        match id {
            Some(id) => tables.subcategory(id),
            None => Ok(None),
        }
    }

    async fn list_goods(&self, page: PageRequest) -> Result<PageSlice<Good>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut items = Vec::with_capacity(tables.goods.len());
        for id in tables.goods.keys() {
            if let Some(good) = tables.good(*id)? {
                items.push(good);
            }
        }
        Ok(paginate(items, page, |g: &Good| (g.name.clone(), g.id.as_i64())))
    }

    async fn get_good(&self, id: GoodId) -> Result<Option<Good>, RepositoryError> {
        self.tables.read().await.good(id)
    }

    async fn good_by_slug(&self, slug: &Slug) -> Result<Option<Good>, RepositoryError> {
        let tables = self.tables.read().await;
        let id = tables
            .goods
            .iter()
            .find(|(_, g)| &g.slug == slug)
            .map(|(id, _)| *id);
        match id {
            Some(id) => tables.good(id),
            None => Ok(None),
        }
    }

    async fn existing_goods(&self, ids: &[GoodId]) -> Result<HashSet<GoodId>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter(|id| tables.goods.contains_key(id))
            .copied()
            .collect())
    }

    async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        check_unique(
            tables.categories.values().map(|c| (c.name.as_str(), &c.slug)),
            &new.name,
            &new.slug,
            "category",
        )?;
        let category = Category {
            id: CategoryId::new(next_id(&mut tables.sequences.category)),
            name: new.name.clone(),
            slug: new.slug.clone(),
            image: new.image.clone(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn create_subcategory(
        &self,
        new: &NewSubcategory,
    ) -> Result<Subcategory, RepositoryError> {
        let mut tables = self.tables.write().await;
        check_unique(
            tables
                .subcategories
                .values()
                .map(|s| (s.name.as_str(), &s.slug)),
            &new.name,
            &new.slug,
            "subcategory",
        )?;
        if !tables.categories.contains_key(&new.category_id) {
            return Err(RepositoryError::InvalidReference(format!(
                "category {} does not exist",
                new.category_id
            )));
        }
        let id = SubcategoryId::new(next_id(&mut tables.sequences.subcategory));
        tables.subcategories.insert(
            id,
            SubcategoryRecord {
                name: new.name.clone(),
                slug: new.slug.clone(),
                image: new.image.clone(),
                category_id: new.category_id,
            },
        );
        tables.subcategory(id)?.ok_or(RepositoryError::NotFound)
    }

    async fn create_good(&self, new: &NewGood) -> Result<Good, RepositoryError> {
        let mut tables = self.tables.write().await;
        check_unique(
            tables.goods.values().map(|g| (g.name.as_str(), &g.slug)),
            &new.name,
            &new.slug,
            "good",
        )?;
        if !tables.subcategories.contains_key(&new.subcategory_id) {
            return Err(RepositoryError::InvalidReference(format!(
                "subcategory {} does not exist",
                new.subcategory_id
            )));
        }
        let id = GoodId::new(next_id(&mut tables.sequences.good));
        tables.goods.insert(
            id,
            GoodRecord {
                name: new.name.clone(),
                slug: new.slug.clone(),
                price: new.price,
                subcategory_id: new.subcategory_id,
                image_large: new.image_large.clone(),
                image_medium: new.image_medium.clone(),
                image_small: new.image_small.clone(),
            },
        );
        tables.good(id)?.ok_or(RepositoryError::NotFound)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.subcategories.values().any(|s| s.category_id == id) {
            return Err(RepositoryError::Protected(format!(
                "category {id} still has subcategories"
            )));
        }
        tables.categories.remove(&id);
        Ok(())
    }

    async fn delete_subcategory(&self, id: SubcategoryId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.subcategories.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.goods.values().any(|g| g.subcategory_id == id) {
            return Err(RepositoryError::Protected(format!(
                "subcategory {id} still has goods"
            )));
        }
        tables.subcategories.remove(&id);
        Ok(())
    }

    async fn delete_good(&self, id: GoodId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.goods.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        tables.cart_lines.retain(|_, line| line.good_id != id);
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart_lines(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        self.tables.read().await.cart_lines(user)
    }

    async fn replace_cart(
        &self,
        user: UserId,
        items: &[CartItem],
    ) -> Result<Vec<CartLine>, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user) {
            return Err(RepositoryError::NotFound);
        }

        // Check everything before touching the previous cart.
        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            if !seen.insert(item.good) {
                return Err(RepositoryError::Conflict(format!(
                    "good {} appears more than once",
                    item.good
                )));
            }
            if !tables.goods.contains_key(&item.good) {
                return Err(RepositoryError::InvalidReference(format!(
                    "good {} does not exist",
                    item.good
                )));
            }
        }

        tables.cart_lines.retain(|_, line| line.user_id != user);
        for item in items {
            let id = CartLineId::new(next_id(&mut tables.sequences.cart_line));
            tables.cart_lines.insert(
                id,
                CartLineRecord {
                    user_id: user,
                    good_id: item.good,
                    amount: item.amount,
                },
            );
        }
        tables.cart_lines(user)
    }

    async fn clear_cart(&self, user: UserId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write().await;
        let before = tables.cart_lines.len();
        tables.cart_lines.retain(|_, line| line.user_id != user);
        Ok((before - tables.cart_lines.len()) as u64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|r| &r.user.username == username) {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }
        let user = User {
            id: UserId::new(next_id(&mut tables.sequences.user)),
            username: username.clone(),
            is_active: true,
            created_at: Utc::now(),
        };
        tables.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|r| r.user.clone()))
    }

    async fn get_user_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|r| &r.user.username == username)
            .map(|r| (r.user.clone(), r.password_hash.clone())))
    }

    async fn set_user_active(
        &self,
        username: &Username,
        is_active: bool,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .users
            .values_mut()
            .find(|r| &r.user.username == username)
            .ok_or(RepositoryError::NotFound)?;
        record.user.is_active = is_active;
        Ok(record.user.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        tables.cart_lines.retain(|_, line| line.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryStore, UserId, Vec<GoodId>) {
        let store = MemoryStore::new();
        let category = store
            .create_category(&NewCategory {
                name: "Категория 1".to_owned(),
                slug: Slug::parse("category-1").unwrap(),
                image: None,
            })
            .await
            .unwrap();
        let subcategory = store
            .create_subcategory(&NewSubcategory {
                name: "Подкатегория 1".to_owned(),
                slug: Slug::parse("subcategory-1").unwrap(),
                image: None,
                category_id: category.id,
            })
            .await
            .unwrap();
        let mut goods = Vec::new();
        for n in 1..=3 {
            let good = store
                .create_good(&NewGood {
                    name: format!("Товар {n}"),
                    slug: Slug::parse(&format!("good-{n}")).unwrap(),
                    price: Price::new(n).unwrap(),
                    subcategory_id: subcategory.id,
                    image_large: None,
                    image_medium: None,
                    image_small: None,
                })
                .await
                .unwrap();
            goods.push(good.id);
        }
        let user = store
            .create_user(&Username::parse("user_1").unwrap(), "hash")
            .await
            .unwrap();
        (store, user.id, goods)
    }

    fn item(good: GoodId, amount: i64) -> CartItem {
        CartItem {
            good,
            amount: Amount::new(amount).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_goods_resolve_parents() {
        let (store, _, goods) = seeded().await;
        let good = store.get_good(goods[0]).await.unwrap().unwrap();
        assert_eq!(good.subcategory.slug.as_str(), "subcategory-1");
        assert_eq!(good.subcategory.category.slug.as_str(), "category-1");
    }

    #[tokio::test]
    async fn test_list_pages_by_name() {
        let (store, _, _) = seeded().await;
        let page = store
            .list_goods(PageRequest {
                offset: 1,
                limit: 1,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Товар 2");
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let (store, _, _) = seeded().await;
        let result = store
            .create_category(&NewCategory {
                name: "Другая".to_owned(),
                slug: Slug::parse("category-1").unwrap(),
                image: None,
            })
            .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_replace_cart_discards_previous_lines() {
        let (store, user, goods) = seeded().await;
        store
            .replace_cart(user, &[item(goods[0], 10), item(goods[1], 20)])
            .await
            .unwrap();
        let lines = store
            .replace_cart(user, &[item(goods[0], 20), item(goods[2], 10)])
            .await
            .unwrap();
        let held: Vec<GoodId> = lines.iter().map(|l| l.good_id).collect();
        assert_eq!(held, vec![goods[0], goods[2]]);
        assert_eq!(store.cart_lines(user).await.unwrap(), lines);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_cart() {
        let (store, user, goods) = seeded().await;
        let before = store
            .replace_cart(user, &[item(goods[0], 1)])
            .await
            .unwrap();

        let duplicate = store
            .replace_cart(user, &[item(goods[1], 1), item(goods[1], 2)])
            .await;
        assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));

        let missing = store
            .replace_cart(user, &[item(GoodId::new(999), 1)])
            .await;
        assert!(matches!(missing, Err(RepositoryError::InvalidReference(_))));

        assert_eq!(store.cart_lines(user).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_clear_cart_is_idempotent() {
        let (store, user, goods) = seeded().await;
        store
            .replace_cart(user, &[item(goods[0], 1), item(goods[1], 1)])
            .await
            .unwrap();
        assert_eq!(store.clear_cart(user).await.unwrap(), 2);
        assert_eq!(store.clear_cart(user).await.unwrap(), 0);
        assert!(store.cart_lines(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_protection() {
        let (store, _, goods) = seeded().await;
        let good = store.get_good(goods[0]).await.unwrap().unwrap();
        let result = store.delete_category(good.subcategory.category.id).await;
        assert!(matches!(result, Err(RepositoryError::Protected(_))));
        let result = store.delete_subcategory(good.subcategory.id).await;
        assert!(matches!(result, Err(RepositoryError::Protected(_))));
    }

    #[tokio::test]
    async fn test_delete_good_cascades_to_cart() {
        let (store, user, goods) = seeded().await;
        store
            .replace_cart(user, &[item(goods[0], 1), item(goods[1], 1)])
            .await
            .unwrap();
        store.delete_good(goods[0]).await.unwrap();
        let lines = store.cart_lines(user).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].good_id, goods[1]);
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let (store, user, goods) = seeded().await;
        let other = store
            .create_user(&Username::parse("user_2").unwrap(), "hash")
            .await
            .unwrap();
        store
            .replace_cart(user, &[item(goods[0], 1)])
            .await
            .unwrap();
        store
            .replace_cart(other.id, &[item(goods[1], 5)])
            .await
            .unwrap();
        store.clear_cart(other.id).await.unwrap();
        assert_eq!(store.cart_lines(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_user_active() {
        let (store, user, _) = seeded().await;
        let username = Username::parse("user_1").unwrap();
        let updated = store.set_user_active(&username, false).await.unwrap();
        assert!(!updated.is_active);
        assert!(!store.get_user(user).await.unwrap().unwrap().is_active);
    }
}
