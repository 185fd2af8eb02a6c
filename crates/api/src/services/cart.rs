//! Shopping cart service.
//!
//! A cart is replaced as a whole: the request is validated line by line,
//! then the store swaps the old lines for the new ones in one step.

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use saraphan_core::{Amount, AmountError, GoodId, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{CartItem, CartSummary};
use crate::validation::{
    self, FieldErrors, INVALID_INTEGER, NOT_UNIQUE, REQUIRED, json_type_name,
};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The request was rejected; nothing was changed.
    #[error("invalid cart request")]
    Validation(FieldErrors),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One submitted line after parsing, before existence checks.
#[derive(Debug, Default)]
struct LineDraft {
    good: Option<GoodId>,
    amount: Option<Amount>,
    errors: FieldErrors,
}

/// Cart operations scoped to one store.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The user's current cart with totals.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn summary(&self, user: UserId) -> Result<CartSummary, CartError> {
        let lines = self.store.cart_lines(user).await?;
        Ok(CartSummary::from_lines(lines))
    }

    /// Validate `goods` and replace the user's cart with it.
    ///
    /// `goods` is the raw `goods` field of the request body. The previous
    /// cart is left untouched unless every line is valid.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` with field-scoped messages when the
    /// list is missing, empty, malformed, names unknown goods or repeats a
    /// good.
    pub async fn replace(
        &self,
        user: UserId,
        goods: Option<&Value>,
    ) -> Result<CartSummary, CartError> {
        let mut drafts = parse_goods(goods).map_err(CartError::Validation)?;

        let ids: Vec<GoodId> = drafts.iter().filter_map(|d| d.good).collect();
        let existing = self.store.existing_goods(&ids).await?;
        for draft in &mut drafts {
            if let Some(id) = draft.good
                && !existing.contains(&id)
            {
                draft
                    .errors
                    .add("good", format!("Invalid pk \"{id}\" - object does not exist."));
            }
        }

        let items = validate_lines(drafts).map_err(CartError::Validation)?;

        let lines = self
            .store
            .replace_cart(user, &items)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    CartError::Validation(FieldErrors::single("goods", NOT_UNIQUE))
                }
                RepositoryError::InvalidReference(_) => CartError::Validation(
                    FieldErrors::single("goods", "One or more goods no longer exist."),
                ),
                other => CartError::Repository(other),
            })?;

        tracing::info!(
            user_id = %user,
            lines = lines.len(),
            "Replaced shopping cart"
        );
        Ok(CartSummary::from_lines(lines))
    }

    /// Remove every line from the user's cart. Clearing an empty cart is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn clear(&self, user: UserId) -> Result<u64, CartError> {
        let removed = self.store.clear_cart(user).await?;
        tracing::info!(user_id = %user, removed, "Cleared shopping cart");
        Ok(removed)
    }
}

/// Parse the shape of the `goods` list.
fn parse_goods(goods: Option<&Value>) -> Result<Vec<LineDraft>, FieldErrors> {
    let items = match goods {
        None | Some(Value::Null) => return Err(FieldErrors::single("goods", REQUIRED)),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(FieldErrors::single(
                "goods",
                format!(
                    "Expected a list of items but got type \"{}\".",
                    json_type_name(other)
                ),
            ));
        }
    };
    Ok(items.iter().map(parse_line).collect())
}

fn parse_line(item: &Value) -> LineDraft {
    let mut draft = LineDraft::default();
    let Value::Object(fields) = item else {
        draft.errors.add(
            "non_field_errors",
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type_name(item)
            ),
        );
        return draft;
    };

    match validation::integer_field(fields.get("good")) {
        Ok(id) => draft.good = Some(GoodId::new(id)),
        Err(message) if message == INVALID_INTEGER => {
            let received = fields.get("good").map_or("null", json_type_name);
            draft.errors.add(
                "good",
                format!("Incorrect type. Expected pk value, received {received}."),
            );
        }
        Err(message) => draft.errors.add("good", message),
    }

    match validation::integer_field(fields.get("amount")) {
        Ok(value) => match Amount::new(value) {
            Ok(amount) => draft.amount = Some(amount),
            Err(AmountError::TooSmall { min }) => {
                draft.errors.add("amount", validation::min_value(min));
            }
            Err(AmountError::TooLarge { max }) => {
                draft.errors.add("amount", validation::max_value(max));
            }
        },
        Err(message) => draft.errors.add("amount", message),
    }

    draft
}

/// Turn parsed lines into cart items, or collect every problem.
fn validate_lines(drafts: Vec<LineDraft>) -> Result<Vec<CartItem>, FieldErrors> {
    if drafts.iter().any(|d| !d.errors.is_empty()) {
        let mut errors = FieldErrors::new();
        errors.add_items("goods", drafts.into_iter().map(|d| d.errors).collect());
        return Err(errors);
    }

    if drafts.is_empty() {
        let mut line = FieldErrors::new();
        line.add("good", REQUIRED);
        line.add("amount", REQUIRED);
        let mut errors = FieldErrors::new();
        errors.add_items("goods", vec![line]);
        return Err(errors);
    }

    let items: Vec<CartItem> = drafts
        .into_iter()
        .filter_map(|d| match (d.good, d.amount) {
            (Some(good), Some(amount)) => Some(CartItem { good, amount }),
            _ => None,
        })
        .collect();

    let mut seen = HashSet::with_capacity(items.len());
    if items.iter().any(|item| !seen.insert(item.good)) {
        let mut errors = FieldErrors::new();
        errors.add_items("goods", vec![FieldErrors::single("good", NOT_UNIQUE)]);
        return Err(errors);
    }

    Ok(items)
}
