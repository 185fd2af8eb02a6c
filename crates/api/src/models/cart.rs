//! Shopping cart domain types.

use saraphan_core::{Amount, CartLineId, GoodId, Price};

/// A validated line of a cart replacement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItem {
    pub good: GoodId,
    pub amount: Amount,
}

/// A stored cart line joined with its good.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Line ID, increasing in insertion order.
    pub id: CartLineId,
    pub good_id: GoodId,
    /// Current name of the good.
    pub good_name: String,
    /// Current unit price of the good.
    pub price: Price,
    pub amount: Amount,
}

impl CartLine {
    /// Price of the whole line.
    #[must_use]
    pub const fn subtotal(&self) -> i64 {
        self.price.times(self.amount)
    }
}

/// A user's cart with its totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    /// Number of distinct goods (lines) in the cart.
    pub total_goods: usize,
    /// Sum of `price * amount` over all lines.
    pub total_sum: i64,
    /// Lines ordered by line ID.
    pub lines: Vec<CartLine>,
}

impl CartSummary {
    /// Compute totals for a set of lines.
    ///
    /// Lines are sorted by ID so the output order follows insertion order.
    #[must_use]
    pub fn from_lines(mut lines: Vec<CartLine>) -> Self {
        lines.sort_by_key(|line| line.id);
        let total_goods = lines.len();
        let total_sum = lines
            .iter()
            .fold(0_i64, |acc, line| acc.saturating_add(line.subtotal()));
        Self {
            total_goods,
            total_sum,
            lines,
        }
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
