//! A user's live cart.

use crate::cart::{compute_subtotal, CartLine};
use crate::error::CheckoutError;
use crate::ids::{CartLineId, UserId};
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// A shopping cart owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    /// Owner.
    pub user_id: UserId,
    /// Lines in the cart.
    pub lines: Vec<CartLine>,
    /// Cart currency.
    pub currency: Currency,
}

impl Cart {
    /// Create an empty cart for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            lines: Vec::new(),
            currency: Currency::VND,
        }
    }

    /// Build a cart from lines already persisted for the user.
    pub fn with_lines(user_id: UserId, lines: Vec<CartLine>) -> Self {
        Self {
            user_id,
            lines,
            currency: Currency::VND,
        }
    }

    /// Add a line, merging with an existing line of the same product and size.
    ///
    /// The merged quantity must not exceed the line's stock. Returns the id
    /// of the line that now holds the quantity.
    pub fn add_line(&mut self, line: CartLine) -> Result<CartLineId, CheckoutError> {
        if line.quantity <= 0 {
            return Err(CheckoutError::invalid_line(
                &line.id,
                format!("non-positive quantity {}", line.quantity),
            ));
        }

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id && l.size == line.size)
        {
            let requested = existing
                .quantity
                .checked_add(line.quantity)
                .ok_or(CheckoutError::Overflow)?;
            if requested > line.stock {
                return Err(CheckoutError::InsufficientStock {
                    product_id: line.product_id.to_string(),
                    requested,
                    available: line.stock,
                });
            }
            existing.quantity = requested;
            existing.stock = line.stock;
            return Ok(existing.id.clone());
        }

        if line.quantity > line.stock {
            return Err(CheckoutError::InsufficientStock {
                product_id: line.product_id.to_string(),
                requested: line.quantity,
                available: line.stock,
            });
        }

        let id = line.id.clone();
        self.lines.push(line);
        Ok(id)
    }

    /// Set the quantity of a line. A quantity of zero or less removes it.
    pub fn update_quantity(&mut self, line_id: &CartLineId, quantity: i64) -> Result<(), CheckoutError> {
        if quantity <= 0 {
            return if self.remove_line(line_id) {
                Ok(())
            } else {
                Err(CheckoutError::LineNotFound(line_id.to_string()))
            };
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| &l.id == line_id)
            .ok_or_else(|| CheckoutError::LineNotFound(line_id.to_string()))?;

        if quantity > line.stock {
            return Err(CheckoutError::InsufficientStock {
                product_id: line.product_id.to_string(),
                requested: quantity,
                available: line.stock,
            });
        }
        line.quantity = quantity;
        Ok(())
    }

    /// Remove a line.
    pub fn remove_line(&mut self, line_id: &CartLineId) -> bool {
        let len_before = self.lines.len();
        self.lines.retain(|l| &l.id != line_id);
        self.lines.len() < len_before
    }

    /// Copy the lines selected for checkout.
    pub fn select(&self, ids: &[CartLineId]) -> Result<Vec<CartLine>, CheckoutError> {
        ids.iter()
            .map(|id| {
                self.lines
                    .iter()
                    .find(|l| &l.id == id)
                    .cloned()
                    .ok_or_else(|| CheckoutError::LineNotFound(id.to_string()))
            })
            .collect()
    }

    /// Total item count (sum of quantities).
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Subtotal of every line in the cart.
    pub fn subtotal(&self) -> Result<Money, CheckoutError> {
        compute_subtotal(&self.lines, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shirt(id: &str, size: &str, quantity: i64) -> CartLine {
        CartLine::new(id, "p-1", "Linen Shirt", Money::vnd(250_000), quantity, size, 5)
    }

    #[test]
    fn test_add_line() {
        let mut cart = Cart::new(UserId::new("u1"));
        cart.add_line(shirt("c1", "M", 2)).unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.subtotal().unwrap(), Money::vnd(500_000));
    }

    #[test]
    fn test_same_product_and_size_merges() {
        let mut cart = Cart::new(UserId::new("u1"));
        let first = cart.add_line(shirt("c1", "M", 2)).unwrap();
        let second = cart.add_line(shirt("c2", "M", 1)).unwrap();
        assert_eq!(first, second);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_different_size_is_separate_line() {
        let mut cart = Cart::new(UserId::new("u1"));
        cart.add_line(shirt("c1", "M", 1)).unwrap();
        cart.add_line(shirt("c2", "L", 1)).unwrap();
        assert_eq!(cart.lines.len(), 2);
    }

    #[test]
    fn test_merge_over_stock_rejected() {
        let mut cart = Cart::new(UserId::new("u1"));
        cart.add_line(shirt("c1", "M", 4)).unwrap();
        let err = cart.add_line(shirt("c2", "M", 2)).unwrap_err();
        assert_eq!(
            err,
            CheckoutError::InsufficientStock {
                product_id: "p-1".to_string(),
                requested: 6,
                available: 5,
            }
        );
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_update_quantity_and_remove() {
        let mut cart = Cart::new(UserId::new("u1"));
        let id = cart.add_line(shirt("c1", "M", 1)).unwrap();
        cart.update_quantity(&id, 3).unwrap();
        assert_eq!(cart.item_count(), 3);
        assert!(cart.update_quantity(&id, 9).is_err());
        cart.update_quantity(&id, 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_select_subset() {
        let mut cart = Cart::new(UserId::new("u1"));
        cart.add_line(shirt("c1", "M", 1)).unwrap();
        cart.add_line(shirt("c2", "L", 1)).unwrap();
        let picked = cart.select(&[CartLineId::new("c2")]).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].size, "L");
        assert!(cart.select(&[CartLineId::new("missing")]).is_err());
    }
}
