use crate::{
  menu::Catalog,
  order::{LineItem, Order, Totals},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_QUANTITY: i64 = 0;
pub const MAX_QUANTITY: i64 = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
  #[error("item {0:?} is not on the menu")]
  UnknownItem(String),
  #[error("quantity {0} is outside 0..=10")]
  InvalidQuantity(i64),
  #[error("cart is empty")]
  EmptyCart,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct CartEntry {
  pub item_name: String,
  pub quantity: u8,
}

/// Quantities picked by one customer session.
///
/// Entries keep the order in which items were first picked. A zero quantity
/// is never stored: setting an item to zero removes it, so absent and zero
/// mean the same thing.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CartSession {
  entries: Vec<CartEntry>,
}

impl CartSession {
  pub fn new() -> CartSession {
    CartSession { entries: vec![] }
  }

  /// Validates `quantity` and `item_name` before touching the cart, so a
  /// rejected call leaves it exactly as it was.
  pub fn set_quantity(
    &mut self,
    catalog: &Catalog,
    item_name: &str,
    quantity: i64,
  ) -> Result<(), CartError> {
    if !catalog.contains(item_name) {
      return Err(CartError::UnknownItem(item_name.to_string()))
    }
    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
      return Err(CartError::InvalidQuantity(quantity))
    }

    let pos = self.entries.iter().position(|x| x.item_name == item_name);
    match (pos, quantity) {
      (Some(i), 0) => {
        self.entries.remove(i);
        debug!("Removed {} from cart", item_name);
      },
      (None, 0) => {},
      (Some(i), q) => self.entries[i].quantity = q as u8,
      (None, q) => {
        self.entries.push(CartEntry {
          item_name: item_name.to_string(),
          quantity: q as u8,
        });
        debug!("Added {} x{} to cart", item_name, q);
      },
    }
    Ok(())
  }

  pub fn compute_total(&self, catalog: &Catalog) -> Result<Totals, CartError> {
    let mut totals = Totals::default();
    for entry in &self.entries {
      let amount = catalog.price_of(&entry.item_name)? * entry.quantity as u64;
      totals.total_price += amount;
      totals.lines.push(LineItem {
        name: entry.item_name.clone(),
        quantity: entry.quantity,
        amount,
      });
    }
    Ok(totals)
  }

  /// Turns the current contents into an order and empties the cart.
  ///
  /// Nothing changes when the cart is empty or a price lookup fails.
  pub fn submit(
    &mut self,
    catalog: &Catalog,
    order_id: String,
    placed_at: i64,
  ) -> Result<Order, CartError> {
    if self.entries.is_empty() {
      return Err(CartError::EmptyCart)
    }
    let totals = self.compute_total(catalog)?;
    self.entries.clear();
    Ok(Order::from_totals(order_id, placed_at, totals))
  }

  pub fn quantity_of(&self, item_name: &str) -> u8 {
    self.entries.iter()
      .find(|x| x.item_name == item_name)
      .map(|x| x.quantity)
      .unwrap_or(0)
  }

  pub fn entries(&self) -> &[CartEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
