use crate::cart::{CartError, MAX_QUANTITY};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct MenuItem {
  pub name: String,
  pub unit_price: u64,  // smallest currency unit (rupiah)
}

impl MenuItem {
  pub fn new(name: &str, unit_price: u64) -> MenuItem {
    MenuItem {
      name: name.to_string(),
      unit_price,
    }
  }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
  #[error("menu has no items")]
  Empty,
  #[error("menu item {0:?} is declared more than once")]
  DuplicateItem(String),
  #[error("menu prices add up to more than {0}")]
  PricesTooHigh(u64),
}

/// Upper bound on the sum of all unit prices. A cart holds each item at most
/// `MAX_QUANTITY` times, so its total never exceeds `u64::MAX`.
pub const MAX_PRICE_SUM: u64 = u64::MAX / MAX_QUANTITY as u64;

/// The fixed menu. Built once at startup and only read afterwards.
///
/// Iteration order is declaration order, which is also the order the
/// ordering page lists the items in.
#[derive(Debug, Clone)]
pub struct Catalog {
  items: Vec<MenuItem>,
}

impl Catalog {
  pub fn new(items: Vec<MenuItem>) -> Result<Catalog, CatalogError> {
    if items.is_empty() {
      return Err(CatalogError::Empty)
    }
    let mut seen = HashSet::new();
    for item in &items {
      if !seen.insert(item.name.as_str()) {
        return Err(CatalogError::DuplicateItem(item.name.clone()))
      }
    }
    let sum = items.iter().try_fold(0u64, |acc, x| acc.checked_add(x.unit_price));
    match sum {
      Some(x) if x <= MAX_PRICE_SUM => {},
      _ => return Err(CatalogError::PricesTooHigh(MAX_PRICE_SUM)),
    }
    Ok(Catalog { items })
  }

  pub fn list_items(&self) -> &[MenuItem] {
    &self.items
  }

  pub fn price_of(&self, name: &str) -> Result<u64, CartError> {
    self.items.iter()
      .find(|x| x.name == name)
      .map(|x| x.unit_price)
      .ok_or_else(|| CartError::UnknownItem(name.to_string()))
  }

  pub fn contains(&self, name: &str) -> bool {
    self.items.iter().any(|x| x.name == name)
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

impl Default for Catalog {
  fn default() -> Self {
    Catalog {
      items: vec![
        MenuItem::new("Ayam Goreng", 15000),
        MenuItem::new("Tahu Goreng", 5000),
        MenuItem::new("Pisang Goreng", 7000),
        MenuItem::new("Es Teh", 5000),
        MenuItem::new("Nasi Putih", 6000),
        MenuItem::new("Tempe Goreng", 5000),
        MenuItem::new("Sambal", 3000),
      ],
    }
  }
}
