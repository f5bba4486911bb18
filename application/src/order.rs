use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct LineItem {
  pub name: String,
  pub quantity: u8,
  pub amount: u64,
}

/// Line items of a cart in selection order, plus their sum.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Eq, PartialEq)]
pub struct Totals {
  pub lines: Vec<LineItem>,
  pub total_price: u64,
}

impl Totals {
  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }
}

/// What a submission produced. Handed to the notifier and the confirmation
/// response, then dropped.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Order {
  pub id: String,
  pub placed_at: i64,
  pub lines: Vec<LineItem>,
  pub total_price: u64,
}

impl Order {
  pub fn from_totals(id: String, placed_at: i64, totals: Totals) -> Order {
    Order {
      id,
      placed_at,
      lines: totals.lines,
      total_price: totals.total_price,
    }
  }

  pub fn num_portions(&self) -> u32 {
    self.lines.iter().map(|x| x.quantity as u32).sum()
  }
}
