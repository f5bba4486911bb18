use crate::order::LineItem;

pub const CURRENCY_PREFIX: &str = "Rp ";

/// `45000` -> `"45,000"`. No decimals, rupiah has no minor unit in practice.
pub fn group_thousands(amount: u64) -> String {
  let digits = amount.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}

pub fn format_price(amount: u64) -> String {
  format!("{}{}", CURRENCY_PREFIX, group_thousands(amount))
}

pub fn format_line(line: &LineItem) -> String {
  format!("{} x{}: {}", line.name, line.quantity, format_price(line.amount))
}
