use application::{
  money::{format_line, format_price},
  order::Order,
};

/// Receives every order a customer submits.
///
/// Orders are not stored anywhere by the server itself. Whatever needs to
/// act on them (kitchen display, persistence, email) hooks in here.
pub trait OrderNotifier: Send + Sync {
  fn order_placed(&self, order: &Order);
}

/// Writes each order to the log and nothing else.
pub struct LogNotifier();

impl OrderNotifier for LogNotifier {
  fn order_placed(&self, order: &Order) {
    let lines: Vec<String> = order.lines.iter().map(format_line).collect();
    info!(
      "Order {} placed at {}: {} | Total {}",
      order.id, order.placed_at, lines.join("; "), format_price(order.total_price),
    );
  }
}
