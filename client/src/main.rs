use application::{
  api::{ApiError, SetQuantityParam},
  cart::MAX_QUANTITY,
  menu::MenuItem,
  money::format_price,
  order::{Order, Totals},
};
use clap::Parser;
use log::{
  info,
  error,
  warn,
  LevelFilter,
};
use rand::{seq::SliceRandom, thread_rng, Rng};
use reqwest::StatusCode;
use simple_logger::SimpleLogger;
use std::time::Duration;

macro_rules! log_info {
  ($customer_id: expr, $round: expr, $msg: expr) => {
    info!("[Customer {}] Round {}: {}", $customer_id, $round, $msg)
  };
}
macro_rules! log_warn {
  ($customer_id: expr, $round: expr, $msg: expr) => {
    warn!("[Customer {}] Round {}: {}", $customer_id, $round, $msg)
  };
}
macro_rules! log_error {
  ($customer_id: expr, $round: expr, $msg: expr) => {
    error!("[Customer {}] Round {}: {}", $customer_id, $round, $msg)
  };
}

/*
  curl -c jar -b jar http://localhost:8000/v1/menu
  curl -c jar -b jar -X PUT -H "Content-Type: application/json" -d '{"item_name":"Es Teh","quantity":2}' http://localhost:8000/v1/cart
  curl -c jar -b jar -X POST http://localhost:8000/v1/order
*/

/// Simulated customers ordering against a running server.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
  /// Server address, without the /v1 prefix
  #[arg(long, default_value = "http://localhost:8000")]
  base_url: String,

  /// Number of customers ordering at the same time
  #[arg(short = 'n', long, default_value_t = 10)]
  customers: usize,

  /// Orders placed by each customer
  #[arg(short, long, default_value_t = 5)]
  rounds: usize,

  /// Pause between two orders of one customer
  #[arg(long, default_value_t = 200)]
  pause_ms: u64,
}

/// One customer's browser: a cookie store holds its session.
struct Client {
  http_client: reqwest::Client,
  base_url: String,
}

impl Client {
  pub fn new(base_url: &str) -> Result<Client, reqwest::Error> {
    let http_client = reqwest::Client::builder()
      .cookie_store(true)
      .build()?;
    Ok(Client {
      http_client,
      base_url: format!("{}/v1", base_url.trim_end_matches('/')),
    })
  }

  pub async fn get_menu(&self) -> Result<Vec<MenuItem>, reqwest::Error> {
    let url = format!("{}/menu", self.base_url);
    self.http_client.get(&url)
      .send()
      .await?
      .error_for_status()?
      .json::<Vec<MenuItem>>()
      .await
  }

  pub async fn set_quantity(&self, item_name: &str, quantity: i64) -> Result<Result<Totals, ApiError>, reqwest::Error> {
    let url = format!("{}/cart", self.base_url);
    let param = SetQuantityParam {
      item_name: item_name.to_string(),
      quantity,
    };
    let resp = self.http_client.put(&url)
      .json(&param)
      .send()
      .await?;

    match resp.status() {
      StatusCode::OK => Ok(Ok(resp.json::<Totals>().await?)),
      _ => Ok(Err(resp.json::<ApiError>().await?)),
    }
  }

  pub async fn get_cart(&self) -> Result<Totals, reqwest::Error> {
    let url = format!("{}/cart", self.base_url);
    self.http_client.get(&url)
      .send()
      .await?
      .error_for_status()?
      .json::<Totals>()
      .await
  }

  pub async fn place_order(&self) -> Result<Result<Order, ApiError>, reqwest::Error> {
    let url = format!("{}/order", self.base_url);
    let resp = self.http_client.post(&url)
      .send()
      .await?;

    match resp.status() {
      StatusCode::OK => Ok(Ok(resp.json::<Order>().await?)),
      _ => Ok(Err(resp.json::<ApiError>().await?)),
    }
  }

  pub async fn end_session(&self) -> Result<bool, reqwest::Error> {
    let url = format!("{}/session", self.base_url);
    self.http_client.delete(&url)
      .send()
      .await?
      .error_for_status()?
      .json::<bool>()
      .await
  }
}

/// Random quantity changes for one order. Some items are dropped again
/// by setting them back to zero, like a customer changing their mind.
fn random_picks(menu: &[MenuItem]) -> Vec<(String, i64)> {
  let mut rng = thread_rng();
  let num_items = rng.gen_range(1..=menu.len());
  let mut picks: Vec<(String, i64)> = menu
    .choose_multiple(&mut rng, num_items)
    .map(|x| (x.name.clone(), rng.gen_range(1..=MAX_QUANTITY)))
    .collect();

  if picks.len() > 1 && rng.gen_bool(0.3) {
    let dropped = picks[0].0.clone();
    picks.push((dropped, 0));
  }
  picks
}

/// Total the server should report after `picks` are applied to an empty cart.
fn expected_total(menu: &[MenuItem], picks: &[(String, i64)]) -> u64 {
  let mut cart: Vec<(&str, i64)> = vec![];
  for (name, quantity) in picks {
    cart.retain(|(x, _)| x != name);
    if *quantity > 0 {
      cart.push((name.as_str(), *quantity));
    }
  }
  cart.iter()
    .map(|(name, quantity)| {
      let price = menu.iter().find(|x| x.name == *name).map(|x| x.unit_price).unwrap_or(0);
      price * *quantity as u64
    })
    .sum()
}

async fn start_customer(customer_id: usize, base_url: String, rounds: usize, pause: Duration) {
  let cli = match Client::new(&base_url) {
    Ok(x) => x,
    Err(err) => {
      error!("[Customer {}] Failed to build http client: {:?}", customer_id, err);
      return
    },
  };
  let menu = match cli.get_menu().await {
    Ok(x) => x,
    Err(err) => {
      error!("[Customer {}] Failed to get menu: {:?}", customer_id, err);
      return
    },
  };

  for round in 0..rounds {
    let picks = random_picks(&menu);
    for (item_name, quantity) in &picks {
      match cli.set_quantity(item_name, *quantity).await {
        Ok(Ok(totals)) => log_info!(customer_id, round, format!(
          "{} x{} -> {}", item_name, quantity, format_price(totals.total_price),
        )),
        Ok(Err(e)) => log_warn!(customer_id, round, format!("{} x{} rejected: {}", item_name, quantity, e.error)),
        Err(err) => log_error!(customer_id, round, format!("Failed to set {}: {:?}", item_name, err)),
      }
    }

    let expected = expected_total(&menu, &picks);
    match cli.get_cart().await {
      Ok(totals) if totals.total_price == expected => {},
      Ok(totals) => log_error!(customer_id, round, format!(
        "Cart total {} does not match expected {}", totals.total_price, expected,
      )),
      Err(err) => log_error!(customer_id, round, format!("Failed to get cart: {:?}", err)),
    }

    match cli.place_order().await {
      Ok(Ok(order)) => log_info!(customer_id, round, format!(
        "Placed order {} ({} portions, {})", order.id, order.num_portions(), format_price(order.total_price),
      )),
      Ok(Err(e)) => log_warn!(customer_id, round, format!("Order rejected: {}", e.error)),
      Err(err) => log_error!(customer_id, round, format!("Failed to place order: {:?}", err)),
    }

    match cli.get_cart().await {
      Ok(totals) if totals.is_empty() => {},
      Ok(totals) => log_error!(customer_id, round, format!("Cart not cleared after order: {:?}", totals)),
      Err(err) => log_error!(customer_id, round, format!("Failed to get cart: {:?}", err)),
    }

    tokio::time::sleep(pause).await;
  }

  match cli.end_session().await {
    Ok(_) => info!("[Customer {}] Done", customer_id),
    Err(err) => error!("[Customer {}] Failed to end session: {:?}", customer_id, err),
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  SimpleLogger::new().with_level(LevelFilter::Info).init()?;
  let args = Args::parse();
  let pause = Duration::from_millis(args.pause_ms);

  let customers: Vec<_> = (0..args.customers)
    .map(|id| tokio::spawn(start_customer(id, args.base_url.clone(), args.rounds, pause)))
    .collect();

  for x in customers {
    x.await?;
  }
  Ok(())
}
