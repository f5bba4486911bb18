use server::{
  clock::utc_clock::UtcClock,
  http_server::build_rocket,
};
use std::sync::Arc;

#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
  let clock = Arc::new(UtcClock());
  let _ = build_rocket(clock).launch().await?;
  Ok(())
}
