use crate::render::Storefront;
use application::menu::{Catalog, CatalogError, MenuItem};
use serde::{Deserialize, Serialize};

/// Settings read from `Rocket.toml` / `ROCKET_*` next to Rocket's own keys.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub session_ttl_secs: i64,
  pub max_sessions: usize,
  /// Reject bad form input with 400 instead of logging and ignoring it.
  pub strict_input: bool,
  pub storefront: Storefront,
  /// Replaces the built-in menu when set.
  pub menu: Option<Vec<MenuItem>>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    ServerConfig {
      session_ttl_secs: 30 * 60,
      max_sessions: 10_000,
      strict_input: cfg!(debug_assertions),
      storefront: Storefront::default(),
      menu: None,
    }
  }
}

impl ServerConfig {
  pub fn catalog(&self) -> Result<Catalog, CatalogError> {
    match &self.menu {
      Some(items) => Catalog::new(items.clone()),
      None => Ok(Catalog::default()),
    }
  }
}
