use serde::{Deserialize, Serialize};

/// Body of `PUT /v1/cart`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SetQuantityParam {
  pub item_name: String,
  pub quantity: i64,
}

/// Body returned by the JSON API on a rejected request.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
  pub error: String,
}
