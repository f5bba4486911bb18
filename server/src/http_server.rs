use crate::{
  clock::clock::Clock,
  config::ServerConfig,
  notifier::{LogNotifier, OrderNotifier},
  render::{render_page, Storefront, EMPTY_CART},
  session_store::{SessionStore, StoreError},
};
use application::{
  api::{ApiError, SetQuantityParam},
  cart::CartError,
  menu::MenuItem,
  order::{Order, Totals},
};
use rocket::{
  fairing::AdHoc,
  form::Form,
  http::{Cookie, CookieJar, SameSite, Status},
  request::{self, FlashMessage, FromRequest, Request},
  response::{content::RawHtml, status::Custom, Flash, Redirect},
  serde::json::Json,
  {catch, catchers, routes, get, post, put, delete, uri, Build, FromForm, Rocket, State},
};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "warung_session";

macro_rules! return_json {
  ($res: expr) => {
    match $res {
      Ok(x) => Ok(Json(x)),
      Err(e) => Err(json_error(e)),
    }
  };
}

fn status_of(e: &StoreError) -> Status {
  match e {
    StoreError::Cart(_) => Status::BadRequest,
    StoreError::TooManySessions(_) => Status::ServiceUnavailable,
    StoreError::LockPoisoned | StoreError::Unmanaged => Status::InternalServerError,
  }
}

fn json_error(e: StoreError) -> Custom<Json<ApiError>> {
  warn!("Rejected API request: {}", e);
  Custom(status_of(&e), Json(ApiError { error: e.to_string() }))
}

fn html_error(e: StoreError) -> Custom<String> {
  Custom(status_of(&e), e.to_string())
}

fn session_cookie(id: String) -> Cookie<'static> {
  let mut cookie = Cookie::new(SESSION_COOKIE, id);
  cookie.set_path("/");
  cookie.set_http_only(true);
  cookie.set_same_site(SameSite::Lax);
  cookie
}

// Reason a request guard failed, kept in the request's local cache for the
// JSON catcher.
struct GuardFailure(Option<String>);

fn guard_error(req: &Request<'_>, e: StoreError) -> request::Outcome<SessionId, StoreError> {
  req.local_cache(|| GuardFailure(Some(e.to_string())));
  request::Outcome::Error((status_of(&e), e))
}

/// The caller's session id, taken from the session cookie. A first visit or
/// an expired session gets a new session and a fresh cookie.
pub struct SessionId(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionId {
  type Error = StoreError;

  async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
    let store = match req.rocket().state::<SessionStore>() {
      Some(x) => x,
      None => return guard_error(req, StoreError::Unmanaged),
    };

    let jar = req.cookies();
    let existing = jar.get(SESSION_COOKIE).map(|x| x.value().to_string());

    match store.open(existing.as_deref()) {
      Ok(id) => {
        if existing.as_deref() != Some(id.as_str()) {
          jar.add(session_cookie(id.clone()));
        }
        request::Outcome::Success(SessionId(id))
      },
      Err(e) => {
        warn!("Refused session: {}", e);
        guard_error(req, e)
      },
    }
  }
}

#[derive(FromForm, Debug)]
pub struct QuantityForm {
  pub item: String,
  pub quantity: i64,
}

#[get("/")]
pub fn index(
  session: SessionId,
  store: &State<SessionStore>,
  front: &State<Storefront>,
  flash: Option<FlashMessage<'_>>,
) -> Result<RawHtml<String>, Custom<String>> {
  let cart = store.cart(&session.0).map_err(html_error)?;
  let flash = flash.as_ref().map(|x| (x.kind(), x.message()));

  render_page(front, store.catalog(), &cart, flash)
    .map(RawHtml)
    .map_err(|e| html_error(e.into()))
}

#[post("/cart", data = "<form>")]
pub fn set_quantity(
  session: SessionId,
  form: Form<QuantityForm>,
  store: &State<SessionStore>,
  config: &State<ServerConfig>,
) -> Result<Redirect, Custom<String>> {
  match store.set_quantity(&session.0, &form.item, form.quantity) {
    Ok(_) => Ok(Redirect::to(uri!(index))),
    Err(StoreError::Cart(e)) if !config.strict_input => {
      warn!("Session {}: ignoring {} x{}: {}", session.0, form.item, form.quantity, e);
      Ok(Redirect::to(uri!(index)))
    },
    Err(e) => {
      warn!("Session {}: rejected {} x{}: {}", session.0, form.item, form.quantity, e);
      Err(html_error(e))
    },
  }
}

#[post("/order")]
pub fn place_order(
  session: SessionId,
  store: &State<SessionStore>,
  front: &State<Storefront>,
  config: &State<ServerConfig>,
) -> Result<Flash<Redirect>, Custom<String>> {
  match store.submit(&session.0) {
    Ok(_) => Ok(Flash::success(Redirect::to(uri!(index)), front.confirmation())),
    Err(StoreError::Cart(CartError::EmptyCart)) if !config.strict_input => {
      warn!("Session {}: order submitted with an empty cart", session.0);
      Ok(Flash::warning(Redirect::to(uri!(index)), EMPTY_CART))
    },
    Err(e) => {
      warn!("Session {}: order rejected: {}", session.0, e);
      Err(html_error(e))
    },
  }
}

#[get("/menu")]
pub fn get_menu(store: &State<SessionStore>) -> Json<Vec<MenuItem>> {
  Json(store.catalog().list_items().to_vec())
}

#[get("/cart")]
pub fn get_cart(
  session: SessionId,
  store: &State<SessionStore>,
) -> Result<Json<Totals>, Custom<Json<ApiError>>> {
  return_json!(store.totals(&session.0))
}

#[put("/cart", data = "<req>")]
pub fn put_cart(
  session: SessionId,
  req: Json<SetQuantityParam>,
  store: &State<SessionStore>,
) -> Result<Json<Totals>, Custom<Json<ApiError>>> {
  return_json!(store.set_quantity(&session.0, &req.item_name, req.quantity))
}

#[post("/order")]
pub fn post_order(
  session: SessionId,
  store: &State<SessionStore>,
) -> Result<Json<Order>, Custom<Json<ApiError>>> {
  return_json!(store.submit(&session.0))
}

#[delete("/session")]
pub fn delete_session(
  jar: &CookieJar<'_>,
  store: &State<SessionStore>,
) -> Result<Json<bool>, Custom<Json<ApiError>>> {
  let id = match jar.get(SESSION_COOKIE) {
    Some(x) => x.value().to_string(),
    None => return Ok(Json(false)),
  };
  jar.remove(Cookie::from(SESSION_COOKIE));
  return_json!(store.end(&id))
}

/// Errors under `/v1` answer with an `ApiError` body, also when the request
/// never reached a route.
#[catch(default)]
pub fn api_error(status: Status, req: &Request<'_>) -> Custom<Json<ApiError>> {
  let error = match &req.local_cache(|| GuardFailure(None)).0 {
    Some(x) => x.clone(),
    None => status.reason().unwrap_or("request failed").to_string(),
  };
  Custom(status, Json(ApiError { error }))
}

pub fn build_rocket(clock: Arc<dyn Clock>) -> Rocket<Build> {
  assemble(rocket::build(), clock, Arc::new(LogNotifier()))
}

/// Mounts the routes on `rocket` and attaches the fairing that builds the
/// session store from its configuration.
pub fn assemble(
  rocket: Rocket<Build>,
  clock: Arc<dyn Clock>,
  notifier: Arc<dyn OrderNotifier>,
) -> Rocket<Build> {
  rocket
    .mount(
      "/",
      routes![
        index,
        set_quantity,
        place_order,
      ],
    )
    .mount(
      "/v1",
      routes![
        get_menu,
        get_cart,
        put_cart,
        post_order,
        delete_session,
      ],
    )
    .register("/v1", catchers![api_error])
    .attach(AdHoc::try_on_ignite("Session Store", move |rocket| async move {
      let config = match rocket.figment().extract::<ServerConfig>() {
        Ok(x) => x,
        Err(e) => {
          error!("Invalid server config: {}", e);
          return Err(rocket)
        },
      };
      let catalog = match config.catalog() {
        Ok(x) => x,
        Err(e) => {
          error!("Invalid menu: {}", e);
          return Err(rocket)
        },
      };
      info!(
        "Serving {} menu items. Sessions expire after {}s, at most {} live. Strict input: {}",
        catalog.len(), config.session_ttl_secs, config.max_sessions, config.strict_input,
      );

      let store = SessionStore::new(
        Arc::new(catalog),
        clock,
        notifier,
        config.session_ttl_secs,
        config.max_sessions,
      );
      let front = config.storefront.clone();
      Ok(rocket.manage(store).manage(front).manage(config))
    }))
}
