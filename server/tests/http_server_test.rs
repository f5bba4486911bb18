use application::{
  api::{ApiError, SetQuantityParam},
  menu::MenuItem,
  order::{LineItem, Order, Totals},
};
use rocket::{
  figment::providers::Serialized,
  http::{ContentType, Cookie, Status},
  local::blocking::Client,
  Config,
};
use server::{
  clock::arbitrary_clock::ArbitraryClock,
  http_server::{assemble, SESSION_COOKIE},
  notifier::OrderNotifier,
};
use std::sync::{Arc, Mutex};

const CONFIRMATION: &str = "Pesanan Anda telah diterima! Terima kasih telah memesan di Warung Makan Sedap.";
const EMPTY_CART: &str = "Keranjang kosong. Silakan tambahkan menu!";

struct RecordingNotifier {
  orders: Mutex<Vec<Order>>,
}

impl OrderNotifier for RecordingNotifier {
  fn order_placed(&self, order: &Order) {
    self.orders.lock().unwrap().push(order.clone());
  }
}

impl RecordingNotifier {
  fn count(&self) -> usize {
    self.orders.lock().unwrap().len()
  }
}

/// One browser talking to a freshly built server.
struct Customer {
  client: Client,
}

impl Customer {
  fn visit(&self) -> (Status, Option<String>, String) {
    let res = self.client.get("/").dispatch();
    let status = res.status();
    let cookie = res.cookies().get(SESSION_COOKIE).map(|x| x.value().to_string());
    (status, cookie, res.into_string().unwrap_or_default())
  }

  fn page(&self) -> String {
    self.visit().2
  }

  fn pick(&self, item: &str, quantity: i64) -> Status {
    let body = format!("item={}&quantity={}", item.replace(' ', "%20"), quantity);
    let res = self.client.post("/cart")
      .header(ContentType::Form)
      .body(body)
      .dispatch();
    res.status()
  }

  fn order(&self) -> Status {
    self.client.post("/order").dispatch().status()
  }

  fn put_cart(&self, item_name: &str, quantity: i64) -> (Status, String) {
    let req = SetQuantityParam {
      item_name: item_name.to_string(),
      quantity,
    };
    let res = self.client.put("/v1/cart").json(&req).dispatch();
    (res.status(), res.into_string().unwrap_or_default())
  }
}

struct Fixture {
  clock: Arc<ArbitraryClock>,
  notifier: Arc<RecordingNotifier>,
}

fn config(strict_input: bool) -> rocket::figment::Figment {
  Config::figment()
    .merge(("log_level", "off"))
    .merge(("session_ttl_secs", 60))
    .merge(("max_sessions", 100))
    .merge(("strict_input", strict_input))
}

fn launch(strict_input: bool) -> (Customer, Fixture) {
  let clock = Arc::new(ArbitraryClock::at(1_000));
  let notifier = Arc::new(RecordingNotifier { orders: Mutex::new(vec![]) });
  let rocket = assemble(rocket::custom(config(strict_input)), clock.clone(), notifier.clone());
  let client = Client::tracked(rocket).expect("valid rocket");
  (Customer { client }, Fixture { clock, notifier })
}

#[test]
fn test_first_visit() {
  let (customer, _) = launch(true);

  let (status, cookie, page) = customer.visit();
  assert_eq!(Status::Ok, status);
  assert!(cookie.is_some());
  assert!(page.contains("<h1>Warung Makan Sedap</h1>"));
  assert!(page.contains(EMPTY_CART));
  assert!(!page.contains("action=\"/order\""));
  assert_eq!(7, page.matches("name=\"quantity\"").count());

  // the session is kept across requests
  let (_, again, _) = customer.visit();
  assert_eq!(None, again);
}

#[test]
fn test_order_flow() {
  let (customer, fixture) = launch(true);
  customer.visit();

  assert_eq!(Status::SeeOther, customer.pick("Ayam Goreng", 2));
  assert_eq!(Status::SeeOther, customer.pick("Es Teh", 3));

  let page = customer.page();
  assert!(page.contains("<li>Ayam Goreng x2: Rp 30,000</li>"));
  assert!(page.contains("<li>Es Teh x3: Rp 15,000</li>"));
  assert!(page.contains("<b>Total Harga: Rp 45,000</b>"));
  assert!(page.contains("action=\"/order\""));

  assert_eq!(Status::SeeOther, customer.order());
  assert_eq!(1, fixture.notifier.count());

  // confirmation shows up once, on the page after the redirect
  let page = customer.page();
  assert!(page.contains(CONFIRMATION));
  assert!(page.contains(EMPTY_CART));
  assert_eq!(1, page.matches(CONFIRMATION).count());

  let page = customer.page();
  assert!(!page.contains(CONFIRMATION));
  assert!(page.contains(EMPTY_CART));

  let orders = fixture.notifier.orders.lock().unwrap().clone();
  assert_eq!(45000, orders[0].total_price);
  assert_eq!(1_000, orders[0].placed_at);
  assert_eq!(orders[0].lines[0], LineItem {
    name: "Ayam Goreng".to_string(),
    quantity: 2,
    amount: 30000,
  });
}

#[test]
fn test_setting_zero_removes_line() {
  let (customer, _) = launch(true);
  customer.pick("Sambal", 4);
  customer.pick("Nasi Putih", 1);

  for _ in 0..3 {
    assert_eq!(Status::SeeOther, customer.pick("Sambal", 0));
  }
  let page = customer.page();
  assert!(!page.contains("<li>Sambal"));
  assert!(page.contains("<li>Nasi Putih x1: Rp 6,000</li>"));
  assert!(page.contains("<b>Total Harga: Rp 6,000</b>"));
}

#[test]
fn test_sessions_are_isolated() {
  let rocket = assemble(
    rocket::custom(config(true)),
    Arc::new(ArbitraryClock::new()),
    Arc::new(RecordingNotifier { orders: Mutex::new(vec![]) }),
  );
  // two browsers on one server, each carrying only its own cookie
  let client = Client::untracked(rocket).expect("valid rocket");
  let open = || {
    let res = client.get("/").dispatch();
    res.cookies().get(SESSION_COOKIE).map(|x| x.value().to_string()).unwrap()
  };
  let alice = open();
  let bob = open();
  assert_ne!(alice, bob);

  let page_of = |id: &str| {
    client.get("/")
      .cookie(Cookie::new(SESSION_COOKIE, id.to_string()))
      .dispatch()
      .into_string()
      .unwrap()
  };

  let res = client.post("/cart")
    .cookie(Cookie::new(SESSION_COOKIE, alice.clone()))
    .header(ContentType::Form)
    .body("item=Tahu%20Goreng&quantity=5")
    .dispatch();
  assert_eq!(Status::SeeOther, res.status());

  assert!(page_of(&alice).contains("<li>Tahu Goreng x5: Rp 25,000</li>"));
  assert!(page_of(&bob).contains(EMPTY_CART));

  let res = client.post("/order")
    .cookie(Cookie::new(SESSION_COOKIE, bob.clone()))
    .dispatch();
  assert_eq!(Status::BadRequest, res.status());
  assert!(page_of(&alice).contains("<li>Tahu Goreng x5: Rp 25,000</li>"));
}

#[test]
fn test_strict_form_input() {
  let (customer, _) = launch(true);
  customer.pick("Pisang Goreng", 1);

  assert_eq!(Status::BadRequest, customer.pick("Pisang Goreng", 11));
  assert_eq!(Status::BadRequest, customer.pick("Pisang Goreng", -1));
  assert_eq!(Status::BadRequest, customer.pick("Rendang", 1));

  let page = customer.page();
  assert!(page.contains("<li>Pisang Goreng x1: Rp 7,000</li>"));
  assert!(!page.contains("Rendang"));
}

#[test]
fn test_lenient_form_input() {
  let (customer, fixture) = launch(false);
  customer.pick("Pisang Goreng", 1);

  assert_eq!(Status::SeeOther, customer.pick("Pisang Goreng", 11));
  assert_eq!(Status::SeeOther, customer.pick("Rendang", 1));
  assert!(customer.page().contains("<li>Pisang Goreng x1: Rp 7,000</li>"));

  // submitting twice: the second one finds an empty cart
  assert_eq!(Status::SeeOther, customer.order());
  customer.page();
  assert_eq!(Status::SeeOther, customer.order());
  let page = customer.page();
  assert!(page.contains("<div class=\"flash warning\">"));
  assert_eq!(1, fixture.notifier.count());
}

#[test]
fn test_strict_empty_order() {
  let (customer, fixture) = launch(true);
  customer.visit();
  assert_eq!(Status::BadRequest, customer.order());
  assert_eq!(0, fixture.notifier.count());
}

#[test]
fn test_json_api() {
  let (customer, fixture) = launch(true);

  let menu = customer.client.get("/v1/menu").dispatch().into_json::<Vec<MenuItem>>().unwrap();
  assert_eq!(7, menu.len());
  assert_eq!(MenuItem::new("Ayam Goreng", 15000), menu[0]);

  let (status, body) = customer.put_cart("Ayam Goreng", 2);
  assert_eq!(Status::Ok, status);
  let totals: Totals = serde_json::from_str(&body).unwrap();
  assert_eq!(30000, totals.total_price);

  let (status, _) = customer.put_cart("Tempe Goreng", 3);
  assert_eq!(Status::Ok, status);

  let (status, body) = customer.put_cart("Tempe Goreng", 12);
  assert_eq!(Status::BadRequest, status);
  let err: ApiError = serde_json::from_str(&body).unwrap();
  assert_eq!("quantity 12 is outside 0..=10", err.error);

  let (status, body) = customer.put_cart("NotOnMenu", 1);
  assert_eq!(Status::BadRequest, status);
  let err: ApiError = serde_json::from_str(&body).unwrap();
  assert_eq!("item \"NotOnMenu\" is not on the menu", err.error);

  let totals = customer.client.get("/v1/cart").dispatch().into_json::<Totals>().unwrap();
  assert_eq!(45000, totals.total_price);
  assert_eq!(vec!["Ayam Goreng", "Tempe Goreng"], totals.lines.iter().map(|x| x.name.as_str()).collect::<Vec<_>>());

  fixture.clock.advance(5);
  let res = customer.client.post("/v1/order").dispatch();
  assert_eq!(Status::Ok, res.status());
  let order = res.into_json::<Order>().unwrap();
  assert_eq!(45000, order.total_price);
  assert_eq!(1_005, order.placed_at);
  assert_eq!(vec![order], fixture.notifier.orders.lock().unwrap().clone());

  let totals = customer.client.get("/v1/cart").dispatch().into_json::<Totals>().unwrap();
  assert_eq!(Totals::default(), totals);

  let res = customer.client.post("/v1/order").dispatch();
  assert_eq!(Status::BadRequest, res.status());
  assert_eq!(1, fixture.notifier.count());
}

#[test]
fn test_end_session() {
  let (customer, _) = launch(true);
  let (_, first, _) = customer.visit();
  customer.pick("Es Teh", 1);

  let res = customer.client.delete("/v1/session").dispatch();
  assert_eq!(Status::Ok, res.status());
  assert_eq!(Some(true), res.into_json::<bool>());

  let (_, second, page) = customer.visit();
  assert!(second.is_some());
  assert_ne!(first, second);
  assert!(page.contains(EMPTY_CART));
}

#[test]
fn test_idle_session_expires() {
  let (customer, fixture) = launch(true);
  let (_, first, _) = customer.visit();
  customer.pick("Es Teh", 1);

  fixture.clock.advance(59);
  assert!(customer.page().contains("<li>Es Teh x1"));

  // activity above pushed the deadline out, now let it lapse
  fixture.clock.advance(60);
  let (_, second, page) = customer.visit();
  assert!(second.is_some());
  assert_ne!(first, second);
  assert!(page.contains(EMPTY_CART));
}

#[test]
fn test_custom_menu_and_storefront() {
  let figment = config(true)
    .merge(("storefront.shop_name", "Warung Bu Tini"))
    .merge(Serialized::global("menu", vec![MenuItem::new("Soto Ayam", 12000)]));
  let rocket = assemble(
    rocket::custom(figment),
    Arc::new(ArbitraryClock::new()),
    Arc::new(RecordingNotifier { orders: Mutex::new(vec![]) }),
  );
  let customer = Customer { client: Client::tracked(rocket).expect("valid rocket") };

  customer.pick("Soto Ayam", 2);
  let page = customer.page();
  assert!(page.contains("<h1>Warung Bu Tini</h1>"));
  assert!(page.contains("<li>Soto Ayam x2: Rp 24,000</li>"));
  assert_eq!(1, page.matches("name=\"quantity\"").count());

  customer.order();
  assert!(customer.page().contains("Terima kasih telah memesan di Warung Bu Tini."));
}

#[test]
fn test_bad_menu_aborts_ignite() {
  let figment = config(true)
    .merge(Serialized::global("menu", vec![MenuItem::new("Soto", 1), MenuItem::new("Soto", 2)]));
  let rocket = assemble(
    rocket::custom(figment),
    Arc::new(ArbitraryClock::new()),
    Arc::new(RecordingNotifier { orders: Mutex::new(vec![]) }),
  );
  assert!(Client::tracked(rocket).is_err());
}

#[test]
fn test_session_limit() {
  let rocket = assemble(
    rocket::custom(config(true).merge(("max_sessions", 1))),
    Arc::new(ArbitraryClock::at(1_000)),
    Arc::new(RecordingNotifier { orders: Mutex::new(vec![]) }),
  );
  let client = Client::untracked(rocket).expect("valid rocket");

  let res = client.get("/v1/cart").dispatch();
  assert_eq!(Status::Ok, res.status());
  let first = res.cookies().get(SESSION_COOKIE).map(|x| x.value().to_string()).unwrap();

  // a second browser finds no room
  let res = client.get("/v1/cart").dispatch();
  assert_eq!(Status::ServiceUnavailable, res.status());
  assert!(res.cookies().get(SESSION_COOKIE).is_none());
  let err = res.into_json::<ApiError>().unwrap();
  assert_eq!("session limit of 1 reached", err.error);

  let res = client.put("/v1/cart")
    .json(&SetQuantityParam { item_name: "Es Teh".to_string(), quantity: 1 })
    .dispatch();
  assert_eq!(Status::ServiceUnavailable, res.status());
  assert!(res.into_json::<ApiError>().is_some());

  assert_eq!(Status::ServiceUnavailable, client.get("/").dispatch().status());

  // the first browser keeps its session
  let res = client.get("/v1/cart")
    .cookie(Cookie::new(SESSION_COOKIE, first))
    .dispatch();
  assert_eq!(Status::Ok, res.status());
}

#[test]
fn test_api_errors_are_json() {
  let (customer, _) = launch(true);

  let res = customer.client.put("/v1/cart")
    .header(ContentType::JSON)
    .body("{\"item_name\": 3}")
    .dispatch();
  assert!(res.status().class().is_client_error());
  assert!(res.into_json::<ApiError>().is_some());

  let res = customer.client.get("/v1/nothing-here").dispatch();
  assert_eq!(Status::NotFound, res.status());
  assert_eq!(Some(ApiError { error: "Not Found".to_string() }), res.into_json::<ApiError>());
}
