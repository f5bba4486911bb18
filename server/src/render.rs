use application::{
  cart::{CartError, CartSession, MAX_QUANTITY, MIN_QUANTITY},
  menu::Catalog,
  money::{format_line, format_price},
};
use serde::{Deserialize, Serialize};

pub const MENU_HEADING: &str = "Menu";
pub const CART_HEADING: &str = "Keranjang Pesanan";
pub const EMPTY_CART: &str = "Keranjang kosong. Silakan tambahkan menu!";
pub const TOTAL_LABEL: &str = "Total Harga";
pub const ORDER_BUTTON: &str = "Pesan";

/// Shop-specific text shown on the ordering page.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Storefront {
  pub shop_name: String,
  pub tagline: String,
  pub footer: String,
}

impl Default for Storefront {
  fn default() -> Self {
    Storefront {
      shop_name: "Warung Makan Sedap".to_string(),
      tagline: "Selamat datang di Warung Makan Sedap! Nikmati hidangan lezat dengan harga terjangkau.".to_string(),
      footer: "Hidangan Rumahan dengan Cita Rasa Nusantara".to_string(),
    }
  }
}

impl Storefront {
  pub fn confirmation(&self) -> String {
    format!("Pesanan Anda telah diterima! Terima kasih telah memesan di {}.", self.shop_name)
  }
}

pub fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#x27;"),
      _ => out.push(c),
    }
  }
  out
}

/// Renders the whole ordering page from the menu and one session's cart.
///
/// `flash` is a `(kind, message)` pair to show once above the cart, e.g. the
/// order confirmation.
pub fn render_page(
  front: &Storefront,
  catalog: &Catalog,
  cart: &CartSession,
  flash: Option<(&str, &str)>,
) -> Result<String, CartError> {
  let totals = cart.compute_total(catalog)?;
  let shop_name = escape_html(&front.shop_name);
  let mut html = String::new();

  html.push_str("<!DOCTYPE html>\n<html lang=\"id\">\n<head>\n<meta charset=\"utf-8\">\n");
  html.push_str(&format!("<title>{}</title>\n", shop_name));
  html.push_str(STYLE);
  html.push_str("</head>\n<body>\n<main>\n");
  html.push_str(&format!("<h1>{}</h1>\n<p>{}</p>\n", shop_name, escape_html(&front.tagline)));

  html.push_str(&format!("<h2>{}</h2>\n<div class=\"menu\">\n", MENU_HEADING));
  for item in catalog.list_items() {
    let name = escape_html(&item.name);
    html.push_str(&format!(
      concat!(
        "<form class=\"row\" method=\"post\" action=\"/cart\">",
        "<span class=\"name\"><b>{name}</b></span>",
        "<span class=\"price\">{price}</span>",
        "<input type=\"hidden\" name=\"item\" value=\"{name}\">",
        "<label>Jumlah {name} ",
        "<input type=\"number\" name=\"quantity\" min=\"{min}\" max=\"{max}\" value=\"{qty}\" onchange=\"this.form.submit()\">",
        "</label>",
        "<noscript><button type=\"submit\">OK</button></noscript>",
        "</form>\n",
      ),
      name = name,
      price = format_price(item.unit_price),
      min = MIN_QUANTITY,
      max = MAX_QUANTITY,
      qty = cart.quantity_of(&item.name),
    ));
  }
  html.push_str("</div>\n");

  html.push_str(&format!("<h2>{}</h2>\n", CART_HEADING));
  if let Some((kind, message)) = flash {
    html.push_str(&format!(
      "<div class=\"flash {}\">{}</div>\n", escape_html(kind), escape_html(message),
    ));
  }
  if totals.is_empty() {
    html.push_str(&format!("<p class=\"empty\">{}</p>\n", EMPTY_CART));
  } else {
    html.push_str("<ul class=\"cart\">\n");
    for line in &totals.lines {
      html.push_str(&format!("<li>{}</li>\n", escape_html(&format_line(line))));
    }
    html.push_str("</ul>\n");
    html.push_str(&format!(
      "<p class=\"total\"><b>{}: {}</b></p>\n", TOTAL_LABEL, format_price(totals.total_price),
    ));
    html.push_str(&format!(
      "<form method=\"post\" action=\"/order\"><button type=\"submit\" class=\"primary\">{}</button></form>\n",
      ORDER_BUTTON,
    ));
  }

  html.push_str("<hr>\n");
  html.push_str(&format!(
    "<footer><b>{}</b> - {}</footer>\n", shop_name, escape_html(&front.footer),
  ));
  html.push_str("</main>\n</body>\n</html>\n");
  Ok(html)
}

const STYLE: &str = "<style>
main { max-width: 46rem; margin: 2rem auto; font-family: sans-serif; }
.row { display: grid; grid-template-columns: 3fr 1fr 2fr; align-items: center; margin: .4rem 0; }
.row noscript { grid-column: 3; }
.flash.success { background: #e6f4ea; border: 1px solid #34a853; padding: .6rem; }
.flash.warning { background: #fef7e0; border: 1px solid #fbbc04; padding: .6rem; }
button.primary { background: #ff4b4b; color: #fff; border: 0; padding: .5rem 1.2rem; border-radius: .3rem; }
</style>
";
