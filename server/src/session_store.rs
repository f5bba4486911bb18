use crate::{
  clock::clock::Clock,
  notifier::OrderNotifier,
};
use application::{
  cart::{CartError, CartSession},
  menu::Catalog,
  order::{Order, Totals},
};
use std::{
  collections::HashMap,
  sync::{
    atomic::{AtomicI64, Ordering},
    Arc, RwLock,
  },
};
use thiserror::Error;
use uuid::Uuid;

macro_rules! lock_sessions {
  ($store: expr, write) => {
    $store.sessions.write().map_err(|_| {
      error!("Session map lock is poisoned");
      StoreError::LockPoisoned
    })?
  };
  ($store: expr, read) => {
    $store.sessions.read().map_err(|_| {
      error!("Session map lock is poisoned");
      StoreError::LockPoisoned
    })?
  };
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
  #[error(transparent)]
  Cart(#[from] CartError),
  #[error("session limit of {0} reached")]
  TooManySessions(usize),
  #[error("session store lock is poisoned")]
  LockPoisoned,
  #[error("session store is not attached to this server")]
  Unmanaged,
}

struct Session {
  cart: CartSession,
  last_seen: i64,
}

/// Carts of all live customer sessions, keyed by session id.
///
/// Each cart is only reachable through its own id. A session that has been
/// idle for `session_ttl` seconds is dropped together with its cart. Lookups
/// check expiry themselves; the whole map is swept at most once per
/// `session_ttl`, or when it is full.
pub struct SessionStore {
  catalog: Arc<Catalog>,
  clock: Arc<dyn Clock>,
  notifier: Arc<dyn OrderNotifier>,
  session_ttl: i64,
  max_sessions: usize,
  sessions: RwLock<HashMap<String, Session>>,
  last_sweep: AtomicI64,
}

impl SessionStore {
  pub fn new(
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn OrderNotifier>,
    session_ttl: i64,
    max_sessions: usize,
  ) -> SessionStore {
    let now = clock.now();
    SessionStore {
      catalog,
      clock,
      notifier,
      session_ttl,
      max_sessions,
      sessions: RwLock::new(HashMap::new()),
      last_sweep: AtomicI64::new(now),
    }
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  /// Resolves the caller's session, starting a new one when `existing` is
  /// missing or no longer live. Returns the id to use from now on.
  pub fn open(&self, existing: Option<&str>) -> Result<String, StoreError> {
    let now = self.clock.now();
    let mut sessions = lock_sessions!(self, write);
    self.sweep_if_due(&mut sessions, now);

    if let Some(id) = existing {
      if self.touch(&mut sessions, id, now) {
        return Ok(id.to_string())
      }
    }

    let id = Uuid::new_v4().to_string();
    self.start(&mut sessions, &id, now)?;
    Ok(id)
  }

  pub fn set_quantity(&self, session_id: &str, item_name: &str, quantity: i64) -> Result<Totals, StoreError> {
    let totals = self.with_cart(session_id, |cart| {
      cart.set_quantity(&self.catalog, item_name, quantity)?;
      cart.compute_total(&self.catalog)
    })?;
    info!("Session {}: {} set to {}", session_id, item_name, quantity);
    Ok(totals)
  }

  pub fn totals(&self, session_id: &str) -> Result<Totals, StoreError> {
    self.with_cart(session_id, |cart| cart.compute_total(&self.catalog))
  }

  /// Copy of the session's cart, for rendering.
  pub fn cart(&self, session_id: &str) -> Result<CartSession, StoreError> {
    self.with_cart(session_id, |cart| Ok(cart.clone()))
  }

  /// Places the order and empties the cart. The notifier hears about the
  /// order once, after the session lock has been released.
  pub fn submit(&self, session_id: &str) -> Result<Order, StoreError> {
    let placed_at = self.clock.now();
    let order = self.with_cart(session_id, |cart| {
      cart.submit(&self.catalog, Uuid::new_v4().to_string(), placed_at)
    })?;
    info!("Session {}: submitted order {} ({} lines)", session_id, order.id, order.lines.len());

    self.notifier.order_placed(&order);
    Ok(order)
  }

  /// Ends the session. Returns false if it was not live.
  pub fn end(&self, session_id: &str) -> Result<bool, StoreError> {
    let mut sessions = lock_sessions!(self, write);
    let ended = sessions.remove(session_id).is_some();
    if ended {
      info!("Session {} ended", session_id);
    }
    Ok(ended)
  }

  /// Drops every idle session now, regardless of when the last sweep ran.
  pub fn evict_idle(&self, now: i64) -> Result<usize, StoreError> {
    let mut sessions = lock_sessions!(self, write);
    Ok(self.sweep(&mut sessions, now))
  }

  pub fn len(&self) -> Result<usize, StoreError> {
    Ok(lock_sessions!(self, read).len())
  }

  pub fn is_empty(&self) -> Result<bool, StoreError> {
    Ok(self.len()? == 0)
  }

  // Runs `f` on the session's cart under the write lock. A session that
  // expired between requests comes back empty under the same id.
  fn with_cart<T, F>(&self, session_id: &str, f: F) -> Result<T, StoreError>
  where F: FnOnce(&mut CartSession) -> Result<T, CartError>
  {
    let now = self.clock.now();
    let mut sessions = lock_sessions!(self, write);

    if !self.touch(&mut sessions, session_id, now) {
      self.sweep_if_due(&mut sessions, now);
      self.start(&mut sessions, session_id, now)?;
    }
    let session = sessions.get_mut(session_id).ok_or(StoreError::Unmanaged)?;

    Ok(f(&mut session.cart)?)
  }

  // Marks a live session as seen. An expired one is dropped and false
  // returned, same as for an unknown id.
  fn touch(&self, sessions: &mut HashMap<String, Session>, id: &str, now: i64) -> bool {
    let expired = match sessions.get(id) {
      Some(x) => now - x.last_seen >= self.session_ttl,
      None => return false,
    };
    if expired {
      sessions.remove(id);
      info!("Session {} expired", id);
      return false
    }
    if let Some(x) = sessions.get_mut(id) {
      x.last_seen = now;
    }
    true
  }

  fn start(&self, sessions: &mut HashMap<String, Session>, id: &str, now: i64) -> Result<(), StoreError> {
    if sessions.len() >= self.max_sessions {
      self.sweep(sessions, now);
    }
    if sessions.len() >= self.max_sessions {
      warn!("Max # of sessions ({}) reached. Refusing new session.", self.max_sessions);
      return Err(StoreError::TooManySessions(self.max_sessions))
    }
    sessions.insert(id.to_string(), Session {
      cart: CartSession::new(),
      last_seen: now,
    });
    info!("Session {} started ({} live)", id, sessions.len());
    Ok(())
  }

  fn sweep_if_due(&self, sessions: &mut HashMap<String, Session>, now: i64) {
    if now - self.last_sweep.load(Ordering::Relaxed) >= self.session_ttl {
      self.sweep(sessions, now);
    }
  }

  fn sweep(&self, sessions: &mut HashMap<String, Session>, now: i64) -> usize {
    self.last_sweep.store(now, Ordering::Relaxed);
    let before = sessions.len();
    let ttl = self.session_ttl;
    sessions.retain(|_, x| now - x.last_seen < ttl);

    let evicted = before - sessions.len();
    if evicted > 0 {
      info!("Evicted {} idle sessions ({} live)", evicted, sessions.len());
    }
    evicted
  }
}
