pub mod utc_clock;

pub use application::clock::{arbitrary_clock, clock};
