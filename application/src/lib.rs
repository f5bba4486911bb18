pub mod api;
pub mod cart;
pub mod clock;
pub mod menu;
pub mod money;
pub mod order;

#[macro_use] extern crate log;
