pub mod clock;
pub mod arbitrary_clock;
