/// Small helpers shared by the buffer views

pub mod align;

pub use align::*;
