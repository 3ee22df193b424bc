#![forbid(unsafe_code)]

pub mod model;
pub mod resolution;
pub mod time;

pub use resolution::{Resolution, resolve};
pub use time::Clock;
