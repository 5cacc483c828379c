//! Client for the Help Center API: typed resources, tagged page decoding and
//! cursor pagination over a pluggable [`Transport`].

mod client;
pub mod error;
pub mod models;
mod paginate;
pub mod transport;

pub use client::{HelpCenter, PER_PAGE};
pub use paginate::{fetch_all, pages};
pub use transport::Transport;
