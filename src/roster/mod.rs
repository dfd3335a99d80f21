pub mod loader;
pub mod models;

pub use models::{Donor, Recipient};
