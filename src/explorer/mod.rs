//! Drill-down browsing: state, city, zipcode, category

pub mod query;
pub mod state;

pub use query::*;
pub use state::*;
