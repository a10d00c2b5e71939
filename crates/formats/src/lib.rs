pub mod countries;

pub use countries::*;
