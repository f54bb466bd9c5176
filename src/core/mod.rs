// Core records, boundary validation, query rules, and error modeling.
pub mod error;
pub mod input;
pub mod model;
pub mod query;
