pub mod store;
pub mod yahoo;
