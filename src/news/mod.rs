pub mod aggregator;
pub mod symbols;

#[cfg(test)]
mod symbols_tests;
