//! Integration tests: one binary for the whole suite

mod api_tests;
mod circulation;
