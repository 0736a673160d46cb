//! Integration tests for Sumi-Sieve
//!
//! These tests run the whole pipeline against wiremock servers and a
//! temporary CSV file.

mod common;
mod crawl_tests;
mod robots_tests;
mod store_tests;
