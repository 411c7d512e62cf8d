//! Integration tests for Onion-Archive

mod crawl_tests;
mod store_tests;
mod transport_tests;
