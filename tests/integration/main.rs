//! Integration tests for Review-Harvest

mod common;
mod crawl_tests;
mod http_tests;
mod recording;
