//! Integration tests for the provocation pipeline

mod config_loading;
pub mod test_utils;
