//! Integration test modules

mod compression_tests;
