//! In-crate test suite.


mod generator_tests;
