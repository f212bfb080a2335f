//! Tests for session entities

mod token_tests;
