//! Tests for the token codec and its configuration
