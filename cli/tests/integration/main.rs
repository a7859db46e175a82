//! Integration tests for vpsctl
//!
//! These tests spawn the actual binary and check end-to-end behaviour
//! that needs no remote host.

mod cli_tests;
