//! Integration tests against a live gateway

pub mod handshake_test;
pub mod fanout_test;
