//! Shared fixtures for the polls client integration tests

pub mod common;
