//! Integration tests for Canvas-Export
//!
//! These tests use wiremock to stand in for a Canvas instance and exercise
//! the REST client and the full export pipeline end-to-end.

mod canvas_client;
mod export_tests;
