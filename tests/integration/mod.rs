//! Integration tests with mock HTTP server

pub mod end_to_end;
pub mod mock_server;
