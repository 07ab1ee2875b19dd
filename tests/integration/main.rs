//! Integration tests with mock HTTP server

mod handler;
mod mock_server;
mod pipeline;
