//! API module for HTTP and WebSocket endpoints

pub mod http;
pub mod rest;
pub mod websocket;
