//! Request/response types and HTTP handlers.

pub mod admin;
pub mod codes;
pub mod health;
pub mod movies;
pub mod ratings;
pub mod status;
pub mod websocket;
