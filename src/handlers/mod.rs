// src/handlers/mod.rs
pub mod auth;
pub mod users;
pub mod videos;
pub mod youtube;
