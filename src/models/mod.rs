pub mod auth;
pub mod video;
pub mod youtube;
