pub mod chat;
pub mod events;
pub mod image;
pub mod models;
pub mod proposal;
pub mod session;
pub mod styles;
