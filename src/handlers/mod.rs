pub mod auth;
pub mod chat;
pub mod comment;
pub mod post;
pub mod project;
pub mod vote;
