pub mod chat;
pub mod comment;
pub mod comment_tree;
pub mod forum;
pub mod github;
pub mod post;
pub mod profile;
pub mod project;
pub mod project_cache;
pub mod ranking;
pub mod submission;
pub mod vote;
pub mod vote_hydrator;
