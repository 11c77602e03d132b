pub mod auth;
pub mod club;
pub mod complaint;
pub mod election;
pub mod mongodb;
pub mod post;
pub mod user;
