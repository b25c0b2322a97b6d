pub mod idea;
pub mod interaction;
pub mod pagination;
pub mod revenue;
pub mod user;
