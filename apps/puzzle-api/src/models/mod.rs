pub mod puzzle;
pub mod user;
