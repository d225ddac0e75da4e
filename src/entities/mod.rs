pub mod movie;
pub mod session;
