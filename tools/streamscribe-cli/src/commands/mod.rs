pub mod check;
pub mod host;
pub mod join;
pub mod link;
pub mod profiles;
