pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod fees;
pub mod schools;
pub mod students;
pub mod teachers;
