pub mod admins;
pub mod assignments;
pub mod attendance;
pub mod fees;
pub mod schools;
pub mod students;
pub mod teachers;

pub(crate) fn now_string() -> String {
    chrono::Utc::now().to_string()
}

pub(crate) fn today_string() -> String {
    chrono::Utc::now().date_naive().to_string()
}
