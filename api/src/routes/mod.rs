use serde::Serialize;

pub mod courses;
pub mod health_check;
pub mod students;

#[derive(Serialize)]
pub struct ErrorMessage {
    pub error: String,
}
