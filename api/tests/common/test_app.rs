use std::net::TcpListener;

use api::{
    configuration::{get_settings, Settings},
    startup::run,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::database::create_campus_api_database;

#[derive(Serialize)]
pub struct CreateCourseRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<i64>>,
}

#[derive(Serialize)]
pub struct UpdateCourseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<i64>>,
}

#[derive(Deserialize)]
pub struct CourseResponse {
    pub id: i64,
    pub name: String,
    pub students: Vec<i64>,
}

#[derive(Serialize)]
pub struct CreateStudentRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct UpdateStudentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Some(None)` serializes to an explicit null, which clears the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<Option<NaiveDate>>,
}

#[derive(Deserialize)]
pub struct StudentResponse {
    pub id: i64,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
}

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn health_check(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/health_check", &self.address))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn create_course(&self, course: &CreateCourseRequest) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/v1/courses/", &self.address))
            .json(course)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn read_course(&self, course_id: i64) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/v1/courses/{course_id}/", &self.address))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn update_course(
        &self,
        course_id: i64,
        course: &UpdateCourseRequest,
    ) -> reqwest::Response {
        self.api_client
            .patch(format!("{}/api/v1/courses/{course_id}/", &self.address))
            .json(course)
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn delete_course(&self, course_id: i64) -> reqwest::Response {
        self.api_client
            .delete(format!("{}/api/v1/courses/{course_id}/", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn read_all_courses(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/v1/courses/", &self.address))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn read_courses_filtered_by_id(&self, course_id: i64) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/v1/courses/", &self.address))
            .query(&[("id", course_id)])
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn read_courses_filtered_by_name(&self, name: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/v1/courses/", &self.address))
            .query(&[("name", name)])
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn create_student(&self, student: &CreateStudentRequest) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/v1/students/", &self.address))
            .json(student)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn read_student(&self, student_id: i64) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/v1/students/{student_id}/", &self.address))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn update_student(
        &self,
        student_id: i64,
        student: &UpdateStudentRequest,
    ) -> reqwest::Response {
        self.api_client
            .patch(format!("{}/api/v1/students/{student_id}/", &self.address))
            .json(student)
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn delete_student(&self, student_id: i64) -> reqwest::Response {
        self.api_client
            .delete(format!("{}/api/v1/students/{student_id}/", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn read_all_students(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/v1/students/", &self.address))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn read_students_filtered_by_id(&self, student_id: i64) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/v1/students/", &self.address))
            .query(&[("id", student_id)])
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn read_students_filtered_by_name(&self, name: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}/api/v1/students/", &self.address))
            .query(&[("name", name)])
            .send()
            .await
            .expect("failed to execute request")
    }
}

pub async fn spawn_test_app() -> TestApp {
    let base_address = "127.0.0.1";
    let listener =
        TcpListener::bind(format!("{base_address}:0")).expect("failed to bind random port");
    let port = listener.local_addr().expect("failed to read local address").port();

    let mut settings = get_settings::<'_, Settings>().expect("Failed to read configuration");
    // We use a random database name so every test runs against its own
    // database. Leftovers are reclaimed with the `delete-test-databases`
    // command of the api binary.
    settings.database.name = Uuid::new_v4().to_string();

    let connection_pool = create_campus_api_database(&settings.database).await;

    let server = run(listener, connection_pool)
        .await
        .expect("failed to bind address");

    tokio::spawn(server);

    TestApp {
        address: format!("http://{base_address}:{port}"),
        api_client: reqwest::Client::new(),
    }
}
