use actix_web::{
    delete, get,
    http::{header::ContentType, StatusCode},
    patch, post,
    web::{Data, Json, Path, Query},
    HttpResponse, Responder, ResponseError,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

use crate::db;
use crate::routes::ErrorMessage;

#[derive(Debug, Error)]
enum StudentError {
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("student with id {0} not found")]
    StudentNotFound(i64),
}

impl StudentError {
    fn to_message(&self) -> String {
        match self {
            // Do not expose internal database details in error messages
            StudentError::DatabaseError(_) => "internal server error".to_string(),
            // Every other message is ok, as they do not divulge sensitive information
            e => e.to_string(),
        }
    }
}

impl ResponseError for StudentError {
    fn status_code(&self) -> StatusCode {
        match self {
            StudentError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StudentError::StudentNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = ErrorMessage {
            error: self.to_message(),
        };
        let body =
            serde_json::to_string(&error_message).expect("failed to serialize error message");
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(body)
    }
}

#[derive(Deserialize, ToSchema)]
pub struct PostStudentRequest {
    #[schema(example = "Hermione Granger")]
    pub name: String,
    #[schema(value_type = Option<String>, example = "1979-09-19")]
    pub birth_date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct PatchStudentRequest {
    pub name: Option<String>,
    // The outer option distinguishes an absent field from an explicit null,
    // so a patch can clear the birth date.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub birth_date: Option<Option<NaiveDate>>,
}

#[derive(Serialize, ToSchema)]
pub struct GetStudentResponse {
    #[schema(example = 1)]
    id: i64,
    #[schema(example = "Hermione Granger")]
    name: String,
    #[schema(value_type = Option<String>)]
    birth_date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams)]
pub struct StudentsFilter {
    /// return only the student with this exact id
    pub id: Option<i64>,
    /// return only students with this exact name
    pub name: Option<String>,
}

#[utoipa::path(
    context_path = "/api/v1",
    request_body = PostStudentRequest,
    responses(
        (status = 201, description = "Create new student", body = GetStudentResponse),
        (status = 500, description = "Internal server error")
    )
)]
#[post("/students/")]
pub async fn create_student(
    pool: Data<PgPool>,
    student: Json<PostStudentRequest>,
) -> Result<impl Responder, StudentError> {
    let student = student.0;
    let student = db::students::create_student(&pool, &student.name, student.birth_date).await?;
    let response = GetStudentResponse {
        id: student.id,
        name: student.name,
        birth_date: student.birth_date,
    };
    Ok(HttpResponse::Created().json(response))
}

#[utoipa::path(
    context_path = "/api/v1",
    params(
        ("student_id" = i64, Path, description = "Id of the student"),
    ),
    responses(
        (status = 200, description = "Return student with id = student_id", body = GetStudentResponse),
        (status = 404, description = "Student not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[get("/students/{student_id}/")]
pub async fn read_student(
    pool: Data<PgPool>,
    student_id: Path<i64>,
) -> Result<impl Responder, StudentError> {
    let student_id = student_id.into_inner();
    let response = db::students::read_student(&pool, student_id)
        .await?
        .map(|s| GetStudentResponse {
            id: s.id,
            name: s.name,
            birth_date: s.birth_date,
        })
        .ok_or(StudentError::StudentNotFound(student_id))?;
    Ok(Json(response))
}

#[utoipa::path(
    context_path = "/api/v1",
    request_body = PatchStudentRequest,
    params(
        ("student_id" = i64, Path, description = "Id of the student"),
    ),
    responses(
        (status = 200, description = "Update student with id = student_id", body = GetStudentResponse),
        (status = 404, description = "Student not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[patch("/students/{student_id}/")]
pub async fn update_student(
    pool: Data<PgPool>,
    student_id: Path<i64>,
    student: Json<PatchStudentRequest>,
) -> Result<impl Responder, StudentError> {
    let student_id = student_id.into_inner();
    let student = student.0;
    let response =
        db::students::update_student(&pool, student_id, student.name.as_deref(), student.birth_date)
            .await?
            .map(|s| GetStudentResponse {
                id: s.id,
                name: s.name,
                birth_date: s.birth_date,
            })
            .ok_or(StudentError::StudentNotFound(student_id))?;
    Ok(Json(response))
}

#[utoipa::path(
    context_path = "/api/v1",
    params(
        ("student_id" = i64, Path, description = "Id of the student"),
    ),
    responses(
        (status = 204, description = "Delete student with id = student_id"),
        (status = 404, description = "Student not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[delete("/students/{student_id}/")]
pub async fn delete_student(
    pool: Data<PgPool>,
    student_id: Path<i64>,
) -> Result<impl Responder, StudentError> {
    let student_id = student_id.into_inner();
    db::students::delete_student(&pool, student_id)
        .await?
        .ok_or(StudentError::StudentNotFound(student_id))?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    context_path = "/api/v1",
    params(StudentsFilter),
    responses(
        (status = 200, description = "Return all students matching the filter", body = [GetStudentResponse]),
        (status = 500, description = "Internal server error")
    )
)]
#[get("/students/")]
pub async fn read_all_students(
    pool: Data<PgPool>,
    filter: Query<StudentsFilter>,
) -> Result<impl Responder, StudentError> {
    let filter = filter.into_inner();
    let mut students = vec![];
    for student in
        db::students::read_all_students(&pool, filter.id, filter.name.as_deref()).await?
    {
        let student = GetStudentResponse {
            id: student.id,
            name: student.name,
            birth_date: student.birth_date,
        };
        students.push(student);
    }
    Ok(Json(students))
}
