use actix_web::{
    delete, get,
    http::{header::ContentType, StatusCode},
    patch, post,
    web::{Data, Json, Path, Query},
    HttpResponse, Responder, ResponseError,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

use crate::db::{self, courses::CoursesDbError};
use crate::routes::ErrorMessage;

#[derive(Debug, Error)]
enum CourseError {
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("course with id {0} not found")]
    CourseNotFound(i64),

    #[error("student with id {0} not found")]
    StudentNotFound(i64),
}

impl From<CoursesDbError> for CourseError {
    fn from(e: CoursesDbError) -> Self {
        match e {
            CoursesDbError::Database(e) => CourseError::DatabaseError(e),
            CoursesDbError::StudentNotFound(id) => CourseError::StudentNotFound(id),
        }
    }
}

impl CourseError {
    fn to_message(&self) -> String {
        match self {
            // Do not expose internal database details in error messages
            CourseError::DatabaseError(_) => "internal server error".to_string(),
            // Every other message is ok, as they do not divulge sensitive information
            e => e.to_string(),
        }
    }
}

impl ResponseError for CourseError {
    fn status_code(&self) -> StatusCode {
        match self {
            CourseError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CourseError::CourseNotFound(_) => StatusCode::NOT_FOUND,
            CourseError::StudentNotFound(_) => StatusCode::BAD_REQUEST,
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
pub struct PostCourseRequest {
    #[schema(example = "Defence Against the Dark Arts")]
    pub name: String,
    /// ids of students enrolled in the course
    #[serde(default)]
    pub students: Vec<i64>,
}

#[derive(Deserialize, ToSchema)]
pub struct PatchCourseRequest {
    pub name: Option<String>,
    /// when present, replaces the whole set of enrolled students
    pub students: Option<Vec<i64>>,
}

#[derive(Serialize, ToSchema)]
pub struct GetCourseResponse {
    #[schema(example = 1)]
    id: i64,
    #[schema(example = "Defence Against the Dark Arts")]
    name: String,
    students: Vec<i64>,
}

#[derive(Deserialize, IntoParams)]
pub struct CoursesFilter {
    /// return only the course with this exact id
    pub id: Option<i64>,
    /// return only courses with this exact name
    pub name: Option<String>,
}

#[utoipa::path(
    context_path = "/api/v1",
    request_body = PostCourseRequest,
    responses(
        (status = 201, description = "Create new course", body = GetCourseResponse),
        (status = 400, description = "Unknown student id in students"),
        (status = 500, description = "Internal server error")
    )
)]
#[post("/courses/")]
pub async fn create_course(
    pool: Data<PgPool>,
    course: Json<PostCourseRequest>,
) -> Result<impl Responder, CourseError> {
    let course = course.0;
    let course = db::courses::create_course(&pool, &course.name, &course.students).await?;
    let response = GetCourseResponse {
        id: course.id,
        name: course.name,
        students: course.students,
    };
    Ok(HttpResponse::Created().json(response))
}

#[utoipa::path(
    context_path = "/api/v1",
    params(
        ("course_id" = i64, Path, description = "Id of the course"),
    ),
    responses(
        (status = 200, description = "Return course with id = course_id", body = GetCourseResponse),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[get("/courses/{course_id}/")]
pub async fn read_course(
    pool: Data<PgPool>,
    course_id: Path<i64>,
) -> Result<impl Responder, CourseError> {
    let course_id = course_id.into_inner();
    let response = db::courses::read_course(&pool, course_id)
        .await?
        .map(|c| GetCourseResponse {
            id: c.id,
            name: c.name,
            students: c.students,
        })
        .ok_or(CourseError::CourseNotFound(course_id))?;
    Ok(Json(response))
}

#[utoipa::path(
    context_path = "/api/v1",
    request_body = PatchCourseRequest,
    params(
        ("course_id" = i64, Path, description = "Id of the course"),
    ),
    responses(
        (status = 200, description = "Update course with id = course_id", body = GetCourseResponse),
        (status = 400, description = "Unknown student id in students"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[patch("/courses/{course_id}/")]
pub async fn update_course(
    pool: Data<PgPool>,
    course_id: Path<i64>,
    course: Json<PatchCourseRequest>,
) -> Result<impl Responder, CourseError> {
    let course_id = course_id.into_inner();
    let course = course.0;
    let response = db::courses::update_course(
        &pool,
        course_id,
        course.name.as_deref(),
        course.students.as_deref(),
    )
    .await?
    .map(|c| GetCourseResponse {
        id: c.id,
        name: c.name,
        students: c.students,
    })
    .ok_or(CourseError::CourseNotFound(course_id))?;
    Ok(Json(response))
}

#[utoipa::path(
    context_path = "/api/v1",
    params(
        ("course_id" = i64, Path, description = "Id of the course"),
    ),
    responses(
        (status = 204, description = "Delete course with id = course_id"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[delete("/courses/{course_id}/")]
pub async fn delete_course(
    pool: Data<PgPool>,
    course_id: Path<i64>,
) -> Result<impl Responder, CourseError> {
    let course_id = course_id.into_inner();
    db::courses::delete_course(&pool, course_id)
        .await?
        .ok_or(CourseError::CourseNotFound(course_id))?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    context_path = "/api/v1",
    params(CoursesFilter),
    responses(
        (status = 200, description = "Return all courses matching the filter", body = [GetCourseResponse]),
        (status = 500, description = "Internal server error")
    )
)]
#[get("/courses/")]
pub async fn read_all_courses(
    pool: Data<PgPool>,
    filter: Query<CoursesFilter>,
) -> Result<impl Responder, CourseError> {
    let filter = filter.into_inner();
    let mut courses = vec![];
    for course in db::courses::read_all_courses(&pool, filter.id, filter.name.as_deref()).await? {
        let course = GetCourseResponse {
            id: course.id,
            name: course.name,
            students: course.students,
        };
        courses.push(course);
    }
    Ok(Json(courses))
}
