use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};

#[derive(FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
}

pub async fn create_student(
    pool: &PgPool,
    name: &str,
    birth_date: Option<NaiveDate>,
) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        r#"
        insert into students (name, birth_date)
        values ($1, $2)
        returning id, name, birth_date
        "#,
    )
    .bind(name)
    .bind(birth_date)
    .fetch_one(pool)
    .await
}

pub async fn read_student(pool: &PgPool, student_id: i64) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        r#"
        select id, name, birth_date
        from students
        where id = $1
        "#,
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

/// Partial update. `name` is left untouched when `None`. The outer option of
/// `birth_date` distinguishes an absent field from an explicit null.
pub async fn update_student(
    pool: &PgPool,
    student_id: i64,
    name: Option<&str>,
    birth_date: Option<Option<NaiveDate>>,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        r#"
        update students
        set name = coalesce($2, name),
            birth_date = case when $4 then $3::date else birth_date end
        where id = $1
        returning id, name, birth_date
        "#,
    )
    .bind(student_id)
    .bind(name)
    .bind(birth_date.flatten())
    .bind(birth_date.is_some())
    .fetch_optional(pool)
    .await
}

pub async fn delete_student(pool: &PgPool, student_id: i64) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        delete from students
        where id = $1
        returning id
        "#,
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub async fn read_all_students(
    pool: &PgPool,
    student_id: Option<i64>,
    name: Option<&str>,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        r#"
        select id, name, birth_date
        from students
        where ($1::bigint is null or id = $1)
        and ($2::text is null or name = $2)
        order by id
        "#,
    )
    .bind(student_id)
    .bind(name)
    .fetch_all(pool)
    .await
}
