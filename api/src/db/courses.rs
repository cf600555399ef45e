use sqlx::{FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoursesDbError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("student with id {0} not found")]
    StudentNotFound(i64),
}

#[derive(FromRow)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub students: Vec<i64>,
}

pub async fn create_course(
    pool: &PgPool,
    name: &str,
    student_ids: &[i64],
) -> Result<Course, CoursesDbError> {
    let mut txn = pool.begin().await?;
    let course_id: i64 = sqlx::query_scalar(
        r#"
        insert into courses (name)
        values ($1)
        returning id
        "#,
    )
    .bind(name)
    .fetch_one(&mut *txn)
    .await?;
    set_course_students_txn(&mut txn, course_id, student_ids).await?;
    let course = read_course_txn(&mut txn, course_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    txn.commit().await?;

    Ok(course)
}

pub async fn read_course(pool: &PgPool, course_id: i64) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        r#"
        select c.id, c.name,
            coalesce(array_agg(cs.student_id order by cs.student_id)
                filter (where cs.student_id is not null), '{}') as students
        from courses c
        left join course_students cs on cs.course_id = c.id
        where c.id = $1
        group by c.id, c.name
        "#,
    )
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

async fn read_course_txn(
    txn: &mut Transaction<'_, Postgres>,
    course_id: i64,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        r#"
        select c.id, c.name,
            coalesce(array_agg(cs.student_id order by cs.student_id)
                filter (where cs.student_id is not null), '{}') as students
        from courses c
        left join course_students cs on cs.course_id = c.id
        where c.id = $1
        group by c.id, c.name
        "#,
    )
    .bind(course_id)
    .fetch_optional(&mut **txn)
    .await
}

/// Partial update. `name` is left untouched when `None`; `student_ids`, when
/// present, replaces the whole association set.
pub async fn update_course(
    pool: &PgPool,
    course_id: i64,
    name: Option<&str>,
    student_ids: Option<&[i64]>,
) -> Result<Option<Course>, CoursesDbError> {
    let mut txn = pool.begin().await?;
    let updated: Option<i64> = sqlx::query_scalar(
        r#"
        update courses
        set name = coalesce($2, name)
        where id = $1
        returning id
        "#,
    )
    .bind(course_id)
    .bind(name)
    .fetch_optional(&mut *txn)
    .await?;

    if updated.is_none() {
        return Ok(None);
    }

    if let Some(student_ids) = student_ids {
        sqlx::query(
            r#"
            delete from course_students
            where course_id = $1
            "#,
        )
        .bind(course_id)
        .execute(&mut *txn)
        .await?;
        set_course_students_txn(&mut txn, course_id, student_ids).await?;
    }

    let course = read_course_txn(&mut txn, course_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    txn.commit().await?;

    Ok(Some(course))
}

pub async fn delete_course(pool: &PgPool, course_id: i64) -> Result<Option<i64>, sqlx::Error> {
    let record = sqlx::query_scalar::<_, i64>(
        r#"
        delete from courses
        where id = $1
        returning id
        "#,
    )
    .bind(course_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

pub async fn read_all_courses(
    pool: &PgPool,
    course_id: Option<i64>,
    name: Option<&str>,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        r#"
        select c.id, c.name,
            coalesce(array_agg(cs.student_id order by cs.student_id)
                filter (where cs.student_id is not null), '{}') as students
        from courses c
        left join course_students cs on cs.course_id = c.id
        where ($1::bigint is null or c.id = $1)
        and ($2::text is null or c.name = $2)
        group by c.id, c.name
        order by c.id
        "#,
    )
    .bind(course_id)
    .bind(name)
    .fetch_all(pool)
    .await
}

async fn set_course_students_txn(
    txn: &mut Transaction<'_, Postgres>,
    course_id: i64,
    student_ids: &[i64],
) -> Result<(), CoursesDbError> {
    if student_ids.is_empty() {
        return Ok(());
    }

    let known: Vec<i64> = sqlx::query_scalar(
        r#"
        select id
        from students
        where id = any($1)
        "#,
    )
    .bind(student_ids)
    .fetch_all(&mut **txn)
    .await?;

    if let Some(missing) = student_ids.iter().copied().find(|id| !known.contains(&id)) {
        return Err(CoursesDbError::StudentNotFound(missing));
    }

    sqlx::query(
        r#"
        insert into course_students (course_id, student_id)
        select $1, unnest($2::bigint[])
        on conflict do nothing
        "#,
    )
    .bind(course_id)
    .bind(student_ids)
    .execute(&mut **txn)
    .await?;

    Ok(())
}
