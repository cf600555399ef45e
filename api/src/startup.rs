use std::net::TcpListener;

use actix_web::{dev::Server, web, App, HttpServer};
use sqlx::{postgres::PgPoolOptions, Connection, Executor, PgConnection, PgPool};
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    configuration::{DatabaseSettings, Settings},
    routes::{
        courses::{
            create_course, delete_course, read_all_courses, read_course, update_course,
            GetCourseResponse, PatchCourseRequest, PostCourseRequest,
        },
        health_check::health_check,
        students::{
            create_student, delete_student, read_all_students, read_student, update_student,
            GetStudentResponse, PatchStudentRequest, PostStudentRequest,
        },
    },
};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&configuration.database);

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();
        let server = run(listener, connection_pool).await?;

        Ok(Self { port, server })
    }

    pub async fn migrate_database(database: DatabaseSettings) -> Result<(), anyhow::Error> {
        let connection_pool = get_connection_pool(&database);

        sqlx::migrate!("./migrations").run(&connection_pool).await?;

        Ok(())
    }

    /// Drops every database whose name is a uuid. The test suite creates one
    /// such database per test and leaves it behind, so this reclaims the
    /// space in one go.
    pub async fn delete_all_test_databases(
        configuration: Settings,
    ) -> Result<u64, anyhow::Error> {
        let mut connection =
            PgConnection::connect_with(&configuration.database.without_db()).await?;

        let test_databases: Vec<String> = sqlx::query_scalar(
            r#"
            select datname
            from pg_database
            where datname ~ '^[0-9a-f]{8}(-[0-9a-f]{4}){3}-[0-9a-f]{12}$'
            "#,
        )
        .fetch_all(&mut connection)
        .await?;

        let num_deleted = test_databases.len() as u64;
        for database_name in test_databases {
            connection
                .execute(&*format!(
                    r#"
                    SELECT pg_terminate_backend(pg_stat_activity.pid)
                    FROM pg_stat_activity
                    WHERE pg_stat_activity.datname = '{database_name}'
                    AND pid <> pg_backend_pid();"#,
                ))
                .await?;
            connection
                .execute(&*format!(r#"DROP DATABASE IF EXISTS "{database_name}";"#))
                .await?;
        }

        Ok(num_deleted)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new().connect_lazy_with(configuration.with_db())
}

pub async fn run(listener: TcpListener, connection_pool: PgPool) -> Result<Server, anyhow::Error> {
    let connection_pool = web::Data::new(connection_pool);

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::routes::health_check::health_check,
            crate::routes::courses::create_course,
            crate::routes::courses::read_course,
            crate::routes::courses::update_course,
            crate::routes::courses::delete_course,
            crate::routes::courses::read_all_courses,
            crate::routes::students::create_student,
            crate::routes::students::read_student,
            crate::routes::students::update_student,
            crate::routes::students::delete_student,
            crate::routes::students::read_all_students,
        ),
        components(schemas(
            PostCourseRequest,
            PatchCourseRequest,
            GetCourseResponse,
            PostStudentRequest,
            PatchStudentRequest,
            GetStudentResponse,
        ))
    )]
    struct ApiDoc;

    let openapi = ApiDoc::openapi();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .service(health_check)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .service(
                web::scope("/api/v1")
                    //courses
                    .service(create_course)
                    .service(read_course)
                    .service(update_course)
                    .service(delete_course)
                    .service(read_all_courses)
                    //students
                    .service(create_student)
                    .service(read_student)
                    .service(update_student)
                    .service(delete_student)
                    .service(read_all_students),
            )
            .app_data(connection_pool.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
