use std::str::FromStr;

use actix_files::Files;
use actix_web::{
    middleware,
    web::{self, scope, Data},
    App, HttpResponse, HttpServer,
};
use log::info;
use serde_json::json;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    SqlitePool,
};

use schooldesk::{config::AppConfig, routes, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();

    let opts = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .read_only(false)
        .busy_timeout(std::time::Duration::from_secs(5));

    let db_pool = SqlitePool::connect_with(opts)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    sqlx::migrate!().run(&db_pool).await.expect("Migrate Error");
    info!("Database migrated successfully");

    std::fs::create_dir_all(&config.uploads_dir)?;

    let bind = (config.bind_addr.clone(), config.port);
    info!("Starting HTTP server on http://{}:{}/", bind.0, bind.1);

    let state = AppState { db_pool, config };

    HttpServer::new(move || {
        App::new()
            // enable automatic response compression - usually register this first
            .wrap(middleware::Compress::default())
            // enable logger - always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .service(Files::new("/uploads", &state.config.uploads_dir))
            .service(
                scope("/api/auth")
                    .service(routes::auth::register_handler)
                    .service(routes::auth::login_handler)
                    .service(routes::auth::admins_handler)
                    .service(routes::auth::update_password_handler),
            )
            .service(
                scope("/api/schools")
                    .service(routes::schools::login_handler)
                    .service(routes::schools::add_handler)
                    .service(routes::schools::list_handler)
                    .service(routes::schools::get_handler)
                    .service(routes::schools::update_handler)
                    .service(routes::schools::delete_handler),
            )
            .service(
                scope("/api/teachers")
                    .service(routes::teachers::add_handler)
                    .service(routes::teachers::search_handler)
                    .service(routes::teachers::login_handler)
                    .service(routes::teachers::profile_handler)
                    .service(routes::teachers::profile_update_handler)
                    .service(routes::teachers::update_handler)
                    .service(routes::teachers::delete_handler)
                    .service(routes::teachers::list_handler),
            )
            .service(
                scope("/api/students")
                    .service(routes::students::add_handler)
                    .service(routes::students::search_handler)
                    .service(routes::students::login_handler)
                    .service(routes::students::profile_handler)
                    .service(routes::students::profile_update_handler)
                    .service(routes::students::update_handler)
                    .service(routes::students::delete_handler)
                    .service(routes::students::list_handler),
            )
            .service(
                scope("/api/attendance")
                    .service(routes::attendance::add_handler)
                    .service(routes::attendance::update_handler)
                    .service(routes::attendance::view_handler)
                    .service(routes::attendance::check_handler)
                    .service(routes::attendance::summary_handler),
            )
            .service(
                scope("/api/class-teacher-assignment")
                    .service(routes::assignments::list_handler)
                    .service(routes::assignments::assign_handler)
                    .service(routes::assignments::edit_handler)
                    .service(routes::assignments::delete_handler)
                    .service(routes::assignments::roster_handler),
            )
            .service(
                scope("/api/fees")
                    .service(routes::fees::create_master_handler)
                    .service(routes::fees::update_master_handler)
                    .service(routes::fees::pay_handler)
                    .service(routes::fees::pay_pending_handler)
                    .service(routes::fees::waive_fine_handler)
                    .service(routes::fees::summary_handler)
                    .service(routes::fees::history_handler)
                    .service(routes::fees::receipt_handler)
                    .service(routes::fees::pending_fees_handler)
                    .service(routes::fees::pending_count_handler)
                    .service(routes::fees::outstanding_handler),
            )
            .app_data(Data::new(state.clone()))
            .default_service(web::to(default_handler))
    })
    .bind(bind)?
    .run()
    .await
}

async fn default_handler() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "success": false,
        "message": "Not found",
    }))
}
