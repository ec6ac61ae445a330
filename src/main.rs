use actix_cors::Cors;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{web, App, HttpServer};
use foodgram_service::api;
use foodgram_service::config::Config;
use foodgram_service::db::create_pool;
use foodgram_service::services::media::MediaStore;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Failed to load configuration");

    log::info!(
        "Starting server on {}:{}",
        config.server.host,
        config.server.port
    );
    let pool = create_pool(&config)
        .await
        .expect("Failed to connect to the database");
    log::info!("Database connection established");

    let media = MediaStore::new(&config.media);
    log::info!(
        "Serving media from {} under {}",
        media.root().display(),
        config.media.url
    );

    let openapi = api::ApiDoc::openapi();

    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    let pool = web::Data::new(pool);
    let media = web::Data::new(media);
    let config = web::Data::new(config);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .wrap(NormalizePath::trim())
            .app_data(config.clone())
            .app_data(pool.clone())
            .app_data(media.clone())
            // Trailing slashes are trimmed, so the docs index is addressed by name.
            .route(
                "/api/docs",
                web::get().to(|| async {
                    actix_web::HttpResponse::PermanentRedirect()
                        .append_header(("Location", "/api/docs/index.html"))
                        .finish()
                }),
            )
            .service(
                SwaggerUi::new("/api/docs/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .configure(api::configure)
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .run()
    .await
}
