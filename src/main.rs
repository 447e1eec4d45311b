use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::{error, info};

use yatube::config::{self, AppConfig, StoreBackend};
use yatube::repositories::{MemoryStore, PgStore, Store};
use yatube::services::group_services::{load_groups_file, seed_groups};
use yatube::{AppState, configure, handlers};

async fn provision_groups(store: &dyn Store, config: &AppConfig) -> anyhow::Result<()> {
    let Some(path) = &config.groups_file else {
        return Ok(());
    };
    let groups = load_groups_file(path).await?;
    let created = seed_groups(store, groups).await?;
    info!("groups file {} applied, {} new group(s)", path.display(), created);
    Ok(())
}

async fn build_store(backend: StoreBackend) -> anyhow::Result<Arc<dyn Store>> {
    match backend {
        StoreBackend::Postgres => {
            let store = PgStore::new(config::get_pg_pool()?);
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            info!("using in-memory store, data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let store = match build_store(config.store_backend).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open store: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = provision_groups(store.as_ref(), &config).await {
        error!("Failed to provision groups: {:#}", e);
        std::process::exit(1);
    }

    let bind_address = format!("0.0.0.0:{}", config.port);
    let allowed_origins = config.allowed_origins.clone();
    let state = web::Data::new(AppState::new(store, config));

    info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec!["authorization", "content-type", "accept"])
            .supports_credentials()
            .max_age(3600);
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(configure)
            .default_service(web::to(handlers::not_found))
    })
    .bind(&bind_address)?
    .run()
    .await
}
