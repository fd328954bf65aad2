use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use meli_sync_engine::{
    fulfillment::FulfillmentSync,
    helpers::{ProcessingLocks, DEFAULT_LOCK_TIMEOUT},
    IngestApi,
    SqliteDatabase,
};
use meli_tools::{MeliApi, TokenHolder};
use odoo_tools::OdooApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{
        fulfillment_snapshot,
        health,
        ingest_order,
        meli_auth,
        meli_webhook,
        odoo_version,
        seller_products,
        Ingest,
    },
    workers::{start_lock_sweeper, start_poll_worker},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let meli = MeliApi::new(config.meli.clone(), TokenHolder::default())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let odoo = OdooApi::new(config.odoo.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let fulfillment = FulfillmentSync::new(odoo.clone(), config.fulfillment.clone());
    let locks = ProcessingLocks::new(DEFAULT_LOCK_TIMEOUT);
    let api: Ingest = IngestApi::new(db, meli.clone(), fulfillment, locks);

    start_poll_worker(api.clone(), config.poll_interval);
    start_lock_sweeper(api.clone());

    let srv = create_server_instance(config, api, meli, odoo)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    api: Ingest,
    meli: MeliApi,
    odoo: OdooApi,
) -> Result<Server, ServerError> {
    info!("💻️ Binding to {}:{}", config.host, config.port);
    let srv = HttpServer::new(move || {
        let meli_scope = web::scope("/meli")
            .service(meli_webhook)
            .service(meli_auth)
            .service(ingest_order)
            .service(seller_products);
        let odoo_scope = web::scope("/odoo").service(fulfillment_snapshot).service(odoo_version);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mog::access_log"))
            .app_data(web::Data::new(api.clone()))
            .app_data(web::Data::new(meli.clone()))
            .app_data(web::Data::new(odoo.clone()))
            .service(health)
            .service(meli_scope)
            .service(odoo_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
