use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use fluxpay_tools::{FluxPayApi, WEBHOOK_SIGNATURE_HEADER};
use log::info;
use ticket_engine::{OrderFlowApi, SqliteDatabase, TicketApi};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    mailer::LogMailer,
    middleware::HmacMiddlewareFactory,
    routes::{
        health,
        CancelTicketsRoute,
        GetOrderRoute,
        NewOrderRoute,
        PaymentWebhookRoute,
        ResendTicketRoute,
        VerifyPaymentRoute,
        VerifyTicketRoute,
    },
    sweep_worker::start_sweep_worker,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let fluxpay =
        FluxPayApi::new(config.fluxpay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let mailer = LogMailer;
    let _sweep = start_sweep_worker(
        db.clone(),
        fluxpay.clone(),
        mailer.clone(),
        ServerOptions::from_config(&config),
        config.sweep_grace,
        config.sweep_retention,
    );
    let srv = create_server_instance(config, db, fluxpay, mailer)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    fluxpay: FluxPayApi,
    mailer: LogMailer,
) -> Result<Server, ServerError> {
    info!("🚀️ Starting ticket server on {}:{}", config.host, config.port);
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone());
        let tickets_api = TicketApi::new(db.clone());
        let options = ServerOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tix::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(tickets_api))
            .app_data(web::Data::new(fluxpay.clone()))
            .app_data(web::Data::new(mailer.clone()))
            .app_data(web::Data::new(options));
        // The provider's webhook deliveries are the only unauthenticated state-changing requests the server
        // accepts, so they go behind the HMAC signature check.
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(
                WEBHOOK_SIGNATURE_HEADER,
                config.fluxpay.webhook_secret.clone(),
                config.webhook_signature_checks,
            ))
            .service(PaymentWebhookRoute::<SqliteDatabase, LogMailer>::new());
        app.service(health)
            .service(NewOrderRoute::<SqliteDatabase>::new())
            .service(GetOrderRoute::<SqliteDatabase>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, LogMailer>::new())
            .service(VerifyTicketRoute::<SqliteDatabase>::new())
            .service(CancelTicketsRoute::<SqliteDatabase>::new())
            .service(ResendTicketRoute::<SqliteDatabase, LogMailer>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
