use actix_web::{App, HttpServer, web};

use crate::adapters::api::{ApiState, configure_routes};
use crate::app::cli::{self, Command};
use crate::app::config::AppConfig;
use crate::app::error::AppError;

pub fn run(config: AppConfig) -> Result<(), AppError> {
    let bind = config.http_bind.clone();
    let api_state = ApiState { config };

    tracing::info!(bind = %bind, "http server starting");

    actix_web::rt::System::new()
        .block_on(async move {
            HttpServer::new(move || {
                App::new()
                    .app_data(web::Data::new(api_state.clone()))
                    .configure(configure_routes)
            })
            .bind(&bind)?
            .run()
            .await
        })
        .map_err(AppError::runtime)
}

pub fn run_cli(config: AppConfig, command: Command) -> Result<(), AppError> {
    actix_web::rt::System::new().block_on(async move {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        cli::execute(&config, command, &mut out).await
    })
}
