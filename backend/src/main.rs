mod batch;
mod config;
mod error;
mod job_controller;
mod repository;
mod services;

use crate::batch::runner::JobRunner;
use crate::config::AppConfig;
use crate::job_controller::state::JobsState;
use actix_web::{web, App, HttpServer};
use common::jobs::JobStatus;
use env_logger::Env;
use log::info;
use std::io;
use tokio::sync::mpsc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config =
        AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // Initialize job controller state
    let (tx, rx) = mpsc::channel(100);
    let jobs_state = JobsState::new(tx);

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        job_controller::state::start_job_updater(updater_state, rx).await;
    });

    // One import per process start, before anything is served.
    let runner = JobRunner::new(jobs_state.clone(), &config.db_path, config.import_sources());
    let status = runner.run_once().await;

    if !config.serve {
        return match status {
            JobStatus::Failed(cause) => Err(io::Error::other(cause)),
            _ => Ok(()),
        };
    }

    let url = format!("http://{}:{}", config.host, config.port);
    info!("Server running at {}", url);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(jobs_state.clone()))
            .service(services::import::configure_routes())
    })
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}
