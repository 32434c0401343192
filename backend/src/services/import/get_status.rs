use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse, Responder};

pub(crate) async fn process(run_token: web::Path<String>, state: web::Data<JobsState>) -> impl Responder {
    get_import_job_status(run_token, state).await
}

async fn get_import_job_status(
    run_token: web::Path<String>,
    state: web::Data<JobsState>,
) -> HttpResponse {
    let Ok(run_token) = run_token.into_inner().parse::<i64>() else {
        return HttpResponse::BadRequest().body("Run token must be an integer");
    };
    match state.get(run_token).await {
        Some(record) => HttpResponse::Ok().json(record),
        None => HttpResponse::NotFound().body("Run token not found"),
    }
}
