use actix_web::{HttpResponse, Responder};
use uuid::Uuid;

pub async fn health_check() -> impl Responder {
    let request_id = Uuid::new_v4();
    let _span_guard = tracing::info_span!("Health check", %request_id).entered();

    HttpResponse::Ok().finish()
}
