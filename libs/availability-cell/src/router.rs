use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{self, AvailabilityState};

pub fn schedule_routes(state: Arc<AvailabilityState>) -> Router {
    Router::new()
        .route(
            "/doctors/{doctor_id}",
            post(handlers::create_schedule).get(handlers::list_doctor_schedules),
        )
        .route(
            "/{schedule_id}",
            get(handlers::get_schedule)
                .put(handlers::update_schedule)
                .delete(handlers::delete_schedule),
        )
        .route("/holidays", post(handlers::add_holiday))
        .route("/slots/generate", post(handlers::generate_slots))
        .with_state(state)
}
