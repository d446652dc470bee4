use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::DoctorState;

pub fn router(state: DoctorState) -> Router {
    let protected = Router::new()
        .route("/edit", put(handlers::edit_profile))
        .route("/busy", post(handlers::declare_busy))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    // Profile and calendar reads take an optional bearer token: owners get
    // the richer view, everyone else the public one.
    let public = Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .route("/sortedDoctors", get(handlers::sorted_doctors))
        .route("/user", get(handlers::get_own_profile))
        .route("/user/{userId}", get(handlers::get_profile))
        .route("/appointments/{userId}", get(handlers::calendar));

    public.merge(protected).with_state(state)
}
