use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Car Inventory Router Module
///
/// Defines the role-gated CRUD surface for car listings plus the principal's
/// profile endpoint. Every handler here relies on the `AuthUser` extractor
/// middleware being layered above this module, so each receives a validated
/// principal (id + role).
///
/// Role gating per action is enforced inside the handlers through the single
/// `auth::require` gate: create/update require admin or manager, delete
/// requires admin, reads only require authentication.
pub fn car_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Retrieves the currently authenticated principal's identity record.
        .route("/me", get(handlers::get_me))
        // GET /cars?brand=...&minPrice=...&page=...
        // Lists cars with filtering, sorting, and pagination.
        // POST /cars
        // Submits a new listing (admin, manager).
        .route("/cars", get(handlers::get_cars).post(handlers::create_car))
        // GET/PUT/DELETE /cars/{id}
        // Single-record retrieval, partial update (admin, manager), and
        // permanent delete (admin).
        .route(
            "/cars/{id}",
            get(handlers::get_car_by_id)
                .put(handlers::update_car)
                .delete(handlers::delete_car),
        )
}
