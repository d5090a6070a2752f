use crate::{
    AppState,
    auth::{AuthUser, Role, require},
    error::ApiError,
    models::{Car, CreateCarRequest, Profile, UpdateCarRequest},
    query::{CarFilters, ListCarsQuery, PageMeta, PaginationOptions},
    response::ApiResponse,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

// --- Handlers ---

/// create_car
///
/// [admin, manager] Submits a new listing. Validation accumulates every field
/// violation into one response; on success the record comes back with its
/// assigned id and timestamps.
#[utoipa::path(
    post,
    path = "/cars",
    request_body = CreateCarRequest,
    responses(
        (status = 201, description = "Created", body = Car),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn create_car(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCarRequest>,
) -> Result<ApiResponse<Car>, ApiError> {
    require(&user, &[Role::Admin, Role::Manager])?;

    let new = payload.validate().map_err(ApiError::Validation)?;
    let car = state.store.create_car(new).await?;

    Ok(ApiResponse::created("Car created successfully", car))
}

/// get_cars
///
/// [any authenticated] Lists cars with filtering, sorting, and pagination.
/// The filter predicate is applied conjunctively; `total` in the pagination
/// metadata counts all matches, not just the returned page.
#[utoipa::path(
    get,
    path = "/cars",
    params(ListCarsQuery),
    responses(
        (status = 200, description = "List filtered cars", body = [Car]),
        (status = 400, description = "Invalid query parameter"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_cars(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListCarsQuery>,
) -> Result<ApiResponse<Vec<Car>>, ApiError> {
    let filters = CarFilters::build(&query)?;
    let pagination = PaginationOptions::normalize(&query)?;

    let page = state.store.list_cars(&filters, &pagination).await?;

    let mut cars = page.cars;
    if query.sort.as_deref() == Some("price") {
        // Legacy contract: `sort=price` re-sorts only the already-paginated
        // page, not the full result set. `sortBy=price` is the global
        // ordering.
        cars.sort_by(|a, b| a.price.total_cmp(&b.price));
    }

    let meta = PageMeta::compute(page.total, pagination.page, pagination.limit);

    Ok(ApiResponse::ok("Cars retrieved successfully", cars).with_pagination(meta))
}

/// get_car_by_id
///
/// [any authenticated] Retrieves a single listing by id.
#[utoipa::path(
    get,
    path = "/cars/{id}",
    params(("id" = Uuid, Path, description = "Car ID")),
    responses(
        (status = 200, description = "Found", body = Car),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_car_by_id(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Car>, ApiError> {
    let car = state
        .store
        .get_car(id)
        .await?
        .ok_or(ApiError::NotFound("Car not found"))?;

    Ok(ApiResponse::ok("Car retrieved successfully", car))
}

/// update_car
///
/// [admin, manager] Partial update: only present, non-null, non-empty fields
/// are applied; an update with nothing left after that pass is rejected.
/// Numeric and enum fields are re-validated with the create rules.
#[utoipa::path(
    put,
    path = "/cars/{id}",
    params(("id" = Uuid, Path, description = "Car ID")),
    request_body = UpdateCarRequest,
    responses(
        (status = 200, description = "Updated", body = Car),
        (status = 400, description = "Validation failed or empty update"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_car(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCarRequest>,
) -> Result<ApiResponse<Car>, ApiError> {
    require(&user, &[Role::Admin, Role::Manager])?;

    let patch = payload.into_patch()?;
    let car = state
        .store
        .update_car(id, patch)
        .await?
        .ok_or(ApiError::NotFound("Car not found"))?;

    Ok(ApiResponse::ok("Car updated successfully", car))
}

/// delete_car
///
/// [admin] Removes a listing permanently. No soft-delete; no payload on
/// success.
#[utoipa::path(
    delete,
    path = "/cars/{id}",
    params(("id" = Uuid, Path, description = "Car ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_car(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    require(&user, &[Role::Admin])?;

    if !state.store.delete_car(id).await? {
        return Err(ApiError::NotFound("Car not found"));
    }

    Ok(ApiResponse::message_only("Car deleted successfully"))
}

/// get_me
///
/// [any authenticated] The authenticated principal's own identity record.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_me(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Profile>, ApiError> {
    // The principal was just resolved, but the record may have been deleted
    // concurrently; treat that as a dead credential.
    let record = state
        .store
        .get_user(user.id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    Ok(ApiResponse::ok(
        "Profile retrieved successfully",
        Profile {
            id: record.id,
            email: record.email,
            role: record.role,
        },
    ))
}
