use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::vendors::{CreateVendorRequest, UpdateVendorRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Vendor,
    response::ApiResponse,
    services::vendor_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_vendor))
        .route("/me", get(my_vendor))
        .route("/me", patch(update_vendor))
        .route("/{id}", get(get_vendor))
}

#[utoipa::path(
    post,
    path = "/api/vendors",
    request_body = CreateVendorRequest,
    responses(
        (status = 200, description = "Create vendor profile", body = ApiResponse<Vendor>),
        (status = 400, description = "Profile already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Vendors"
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateVendorRequest>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    let resp = vendor_service::create_vendor(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vendors/me",
    responses(
        (status = 200, description = "Own vendor profile", body = ApiResponse<Vendor>),
        (status = 404, description = "No vendor profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Vendors"
)]
pub async fn my_vendor(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    let resp = vendor_service::my_vendor(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/vendors/me",
    request_body = UpdateVendorRequest,
    responses(
        (status = 200, description = "Update own vendor profile", body = ApiResponse<Vendor>),
        (status = 404, description = "No vendor profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Vendors"
)]
pub async fn update_vendor(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateVendorRequest>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    let resp = vendor_service::update_vendor(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vendors/{id}",
    params(("id" = Uuid, Path, description = "Vendor ID")),
    responses(
        (status = 200, description = "Get vendor", body = ApiResponse<Vendor>),
        (status = 404, description = "Not Found")
    ),
    tag = "Vendors"
)]
pub async fn get_vendor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    let resp = vendor_service::get_vendor(&state, id).await?;
    Ok(Json(resp))
}
