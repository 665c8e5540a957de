//! Band endpoints under `/v1/bandas`
//!
//! Handlers only extract, validate and translate; every rule lives in
//! `BandService`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::db::{ArtistSummary, BandDetails};
use crate::error::ApiResult;
use crate::pagination::{Page, PageRequest, SortDirection, DEFAULT_PAGE_SIZE};
use crate::validation::{validate_artist_id, validate_band_name};
use crate::AppState;

/// Create/update body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandaRequest {
    pub nome_banda: Option<String>,
}

/// Link body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VincularArtistaRequest {
    pub id_artista: Option<i64>,
}

/// Query parameters for `/paginado`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default)]
    pub page: i64,

    #[serde(default = "default_page_size")]
    pub size: i64,

    /// "desc" (any case) for descending; anything else is ascending
    #[serde(default)]
    pub sort_dir: Option<String>,
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// POST /v1/bandas
pub async fn create_band(
    State(state): State<AppState>,
    payload: Result<Json<BandaRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BandDetails>)> {
    let Json(request) = payload?;
    let name = validate_band_name(request.nome_banda)?;

    let created = state.bands.create(&name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /v1/bandas/:id
pub async fn get_band(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<BandDetails>> {
    let Path(id) = path?;
    Ok(Json(state.bands.get_by_id(id).await?))
}

/// GET /v1/bandas
pub async fn list_bands(State(state): State<AppState>) -> ApiResult<Json<Vec<BandDetails>>> {
    Ok(Json(state.bands.list_all().await?))
}

/// GET /v1/bandas/paginado?page&size&sortDir
pub async fn list_bands_paged(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Page<BandDetails>>> {
    let Query(query) = query?;
    let direction = query
        .sort_dir
        .as_deref()
        .map(SortDirection::parse_lenient)
        .unwrap_or_default();

    debug!(page = query.page, size = query.size, ?direction, "Paged band listing");

    let request = PageRequest::new(query.page, query.size, direction)?;
    Ok(Json(state.bands.list_paged(request).await?))
}

/// PUT /v1/bandas/:id
pub async fn update_band(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<BandaRequest>, JsonRejection>,
) -> ApiResult<Json<BandDetails>> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let name = validate_band_name(request.nome_banda)?;

    Ok(Json(state.bands.update(id, &name).await?))
}

/// DELETE /v1/bandas/:id
pub async fn delete_band(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    state.bands.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/bandas/:id/artistas
pub async fn link_artist(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<VincularArtistaRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Path(band_id) = path?;
    let Json(request) = payload?;
    let artist_id = validate_artist_id(request.id_artista)?;

    state.bands.link_artist(band_id, artist_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/bandas/:id/artistas/:artist_id
pub async fn unlink_artist(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path((band_id, artist_id)) = path?;
    state.bands.unlink_artist(band_id, artist_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/bandas/:id/artistas
pub async fn list_band_artists(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<ArtistSummary>>> {
    let Path(band_id) = path?;
    Ok(Json(state.bands.list_artists_of_band(band_id).await?))
}

/// Build band routes
pub fn band_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bandas", get(list_bands).post(create_band))
        .route("/v1/bandas/paginado", get(list_bands_paged))
        .route(
            "/v1/bandas/:id",
            get(get_band).put(update_band).delete(delete_band),
        )
        .route(
            "/v1/bandas/:id/artistas",
            get(list_band_artists).post(link_artist),
        )
        .route("/v1/bandas/:id/artistas/:artist_id", delete(unlink_artist))
}
