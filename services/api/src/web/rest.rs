//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the Rango endpoints and the master
//! definition for the OpenAPI specification.

use crate::{
    error::ApiError,
    web::{session::ClientSession, state::AppState},
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse, Json, Redirect, Response},
    Extension,
};
use chrono::Local;
use rango_core::{
    catalog,
    domain::{Category, Page},
    forms::{CategoryForm, PageForm},
    visits::{track_visit, VisitRecord, VISITS_KEY},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    info(title = "Rango", description = "Categories, pages and visit tracking."),
    paths(
        index_handler,
        about_handler,
        show_category_handler,
        add_category_handler,
        add_page_handler,
        like_category_handler,
        goto_handler,
        restricted_handler,
    ),
    components(
        schemas(
            CategoryView,
            PageView,
            IndexResponse,
            AboutResponse,
            CategoryResponse,
            NewCategoryRequest,
            NewPageRequest,
            LikeResponse,
            ValidationErrorResponse,
        )
    ),
    tags(
        (name = "Rango API", description = "Categories, pages and visit tracking.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub views: u32,
    pub likes: u32,
}

impl From<Category> for CategoryView {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            views: c.views,
            likes: c.likes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PageView {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub url: String,
    pub views: u32,
}

impl From<Page> for PageView {
    fn from(p: Page) -> Self {
        Self {
            id: p.id,
            category_id: p.category_id,
            title: p.title,
            url: p.url,
            views: p.views,
        }
    }
}

/// The five most liked categories, the five most viewed pages and the
/// visitor's visit count.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IndexResponse {
    pub categories: Vec<CategoryView>,
    pub pages: Vec<PageView>,
    pub visits: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AboutResponse {
    pub test_cookie_worked: bool,
    pub visits: Option<u64>,
}

/// Both fields are `null` when no category has the requested slug.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub category: Option<CategoryView>,
    pub pages: Option<Vec<PageView>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewCategoryRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewPageRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LikeResponse {
    pub likes: u32,
}

/// Field-level validation messages.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorResponse {
    pub errors: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GotoParams {
    /// The page to visit.
    pub page_id: Uuid,
}

/// Attaches the session cookie, when there is one, to a response.
fn respond(status: StatusCode, cookie: Option<String>, body: impl IntoResponse) -> Response {
    (
        status,
        AppendHeaders(cookie.map(|c| (header::SET_COOKIE, c))),
        body,
    )
        .into_response()
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// The landing page: top categories and pages plus the visit counter.
///
/// Runs the visit tracker against the caller's session and writes the result
/// back, so every call refreshes the `sessionid` cookie.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Index listing", body = IndexResponse),
        (status = 500, description = "Stored session state could not be read")
    )
)]
pub async fn index_handler(
    State(app_state): State<Arc<AppState>>,
    mut session: ClientSession,
) -> Result<Response, ApiError> {
    session.set_test_cookie();

    let listing = catalog::index_listing(app_state.db.as_ref()).await?;

    let record = VisitRecord::from_session(session.data())?;
    let visit = track_visit(&record, Local::now().naive_local())?;
    visit.apply_to(session.data_mut());

    let cookie = session.commit(&app_state).await?;
    let body = IndexResponse {
        categories: listing.categories.into_iter().map(Into::into).collect(),
        pages: listing.pages.into_iter().map(Into::into).collect(),
        visits: visit.visits,
    };
    Ok(respond(StatusCode::OK, cookie, Json(body)))
}

#[utoipa::path(
    get,
    path = "/about",
    responses(
        (status = 200, description = "About page context", body = AboutResponse)
    )
)]
pub async fn about_handler(
    State(app_state): State<Arc<AppState>>,
    mut session: ClientSession,
) -> Result<Response, ApiError> {
    let test_cookie_worked = session.test_cookie_worked();
    if test_cookie_worked {
        info!("Test cookie worked for session {}", session.key());
        session.delete_test_cookie();
    }
    let visits = session.data().get(VISITS_KEY).and_then(|v| v.as_u64());

    let cookie = session.commit(&app_state).await?;
    Ok(respond(
        StatusCode::OK,
        cookie,
        Json(AboutResponse {
            test_cookie_worked,
            visits,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/category/{slug}",
    params(
        ("slug" = String, Path, description = "The category slug.")
    ),
    responses(
        (status = 200, description = "The category and its pages, or nulls when unknown", body = CategoryResponse)
    )
)]
pub async fn show_category_handler(
    State(app_state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let response = match catalog::category_detail(app_state.db.as_ref(), &slug).await? {
        Some((category, pages)) => CategoryResponse {
            category: Some(category.into()),
            pages: Some(pages.into_iter().map(Into::into).collect()),
        },
        None => CategoryResponse {
            category: None,
            pages: None,
        },
    };
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/add_category",
    request_body = NewCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryView),
        (status = 422, description = "Invalid form", body = ValidationErrorResponse)
    )
)]
pub async fn add_category_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<NewCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = CategoryForm { name: req.name };
    let category = catalog::create_category(app_state.db.as_ref(), &form)
        .await
        .inspect_err(|e| warn!("Rejected new category: {}", e))?;
    info!("Created category '{}' ({})", category.name, category.slug);
    Ok((StatusCode::CREATED, Json(CategoryView::from(category))))
}

#[utoipa::path(
    post,
    path = "/category/{slug}/add_page",
    request_body = NewPageRequest,
    params(
        ("slug" = String, Path, description = "The owning category's slug.")
    ),
    responses(
        (status = 201, description = "Page created", body = PageView),
        (status = 404, description = "Unknown category"),
        (status = 422, description = "Invalid form", body = ValidationErrorResponse)
    )
)]
pub async fn add_page_handler(
    State(app_state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(req): Json<NewPageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = PageForm {
        title: req.title,
        url: req.url,
    };
    let page = catalog::add_page(app_state.db.as_ref(), &slug, &form)
        .await
        .inspect_err(|e| warn!("Rejected new page for '{}': {}", slug, e))?;
    info!("Added page '{}' to '{}'", page.title, slug);
    Ok((StatusCode::CREATED, Json(PageView::from(page))))
}

#[utoipa::path(
    post,
    path = "/category/{slug}/like",
    params(
        ("slug" = String, Path, description = "The category slug.")
    ),
    responses(
        (status = 200, description = "Updated like count", body = LikeResponse),
        (status = 404, description = "Unknown category")
    )
)]
pub async fn like_category_handler(
    State(app_state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<LikeResponse>, ApiError> {
    let category = catalog::like_category(app_state.db.as_ref(), &slug).await?;
    Ok(Json(LikeResponse {
        likes: category.likes,
    }))
}

/// Counts a click-through and redirects to the page's url.
#[utoipa::path(
    get,
    path = "/goto",
    params(GotoParams),
    responses(
        (status = 303, description = "Redirect to the page url"),
        (status = 404, description = "Unknown page")
    )
)]
pub async fn goto_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<GotoParams>,
) -> Result<Redirect, ApiError> {
    let page = catalog::track_page_visit(app_state.db.as_ref(), params.page_id).await?;
    Ok(Redirect::to(&page.url))
}

#[utoipa::path(
    get,
    path = "/restricted",
    responses(
        (status = 200, description = "Greeting for signed-in users", body = String),
        (status = 401, description = "No forwarded identity")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The user id forwarded by the identity provider.")
    )
)]
pub async fn restricted_handler(Extension(user_id): Extension<Uuid>) -> String {
    info!("Restricted page served to user {}", user_id);
    "Since you're logged in, you can see this text".to_string()
}
