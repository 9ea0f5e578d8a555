//! HTTP route handlers.

use askama::Template;
use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_cookies::{CookieManagerLayer, Cookies};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::auth::{self, AuthError, NewAccount, RegisterError};
use crate::directory::{Directory, DirectoryError};
use crate::domain::{StationRecord, User};
use crate::query::{BoundingBox, Lookup, QueryError, StationSort, require};
use crate::store::{SaveFavouriteError, StoreError};

use super::dto::*;
use super::session::{Session, current_user, safe_redirect, with_query};
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// Static assets are served from the configured directory under `/static`.
pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();
    let no_cache = state.config.debug;

    let mut router: Router = Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/about", get(about_page))
        .route("/search", get(search))
        .route("/update", get(update))
        .route("/lookup", get(lookup))
        .route("/stations", get(stations_page))
        .route("/favourite", get(favourites_page).post(favourite_action))
        .route("/register", get(register_page).post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found)
        .with_state(state);

    if no_cache {
        router = router
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-cache, no-store, must-revalidate"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::EXPIRES,
                HeaderValue::from_static("0"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::PRAGMA,
                HeaderValue::from_static("no-cache"),
            ));
    }

    router
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> AppError {
    AppError::NotFound {
        message: "Not found".to_string(),
    }
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

fn render(template: &impl Template) -> Result<Html<String>, AppError> {
    template.render().map(Html).map_err(|e| AppError::Internal {
        message: format!("Template error: {}", e),
    })
}

/// Whether a page was reached through a failed or required login.
fn login_failed(params: &PageParams) -> bool {
    matches!(params.error.as_deref(), Some("true" | "login"))
}

fn username(user: &Option<User>) -> Option<String> {
    user.as_ref().map(|u| u.username.clone())
}

/// Map page.
async fn index_page(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<PageParams>,
) -> Result<Response, AppError> {
    let user = current_user(&state, &cookies).await?;

    let Some(api_key) = state.config.api_key.clone() else {
        let mut page = ErrorTemplate::new("Map unavailable", "API_KEY is not set.");
        page.username = username(&user);
        return Ok((StatusCode::INTERNAL_SERVER_ERROR, render(&page)?).into_response());
    };

    let favourites = match &user {
        Some(user) => state.store.favourites(user.id).await?,
        None => Vec::new(),
    };

    let page = IndexTemplate {
        username: username(&user),
        path: "/",
        login_failed: login_failed(&params),
        api_key,
        favourites: favourites.iter().map(StationView::from).collect(),
    };
    Ok(render(&page)?.into_response())
}

/// About page.
async fn about_page(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<PageParams>,
) -> Result<Html<String>, AppError> {
    let user = current_user(&state, &cookies).await?;

    render(&AboutTemplate {
        username: username(&user),
        path: "/about",
        login_failed: login_failed(&params),
    })
}

fn to_json(records: &[StationRecord]) -> Json<Vec<StationJson>> {
    Json(records.iter().map(StationJson::from).collect())
}

/// Free-text station search.
async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<StationJson>>, AppError> {
    let q = require(params.q.as_deref(), "q")?;
    let records = Directory::new(state.store.as_ref()).search(q).await?;
    Ok(to_json(&records))
}

/// Stations inside the map viewport.
async fn update(
    State(state): State<AppState>,
    Query(params): Query<UpdateParams>,
) -> Result<Json<Vec<StationJson>>, AppError> {
    let sw = require(params.sw.as_deref(), "sw")?;
    let ne = require(params.ne.as_deref(), "ne")?;
    let bbox = BoundingBox::parse(sw, ne)?;

    let records = Directory::new(state.store.as_ref()).within(&bbox).await?;
    Ok(to_json(&records))
}

/// Stations at a place, or the station behind a stream URL.
async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<Vec<StationJson>>, AppError> {
    let lookup = Lookup::from_params(
        params.city.as_deref(),
        params.state.as_deref(),
        params.stream.as_deref(),
    )?;

    let records = Directory::new(state.store.as_ref()).lookup(&lookup).await?;
    Ok(to_json(&records))
}

/// Full station list.
async fn stations_page(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<PageParams>,
) -> Result<Html<String>, AppError> {
    let sort: StationSort = match params.sort.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => s.parse()?,
        None => StationSort::default(),
    };

    let user = current_user(&state, &cookies).await?;
    let records = Directory::new(state.store.as_ref()).all(sort).await?;

    render(&StationsTemplate {
        username: username(&user),
        path: "/stations",
        login_failed: login_failed(&params),
        sort: sort.as_str(),
        stations: records.iter().map(StationView::from).collect(),
        notice: Notice::from_flags(params.error.as_deref(), params.success.as_deref()),
    })
}

/// Redirect for pages that need a logged-in user.
fn login_required() -> Response {
    Redirect::to("/?error=login").into_response()
}

/// The logged-in user's favourites.
async fn favourites_page(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<PageParams>,
) -> Result<Response, AppError> {
    let Some(user) = current_user(&state, &cookies).await? else {
        return Ok(login_required());
    };

    let favourites = state.store.favourites(user.id).await?;

    let page = FavouritesTemplate {
        username: Some(user.username),
        path: "/favourite",
        login_failed: false,
        stations: favourites.iter().map(StationView::from).collect(),
        deleted: params.deleted.is_some(),
    };
    Ok(render(&page)?.into_response())
}

fn station_id(value: &str) -> Result<i64, AppError> {
    value.trim().parse().map_err(|_| AppError::BadRequest {
        message: format!("Invalid station id: {value}"),
    })
}

/// Add or remove a favourite.
async fn favourite_action(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<FavouriteForm>,
) -> Result<Response, AppError> {
    let Some(user) = current_user(&state, &cookies).await? else {
        return Ok(login_required());
    };

    if let Some(add) = form.add.as_deref().filter(|v| !v.is_empty()) {
        let station_id = station_id(add)?;

        let target = match state.store.add_favourite(user.id, station_id).await {
            Ok(_) => {
                info!(user_id = user.id, station_id, "added favourite");
                "/stations?success=true".to_string()
            }
            Err(SaveFavouriteError::Rejected(e)) => {
                info!(user_id = user.id, station_id, reason = %e, "favourite rejected");
                with_query("/stations", "error", e.code())
            }
            Err(SaveFavouriteError::Store(e)) => return Err(e.into()),
        };
        return Ok(Redirect::to(&target).into_response());
    }

    if let Some(delete) = form.delete.as_deref().filter(|v| !v.is_empty()) {
        let station_id = station_id(delete)?;
        let removed = state.store.remove_favourite(user.id, station_id).await?;
        info!(user_id = user.id, station_id, removed, "removed favourite");
        return Ok(Redirect::to("/favourite?deleted=true").into_response());
    }

    Err(AppError::BadRequest {
        message: "Expected add or delete".to_string(),
    })
}

/// Registration form.
async fn register_page(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<PageParams>,
) -> Result<Html<String>, AppError> {
    let user = current_user(&state, &cookies).await?;

    render(&RegisterTemplate {
        username: username(&user),
        path: "/register",
        login_failed: login_failed(&params),
        error: params
            .error
            .as_deref()
            .and_then(register_message)
            .map(str::to_string),
    })
}

/// Create an account and log it in.
async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, AppError> {
    let rejected = |code: &str| Redirect::to(&with_query("/register", "error", code));

    let account = match NewAccount::validate(
        form.username.as_deref(),
        form.password.as_deref(),
        form.confirmation.as_deref(),
    ) {
        Ok(account) => account,
        Err(e) => return Ok(rejected(e.code())),
    };

    match auth::register(&state.store, &account).await {
        Ok(user) => {
            Session::new(&cookies, &state.session_key).start(user.id);
            Ok(Redirect::to("/"))
        }
        Err(RegisterError::Invalid(e)) => Ok(rejected(e.code())),
        Err(RegisterError::Auth(e)) => Err(e.into()),
    }
}

/// Log in, returning to the page the form was submitted from.
async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, AppError> {
    let session = Session::new(&cookies, &state.session_key);
    session.clear();

    let origin = safe_redirect(form.submit.as_deref());

    match auth::login(&state.store, form.username.as_deref(), form.password.as_deref()).await {
        Ok(user) => {
            session.start(user.id);
            info!(user_id = user.id, "logged in");
            Ok(Redirect::to(origin))
        }
        Err(AuthError::MissingCredentials) => Ok(Redirect::to("/?error=true")),
        Err(AuthError::InvalidCredentials) => {
            Ok(Redirect::to(&with_query(origin, "error", "true")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Log out.
async fn logout(State(state): State<AppState>, cookies: Cookies) -> Redirect {
    Session::new(&cookies, &state.session_key).clear();
    Redirect::to("/")
}

// ============================================================================
// Error handling
// ============================================================================

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::Query(e) => e.into(),
            DirectoryError::Store(e) => e.into(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredentials | AuthError::InvalidCredentials => AppError::BadRequest {
                message: e.to_string(),
            },
            AuthError::Hashing(_) | AuthError::Store(_) => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message.clone()),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
