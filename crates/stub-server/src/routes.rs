//! HTTP routes of the stub API.

use crate::{StubError, StubStore};
use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use careplan_wire::{
    CarePlan, CarePlanPayload, CarePlanStatus, Created, EntityId, Envelope, Goal, GoalPayload,
    Intervention, InterventionPayload, Page, Review, ReviewPayload, StaffMember,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_care_plans,
        create_care_plan,
        get_care_plan,
        create_goal,
        create_intervention,
        list_interventions,
        create_review,
        list_reviews,
        list_staff,
    ),
    components(schemas(
        EntityId,
        CarePlanStatus,
        CarePlan,
        Goal,
        Intervention,
        Review,
        StaffMember,
        CarePlanPayload,
        GoalPayload,
        InterventionPayload,
        ReviewPayload,
        Created,
    ))
)]
pub struct ApiDoc;

type ApiResult<T> = Result<(StatusCode, Json<Envelope<T>>), StubError>;

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    #[serde(default)]
    page: Option<u32>,
}

impl PageQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

#[derive(Debug, Serialize)]
struct Health {
    ok: bool,
    message: String,
}

/// Builds the stub router.
///
/// `/health` and `/api-docs/openapi.json` are open; every other route requires the store's
/// bearer token when one is configured.
pub fn router(store: StubStore) -> Router {
    let api = Router::new()
        .route("/care-plans", get(list_care_plans).post(create_care_plan))
        .route("/care-plans/goals", post(create_goal))
        .route("/care-plans/interventions", post(create_intervention))
        .route("/care-plans/interventions/:goal_id", get(list_interventions))
        .route("/care-plans/reviews", post(create_review))
        .route("/care-plans/reviews/:goal_id", get(list_reviews))
        .route("/care-plans/:id", get(get_care_plan))
        .route("/doctors", get(list_staff))
        .route_layer(middleware::from_fn_with_state(store.clone(), require_bearer));

    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi))
        .merge(api)
        .layer(CorsLayer::permissive())
        .with_state(store)
}

async fn require_bearer(State(store): State<StubStore>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if !store.accepts_token(presented) {
        return StubError::Unauthenticated.into_response();
    }
    next.run(request).await
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        if matches!(self, StubError::Bare) {
            tracing::warn!("responding 500 without a body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        let status = match &self {
            StubError::NotFound(_) => StatusCode::NOT_FOUND,
            StubError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StubError::Rejected(_) => StatusCode::OK,
            StubError::Unauthenticated => StatusCode::UNAUTHORIZED,
            StubError::Injected(_)
            | StubError::Seed(_)
            | StubError::Internal(_)
            | StubError::Bare => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!("responding {}: {}", status.as_u16(), self);
        (status, Json(Envelope::<()>::failure(self.to_string()))).into_response()
    }
}

fn ok<T>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::OK, Json(Envelope::ok(data)))
}

fn created<T>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::ok(data)))
}

fn parse_id(raw: &str) -> Result<EntityId, StubError> {
    EntityId::new(raw).map_err(|e| StubError::Invalid(e.to_string()))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Stub server is alive"))
)]
async fn health() -> Json<Envelope<Health>> {
    Json(Envelope::ok(Health {
        ok: true,
        message: "care plan stub is alive".into(),
    }))
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    get,
    path = "/care-plans",
    params(("page" = Option<u32>, Query, description = "1-based page number")),
    responses(
        (status = 200, description = "Page of care plans with nested goals", body = [CarePlan]),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
async fn list_care_plans(
    State(store): State<StubStore>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<CarePlan>> {
    Ok(ok(Page::slice(
        &store.care_plans(),
        query.page(),
        store.per_page(),
    )))
}

#[utoipa::path(
    post,
    path = "/care-plans",
    request_body = CarePlanPayload,
    responses(
        (status = 201, description = "Care plan created", body = CarePlan),
        (status = 422, description = "Invalid title")
    )
)]
async fn create_care_plan(
    State(store): State<StubStore>,
    Json(payload): Json<CarePlanPayload>,
) -> ApiResult<CarePlan> {
    store.create_care_plan(payload).map(created)
}

#[utoipa::path(
    get,
    path = "/care-plans/{id}",
    params(("id" = String, Path, description = "Care plan id")),
    responses(
        (status = 200, description = "Care plan with nested goals", body = CarePlan),
        (status = 404, description = "Unknown care plan")
    )
)]
async fn get_care_plan(
    State(store): State<StubStore>,
    Path(id): Path<String>,
) -> ApiResult<CarePlan> {
    let id = parse_id(&id)?;
    store
        .care_plan(&id)
        .map(ok)
        .ok_or_else(|| StubError::NotFound(format!("care plan {id} not found")))
}

#[utoipa::path(
    post,
    path = "/care-plans/goals",
    request_body = GoalPayload,
    responses(
        (status = 201, description = "Goal created", body = Goal),
        (status = 404, description = "Unknown care plan")
    )
)]
async fn create_goal(
    State(store): State<StubStore>,
    Json(payload): Json<GoalPayload>,
) -> ApiResult<Goal> {
    store.create_goal(payload).map(created)
}

#[utoipa::path(
    post,
    path = "/care-plans/interventions",
    request_body = InterventionPayload,
    responses(
        (status = 201, description = "Intervention created", body = Intervention),
        (status = 404, description = "Unknown goal")
    )
)]
async fn create_intervention(
    State(store): State<StubStore>,
    Json(payload): Json<InterventionPayload>,
) -> ApiResult<Intervention> {
    store.create_intervention(payload).map(created)
}

#[utoipa::path(
    get,
    path = "/care-plans/interventions/{goal_id}",
    params(
        ("goal_id" = String, Path, description = "Goal id"),
        ("page" = Option<u32>, Query, description = "1-based page number")
    ),
    responses(
        (status = 200, description = "Page of the goal's interventions", body = [Intervention]),
        (status = 404, description = "Unknown goal")
    )
)]
async fn list_interventions(
    State(store): State<StubStore>,
    Path(goal_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<Intervention>> {
    let goal_id = parse_id(&goal_id)?;
    let items = store.interventions_for(&goal_id)?;
    Ok(ok(Page::slice(&items, query.page(), store.per_page())))
}

#[utoipa::path(
    post,
    path = "/care-plans/reviews",
    request_body = ReviewPayload,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 404, description = "Unknown goal")
    )
)]
async fn create_review(
    State(store): State<StubStore>,
    Json(payload): Json<ReviewPayload>,
) -> ApiResult<Review> {
    store.create_review(payload).map(created)
}

#[utoipa::path(
    get,
    path = "/care-plans/reviews/{goal_id}",
    params(
        ("goal_id" = String, Path, description = "Goal id"),
        ("page" = Option<u32>, Query, description = "1-based page number")
    ),
    responses(
        (status = 200, description = "Page of the goal's reviews", body = [Review]),
        (status = 404, description = "Unknown goal")
    )
)]
async fn list_reviews(
    State(store): State<StubStore>,
    Path(goal_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<Review>> {
    let goal_id = parse_id(&goal_id)?;
    let items = store.reviews_for(&goal_id)?;
    Ok(ok(Page::slice(&items, query.page(), store.per_page())))
}

#[utoipa::path(
    get,
    path = "/doctors",
    params(("page" = Option<u32>, Query, description = "1-based page number")),
    responses((status = 200, description = "Page of the staff directory", body = [StaffMember]))
)]
async fn list_staff(
    State(store): State<StubStore>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<StaffMember>> {
    Ok(ok(Page::slice(
        &store.staff(),
        query.page(),
        store.per_page(),
    )))
}
