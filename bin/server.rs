// Customer Base - REST API server
// JSON create, bulk text upload, paginated lookup and delete over HTTP

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use customer_base::{Customer, CustomerError, CustomerService, NewCustomer, SqliteRepository};

/// Shared application state
#[derive(Clone)]
struct AppState {
    service: CustomerService,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Serialize)]
struct BulkResponse {
    inserted: usize,
}

#[derive(Deserialize)]
struct ListQuery {
    page: Option<usize>,
}

/// Map the error taxonomy onto HTTP statuses: client input 400, lookup
/// miss 404, storage 500.
fn error_response(err: CustomerError) -> axum::response::Response {
    let status = match &err {
        CustomerError::NotFound => StatusCode::NOT_FOUND,
        CustomerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        eprintln!("storage error: {err}");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "OK" }))
}

/// POST /api/v1/customers - Create a customer from JSON input
async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<NewCustomer>,
) -> impl IntoResponse {
    match state.service.create(&input) {
        Ok(customer) => (
            StatusCode::CREATED,
            Json(CreatedResponse {
                id: customer.id().to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

/// POST /api/v1/customers/bulk - Bulk create from a fixed-width text body
async fn create_customers_bulk(State(state): State<AppState>, body: String) -> impl IntoResponse {
    match state.service.create_bulk(&body) {
        Ok(inserted) => (StatusCode::CREATED, Json(BulkResponse { inserted })).into_response(),
        Err(err) => error_response(err),
    }
}

/// GET /api/v1/customers?page=N - Paginated list (100 per page, 1-indexed)
async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let page = query.page.unwrap_or(1);

    match state.service.list(page) {
        Ok(customers) => (StatusCode::OK, Json::<Vec<Customer>>(customers)).into_response(),
        Err(err) => error_response(err),
    }
}

/// GET /api/v1/customers/:id - Lookup by id
async fn get_customer_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.service.find_by_id(&id) {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(err) => error_response(err),
    }
}

/// GET /api/v1/customers/cpf/:cpf - Lookup by CPF
async fn get_customer_by_cpf(
    State(state): State<AppState>,
    Path(cpf): Path<String>,
) -> impl IntoResponse {
    match state.service.find_by_cpf(&cpf) {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(err) => error_response(err),
    }
}

/// DELETE /api/v1/customers/:id - Hard delete
async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.service.delete(&id) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err),
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("Customer Base - API server");

    let db_path = std::env::var("CUSTOMER_DB").unwrap_or_else(|_| "customers.db".to_string());

    let conn = Connection::open(&db_path).expect("Failed to open database");
    let repo = SqliteRepository::new(conn).expect("Failed to initialize database");
    println!("✓ Database ready: {db_path}");

    let state = AppState {
        service: CustomerService::new(Arc::new(repo)),
    };

    let customer_routes = Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route("/bulk", post(create_customers_bulk))
        .route("/:id", get(get_customer_by_id).delete(delete_customer))
        .route("/cpf/:cpf", get(get_customer_by_cpf));

    let app = Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/v1/customers", customer_routes)
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = std::env::var("CUSTOMER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    println!("✓ Listening on http://{addr}");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
