pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod platform;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::platform::identity::IdentityProvider;
use crate::platform::store::RecordStore;
use crate::services::{
    assignment_service::AssignmentService, auth_service::AuthService,
    contact_service::ContactService, customer_service::CustomerService, deal_service::DealService,
    user_service::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn RecordStore>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub customer_service: CustomerService,
    pub contact_service: ContactService,
    pub deal_service: DealService,
    pub assignment_service: AssignmentService,
}

impl AppState {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn RecordStore>) -> Self {
        let auth_service = AuthService::new(identity.clone(), store.clone());
        let user_service = UserService::new(identity.clone(), store.clone());
        let customer_service = CustomerService::new(store.clone());
        let contact_service = ContactService::new(store.clone());
        let deal_service = DealService::new(store.clone());
        let assignment_service = AssignmentService::new(store.clone());

        Self {
            identity,
            store,
            auth_service,
            user_service,
            customer_service,
            contact_service,
            deal_service,
            assignment_service,
        }
    }
}

/// The full API surface. Auth endpoints and the health probe are open;
/// everything else sits behind the session resolver, so resolution always
/// completes before any resource table is touched.
pub fn app(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/refresh", post(routes::auth::refresh));

    let protected = Router::new()
        .route("/api/auth/me", get(routes::auth::me))
        .route(
            "/api/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route("/api/users/:id", put(routes::users::update_user))
        .route(
            "/api/users/:id/toggle-status",
            patch(routes::users::toggle_user_status),
        )
        .route(
            "/api/customers",
            get(routes::customers::list_customers).post(routes::customers::create_customer),
        )
        .route(
            "/api/customers/:id",
            put(routes::customers::update_customer).delete(routes::customers::delete_customer),
        )
        .route(
            "/api/contacts",
            get(routes::contacts::list_contacts).post(routes::contacts::create_contact),
        )
        .route(
            "/api/contacts/:id",
            put(routes::contacts::update_contact).delete(routes::contacts::delete_contact),
        )
        .route(
            "/api/deals",
            get(routes::deals::list_deals).post(routes::deals::create_deal),
        )
        .route(
            "/api/assignments",
            get(routes::assignments::list_assignments).post(routes::assignments::create_assignment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::resolve_session,
        ));

    public.merge(protected).with_state(state)
}
