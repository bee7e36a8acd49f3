use axum::{
    routing::{get, post},
    Router,
};

use crate::{api, AppState};

pub(crate) mod paths {
    pub const HEALTHZ: &str = "/healthz";
    pub const API_HELLO: &str = "/api/hello";
    pub const CONTACTS: &str = "/contacts";
    pub const CONTACTS_VALIDATE: &str = "/contacts/validate";
    pub const CONTACTS_COMPLETE: &str = contact_core::COMPLETE_PATH;
}

pub(crate) fn build_router(state: AppState) -> Router<()> {
    Router::new()
        .route(paths::HEALTHZ, get(api::meta::healthz))
        .route(paths::API_HELLO, get(api::meta::hello))
        .route(
            paths::CONTACTS,
            get(api::contacts::contacts_list).post(api::contacts::contacts_submit),
        )
        .route(
            paths::CONTACTS_VALIDATE,
            post(api::contacts::contacts_validate),
        )
        .route(
            paths::CONTACTS_COMPLETE,
            get(api::contacts::contacts_complete),
        )
        .with_state(state)
}
