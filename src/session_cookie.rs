// Browser-session persistence for the wizard store, and the per-request
// WizardSession extractor handed to every page handler.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponseParts, Redirect, ResponseParts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::info;

use crate::{
    models::VehicleIdentity,
    session_store::{SessionState, SessionStorage, StoreError, WizardSessionStore},
    wizard::WizardStep,
    AppState,
};

// Session storage backed by cookies. No Max-Age or Expires is ever set, so the
// browser drops the entry when its session ends. Unlike per-tab storage, every
// tab of the same browser sees the same entry.
#[derive(Debug, Clone)]
pub struct CookieSessionStorage {
    jar: CookieJar,
    secure: bool,
}

impl CookieSessionStorage {
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self { jar, secure }
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl SessionStorage for CookieSessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.jar.get(key).map(|cookie| cookie.value().to_string())
    }

    // The jar percent-encodes values on the way out and decodes them on the
    // way in, so the JSON is stored as-is.
    fn set_item(&mut self, key: &str, value: String) {
        let cookie = Cookie::build((key.to_string(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure);
        self.jar = self.jar.clone().add(cookie);
    }

    fn remove_item(&mut self, key: &str) {
        self.jar = self.jar.clone().remove(Cookie::build((key.to_string(), "")).path("/"));
    }
}

// Explicit per-request session context. Handlers that change the session must
// return it as part of their response so the cookie update reaches the browser.
#[derive(Debug)]
pub struct WizardSession {
    store: WizardSessionStore<CookieSessionStorage>,
}

impl WizardSession {
    pub fn from_jar(jar: CookieJar, secure: bool) -> Self {
        Self { store: WizardSessionStore::new(CookieSessionStorage::new(jar, secure)) }
    }

    pub fn identity(&self) -> Option<&VehicleIdentity> {
        self.store.get_identity()
    }

    pub fn state(&self) -> SessionState {
        self.store.state()
    }

    // The redirect back to VIN entry when `step` may not render. Otherwise the
    // session identity, which is None only on VIN entry.
    pub fn require(&self, step: WizardStep) -> Result<Option<&VehicleIdentity>, Redirect> {
        if !self.store.can_render(step) {
            info!("No vehicle in session for {:?}, redirecting to VIN entry", step);
            return Err(Redirect::to(WizardStep::VinEntry.route()));
        }
        Ok(self.identity())
    }

    // For steps that render the vehicle: an empty session always redirects.
    pub fn require_identity(&self, step: WizardStep) -> Result<&VehicleIdentity, Redirect> {
        self.require(step)?
            .ok_or_else(|| Redirect::to(WizardStep::VinEntry.route()))
    }

    pub fn set_identity(&mut self, identity: VehicleIdentity) -> Result<(), StoreError> {
        self.store.set_identity(Some(identity))
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    pub fn into_jar(self) -> CookieJar {
        self.store.into_storage().into_jar()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for WizardSession
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(WizardSession::from_jar(jar, app_state.settings.secure_cookies))
    }
}

impl IntoResponseParts for WizardSession {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.into_jar().into_response_parts(res)
    }
}
