//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Provides a thin wrapper around Actix sessions so handlers only deal with
//! domain-friendly operations such as persisting or resolving a staff id.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{AuthService, Error, StaffId, StaffMember};

pub(crate) const STAFF_ID_KEY: &str = "staff_id";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated staff member's id in the session cookie.
    ///
    /// The session is renewed first so a pre-login cookie cannot be reused.
    pub fn persist_staff(&self, staff_id: &StaffId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(STAFF_ID_KEY, staff_id.to_string())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the current staff id from the session, if present.
    pub fn staff_id(&self) -> Result<Option<StaffId>, Error> {
        let id = self
            .0
            .get::<String>(STAFF_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        match id {
            Some(raw) => match raw.parse::<StaffId>() {
                Ok(id) => Ok(Some(id)),
                Err(error) => {
                    tracing::warn!("invalid staff id in session cookie: {error}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Require an authenticated staff id or return `401 Unauthorized`.
    pub fn require_staff_id(&self) -> Result<StaffId, Error> {
        self.staff_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Resolve the signed-in member through the staff directory.
    pub async fn current_member(&self, auth: &AuthService) -> Result<StaffMember, Error> {
        let id = self.require_staff_id()?;
        auth.member(&id).await
    }

    /// Drop every session entry and expire the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    const FIXTURE_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn session_test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(crate::inbound::http::test_utils::test_session_middleware())
            .route(
                "/set",
                web::get().to(|session: SessionContext| async move {
                    let id: StaffId = FIXTURE_ID.parse().expect("fixture id");
                    session.persist_staff(&id)?;
                    Ok::<_, Error>(HttpResponse::Ok())
                }),
            )
            .route(
                "/set-invalid",
                web::get().to(|session: Session| async move {
                    session
                        .insert(STAFF_ID_KEY, "not-a-uuid")
                        .expect("set invalid staff id");
                    HttpResponse::Ok()
                }),
            )
            .route(
                "/get",
                web::get().to(|session: SessionContext| async move {
                    let id = session.require_staff_id()?;
                    Ok::<_, Error>(HttpResponse::Ok().body(id.to_string()))
                }),
            )
            .route(
                "/clear",
                web::get().to(|session: SessionContext| async move {
                    session.clear();
                    HttpResponse::Ok()
                }),
            )
    }

    async fn cookie_from(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        uri: &str,
    ) -> actix_web::cookie::Cookie<'static> {
        let res = test::call_service(app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .map(|cookie| cookie.into_owned())
            .expect("session cookie set")
    }

    #[actix_web::test]
    async fn round_trips_staff_id() {
        let app = test::init_service(session_test_app()).await;
        let cookie = cookie_from(&app, "/set").await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, FIXTURE_ID);
    }

    #[actix_web::test]
    async fn missing_staff_is_unauthorised() {
        let app = test::init_service(session_test_app()).await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/get").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn tampered_staff_id_is_unauthorised() {
        let app = test::init_service(session_test_app()).await;
        let cookie = cookie_from(&app, "/set-invalid").await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn clearing_expires_the_cookie() {
        let app = test::init_service(session_test_app()).await;
        let cookie = cookie_from(&app, "/set").await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/clear").cookie(cookie).to_request(),
        )
        .await;
        let removal = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("removal cookie");
        assert_eq!(removal.value(), "");
    }
}
