use crate::infra::{deserialize_datetime, AppState, CoreState};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use stay_ops::error::AppError;
use stay_ops::operations::access::{
    AccessEventKind, NewPin, PinRecord, PinRole, PinSource, Session,
};
use stay_ops::operations::cleaning::cleaning_router;
use stay_ops::operations::stays::{GuestDraft, GuestId, NewStay, Stay, StayError, StayId};

pub(crate) fn with_core_routes(core: CoreState) -> Router {
    let jobs = cleaning_router(core.jobs.clone());

    Router::new()
        .route("/api/v1/stays", post(create_stay_handler))
        .route(
            "/api/v1/stays/:stay_id",
            get(get_stay_handler).delete(delete_stay_handler),
        )
        .route("/api/v1/stays/:stay_id/dates", put(update_dates_handler))
        .route("/api/v1/stays/:stay_id/guests", post(add_guest_handler))
        .route(
            "/api/v1/stays/:stay_id/guests/:guest_id",
            put(update_guest_handler).delete(remove_guest_handler),
        )
        .route("/api/v1/stays/:stay_id/cleaner", put(reassign_cleaner_handler))
        .route("/api/v1/pins", post(create_pin_handler))
        .route(
            "/api/v1/pins/:code",
            get(lookup_pin_handler).delete(revoke_pin_handler),
        )
        .route(
            "/api/v1/apartments/:apt_id/pins",
            get(list_apt_pins_handler).delete(revoke_apt_pins_handler),
        )
        .route("/api/v1/apartments/:apt_id/access", post(access_attempt_handler))
        .route("/api/v1/apartments/:apt_id/door/open", post(door_open_handler))
        .route("/api/v1/apartments/:apt_id/door/close", post(door_close_handler))
        .route("/api/v1/apartments/:apt_id/gate/open", post(gate_open_handler))
        .route("/api/v1/apartments/:apt_id/door", get(door_state_handler))
        .route("/api/v1/apartments/:apt_id/events", get(events_handler))
        .route("/api/v1/sessions/validate", post(session_validate_handler))
        .with_state(core)
        .merge(jobs)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateStayRequest {
    pub(crate) apt_id: String,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub(crate) check_in: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub(crate) check_out: NaiveDateTime,
    pub(crate) guests: Vec<GuestDraft>,
    #[serde(default)]
    pub(crate) cleaner_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StayResponse {
    pub(crate) stay: Stay,
    pub(crate) pins: Vec<PinRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateDatesRequest {
    #[serde(deserialize_with = "deserialize_datetime")]
    pub(crate) check_in: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub(crate) check_out: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReassignCleanerRequest {
    #[serde(default)]
    pub(crate) cleaner_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatePinRequest {
    pub(crate) role: PinRole,
    pub(crate) apt_id: String,
    #[serde(default)]
    pub(crate) stay_id: Option<String>,
    #[serde(default)]
    pub(crate) guest_id: Option<String>,
    pub(crate) issued_to: String,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub(crate) valid_from: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub(crate) valid_to: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccessAttemptRequest {
    pub(crate) pin: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActorRequest {
    #[serde(default)]
    pub(crate) actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventsQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn create_stay_handler(
    State(core): State<CoreState>,
    Json(payload): Json<CreateStayRequest>,
) -> Result<(StatusCode, Json<StayResponse>), AppError> {
    let stay = core.stays.create_stay(
        NewStay {
            apt_id: payload.apt_id,
            check_in: payload.check_in,
            check_out: payload.check_out,
            guests: payload.guests,
            cleaner_name: payload.cleaner_name,
        },
        now(),
    )?;

    let pins = core.pins.pins_for_stay(&stay.stay_id);
    Ok((StatusCode::CREATED, Json(StayResponse { stay, pins })))
}

pub(crate) async fn get_stay_handler(
    State(core): State<CoreState>,
    Path(stay_id): Path<String>,
) -> Result<Json<StayResponse>, AppError> {
    let stay_id = StayId(stay_id);
    let stay = core
        .stays
        .get(&stay_id)
        .ok_or(StayError::StayNotFound(stay_id))?;
    let pins = core.pins.pins_for_stay(&stay.stay_id);
    Ok(Json(StayResponse { stay, pins }))
}

pub(crate) async fn delete_stay_handler(
    State(core): State<CoreState>,
    Path(stay_id): Path<String>,
) -> Json<serde_json::Value> {
    let deleted = core.stays.delete_stay(&StayId(stay_id), now());
    Json(json!({ "deleted": deleted }))
}

pub(crate) async fn update_dates_handler(
    State(core): State<CoreState>,
    Path(stay_id): Path<String>,
    Json(payload): Json<UpdateDatesRequest>,
) -> Result<Json<Stay>, AppError> {
    let stay = core
        .stays
        .update_dates(&StayId(stay_id), payload.check_in, payload.check_out)?;
    Ok(Json(stay))
}

pub(crate) async fn add_guest_handler(
    State(core): State<CoreState>,
    Path(stay_id): Path<String>,
    Json(draft): Json<GuestDraft>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let guest = core.stays.add_guest(&StayId(stay_id), draft, now())?;
    Ok((StatusCode::CREATED, Json(json!({ "guest": guest }))))
}

pub(crate) async fn update_guest_handler(
    State(core): State<CoreState>,
    Path((stay_id, guest_id)): Path<(String, String)>,
    Json(draft): Json<GuestDraft>,
) -> Result<Json<serde_json::Value>, AppError> {
    let guest = core
        .stays
        .update_guest(&StayId(stay_id), &GuestId(guest_id), draft)?;
    Ok(Json(json!({ "guest": guest })))
}

/// The core allows emptying a roster; the "at least one guest" rule is a
/// caller-layer guard and lives here.
pub(crate) async fn remove_guest_handler(
    State(core): State<CoreState>,
    Path((stay_id, guest_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let stay_id = StayId(stay_id);
    let stay = core
        .stays
        .get(&stay_id)
        .ok_or_else(|| StayError::StayNotFound(stay_id.clone()))?;
    if stay.guests.len() <= 1 {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "removed": false,
                "error": "a stay must retain at least one guest",
            })),
        )
            .into_response());
    }

    let revoked = core
        .stays
        .remove_guest(&stay_id, &GuestId(guest_id), now())?;
    Ok(Json(json!({ "removed": true, "revoked_pins": revoked })).into_response())
}

pub(crate) async fn reassign_cleaner_handler(
    State(core): State<CoreState>,
    Path(stay_id): Path<String>,
    Json(payload): Json<ReassignCleanerRequest>,
) -> Result<Json<StayResponse>, AppError> {
    let stay = core.stays.reassign_cleaner(
        &StayId(stay_id),
        payload.cleaner_name.as_deref(),
        now(),
    )?;
    let pins = core.pins.pins_for_stay(&stay.stay_id);
    Ok(Json(StayResponse { stay, pins }))
}

pub(crate) async fn create_pin_handler(
    State(core): State<CoreState>,
    Json(payload): Json<CreatePinRequest>,
) -> Result<(StatusCode, Json<PinRecord>), AppError> {
    let record = core.pins.create(
        NewPin {
            role: payload.role,
            apt_id: payload.apt_id,
            stay_id: payload.stay_id.map(StayId),
            guest_id: payload.guest_id.map(GuestId),
            issued_to: payload.issued_to,
            valid_from: payload.valid_from,
            valid_to: payload.valid_to,
            source: PinSource::Manual,
        },
        now(),
    )?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub(crate) async fn lookup_pin_handler(
    State(core): State<CoreState>,
    Path(code): Path<String>,
) -> Response {
    match core.pins.lookup(&code, now()) {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "pin not found" })),
        )
            .into_response(),
    }
}

pub(crate) async fn revoke_pin_handler(
    State(core): State<CoreState>,
    Path(code): Path<String>,
) -> Json<serde_json::Value> {
    let revoked = core.pins.revoke(&code, now());
    Json(json!({ "revoked": revoked }))
}

pub(crate) async fn list_apt_pins_handler(
    State(core): State<CoreState>,
    Path(apt_id): Path<String>,
) -> Json<serde_json::Value> {
    let pins = core.pins.pins_for_apt(&apt_id);
    Json(json!({ "pins": pins }))
}

/// Emergency cutoff: drops every PIN for the apartment in one sweep.
pub(crate) async fn revoke_apt_pins_handler(
    State(core): State<CoreState>,
    Path(apt_id): Path<String>,
) -> Json<serde_json::Value> {
    let revoked = core.pins.revoke_all_by_apt(&apt_id, now());
    Json(json!({ "revoked_pins": revoked }))
}

/// PIN-based entry attempt from the door keypad. Grants log an access-ok
/// event plus the door opening; denials log access-ko and nothing else.
pub(crate) async fn access_attempt_handler(
    State(core): State<CoreState>,
    Path(apt_id): Path<String>,
    Json(payload): Json<AccessAttemptRequest>,
) -> Response {
    let at = now();
    let record = core
        .pins
        .lookup(&payload.pin, at)
        .filter(|record| record.apt_id == apt_id && record.is_live(at));

    match record {
        Some(record) => {
            let kind = match record.role {
                PinRole::Cleaner => AccessEventKind::CleanerAccessOk,
                _ => AccessEventKind::GuestAccessOk,
            };
            core.events.append(
                &apt_id,
                kind,
                &record.issued_to,
                format!("{} entered with PIN", record.issued_to),
                at,
            );
            core.events.append(
                &apt_id,
                AccessEventKind::DoorOpened,
                &record.issued_to,
                "front door opened by PIN".to_string(),
                at,
            );
            (
                StatusCode::OK,
                Json(json!({ "granted": true, "role": record.role })),
            )
                .into_response()
        }
        None => {
            core.events.append(
                &apt_id,
                AccessEventKind::GuestAccessKo,
                "keypad",
                "access denied: unknown, expired, or foreign PIN".to_string(),
                at,
            );
            (
                StatusCode::FORBIDDEN,
                Json(json!({ "granted": false })),
            )
                .into_response()
        }
    }
}

pub(crate) async fn door_open_handler(
    State(core): State<CoreState>,
    Path(apt_id): Path<String>,
    payload: Option<Json<ActorRequest>>,
) -> Json<serde_json::Value> {
    let actor = actor_from(payload);
    let event = core.events.append(
        &apt_id,
        AccessEventKind::DoorOpened,
        &actor,
        "front door opened",
        now(),
    );
    Json(json!({ "event": event }))
}

pub(crate) async fn door_close_handler(
    State(core): State<CoreState>,
    Path(apt_id): Path<String>,
    payload: Option<Json<ActorRequest>>,
) -> Json<serde_json::Value> {
    let actor = actor_from(payload);
    let event = core.events.append(
        &apt_id,
        AccessEventKind::DoorClosed,
        &actor,
        "front door closed",
        now(),
    );
    Json(json!({ "event": event }))
}

/// The gate has no state to derive; opening it is a one-shot pulse.
pub(crate) async fn gate_open_handler(
    State(core): State<CoreState>,
    Path(apt_id): Path<String>,
    payload: Option<Json<ActorRequest>>,
) -> Json<serde_json::Value> {
    let actor = actor_from(payload);
    let event = core.events.append(
        &apt_id,
        AccessEventKind::GateOpened,
        &actor,
        "street gate pulse",
        now(),
    );
    Json(json!({ "event": event }))
}

fn actor_from(payload: Option<Json<ActorRequest>>) -> String {
    payload
        .and_then(|Json(request)| request.actor)
        .unwrap_or_else(|| "operator".to_string())
}

pub(crate) async fn door_state_handler(
    State(core): State<CoreState>,
    Path(apt_id): Path<String>,
) -> Json<serde_json::Value> {
    let state = core.events.derive_door_state(&apt_id);
    Json(json!({ "state": state }))
}

pub(crate) async fn events_handler(
    State(core): State<CoreState>,
    Path(apt_id): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Json<serde_json::Value> {
    let events = core.events.events_for(&apt_id, query.limit.unwrap_or(50));
    Json(json!({ "events": events }))
}

pub(crate) async fn session_validate_handler(
    State(core): State<CoreState>,
    Json(session): Json<Session>,
) -> Response {
    match core.sessions.validate(&session, now()) {
        Ok(()) => (StatusCode::OK, Json(json!({ "valid": true }))).into_response(),
        Err(rejection) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "valid": false, "reason": rejection.to_string() })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{build_core, default_accounts, InMemoryCleanerConfigStore};
    use chrono::Duration;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_router() -> (CoreState, Router) {
        let core = build_core(
            Arc::new(InMemoryCleanerConfigStore::default()),
            Arc::new(default_accounts()),
        );
        (core.clone(), with_core_routes(core))
    }

    fn booking_payload() -> serde_json::Value {
        let check_in = Local::now().naive_local() + Duration::hours(1);
        let check_out = check_in + Duration::days(4);
        json!({
            "apt_id": "apt-milano-01",
            "check_in": check_in.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "check_out": check_out.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "guests": [
                { "first_name": "Mario", "last_name": "Rossi", "phone": "+39 333 111111" },
                { "first_name": "Anna", "last_name": "Verdi", "phone": "+39 333 222222" }
            ],
            "cleaner_name": "Lucia Bianchi"
        })
    }

    async fn read_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 128 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    async fn post_json(router: Router, uri: &str, payload: serde_json::Value) -> Response {
        router
            .oneshot(
                axum::http::Request::post(uri)
                    .header(axum::http::header::CONTENT_TYPE, "application/json")
                    .body(axum::body::Body::from(serde_json::to_vec(&payload).unwrap()))
                    .unwrap(),
            )
            .await
            .expect("router responds")
    }

    #[tokio::test]
    async fn create_stay_returns_issued_pins() {
        let (_, router) = test_router();
        let response = post_json(router, "/api/v1/stays", booking_payload()).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        let pins = body["pins"].as_array().expect("pins array");
        assert_eq!(pins.len(), 3, "two guest PINs plus one cleaner PIN");
        assert_eq!(body["stay"]["cleaner_name"], "Lucia Bianchi");
    }

    #[tokio::test]
    async fn create_stay_rejects_inverted_dates() {
        let (_, router) = test_router();
        let mut payload = booking_payload();
        let check_in = payload["check_in"].clone();
        payload["check_in"] = payload["check_out"].clone();
        payload["check_out"] = check_in;

        let response = post_json(router, "/api/v1/stays", payload).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn last_guest_removal_is_refused_at_the_edge() {
        let (core, router) = test_router();
        let mut payload = booking_payload();
        payload["guests"] = json!([
            { "first_name": "Mario", "last_name": "Rossi", "phone": "+39 333 111111" }
        ]);
        let response = post_json(router.clone(), "/api/v1/stays", payload).await;
        let body = read_json(response).await;
        let stay_id = body["stay"]["stay_id"].as_str().expect("stay id").to_string();
        let guest_id = body["stay"]["guests"][0]["guest_id"]
            .as_str()
            .expect("guest id")
            .to_string();

        let response = router
            .oneshot(
                axum::http::Request::delete(format!(
                    "/api/v1/stays/{stay_id}/guests/{guest_id}"
                ))
                .body(axum::body::Body::empty())
                .unwrap(),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = read_json(response).await;
        assert_eq!(body["removed"], false);
        // The core itself was never asked, so the guest keeps the PIN.
        let stay = core
            .stays
            .get(&StayId(stay_id))
            .expect("stay still present");
        assert_eq!(stay.guests.len(), 1);
    }

    #[tokio::test]
    async fn access_attempt_with_live_pin_opens_the_door() {
        let (core, router) = test_router();
        let response = post_json(router.clone(), "/api/v1/stays", booking_payload()).await;
        let body = read_json(response).await;
        // Guest PINs only open at check-in, an hour from now.
        let code = body["pins"]
            .as_array()
            .expect("pins")
            .iter()
            .find(|pin| pin["role"] == "guest")
            .expect("guest pin")["code"]
            .as_str()
            .expect("code")
            .to_string();

        // Not yet inside the window: denied and logged as KO.
        let response = post_json(
            router.clone(),
            "/api/v1/apartments/apt-milano-01/access",
            json!({ "pin": code }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            core.events.derive_door_state("apt-milano-01"),
            stay_ops::operations::access::DoorState::Unknown
        );

        // Issue a manual host PIN that is live right now.
        let from = Local::now().naive_local() - Duration::hours(1);
        let to = Local::now().naive_local() + Duration::hours(1);
        let response = post_json(
            router.clone(),
            "/api/v1/pins",
            json!({
                "role": "host",
                "apt_id": "apt-milano-01",
                "issued_to": "Anna Host",
                "valid_from": from.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "valid_to": to.format("%Y-%m-%dT%H:%M:%S").to_string(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let live_code = read_json(response).await["code"]
            .as_str()
            .expect("code")
            .to_string();

        let response = post_json(
            router,
            "/api/v1/apartments/apt-milano-01/access",
            json!({ "pin": live_code }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            core.events.derive_door_state("apt-milano-01"),
            stay_ops::operations::access::DoorState::Open
        );
    }

    #[tokio::test]
    async fn session_validation_covers_legacy_and_account_paths() {
        let (_, router) = test_router();

        let response = post_json(
            router.clone(),
            "/api/v1/sessions/validate",
            json!({ "role": "host", "apt_id": "apt-milano-01" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "legacy session passes");

        let response = post_json(
            router.clone(),
            "/api/v1/sessions/validate",
            json!({ "role": "host", "apt_id": "apt-milano-01", "account_id": "host-admin" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = post_json(
            router,
            "/api/v1/sessions/validate",
            json!({ "role": "tech", "apt_id": "apt-milano-01", "account_id": "tech-gone" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_pin_lookup_is_a_404() {
        let (_, router) = test_router();
        let response = router
            .oneshot(
                axum::http::Request::get("/api/v1/pins/000000")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn door_and_gate_events_shape_the_derived_state() {
        let (_, router) = test_router();

        let response = post_json(
            router.clone(),
            "/api/v1/apartments/apt-roma-02/door/open",
            json!({ "actor": "Mario Rossi" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        post_json(
            router.clone(),
            "/api/v1/apartments/apt-roma-02/gate/open",
            json!({}),
        )
        .await;

        let response = router
            .oneshot(
                axum::http::Request::get("/api/v1/apartments/apt-roma-02/door")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .expect("router responds");
        let body = read_json(response).await;
        assert_eq!(body["state"], "open", "gate pulse does not close the door");
    }
}
