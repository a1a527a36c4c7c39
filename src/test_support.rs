use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde_json::{Value, json};

use crate::adapters::auth::{HttpAuthenticator, TokenManager};
use crate::adapters::client_session::ClientSettings;
use crate::adapters::gateway::ChargePointGateway;
use crate::adapters::http::{HttpDispatcher, build_http_client};
use crate::domain::models::Credential;

pub const TEST_EMAIL: &str = "owner@example.com";
pub const TEST_PASSWORD: &str = "hunter2";
pub const TEST_API_KEY: &str = "key-123";

#[derive(Debug, Clone)]
pub struct FakeOptions {
    /// Lifetime of issued access tokens; zero or negative issues already-expired tokens.
    pub token_ttl_secs: i64,
    /// Logins beyond this count are rejected with 401.
    pub logins_allowed: Option<usize>,
    pub refresh_ok: bool,
    /// Delay before answering any non-auth request.
    pub response_delay: Option<Duration>,
}

impl Default for FakeOptions {
    fn default() -> Self {
        Self {
            token_ttl_secs: 3600,
            logins_allowed: None,
            refresh_ok: true,
            response_delay: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub body: Value,
    pub authorization: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
struct CannedResponse {
    status: u16,
    body: String,
}

struct Shared {
    options: FakeOptions,
    responses: Mutex<HashMap<(String, String), CannedResponse>>,
    recorded: Mutex<Vec<RecordedRequest>>,
    logins: AtomicUsize,
    refreshes: AtomicUsize,
}

/// Charge Amps cloud stand-in served on an ephemeral local port.
pub struct FakeUpstream {
    address: SocketAddr,
    shared: Arc<Shared>,
    handle: ServerHandle,
}

impl FakeUpstream {
    pub async fn start() -> Self {
        Self::start_with(FakeOptions::default()).await
    }

    pub async fn start_with(options: FakeOptions) -> Self {
        let shared = Arc::new(Shared {
            options,
            responses: Mutex::new(HashMap::new()),
            recorded: Mutex::new(Vec::new()),
            logins: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
        });
        let data = web::Data::from(Arc::clone(&shared));

        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .default_service(web::to(handle_request))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("fake upstream should bind");
        let address = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            address,
            shared,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// Canned JSON reply for `method` on an API path given without the `/api/v5` prefix.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.respond_raw(method, path, status, &body.to_string());
    }

    pub fn respond_raw(&self, method: &str, path: &str, status: u16, body: &str) {
        self.shared
            .responses
            .lock()
            .expect("responses lock")
            .insert(
                (method.to_string(), format!("/api/v5{path}")),
                CannedResponse {
                    status,
                    body: body.to_string(),
                },
            );
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.shared.recorded.lock().expect("recorded lock").clone()
    }

    pub fn last_request_to(&self, path: &str) -> Option<RecordedRequest> {
        self.recorded()
            .into_iter()
            .rev()
            .find(|request| request.path == path)
    }

    pub fn login_calls(&self) -> usize {
        self.shared.logins.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.shared.refreshes.load(Ordering::SeqCst)
    }

    pub fn credential(&self) -> Credential {
        Credential::new(TEST_EMAIL, TEST_PASSWORD, TEST_API_KEY)
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url(),
            credential: self.credential(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn dispatcher(&self) -> HttpDispatcher {
        self.dispatcher_with_timeout(Duration::from_secs(5))
    }

    pub fn dispatcher_with_timeout(&self, timeout: Duration) -> HttpDispatcher {
        let client = build_http_client(timeout).expect("http client builds");
        let base_url = self.base_url();
        let tokens = TokenManager::new(
            HttpAuthenticator::new(client.clone(), &base_url),
            self.credential(),
        );
        HttpDispatcher::new(client, &base_url, tokens)
    }

    pub fn gateway(&self) -> ChargePointGateway {
        ChargePointGateway::new(self.dispatcher())
    }

    pub async fn stop(&self) {
        self.handle.stop(false).await;
    }
}

async fn handle_request(
    request: HttpRequest,
    body: web::Bytes,
    shared: web::Data<Shared>,
) -> HttpResponse {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.path().to_string(),
        query: request.query_string().to_string(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        authorization: header("authorization"),
        api_key: header("apikey"),
    };
    shared
        .recorded
        .lock()
        .expect("recorded lock")
        .push(recorded.clone());

    match recorded.path.as_str() {
        "/api/v5/auth/login" => return login(&shared, &recorded),
        "/api/v5/auth/refreshToken" => return refresh(&shared, &recorded),
        _ => {}
    }

    if !recorded
        .authorization
        .as_deref()
        .is_some_and(|value| value.starts_with("Bearer "))
    {
        return HttpResponse::Unauthorized().json(json!({ "message": "missing bearer token" }));
    }

    if let Some(delay) = shared.options.response_delay {
        actix_web::rt::time::sleep(delay).await;
    }

    let canned = shared
        .responses
        .lock()
        .expect("responses lock")
        .get(&(recorded.method.clone(), recorded.path.clone()))
        .cloned();
    match canned {
        Some(canned) => HttpResponse::build(
            StatusCode::from_u16(canned.status).expect("canned status is valid"),
        )
        .content_type("application/json")
        .body(canned.body),
        None if recorded.method == "GET" => {
            HttpResponse::NotFound().json(json!({ "message": "no such resource" }))
        }
        None => HttpResponse::Ok().finish(),
    }
}

fn login(shared: &Shared, request: &RecordedRequest) -> HttpResponse {
    let serial = shared.logins.fetch_add(1, Ordering::SeqCst) + 1;
    let accepted = request.api_key.as_deref() == Some(TEST_API_KEY)
        && request.body["email"] == TEST_EMAIL
        && request.body["password"] == TEST_PASSWORD
        && shared
            .options
            .logins_allowed
            .is_none_or(|allowed| serial <= allowed);
    if !accepted {
        return HttpResponse::Unauthorized().json(json!({ "message": "invalid credentials" }));
    }
    HttpResponse::Ok().json(grant(&shared.options, "login", serial))
}

fn refresh(shared: &Shared, request: &RecordedRequest) -> HttpResponse {
    let serial = shared.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
    if !shared.options.refresh_ok || request.api_key.as_deref() != Some(TEST_API_KEY) {
        return HttpResponse::Unauthorized().json(json!({ "message": "refresh token revoked" }));
    }
    HttpResponse::Ok().json(grant(&shared.options, "refresh", serial))
}

fn grant(options: &FakeOptions, label: &str, serial: usize) -> Value {
    let exp = Utc::now().timestamp() + options.token_ttl_secs;
    json!({
        "token": format!("{}{label}-{serial}", test_jwt(exp)),
        "refreshToken": format!("refresh-{label}-{serial}"),
        "user": {
            "id": "user-1",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": TEST_EMAIL,
            "mobile": null,
            "userStatus": "Valid"
        }
    })
}

/// Unsigned token carrying only an `exp` claim; the signature segment is left for the caller.
pub fn test_jwt(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"user-1","exp":{exp}}}"#));
    format!("{header}.{claims}.")
}

pub fn sample_charge_point(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Garage",
        "password": null,
        "type": "HALO",
        "isLoadbalanced": false,
        "firmwareVersion": "5.2.0",
        "hardwareVersion": "HW2",
        "connectors": [
            { "chargePointId": id, "connectorId": 1, "type": "Type2" }
        ]
    })
}

pub fn sample_session(
    id: i64,
    rfid: &str,
    kwh: f64,
    start_time: Option<&str>,
    end_time: Option<&str>,
) -> Value {
    json!({
        "id": id,
        "chargePointId": "cp-1",
        "connectorId": 1,
        "userId": "user-1",
        "rfid": rfid,
        "rfidDec": null,
        "rfidDecReverse": null,
        "organisationId": null,
        "sessionType": "RFID",
        "totalConsumptionKwh": kwh,
        "externalTransactionId": null,
        "externalId": null,
        "startTime": start_time,
        "endTime": end_time
    })
}
