pub mod fixtures;

use std::net::TcpListener;
use std::sync::Arc;

use api_tester_core::{ApiConfig, EndpointRegistry, InvocationController, ReqwestTransport};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub use fixtures::TestFixtures;

/// Path prefix the Regulon public API is served under
pub const API_PREFIX: &str = "/public_api/v1";
pub const TEST_TOKEN: &str = "test-token-0001";

/// Local stand-in for the Regulon public API
pub struct MockRegulonApi {
    server: MockServer,
}

impl MockRegulonApi {
    pub async fn start() -> Self {
        init_tracing();
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    pub fn base_url(&self) -> String {
        format!("{}{}", self.server.uri(), API_PREFIX)
    }

    pub fn api_config(&self, token: Option<&str>) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url(),
            token: token.map(str::to_string),
            ..ApiConfig::default()
        }
    }

    /// Controller over the real reqwest transport, pointed at this server
    pub fn controller(&self) -> InvocationController {
        controller_for(&self.api_config(Some(TEST_TOKEN)))
    }

    /// Answer `verb route` (route relative to the API prefix) for
    /// requests carrying the test credential
    pub async fn respond(&self, verb: &str, route: &str, status: u16, body: serde_json::Value) {
        Mock::given(method(verb))
            .and(path(format!("{}{}", API_PREFIX, route)))
            .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn received_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}

pub fn controller_for(api: &ApiConfig) -> InvocationController {
    let transport = ReqwestTransport::new(api).expect("reqwest client builds");
    InvocationController::new(EndpointRegistry::regulon(), Arc::new(transport), api)
}

/// Base URL on a local port nothing is listening on
pub fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}{}", port, API_PREFIX)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("api_tester_core=debug")
        .with_test_writer()
        .try_init();
}
