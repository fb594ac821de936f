use std::{
    collections::{HashMap, VecDeque},
    fs,
    net::SocketAddr,
    sync::Arc,
};

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use tokio::{
    net::TcpListener,
    sync::{broadcast, Mutex},
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::model::messages::{CardQuery, IdQuery, SideQuery};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Join,
    Side,
    Card,
    Render,
}

/// One canned reply. A missing body means an empty 200-style response.
#[derive(Deserialize, Debug, Clone)]
pub struct ScriptedResponse {
    #[serde(default = "ok_status")]
    pub status: u16,
    #[serde(default)]
    pub body: Option<Value>,
}

fn ok_status() -> u16 {
    200
}

impl ScriptedResponse {
    pub fn ok() -> Self {
        ScriptedResponse {
            status: 200,
            body: None,
        }
    }

    pub fn json(body: Value) -> Self {
        ScriptedResponse {
            status: 200,
            body: Some(body),
        }
    }

    pub fn status(status: u16) -> Self {
        ScriptedResponse { status, body: None }
    }

    fn to_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self.body {
            Some(body) => (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                body.to_string(),
            )
                .into_response(),
            None => status.into_response(),
        }
    }
}

/// Per-endpoint reply queues. The last reply of each queue repeats forever,
/// which is how a real server answers an idle poller.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Script {
    #[serde(default)]
    pub join: Vec<ScriptedResponse>,
    #[serde(default)]
    pub side: Vec<ScriptedResponse>,
    #[serde(default)]
    pub card: Vec<ScriptedResponse>,
    #[serde(default)]
    pub render: Vec<ScriptedResponse>,
}

impl Script {
    /// Reads a script file, replacing every `${name}` with its value first.
    pub fn load(file_path: String, replacements: Vec<(impl ToString, impl ToString)>) -> Self {
        let mut text = fs::read_to_string(&file_path)
            .unwrap_or_else(|e| panic!("Unable to read {}: {}", file_path, e));
        for (from, to) in replacements {
            let from = &format!("${{{}}}", from.to_string());
            text = text.replace(from, &to.to_string());
        }
        serde_json::from_str(&text).expect("Could not parse script")
    }

    pub fn with(mut self, endpoint: Endpoint, response: ScriptedResponse) -> Self {
        self.queue_mut(endpoint).push(response);
        self
    }

    pub fn render(self, body: Value) -> Self {
        self.with(Endpoint::Render, ScriptedResponse::json(body))
    }

    fn queue_mut(&mut self, endpoint: Endpoint) -> &mut Vec<ScriptedResponse> {
        match endpoint {
            Endpoint::Join => &mut self.join,
            Endpoint::Side => &mut self.side,
            Endpoint::Card => &mut self.card,
            Endpoint::Render => &mut self.render,
        }
    }
}

/// A query string as the game server would read it.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedQuery {
    Id(IdQuery),
    Side(SideQuery),
    Card(CardQuery),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub endpoint: Endpoint,
    pub query: HashMap<String, String>,
    /// `None` when the query did not decode; such requests get a 400.
    pub decoded: Option<DecodedQuery>,
}

struct ScriptState {
    queues: HashMap<Endpoint, VecDeque<ScriptedResponse>>,
    requests: Vec<RecordedRequest>,
}

impl ScriptState {
    fn next(
        &mut self,
        endpoint: Endpoint,
        query: HashMap<String, String>,
        decoded: Option<DecodedQuery>,
    ) -> ScriptedResponse {
        let valid = decoded.is_some();
        self.requests.push(RecordedRequest {
            endpoint,
            query,
            decoded,
        });
        if !valid {
            return ScriptedResponse::status(400);
        }
        let Some(queue) = self.queues.get_mut(&endpoint) else {
            return ScriptedResponse::ok();
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_else(ScriptedResponse::ok)
        } else {
            queue.front().cloned().unwrap_or_else(ScriptedResponse::ok)
        }
    }
}

type SharedState = Arc<Mutex<ScriptState>>;

/// Local stand-in for the game server, answering from a [`Script`].
pub struct ScriptedServer {
    pub address: SocketAddr,
    state: SharedState,
    shutdown_sender: broadcast::Sender<()>,
}

impl ScriptedServer {
    pub async fn new(script: Script) -> Self {
        let queues: HashMap<Endpoint, VecDeque<ScriptedResponse>> = HashMap::from([
            (Endpoint::Join, script.join.into()),
            (Endpoint::Side, script.side.into()),
            (Endpoint::Card, script.card.into()),
            (Endpoint::Render, script.render.into()),
        ]);
        let state = Arc::new(Mutex::new(ScriptState {
            queues,
            requests: vec![],
        }));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind scripted server");
        let address = listener
            .local_addr()
            .expect("Failed to read scripted server address");

        let app = Router::new()
            .route("/join", get(Self::join))
            .route("/side", get(Self::side))
            .route("/card", get(Self::card))
            .route("/render", get(Self::render))
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let (shutdown_sender, mut shutdown_receiver) = broadcast::channel::<()>(1);
        tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_receiver.recv().await;
                })
                .await;
            if let Err(e) = result {
                error!("Scripted server exited with error: {}", e);
            }
        });
        info!("Scripted server listening on {}", address);

        ScriptedServer {
            address,
            state,
            shutdown_sender,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.address)
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }

    pub async fn requests_to(&self, endpoint: Endpoint) -> Vec<RecordedRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|request| request.endpoint == endpoint)
            .collect()
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_sender.send(());
    }

    async fn join(
        State(state): State<SharedState>,
        Query(query): Query<HashMap<String, String>>,
        decoded: Result<Query<IdQuery>, QueryRejection>,
    ) -> Response {
        let decoded = Self::decoded(decoded).map(DecodedQuery::Id);
        Self::respond(state, Endpoint::Join, query, decoded).await
    }

    async fn side(
        State(state): State<SharedState>,
        Query(query): Query<HashMap<String, String>>,
        decoded: Result<Query<SideQuery>, QueryRejection>,
    ) -> Response {
        let decoded = Self::decoded(decoded).map(DecodedQuery::Side);
        Self::respond(state, Endpoint::Side, query, decoded).await
    }

    async fn card(
        State(state): State<SharedState>,
        Query(query): Query<HashMap<String, String>>,
        decoded: Result<Query<CardQuery>, QueryRejection>,
    ) -> Response {
        let decoded = Self::decoded(decoded).map(DecodedQuery::Card);
        Self::respond(state, Endpoint::Card, query, decoded).await
    }

    async fn render(
        State(state): State<SharedState>,
        Query(query): Query<HashMap<String, String>>,
        decoded: Result<Query<IdQuery>, QueryRejection>,
    ) -> Response {
        let decoded = Self::decoded(decoded).map(DecodedQuery::Id);
        Self::respond(state, Endpoint::Render, query, decoded).await
    }

    fn decoded<Q>(decoded: Result<Query<Q>, QueryRejection>) -> Option<Q> {
        match decoded {
            Ok(Query(query)) => Some(query),
            Err(e) => {
                warn!("Undecodable query: {}", e);
                None
            }
        }
    }

    async fn respond(
        state: SharedState,
        endpoint: Endpoint,
        query: HashMap<String, String>,
        decoded: Option<DecodedQuery>,
    ) -> Response {
        debug!("{:?} {:?}", endpoint, query);
        state
            .lock()
            .await
            .next(endpoint, query, decoded)
            .to_response()
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
