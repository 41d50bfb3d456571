//! JSON request/response surface.
//!
//! One call per operation: a JSON body in, an [`ApiResponse`] (status code
//! plus JSON body) out. The transport that carries these is up to the
//! embedding application.
//!
//! ```
//! use flip_in_order::service::{GameApi, GameService, Operation};
//! use flip_in_order::store::MemoryStore;
//! use serde_json::json;
//!
//! let api = GameApi::new(GameService::new(MemoryStore::new()));
//! let created = api.handle(Operation::CreateSession, &json!({ "hostPlayer": "alice" }));
//! assert_eq!(created.status, 200);
//! assert!(created.body.game_id.is_some());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use super::game::{GameService, JoinTarget};
use crate::core::{GameError, PlayerSeat};
use crate::session::{Session, SessionId};
use crate::store::KvStore;

/// The operations exposed to clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateSession,
    FetchSession,
    JoinSession,
    ApplyMove,
    ClearMismatch,
}

impl Operation {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Operation::CreateSession => "create",
            Operation::FetchSession => "fetch",
            Operation::JoinSession => "join",
            Operation::ApplyMove => "move",
            Operation::ClearMismatch => "reset",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub host_player: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub game_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionRequest {
    pub game_id: Option<String>,
    pub game_code: Option<String>,
    pub guest_player: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub game_id: Option<String>,
    pub player_id: Option<i64>,
    pub card_index: Option<i64>,
}

/// Response body. Absent fields are omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_state: Option<Session>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_ended: Option<bool>,
}

/// Status code and body of one call.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: GameResponse,
}

impl ApiResponse {
    fn ok(body: GameResponse) -> Self {
        Self { status: 200, body }
    }

    fn failure(err: &GameError) -> Self {
        Self {
            status: err.category().status_code(),
            body: GameResponse {
                error: Some(err.client_message()),
                ..GameResponse::default()
            },
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Serialize the body.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.body)
    }
}

/// Maps JSON calls onto a [`GameService`].
pub struct GameApi<S> {
    service: GameService<S>,
}

impl<S: KvStore> GameApi<S> {
    pub fn new(service: GameService<S>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &GameService<S> {
        &self.service
    }

    /// Handle a raw JSON body. Unparseable bodies are bad input.
    pub fn handle_json(&self, op: Operation, body: &str) -> ApiResponse {
        match serde_json::from_str::<Value>(body) {
            Ok(payload) => self.handle(op, &payload),
            Err(err) => self.respond(op, Err(GameError::invalid_input(format!("Malformed request body: {err}")))),
        }
    }

    /// Handle an already-parsed JSON payload.
    pub fn handle(&self, op: Operation, payload: &Value) -> ApiResponse {
        let result = match op {
            Operation::CreateSession => self.create(payload),
            Operation::FetchSession => self.fetch(payload),
            Operation::JoinSession => self.join(payload),
            Operation::ApplyMove => self.apply_move(payload),
            Operation::ClearMismatch => self.clear(payload),
        };
        self.respond(op, result)
    }

    fn respond(&self, op: Operation, result: Result<GameResponse, GameError>) -> ApiResponse {
        match result {
            Ok(body) => ApiResponse::ok(body),
            Err(err @ GameError::Internal(_)) => {
                error!(op = op.name(), error = %err, "request failed");
                ApiResponse::failure(&err)
            }
            Err(err) => {
                debug!(op = op.name(), error = %err, "request rejected");
                ApiResponse::failure(&err)
            }
        }
    }

    fn create(&self, payload: &Value) -> Result<GameResponse, GameError> {
        let request: CreateSessionRequest = parse(payload)?;
        let host = present(request.host_player).ok_or_else(|| GameError::invalid_input("Host player name is required"))?;

        let (id, session) = self.service.create_session(&host)?;
        Ok(GameResponse {
            game_id: Some(id),
            game_state: Some(session),
            ..GameResponse::default()
        })
    }

    fn fetch(&self, payload: &Value) -> Result<GameResponse, GameError> {
        let request: SessionRequest = parse(payload)?;
        let id = present(request.game_id).ok_or_else(|| GameError::invalid_input("Game ID is required"))?;

        let session = self.service.fetch_session(&id)?;
        Ok(state(session))
    }

    fn join(&self, payload: &Value) -> Result<GameResponse, GameError> {
        let request: JoinSessionRequest = parse(payload)?;
        let missing = || GameError::invalid_input("Game ID or game code and guest player name are required");

        let guest = present(request.guest_player).ok_or_else(missing)?;
        let target = match (present(request.game_id), present(request.game_code)) {
            (Some(id), _) => JoinTarget::Id(id),
            (None, Some(code)) => JoinTarget::Code(code),
            (None, None) => return Err(missing()),
        };

        let session = self.service.join_session(&target, &guest)?;
        Ok(state(session))
    }

    fn apply_move(&self, payload: &Value) -> Result<GameResponse, GameError> {
        let request: MoveRequest = parse(payload)?;
        let (Some(id), Some(player_id), Some(card_index)) =
            (present(request.game_id), request.player_id, request.card_index)
        else {
            return Err(GameError::invalid_input("Game ID, player ID, and card index are required"));
        };

        let seat = u8::try_from(player_id)
            .ok()
            .and_then(PlayerSeat::from_number)
            .ok_or_else(|| GameError::invalid_input("Player ID must be 1 or 2"))?;
        let card_index = usize::try_from(card_index)
            .map_err(|_| GameError::invalid_input(format!("Card index {card_index} is out of range")))?;

        let result = self.service.apply_move(&id, seat, card_index)?;
        let game_ended = result.game_ended();
        Ok(GameResponse {
            game_state: Some(result.session),
            game_ended: Some(game_ended),
            ..GameResponse::default()
        })
    }

    fn clear(&self, payload: &Value) -> Result<GameResponse, GameError> {
        let request: SessionRequest = parse(payload)?;
        let id = present(request.game_id).ok_or_else(|| GameError::invalid_input("Game ID is required"))?;

        let session = self.service.clear_mismatch(&id)?;
        Ok(state(session))
    }
}

fn parse<T: for<'de> Deserialize<'de>>(payload: &Value) -> Result<T, GameError> {
    T::deserialize(payload).map_err(|err| GameError::invalid_input(format!("Malformed request body: {err}")))
}

/// Empty strings count as missing.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}

fn state(session: Session) -> GameResponse {
    GameResponse {
        game_state: Some(session),
        ..GameResponse::default()
    }
}
