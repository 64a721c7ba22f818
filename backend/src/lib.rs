use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use santa_core::{
    resolve_assignment, AssignError, CharacterId, Mode, ParticipantName, Roster, RosterError,
    RoundSnapshot,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

pub mod mail;
pub mod template;

use mail::Mailer;

#[derive(Clone)]
pub struct AppState {
    records: Arc<RwLock<Vec<ParticipantRecord>>>,
    roster: Arc<Roster>,
    mailer: Arc<dyn Mailer>,
    persist_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(roster: Roster, mailer: Arc<dyn Mailer>) -> Result<Self, RosterError> {
        roster.validate()?;
        Ok(Self {
            records: Arc::new(RwLock::new(Vec::new())),
            roster: Arc::new(roster),
            mailer,
            persist_path: None,
        })
    }

    pub async fn with_persistence(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.persist_path = Some(path.clone());
        if let Ok(bytes) = tokio::fs::read(&path).await {
            if let Ok(saved) = serde_json::from_slice::<Vec<ParticipantRecord>>(&bytes) {
                let mut records = self.records.write().await;
                *records = saved;
            }
        }
        self
    }

    async fn persist(&self) {
        if let Some(path) = &self.persist_path {
            let snapshot = {
                let records = self.records.read().await;
                records.clone()
            };
            match serde_json::to_vec_pretty(&snapshot) {
                Ok(json) => {
                    if let Err(err) = tokio::fs::write(path, json).await {
                        tracing::error!(%err, "failed to persist participant records");
                    }
                }
                Err(err) => tracing::error!(%err, "failed to serialize participant records"),
            }
        }
    }

    /// Creates the write-once character selection for `(name, mode)`.
    /// Real mode rejects a taken character or a repeat selection; demo
    /// mode permits duplicates of both.
    pub async fn create_selection(
        &self,
        name: &str,
        email: &str,
        character: &str,
        mode: Mode,
    ) -> Result<ParticipantRecord, SelectError> {
        if !self.roster.has_participant(name) {
            return Err(SelectError::UnknownParticipant);
        }
        if !self.roster.has_character(character) {
            return Err(SelectError::UnknownCharacter);
        }
        if email.is_empty() || !email.contains('@') {
            return Err(SelectError::InvalidEmail);
        }

        let mut records = self.records.write().await;
        if mode == Mode::Real {
            if records
                .iter()
                .any(|r| r.mode == Mode::Real && r.character == character)
            {
                return Err(SelectError::CharacterTaken);
            }
            if records.iter().any(|r| r.mode == Mode::Real && r.name == name) {
                return Err(SelectError::AlreadySelected);
            }
        }

        let record = ParticipantRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            character: character.to_string(),
            mode,
            assigned_to: None,
            selected_at: now_millis(),
        };
        records.push(record.clone());
        drop(records);
        self.persist().await;

        Ok(record)
    }

    /// Administrative reset: deletes every record across both modes.
    pub async fn clear_all(&self) -> usize {
        let mut records = self.records.write().await;
        let deleted = records.len();
        records.clear();
        drop(records);
        self.persist().await;
        deleted
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantRecord {
    pub id: String,
    pub name: ParticipantName,
    pub email: String,
    pub character: CharacterId,
    pub mode: Mode,
    pub assigned_to: Option<ParticipantName>,
    pub selected_at: u64,
}

fn find_by_name<'a>(
    records: &'a [ParticipantRecord],
    name: &str,
    mode: Mode,
) -> Option<&'a ParticipantRecord> {
    records.iter().find(|r| r.mode == mode && r.name == name)
}

fn list_assigned<'a>(records: &'a [ParticipantRecord], mode: Mode) -> Vec<&'a ParticipantRecord> {
    records
        .iter()
        .filter(|r| r.mode == mode && r.assigned_to.is_some())
        .collect()
}

fn list_all<'a>(records: &'a [ParticipantRecord], mode: Mode) -> Vec<&'a ParticipantRecord> {
    records.iter().filter(|r| r.mode == mode).collect()
}

fn set_assignment(
    records: &mut [ParticipantRecord],
    name: &str,
    mode: Mode,
    assigned_to: &str,
) -> Option<ParticipantRecord> {
    let record = records
        .iter_mut()
        .find(|r| r.mode == mode && r.name == name)?;
    record.assigned_to = Some(assigned_to.to_string());
    Some(record.clone())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn admin_password() -> String {
    env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "changeme".to_string())
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/select-character", post(select_character))
        .route("/play", post(play))
        .route("/game-state", get(game_state))
        .route("/reset", post(reset))
        .with_state(state)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("invalid participant name")]
    UnknownParticipant,
    #[error("invalid character selection")]
    UnknownCharacter,
    #[error("valid email required")]
    InvalidEmail,
    #[error("this character has already been selected")]
    CharacterTaken,
    #[error("you have already selected a character")]
    AlreadySelected,
}

impl SelectError {
    fn status(&self) -> StatusCode {
        match self {
            Self::UnknownParticipant | Self::UnknownCharacter | Self::InvalidEmail => {
                StatusCode::BAD_REQUEST
            }
            Self::CharacterTaken | Self::AlreadySelected => StatusCode::CONFLICT,
        }
    }
}

#[derive(Deserialize)]
struct SelectRequest {
    name: String,
    email: String,
    character: String,
    #[serde(default)]
    mode: Mode,
}

#[derive(Serialize)]
struct SelectResponse {
    id: String,
    name: String,
    character: String,
}

async fn select_character(
    State(state): State<AppState>,
    Json(payload): Json<SelectRequest>,
) -> impl IntoResponse {
    let name = payload.name.trim();
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, "name required").into_response();
    }

    match state
        .create_selection(
            name,
            payload.email.trim(),
            payload.character.trim(),
            payload.mode,
        )
        .await
    {
        Ok(record) => (
            StatusCode::CREATED,
            Json(SelectResponse {
                id: record.id,
                name: record.name,
                character: record.character,
            }),
        )
            .into_response(),
        Err(err) => (err.status(), err.to_string()).into_response(),
    }
}

#[derive(Deserialize)]
struct PlayRequest {
    name: String,
    #[serde(default)]
    mode: Mode,
}

#[derive(Deserialize)]
struct PlayParams {
    seed: Option<u64>,
}

#[derive(Serialize)]
struct PlayResponse {
    assigned_to: String,
    email_sent: bool,
}

async fn play(
    State(state): State<AppState>,
    Query(params): Query<PlayParams>,
    Json(payload): Json<PlayRequest>,
) -> impl IntoResponse {
    let name = payload.name.trim();
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, "name required").into_response();
    }

    let mut rng = params
        .seed
        .map(ChaCha8Rng::seed_from_u64)
        .unwrap_or_else(ChaCha8Rng::from_entropy);

    match process_play(&state, name, payload.mode, &mut rng).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(PlayResponse {
                assigned_to: outcome.assigned_to,
                email_sent: outcome.email_sent,
            }),
        )
            .into_response(),
        Err(err) => (err.status(), err.to_string()).into_response(),
    }
}

struct PlayOutcome {
    assigned_to: ParticipantName,
    email_sent: bool,
}

#[derive(Debug, thiserror::Error)]
enum PlayError {
    #[error("participant not found, select a character first")]
    NotSelected,
    #[error(transparent)]
    Assign(#[from] AssignError),
}

impl PlayError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotSelected => StatusCode::NOT_FOUND,
            Self::Assign(AssignError::UnknownParticipant) => StatusCode::BAD_REQUEST,
            Self::Assign(AssignError::NoCandidates) => StatusCode::CONFLICT,
        }
    }
}

async fn process_play(
    state: &AppState,
    name: &str,
    mode: Mode,
    rng: &mut ChaCha8Rng,
) -> Result<PlayOutcome, PlayError> {
    if !state.roster.has_participant(name) {
        return Err(PlayError::Assign(AssignError::UnknownParticipant));
    }

    // The snapshot read and the assignment write stay under one lock so
    // two concurrent turns cannot both see the same open pool.
    let mut records = state.records.write().await;

    let participant = find_by_name(&records, name, mode).ok_or(PlayError::NotSelected)?;
    if mode == Mode::Real {
        if let Some(existing) = participant.assigned_to.clone() {
            // First assignment wins: replay returns the stored value
            // without recomputation and without re-sending mail.
            return Ok(PlayOutcome {
                assigned_to: existing,
                email_sent: false,
            });
        }
    }
    let recipient_email = participant.email.clone();

    let snapshot = RoundSnapshot::from_assignments(
        list_assigned(&records, mode)
            .into_iter()
            .filter_map(|r| r.assigned_to.as_deref().map(|t| (r.name.as_str(), t))),
    );
    let assigned_to = resolve_assignment(&state.roster, name, &snapshot, rng)?;

    set_assignment(&mut records, name, mode, &assigned_to).ok_or(PlayError::NotSelected)?;
    drop(records);
    state.persist().await;

    let email_sent = if mode == Mode::Real {
        send_assignment_mail(state, name, &assigned_to, &recipient_email).await;
        true
    } else {
        false
    };

    Ok(PlayOutcome {
        assigned_to,
        email_sent,
    })
}

async fn send_assignment_mail(state: &AppState, name: &str, assigned_to: &str, to: &str) {
    let body = template::assignment_email(name, assigned_to);
    match state
        .mailer
        .send(to, "🎅 Your Secret Santa Assignment!", &body)
        .await
    {
        Ok(receipt) => {
            tracing::info!(to, message_id = %receipt.message_id, "assignment email sent");
        }
        // Best-effort notification: the persisted assignment stands.
        Err(err) => tracing::error!(to, %err, "assignment email failed"),
    }
}

#[derive(Serialize)]
struct ParticipantDetail {
    name: String,
    character: String,
    assigned_to: Option<String>,
    email: String,
}

#[derive(Serialize)]
struct GameStateResponse {
    selected_characters: Vec<String>,
    assigned_participants: Vec<String>,
    total_participants: usize,
    full_details: Vec<ParticipantDetail>,
}

async fn game_state(State(state): State<AppState>) -> impl IntoResponse {
    let records = state.records.read().await;
    let real = list_all(&records, Mode::Real);

    (
        StatusCode::OK,
        Json(GameStateResponse {
            selected_characters: real.iter().map(|r| r.character.clone()).collect(),
            assigned_participants: real
                .iter()
                .filter_map(|r| r.assigned_to.clone())
                .collect(),
            total_participants: real.len(),
            full_details: real
                .iter()
                .map(|r| ParticipantDetail {
                    name: r.name.clone(),
                    character: r.character.clone(),
                    assigned_to: r.assigned_to.clone(),
                    email: r.email.clone(),
                })
                .collect(),
        }),
    )
        .into_response()
}

#[derive(Serialize)]
struct ResetResponse {
    deleted_count: usize,
}

async fn reset(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let expected = admin_password();
    let provided = headers
        .get("x-admin-password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided != expected {
        return (StatusCode::UNAUTHORIZED, "invalid admin password").into_response();
    }

    let deleted_count = state.clear_all().await;
    tracing::info!(deleted_count, "cleared all participant records");

    (StatusCode::OK, Json(ResetResponse { deleted_count })).into_response()
}
