//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::session::Action;
use crate::view::SessionView;

/// Messages the client can send over WebSocket: either a control message or
/// a session action (`next`, `jump_to`, `submit_answer`, ...).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ClientWsMessage {
    Control(ControlMessage),
    Action(Action),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    Ping,
    GetView,
    UploadCourse {
        #[serde(rename = "fileName")]
        file_name: String,
        #[serde(rename = "pdfBase64")]
        pdf_base64: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    View {
        view: SessionView,
        #[serde(rename = "scrollToTop")]
        scroll_to_top: bool,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub session: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct SessionOut {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub view: SessionView,
}

#[derive(Serialize)]
pub struct ActionOut {
    pub applied: bool,
    #[serde(rename = "scrollToTop")]
    pub scroll_to_top: bool,
    pub view: SessionView,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<SessionView>,
}
