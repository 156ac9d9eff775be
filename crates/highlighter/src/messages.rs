//! Inbound control messages from the UI surface
//!
//! ```json
//! {"action": "getPatternCount"}
//! {"action": "redoPatternHighlighting"}
//! {"action": "showElement", "phid": 12}
//! ```

use std::sync::Arc;

use dom::Phid;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::results::ScanResult;
use crate::scheduler::Engine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlMessage {
    GetPatternCount,
    RedoPatternHighlighting,
    ShowElement { phid: Phid },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlResponse {
    Results(ScanResult),
    Started { started: bool },
    Shown { success: bool },
}

impl Engine {
    pub async fn handle(self: &Arc<Self>, message: ControlMessage) -> ControlResponse {
        tracing::debug!("[Engine] control message: {:?}", message);

        match message {
            ControlMessage::GetPatternCount => ControlResponse::Results(self.query_results().await),
            ControlMessage::RedoPatternHighlighting => {
                let Some(permit) = self.try_begin() else {
                    return ControlResponse::Started { started: false };
                };
                let engine = Arc::clone(self);
                tokio::spawn(async move {
                    engine.run_permitted(permit, true).await;
                });
                ControlResponse::Started { started: true }
            }
            ControlMessage::ShowElement { phid } => ControlResponse::Shown {
                success: self.highlight(phid).await,
            },
        }
    }

    /// Decode a JSON message, handle it, encode the reply
    pub async fn handle_json(self: &Arc<Self>, raw: &str) -> Result<String> {
        let message: ControlMessage = serde_json::from_str(raw)?;
        let response = self.handle(message).await;
        Ok(serde_json::to_string(&response)?)
    }
}
