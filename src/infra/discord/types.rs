//! Serde models for the interaction webhook payloads and responses.
//!
//! Only the fields this bot reads are modeled; unknown fields are ignored
//! by serde's default behaviour.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const INTERACTION_PING: u8 = 1;
pub const INTERACTION_APPLICATION_COMMAND: u8 = 2;
pub const INTERACTION_MODAL_SUBMIT: u8 = 5;

pub const COMMAND_CHAT_INPUT: u8 = 1;
pub const COMMAND_USER: u8 = 2;
pub const COMMAND_MESSAGE: u8 = 3;

const OPTION_USER: u8 = 6;

const RESPONSE_PONG: u8 = 1;
const RESPONSE_CHANNEL_MESSAGE: u8 = 4;
const RESPONSE_DEFERRED_CHANNEL_MESSAGE: u8 = 5;
const RESPONSE_MODAL: u8 = 9;

const COMPONENT_ACTION_ROW: u8 = 1;
const COMPONENT_TEXT_INPUT: u8 = 4;
const TEXT_INPUT_PARAGRAPH: u8 = 2;

const FLAG_EPHEMERAL: u64 = 1 << 6;

#[derive(Debug, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    pub application_id: String,
    pub token: String,
    #[serde(default)]
    pub data: Option<InteractionData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InteractionData {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<u8>,
    pub custom_id: Option<String>,
    pub target_id: Option<String>,
    pub options: Vec<CommandOption>,
    pub resolved: Option<ResolvedData>,
    pub components: Vec<ModalComponent>,
}

impl InteractionData {
    /// The snowflake value of a user-typed option, if present.
    pub fn user_option(&self, name: &str) -> Option<String> {
        self.options
            .iter()
            .find(|option| option.kind == OPTION_USER && option.name == name)
            .and_then(|option| option.value.as_ref())
            .and_then(|value| value.as_str().map(str::to_owned))
    }

    /// The message a context-menu command targets.
    pub fn target_message(&self) -> Option<&Message> {
        let target_id = self.target_id.as_deref()?;
        self.resolved.as_ref()?.messages.get(target_id)
    }

    /// The submitted value of the text input with the given custom id,
    /// wherever it sits in the modal's component tree.
    pub fn text_input_value(&self, custom_id: &str) -> Option<&str> {
        self.components
            .iter()
            .find_map(|component| component.find_value(custom_id))
    }
}

#[derive(Debug, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResolvedData {
    pub messages: HashMap<String, Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub content: String,
    pub author: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    pub user: User,
}

impl GuildMember {
    /// Preferred display name: nickname, then global name, then username.
    pub fn display_name(&self) -> &str {
        self.nick
            .as_deref()
            .or(self.user.global_name.as_deref())
            .unwrap_or(&self.user.username)
    }
}

/// Modal rows arrive as a small tree; the text input may sit directly in a
/// row or nested inside a label wrapper.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModalComponent {
    #[serde(rename = "type")]
    pub kind: Option<u8>,
    pub custom_id: Option<String>,
    pub value: Option<String>,
    pub component: Option<Box<ModalComponent>>,
    pub components: Vec<ModalComponent>,
}

impl ModalComponent {
    fn find_value(&self, custom_id: &str) -> Option<&str> {
        if self.custom_id.as_deref() == Some(custom_id) {
            if let Some(value) = self.value.as_deref() {
                return Some(value);
            }
        }
        if let Some(found) = self
            .component
            .as_ref()
            .and_then(|inner| inner.find_value(custom_id))
        {
            return Some(found);
        }
        self.components
            .iter()
            .find_map(|inner| inner.find_value(custom_id))
    }
}

#[derive(Debug, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: RESPONSE_PONG,
            data: None,
        }
    }

    pub fn deferred() -> Self {
        Self {
            kind: RESPONSE_DEFERRED_CHANNEL_MESSAGE,
            data: None,
        }
    }

    pub fn ephemeral_message(content: &str) -> Self {
        Self {
            kind: RESPONSE_CHANNEL_MESSAGE,
            data: Some(serde_json::json!({
                "content": content,
                "flags": FLAG_EPHEMERAL,
            })),
        }
    }

    pub fn error_message(content: &str) -> Self {
        Self {
            kind: RESPONSE_CHANNEL_MESSAGE,
            data: Some(serde_json::json!({ "content": content })),
        }
    }

    /// The text-entry modal shown before generating a quote for `user_id`.
    pub fn quote_modal(user_id: &str) -> Self {
        Self {
            kind: RESPONSE_MODAL,
            data: Some(serde_json::json!({
                "custom_id": format!("quote:{user_id}"),
                "title": "名言画像を生成",
                "components": [{
                    "type": COMPONENT_ACTION_ROW,
                    "components": [{
                        "type": COMPONENT_TEXT_INPUT,
                        "custom_id": "text",
                        "label": "内容",
                        "style": TEXT_INPUT_PARAGRAPH,
                    }],
                }],
            })),
        }
    }
}
