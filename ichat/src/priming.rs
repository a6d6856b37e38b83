//! Versioned priming scripts prepended to every assistant conversation.

use std::path::Path;

use iprovider::{Message, Role};
use serde::{Deserialize, Serialize};

use crate::ChatError;

const IMAGINIFY_V1: &str = include_str!("../priming/imaginify.v1.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScriptRole {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScriptTurn {
    role: ScriptRole,
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScriptDocument {
    version: u32,
    #[serde(default)]
    name: Option<String>,
    turns: Vec<ScriptTurn>,
}

/// Ordered, validated user/assistant exchanges.
///
/// A valid script is non-empty, opens with a user turn, alternates roles,
/// closes with an assistant turn, and carries no blank text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimingScript {
    version: u32,
    name: Option<String>,
    turns: Vec<Message>,
}

impl PrimingScript {
    pub fn new(version: u32, turns: Vec<Message>) -> Result<Self, ChatError> {
        validate_turns(&turns)?;
        Ok(Self {
            version,
            name: None,
            turns,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The script shipped with the application.
    pub fn imaginify_default() -> Result<Self, ChatError> {
        Self::from_json_str(IMAGINIFY_V1)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ChatError> {
        let document: ScriptDocument = serde_json::from_str(json).map_err(|error| {
            ChatError::configuration(format!("priming script is not valid JSON: {error}"))
        })?;

        let turns = document
            .turns
            .into_iter()
            .map(|turn| {
                let role = match turn.role {
                    ScriptRole::User => Role::User,
                    ScriptRole::Assistant => Role::Assistant,
                };
                Message::new(role, turn.text)
            })
            .collect();

        let mut script = Self::new(document.version, turns)?;
        script.name = document.name;
        Ok(script)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|error| {
            ChatError::configuration(format!(
                "failed to read priming script '{}': {error}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, ChatError> {
        let document = ScriptDocument {
            version: self.version,
            name: self.name.clone(),
            turns: self
                .turns
                .iter()
                .map(|message| ScriptTurn {
                    role: match message.role {
                        Role::User => ScriptRole::User,
                        Role::Assistant => ScriptRole::Assistant,
                    },
                    text: message.content.clone(),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&document).map_err(|error| {
            ChatError::configuration(format!("failed to serialize priming script: {error}"))
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

fn validate_turns(turns: &[Message]) -> Result<(), ChatError> {
    let (Some(first), Some(last)) = (turns.first(), turns.last()) else {
        return Err(ChatError::configuration("priming script has no turns"));
    };
    if first.role != Role::User {
        return Err(ChatError::configuration(
            "priming script must open with a user turn",
        ));
    }
    if last.role != Role::Assistant {
        return Err(ChatError::configuration(
            "priming script must close with an assistant turn",
        ));
    }

    for (index, pair) in turns.windows(2).enumerate() {
        if pair[0].role == pair[1].role {
            return Err(ChatError::configuration(format!(
                "priming turns {index} and {} share the role '{}'",
                index + 1,
                pair[1].role
            )));
        }
    }

    if let Some(index) = turns
        .iter()
        .position(|turn| turn.content.trim().is_empty())
    {
        return Err(ChatError::configuration(format!(
            "priming turn {index} is blank"
        )));
    }

    Ok(())
}
