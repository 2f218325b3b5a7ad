use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Collection, Family};

/// Messages pushed to viewers as `{ "event": <name>, "data": <payload> }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full sorted timeline snapshot.
    TimelineUpdate(Vec<Collection>),
    /// Full sorted program snapshot.
    ProgramUpdate(Vec<Collection>),
    /// Highlight a timeline year; `null` clears the highlight.
    AnimateYear(Option<Collection>),
    /// Highlight a program; `null` clears the highlight.
    AnimateProgram(Option<Collection>),
}

impl ServerEvent {
    pub fn snapshot(family: Family, items: Vec<Collection>) -> Self {
        match family {
            Family::Timeline => ServerEvent::TimelineUpdate(items),
            Family::Program => ServerEvent::ProgramUpdate(items),
        }
    }

    pub fn selection(family: Family, item: Option<Collection>) -> Self {
        match family {
            Family::Timeline => ServerEvent::AnimateYear(item),
            Family::Program => ServerEvent::AnimateProgram(item),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::TimelineUpdate(_) => "timelineUpdate",
            ServerEvent::ProgramUpdate(_) => "programUpdate",
            ServerEvent::AnimateYear(_) => "animateYear",
            ServerEvent::AnimateProgram(_) => "animateProgram",
        }
    }
}

/// Messages accepted from viewers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Tag this session with a display role.
    Register(String),
    /// Year to highlight, or `null`.
    SelectYear(Value),
    /// Title to highlight, or `null`.
    SelectProgram(Value),
}
