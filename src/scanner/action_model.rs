use serde::{Deserialize, Serialize};

use crate::browser::page::ElementBounds;

/// Classification of an interactive element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Link,
    Button,
    Input,
    Select,
    Textarea,
    Checkbox,
    Radio,
    Clickable,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Link => "link",
            ActionKind::Button => "button",
            ActionKind::Input => "input",
            ActionKind::Select => "select",
            ActionKind::Textarea => "textarea",
            ActionKind::Checkbox => "checkbox",
            ActionKind::Radio => "radio",
            ActionKind::Clickable => "clickable",
        }
    }
}

/// One discovered interactive element.
///
/// `index` is the number painted on the annotated screenshot and the only
/// handle the model uses to refer back to this element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub index: usize,
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub selector: String,
    pub label: String,
    pub bounds: ElementBounds,
}
