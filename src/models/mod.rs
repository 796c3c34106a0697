use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message the provider returns when a template was created.
pub const STORED_MESSAGE: &str = "template has been stored";
/// Message the provider returns when a template was deleted.
pub const DELETED_MESSAGE: &str = "template has been deleted";

/// One entry of a template listing page. Only the name is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateListResponse {
    #[serde(default)]
    pub items: Vec<TemplateSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TemplateVersion {
    #[serde(default)]
    pub tag: String,
    /// Body in the provider's templating syntax.
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDetail {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    /// The active version, the only one requested with `active=yes`.
    pub version: TemplateVersion,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateResponse {
    pub template: TemplateDetail,
}

/// Template to be stored on the destination domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTemplate {
    pub name: String,
    pub description: String,
    pub template: String,
    pub headers: HashMap<String, String>,
}

impl NewTemplate {
    pub fn from_detail(name: &str, detail: TemplateDetail) -> Self {
        Self {
            name: name.to_string(),
            description: detail.description,
            template: detail.version.template,
            headers: detail.version.headers,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplateResponse {
    #[serde(default)]
    pub message: String,
}

impl CreateTemplateResponse {
    pub fn is_stored(&self) -> bool {
        self.message == STORED_MESSAGE
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

// ============ Output ============

#[derive(Debug, Serialize)]
pub struct Output {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Output {
    pub fn error(err: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(err.into()),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| {
            format!(r#"{{"success": {}, "error": "unserializable output"}}"#, self.success)
        })
    }

    pub fn print(&self) {
        println!("{}", self.to_json());
    }
}
