//! Registry metadata types.

use serde::{Deserialize, Serialize};

use crate::curriculum::Program;
use crate::types::ProgramId;

/// What the catalog shows about a program without loading its curriculum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramMetadata {
    /// Program identifier. Must match the id of the loaded curriculum.
    pub id: ProgramId,

    /// Display title.
    pub title: String,

    /// Summary.
    #[serde(default)]
    pub description: String,

    /// Expected effort per loop, in hours.
    #[serde(default)]
    pub estimated_hours_per_loop: f32,

    /// Accent color, e.g. `"#667eea"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Icon name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl ProgramMetadata {
    /// Creates metadata with an id and a title; everything else empty.
    pub fn new(id: impl Into<ProgramId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            estimated_hours_per_loop: 0.0,
            color: None,
            icon: None,
        }
    }

    /// Derives metadata from a curriculum's own header fields.
    pub fn from_program(program: &Program) -> Self {
        Self {
            id: program.id.clone(),
            title: program.title.clone(),
            description: program.description.clone(),
            estimated_hours_per_loop: program.estimated_hours_per_loop,
            color: None,
            icon: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the expected hours per loop.
    pub fn with_hours_per_loop(mut self, hours: f32) -> Self {
        self.estimated_hours_per_loop = hours;
        self
    }

    /// Sets the accent color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the icon.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}
