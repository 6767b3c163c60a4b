//! Content-type registry
//!
//! Fixed table mapping numeric content-type ids to display labels.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

pub const LEARNING_MODULE: u32 = 8;
pub const ASSESSMENT: u32 = 9;
pub const LEARNING_PATH: u32 = 10;
pub const VIDEO: u32 = 11;
pub const DOCUMENT: u32 = 14;
pub const WEBPAGE: u32 = 28;
pub const CLASSROOM_EVENT: u32 = 36;
pub const EVENT: u32 = 70;
pub const VIRTUAL_CLASSROOM: u32 = 688;
pub const ASSIGNMENT: u32 = 689;
pub const QUIZ: u32 = 693;
pub const WEBINAR: u32 = 695;
pub const ROLE_PLAY: u32 = 699;

/// Calendar grouping for a content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarBucket {
    Events,
    Assignments,
    Assessments,
    Other,
}

/// One registry entry
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    pub id: u32,
    pub label: &'static str,
}

impl ContentType {
    pub fn calendar_bucket(&self) -> CalendarBucket {
        calendar_bucket(self.id)
    }
}

const CONTENT_TYPES: [ContentType; 24] = [
    ContentType { id: LEARNING_MODULE, label: "Learning Module" },
    ContentType { id: ASSESSMENT, label: "Assessment" },
    ContentType { id: LEARNING_PATH, label: "Learning Path" },
    ContentType { id: VIDEO, label: "Video and Audio" },
    ContentType { id: DOCUMENT, label: "Document" },
    ContentType { id: 20, label: "Glossary" },
    ContentType { id: 21, label: "HTML Package" },
    ContentType { id: 26, label: "SCORM Package" },
    ContentType { id: 27, label: "AICC Package" },
    ContentType { id: WEBPAGE, label: "Web Page" },
    ContentType { id: CLASSROOM_EVENT, label: "Classroom Event" },
    ContentType { id: 50, label: "Certificate" },
    ContentType { id: 52, label: "Survey" },
    ContentType { id: EVENT, label: "Event" },
    ContentType { id: 102, label: "xAPI Package" },
    ContentType { id: VIRTUAL_CLASSROOM, label: "Virtual Classroom" },
    ContentType { id: ASSIGNMENT, label: "Assignment" },
    ContentType { id: 690, label: "Poll" },
    ContentType { id: 691, label: "Article" },
    ContentType { id: 692, label: "Podcast" },
    ContentType { id: QUIZ, label: "Quiz" },
    ContentType { id: 694, label: "Microlearning" },
    ContentType { id: WEBINAR, label: "Webinar" },
    ContentType { id: ROLE_PLAY, label: "Role Play" },
];

static BY_ID: Lazy<HashMap<u32, ContentType>> =
    Lazy::new(|| CONTENT_TYPES.iter().map(|ct| (ct.id, *ct)).collect());

static BY_LABEL: Lazy<HashMap<String, ContentType>> = Lazy::new(|| {
    CONTENT_TYPES
        .iter()
        .map(|ct| (ct.label.to_lowercase(), *ct))
        .collect()
});

/// All registered content types, in registry order
pub fn all() -> &'static [ContentType] {
    &CONTENT_TYPES
}

/// Look up a content type by id
pub fn get(id: u32) -> Option<ContentType> {
    BY_ID.get(&id).copied()
}

/// Look up a content type by label (case-insensitive)
pub fn find_by_label(label: &str) -> Option<ContentType> {
    BY_LABEL.get(&label.trim().to_lowercase()).copied()
}

/// Display label for an id, "Unknown" when unregistered
pub fn label(id: u32) -> &'static str {
    get(id).map(|ct| ct.label).unwrap_or("Unknown")
}

/// Content types that open directly in a viewer instead of being enrolled or bought
pub fn is_direct_view(id: u32) -> bool {
    matches!(id, WEBPAGE | VIDEO | DOCUMENT)
}

pub fn calendar_bucket(id: u32) -> CalendarBucket {
    match id {
        CLASSROOM_EVENT | EVENT | VIRTUAL_CLASSROOM | WEBINAR => CalendarBucket::Events,
        ASSIGNMENT => CalendarBucket::Assignments,
        ASSESSMENT | QUIZ => CalendarBucket::Assessments,
        _ => CalendarBucket::Other,
    }
}
