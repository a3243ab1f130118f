use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body encoding of a freshly created note: an empty document tree with a
/// single empty paragraph. The body is opaque to this crate; it is stored and
/// moved around as a blob.
pub const EMPTY_DOC: &str = r#"{"type":"doc","content":[{"type":"paragraph","content":[]}]}"#;

/// Current wall-clock time in milliseconds since the epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// The persisted note record.
///
/// `updated_at` doubles as the optimistic-concurrency version token: a write
/// is rejected when the stored value has advanced past the writer's baseline.
/// It never decreases for a given `id`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<i64>,
}

impl Note {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = now_millis();
        Note {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            created_at: now,
            updated_at: now,
            pinned: None,
        }
    }
}

/// A partial update to a note. `None` fields are left untouched.
///
/// `pinned` uses a second `Option` layer so a patch can distinguish
/// "leave pin state alone" (`None`) from "unpin" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub pinned: Option<Option<i64>>,
}

impl NotePatch {
    pub fn title(title: impl Into<String>) -> Self {
        NotePatch {
            title: Some(title.into()),
            ..NotePatch::default()
        }
    }

    pub fn body(body: impl Into<String>) -> Self {
        NotePatch {
            body: Some(body.into()),
            ..NotePatch::default()
        }
    }

    pub fn pin(pinned: Option<i64>) -> Self {
        NotePatch {
            pinned: Some(pinned),
            ..NotePatch::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.pinned.is_none()
    }

    /// Applies the present fields onto `note`. Timestamps are the caller's
    /// responsibility.
    pub fn apply(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(body) = &self.body {
            note.body = body.clone();
        }
        if let Some(pinned) = self.pinned {
            note.pinned = pinned;
        }
    }

    /// Folds a later patch over this one, field by field. Used by the edit
    /// debouncer so a burst of edits collapses into one patch carrying the
    /// final value of every touched field.
    pub fn fold(&mut self, later: NotePatch) {
        if later.title.is_some() {
            self.title = later.title;
        }
        if later.body.is_some() {
            self.body = later.body;
        }
        if later.pinned.is_some() {
            self.pinned = later.pinned;
        }
    }
}
