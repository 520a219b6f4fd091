//! Lifecycle variants for forum entities.
//!
//! Each variant that results from a transition carries the id of the event
//! that caused it. A transition replaces the previous variant wholesale; the
//! history of an entity lives only in the event log.
//!
//! The store keeps a variant as two columns, a tag and an optional event id.
//! [`Variant`] converts between the two forms and refuses rows whose tag
//! requires a back-reference that is missing.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::EventId;

/// A tagged variant persisted as `(kind, event_id)`.
pub trait Variant: Sized {
    /// Field name used in error messages.
    const FIELD: &'static str;

    /// Variant tag.
    fn kind(&self) -> &'static str;

    /// Causing event, when the variant carries one.
    fn event_id(&self) -> Option<&EventId>;

    /// Rebuild the variant from its stored columns.
    fn from_parts(kind: &str, event_id: Option<EventId>) -> Result<Self, CoreError>;
}

fn required<V: Variant>(kind: &'static str, event_id: Option<EventId>) -> Result<EventId, CoreError> {
    event_id.ok_or(CoreError::MissingBackReference {
        field: V::FIELD,
        kind,
    })
}

fn unknown<V: Variant>(kind: &str) -> CoreError {
    CoreError::UnknownVariant {
        field: V::FIELD,
        value: kind.to_string(),
    }
}

/// Forum category status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CategoryStatus {
    /// Open for new threads.
    Active,
    /// Archived by a privileged actor.
    Archived {
        /// `CategoryUpdated` event that archived the category.
        category_updated_event: EventId,
    },
    /// Deleted on chain.
    Removed {
        /// `CategoryDeleted` event.
        category_deleted_event: EventId,
    },
}

impl CategoryStatus {
    /// Apply an archival status update (Active ↔ Archived).
    ///
    /// Fails for removed categories: the runtime no longer knows them.
    pub fn with_archival(&self, archived: bool, event: EventId) -> Result<Self, CoreError> {
        let next = if archived {
            CategoryStatus::Archived {
                category_updated_event: event,
            }
        } else {
            CategoryStatus::Active
        };

        match self {
            CategoryStatus::Removed { .. } => Err(CoreError::IllegalTransition {
                field: Self::FIELD,
                from: self.kind(),
                to: next.kind(),
            }),
            _ => Ok(next),
        }
    }

    /// Any status may become Removed.
    pub fn removed(event: EventId) -> Self {
        CategoryStatus::Removed {
            category_deleted_event: event,
        }
    }
}

impl Variant for CategoryStatus {
    const FIELD: &'static str = "category status";

    fn kind(&self) -> &'static str {
        match self {
            CategoryStatus::Active => "Active",
            CategoryStatus::Archived { .. } => "Archived",
            CategoryStatus::Removed { .. } => "Removed",
        }
    }

    fn event_id(&self) -> Option<&EventId> {
        match self {
            CategoryStatus::Active => None,
            CategoryStatus::Archived {
                category_updated_event,
            } => Some(category_updated_event),
            CategoryStatus::Removed {
                category_deleted_event,
            } => Some(category_deleted_event),
        }
    }

    fn from_parts(kind: &str, event_id: Option<EventId>) -> Result<Self, CoreError> {
        match kind {
            "Active" => Ok(CategoryStatus::Active),
            "Archived" => Ok(CategoryStatus::Archived {
                category_updated_event: required::<Self>("Archived", event_id)?,
            }),
            "Removed" => Ok(CategoryStatus::Removed {
                category_deleted_event: required::<Self>("Removed", event_id)?,
            }),
            other => Err(unknown::<Self>(other)),
        }
    }
}

/// Forum thread status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ThreadStatus {
    /// Visible and open.
    Active,
    /// Deleted by its author without hiding.
    Locked {
        /// `ThreadDeleted` event.
        thread_deleted_event: EventId,
    },
    /// Moderated by a privileged actor.
    Moderated {
        /// `ThreadModerated` event.
        thread_moderated_event: EventId,
    },
    /// Deleted by its author and hidden.
    Removed {
        /// `ThreadDeleted` event.
        thread_deleted_event: EventId,
    },
}

impl ThreadStatus {
    /// Active → Moderated.
    pub fn moderated(&self, event: EventId) -> Result<Self, CoreError> {
        self.from_active(ThreadStatus::Moderated {
            thread_moderated_event: event,
        })
    }

    /// Active → Removed when `hide`, Active → Locked otherwise.
    pub fn deleted(&self, hide: bool, event: EventId) -> Result<Self, CoreError> {
        let next = if hide {
            ThreadStatus::Removed {
                thread_deleted_event: event,
            }
        } else {
            ThreadStatus::Locked {
                thread_deleted_event: event,
            }
        };
        self.from_active(next)
    }

    fn from_active(&self, next: ThreadStatus) -> Result<Self, CoreError> {
        match self {
            ThreadStatus::Active => Ok(next),
            _ => Err(CoreError::IllegalTransition {
                field: Self::FIELD,
                from: self.kind(),
                to: next.kind(),
            }),
        }
    }
}

impl Variant for ThreadStatus {
    const FIELD: &'static str = "thread status";

    fn kind(&self) -> &'static str {
        match self {
            ThreadStatus::Active => "Active",
            ThreadStatus::Locked { .. } => "Locked",
            ThreadStatus::Moderated { .. } => "Moderated",
            ThreadStatus::Removed { .. } => "Removed",
        }
    }

    fn event_id(&self) -> Option<&EventId> {
        match self {
            ThreadStatus::Active => None,
            ThreadStatus::Locked {
                thread_deleted_event,
            }
            | ThreadStatus::Removed {
                thread_deleted_event,
            } => Some(thread_deleted_event),
            ThreadStatus::Moderated {
                thread_moderated_event,
            } => Some(thread_moderated_event),
        }
    }

    fn from_parts(kind: &str, event_id: Option<EventId>) -> Result<Self, CoreError> {
        match kind {
            "Active" => Ok(ThreadStatus::Active),
            "Locked" => Ok(ThreadStatus::Locked {
                thread_deleted_event: required::<Self>("Locked", event_id)?,
            }),
            "Moderated" => Ok(ThreadStatus::Moderated {
                thread_moderated_event: required::<Self>("Moderated", event_id)?,
            }),
            "Removed" => Ok(ThreadStatus::Removed {
                thread_deleted_event: required::<Self>("Removed", event_id)?,
            }),
            other => Err(unknown::<Self>(other)),
        }
    }
}

/// Forum post status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PostStatus {
    /// Editable.
    Active,
    /// Not editable. Posts created non-editable start here without a
    /// back-reference; posts deleted without hiding carry the deletion event.
    Locked {
        /// `PostDeleted` event, when the lock came from a deletion.
        post_deleted_event: Option<EventId>,
    },
    /// Moderated by a privileged actor.
    Moderated {
        /// `PostModerated` event.
        post_moderated_event: EventId,
    },
    /// Deleted and hidden.
    Removed {
        /// `PostDeleted` event.
        post_deleted_event: EventId,
    },
}

impl PostStatus {
    /// Initial status of a new post, keyed by the event's `editable` flag.
    pub fn initial(editable: bool) -> Self {
        if editable {
            PostStatus::Active
        } else {
            PostStatus::Locked {
                post_deleted_event: None,
            }
        }
    }

    /// Any status may become Moderated.
    pub fn moderated(event: EventId) -> Self {
        PostStatus::Moderated {
            post_moderated_event: event,
        }
    }

    /// Active/Locked → Removed when `hide`, → Locked otherwise.
    pub fn deleted(&self, hide: bool, event: EventId) -> Result<Self, CoreError> {
        let next = if hide {
            PostStatus::Removed {
                post_deleted_event: event,
            }
        } else {
            PostStatus::Locked {
                post_deleted_event: Some(event),
            }
        };

        match self {
            PostStatus::Active | PostStatus::Locked { .. } => Ok(next),
            _ => Err(CoreError::IllegalTransition {
                field: Self::FIELD,
                from: self.kind(),
                to: next.kind(),
            }),
        }
    }
}

impl Variant for PostStatus {
    const FIELD: &'static str = "post status";

    fn kind(&self) -> &'static str {
        match self {
            PostStatus::Active => "Active",
            PostStatus::Locked { .. } => "Locked",
            PostStatus::Moderated { .. } => "Moderated",
            PostStatus::Removed { .. } => "Removed",
        }
    }

    fn event_id(&self) -> Option<&EventId> {
        match self {
            PostStatus::Active => None,
            PostStatus::Locked { post_deleted_event } => post_deleted_event.as_ref(),
            PostStatus::Moderated {
                post_moderated_event,
            } => Some(post_moderated_event),
            PostStatus::Removed { post_deleted_event } => Some(post_deleted_event),
        }
    }

    fn from_parts(kind: &str, event_id: Option<EventId>) -> Result<Self, CoreError> {
        match kind {
            "Active" => Ok(PostStatus::Active),
            "Locked" => Ok(PostStatus::Locked {
                post_deleted_event: event_id,
            }),
            "Moderated" => Ok(PostStatus::Moderated {
                post_moderated_event: required::<Self>("Moderated", event_id)?,
            }),
            "Removed" => Ok(PostStatus::Removed {
                post_deleted_event: required::<Self>("Removed", event_id)?,
            }),
            other => Err(unknown::<Self>(other)),
        }
    }
}

/// How a post came to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PostOrigin {
    /// First post of a thread.
    ThreadInitial {
        /// `ThreadCreated` event.
        thread_created_event: EventId,
    },
    /// Reply added to an existing thread.
    ThreadReply {
        /// `PostAdded` event.
        post_added_event: EventId,
    },
}

impl Variant for PostOrigin {
    const FIELD: &'static str = "post origin";

    fn kind(&self) -> &'static str {
        match self {
            PostOrigin::ThreadInitial { .. } => "ThreadInitial",
            PostOrigin::ThreadReply { .. } => "ThreadReply",
        }
    }

    fn event_id(&self) -> Option<&EventId> {
        match self {
            PostOrigin::ThreadInitial {
                thread_created_event,
            } => Some(thread_created_event),
            PostOrigin::ThreadReply { post_added_event } => Some(post_added_event),
        }
    }

    fn from_parts(kind: &str, event_id: Option<EventId>) -> Result<Self, CoreError> {
        match kind {
            "ThreadInitial" => Ok(PostOrigin::ThreadInitial {
                thread_created_event: required::<Self>("ThreadInitial", event_id)?,
            }),
            "ThreadReply" => Ok(PostOrigin::ThreadReply {
                post_added_event: required::<Self>("ThreadReply", event_id)?,
            }),
            other => Err(unknown::<Self>(other)),
        }
    }
}
