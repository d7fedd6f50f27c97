//! Static schema of every synchronized resource type.
//!
//! Each [`ResourceType`] maps to one [`ResourceDescriptor`] holding the
//! natural key field, the ordered field list, the foreign-key dependency
//! declarations and whether instances can be observed in flight. Engine,
//! store and fetcher all dispatch on this table instead of branching on
//! type names.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enumerated tag of a remote resource type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Account (or subaccount).
    Account,
    /// Voice call.
    Call,
    /// SMS message.
    SmsMessage,
    /// Call recording.
    Recording,
    /// Transcription of a recording.
    Transcription,
    /// Notification (debugger log entry).
    Notification,
    /// Conference room.
    Conference,
    /// Conference participant.
    Participant,
    /// Verified outgoing caller id.
    OutgoingCallerId,
    /// Purchased phone number.
    IncomingPhoneNumber,
}

impl ResourceType {
    /// Every resource type, in declaration order.
    pub const ALL: [ResourceType; 10] = [
        ResourceType::Account,
        ResourceType::Call,
        ResourceType::SmsMessage,
        ResourceType::Recording,
        ResourceType::Transcription,
        ResourceType::Notification,
        ResourceType::Conference,
        ResourceType::Participant,
        ResourceType::OutgoingCallerId,
        ResourceType::IncomingPhoneNumber,
    ];

    /// Snake-case tag used in configuration and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Account => "account",
            ResourceType::Call => "call",
            ResourceType::SmsMessage => "sms_message",
            ResourceType::Recording => "recording",
            ResourceType::Transcription => "transcription",
            ResourceType::Notification => "notification",
            ResourceType::Conference => "conference",
            ResourceType::Participant => "participant",
            ResourceType::OutgoingCallerId => "outgoing_caller_id",
            ResourceType::IncomingPhoneNumber => "incoming_phone_number",
        }
    }

    /// Static descriptor of this type.
    pub fn descriptor(&self) -> &'static ResourceDescriptor {
        match self {
            ResourceType::Account => &ACCOUNT,
            ResourceType::Call => &CALL,
            ResourceType::SmsMessage => &SMS_MESSAGE,
            ResourceType::Recording => &RECORDING,
            ResourceType::Transcription => &TRANSCRIPTION,
            ResourceType::Notification => &NOTIFICATION,
            ResourceType::Conference => &CONFERENCE,
            ResourceType::Participant => &PARTICIPANT,
            ResourceType::OutgoingCallerId => &OUTGOING_CALLER_ID,
            ResourceType::IncomingPhoneNumber => &INCOMING_PHONE_NUMBER,
        }
    }

    /// Types this one declares a foreign key to.
    pub fn parents(&self) -> impl Iterator<Item = ResourceType> {
        self.descriptor().dependencies.iter().map(|d| d.parent)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownResourceType(s.to_string()))
    }
}

/// Storage kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free-form text.
    Text,
    /// Integer; the vendor often delivers these as decimal strings.
    Integer,
    /// Boolean; delivered as `true`/`false` or `"0"`/`"1"`.
    Boolean,
    /// RFC 2822 timestamp.
    DateTime,
}

/// One field of a resource, as delivered in the raw record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Field name in the raw record.
    pub name: &'static str,
    /// Storage kind.
    pub kind: FieldKind,
}

impl Field {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
        }
    }

    const fn boolean(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Boolean,
        }
    }

    const fn datetime(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::DateTime,
        }
    }
}

/// Foreign-key declaration from a child resource to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    /// Raw field holding the parent's natural key (e.g. `call_sid`).
    pub foreign_field: &'static str,
    /// Parent resource type.
    pub parent: ResourceType,
    /// Local column receiving the parent's local id (e.g. `call_id`).
    pub local_key: &'static str,
}

/// Static description of one resource type.
#[derive(Debug)]
pub struct ResourceDescriptor {
    /// The described type.
    pub resource_type: ResourceType,
    /// Local table name.
    pub table: &'static str,
    /// Raw field holding the natural key.
    pub natural_key: &'static str,
    /// Ordered list of persisted raw fields.
    pub fields: &'static [Field],
    /// Foreign-key prerequisites.
    pub dependencies: &'static [Dependency],
    /// Whether instances can be observed while still in flight remotely.
    pub can_be_active: bool,
}

impl ResourceDescriptor {
    /// Look up a field declaration by name.
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

const ACCOUNT_DEP: Dependency = Dependency {
    foreign_field: "account_sid",
    parent: ResourceType::Account,
    local_key: "account_id",
};

const CALL_DEP: Dependency = Dependency {
    foreign_field: "call_sid",
    parent: ResourceType::Call,
    local_key: "call_id",
};

static ACCOUNT: ResourceDescriptor = ResourceDescriptor {
    resource_type: ResourceType::Account,
    table: "accounts",
    natural_key: "sid",
    fields: &[
        Field::text("sid"),
        Field::datetime("date_created"),
        Field::datetime("date_updated"),
        Field::text("friendly_name"),
        Field::text("type"),
        Field::text("status"),
        Field::text("owner_account_sid"),
        Field::text("uri"),
    ],
    dependencies: &[],
    can_be_active: false,
};

static CALL: ResourceDescriptor = ResourceDescriptor {
    resource_type: ResourceType::Call,
    table: "calls",
    natural_key: "sid",
    fields: &[
        Field::text("sid"),
        Field::text("parent_call_sid"),
        Field::datetime("date_created"),
        Field::datetime("date_updated"),
        Field::text("account_sid"),
        Field::text("to"),
        Field::text("from"),
        Field::text("phone_number_sid"),
        Field::text("status"),
        Field::datetime("start_time"),
        Field::datetime("end_time"),
        Field::integer("duration"),
        Field::text("price"),
        Field::text("price_unit"),
        Field::text("direction"),
        Field::text("answered_by"),
        Field::text("forwarded_from"),
        Field::text("caller_name"),
        Field::text("uri"),
    ],
    dependencies: &[ACCOUNT_DEP],
    can_be_active: true,
};

static SMS_MESSAGE: ResourceDescriptor = ResourceDescriptor {
    resource_type: ResourceType::SmsMessage,
    table: "sms_messages",
    natural_key: "sid",
    fields: &[
        Field::text("sid"),
        Field::datetime("date_created"),
        Field::datetime("date_updated"),
        Field::datetime("date_sent"),
        Field::text("account_sid"),
        Field::text("from"),
        Field::text("to"),
        Field::text("body"),
        Field::text("status"),
        Field::text("direction"),
        Field::text("price"),
        Field::text("api_version"),
        Field::text("uri"),
    ],
    dependencies: &[ACCOUNT_DEP],
    can_be_active: true,
};

static RECORDING: ResourceDescriptor = ResourceDescriptor {
    resource_type: ResourceType::Recording,
    table: "recordings",
    natural_key: "sid",
    fields: &[
        Field::text("sid"),
        Field::datetime("date_created"),
        Field::datetime("date_updated"),
        Field::text("account_sid"),
        Field::text("call_sid"),
        Field::integer("duration"),
        Field::text("api_version"),
        Field::text("uri"),
    ],
    dependencies: &[CALL_DEP],
    can_be_active: false,
};

static TRANSCRIPTION: ResourceDescriptor = ResourceDescriptor {
    resource_type: ResourceType::Transcription,
    table: "transcriptions",
    natural_key: "sid",
    fields: &[
        Field::text("sid"),
        Field::datetime("date_created"),
        Field::datetime("date_updated"),
        Field::text("account_sid"),
        Field::text("status"),
        Field::text("recording_sid"),
        Field::integer("duration"),
        Field::text("transcription_text"),
        Field::text("price"),
        Field::text("uri"),
    ],
    dependencies: &[Dependency {
        foreign_field: "recording_sid",
        parent: ResourceType::Recording,
        local_key: "recording_id",
    }],
    can_be_active: true,
};

static NOTIFICATION: ResourceDescriptor = ResourceDescriptor {
    resource_type: ResourceType::Notification,
    table: "notifications",
    natural_key: "sid",
    fields: &[
        Field::text("sid"),
        Field::datetime("date_created"),
        Field::datetime("date_updated"),
        Field::text("account_sid"),
        Field::text("call_sid"),
        Field::text("api_version"),
        Field::integer("log"),
        Field::integer("error_code"),
        Field::text("more_info"),
        Field::text("message_text"),
        Field::datetime("message_date"),
        Field::text("request_url"),
        Field::text("request_method"),
        Field::text("request_variables"),
        Field::text("response_headers"),
        Field::text("response_body"),
        Field::text("uri"),
    ],
    dependencies: &[CALL_DEP],
    can_be_active: false,
};

static CONFERENCE: ResourceDescriptor = ResourceDescriptor {
    resource_type: ResourceType::Conference,
    table: "conferences",
    natural_key: "sid",
    fields: &[
        Field::text("sid"),
        Field::text("friendly_name"),
        Field::text("status"),
        Field::datetime("date_created"),
        Field::datetime("date_updated"),
        Field::text("account_sid"),
        Field::text("uri"),
    ],
    dependencies: &[ACCOUNT_DEP],
    can_be_active: true,
};

// Participants have no sid of their own; a call joins a conference once.
static PARTICIPANT: ResourceDescriptor = ResourceDescriptor {
    resource_type: ResourceType::Participant,
    table: "participants",
    natural_key: "call_sid",
    fields: &[
        Field::text("call_sid"),
        Field::text("conference_sid"),
        Field::datetime("date_created"),
        Field::datetime("date_updated"),
        Field::text("account_sid"),
        Field::boolean("muted"),
        Field::boolean("start_conference_on_enter"),
        Field::boolean("end_conference_on_exit"),
        Field::text("uri"),
    ],
    dependencies: &[
        CALL_DEP,
        Dependency {
            foreign_field: "conference_sid",
            parent: ResourceType::Conference,
            local_key: "conference_id",
        },
    ],
    can_be_active: false,
};

static OUTGOING_CALLER_ID: ResourceDescriptor = ResourceDescriptor {
    resource_type: ResourceType::OutgoingCallerId,
    table: "outgoing_caller_ids",
    natural_key: "sid",
    fields: &[
        Field::text("sid"),
        Field::datetime("date_created"),
        Field::datetime("date_updated"),
        Field::text("friendly_name"),
        Field::text("account_sid"),
        Field::text("phone_number"),
        Field::text("uri"),
    ],
    dependencies: &[ACCOUNT_DEP],
    can_be_active: false,
};

static INCOMING_PHONE_NUMBER: ResourceDescriptor = ResourceDescriptor {
    resource_type: ResourceType::IncomingPhoneNumber,
    table: "incoming_phone_numbers",
    natural_key: "sid",
    fields: &[
        Field::text("sid"),
        Field::datetime("date_created"),
        Field::datetime("date_updated"),
        Field::text("friendly_name"),
        Field::text("account_sid"),
        Field::text("phone_number"),
        Field::text("api_version"),
        Field::text("voice_url"),
        Field::text("voice_method"),
        Field::text("sms_url"),
        Field::text("sms_method"),
        Field::text("status_callback"),
        Field::text("uri"),
    ],
    dependencies: &[ACCOUNT_DEP],
    can_be_active: false,
};
