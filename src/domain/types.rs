use serde::Deserialize;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Enter,
    Attach,
}

impl SessionType {
    pub fn toggle(self) -> Self {
        match self {
            Self::Enter => Self::Attach,
            Self::Attach => Self::Enter,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Attach => "attach",
        }
    }
}

/// One row of a session query result. Timestamps stay as raw epoch seconds;
/// `ended_at == 0` means the session is still active.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct SessionRecord {
    pub session_id: i64,
    pub session_type: SessionType,
    pub user: String,
    pub source_ip: String,
    pub app_name: String,
    pub proc_name: String,
    pub instance_no: u32,
    pub node_ip: String,
    pub status: String,
    pub created_at: i64,
    #[serde(default)]
    pub ended_at: i64,
}

/// Filter criteria collected by the query form. `user` and `app_name` are
/// server-side filters; empty means no filter. `session_type` always has a
/// value but is not a wire parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryCriteria {
    pub session_type: SessionType,
    pub user: String,
    pub app_name: String,
    pub since: OffsetDateTime,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortKey {
    SessionId,
    SessionType,
    User,
    SourceIp,
    AppName,
    ProcName,
    InstanceNo,
    NodeIp,
    Status,
    CreatedAt,
    EndedAt,
}

pub const COLUMNS: [SortKey; 11] = [
    SortKey::SessionId,
    SortKey::SessionType,
    SortKey::User,
    SortKey::SourceIp,
    SortKey::AppName,
    SortKey::ProcName,
    SortKey::InstanceNo,
    SortKey::NodeIp,
    SortKey::Status,
    SortKey::CreatedAt,
    SortKey::EndedAt,
];

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            Self::SessionId => "Session ID",
            Self::SessionType => "Type",
            Self::User => "User",
            Self::SourceIp => "Source IP",
            Self::AppName => "App Name",
            Self::ProcName => "Proc Name",
            Self::InstanceNo => "Inst",
            Self::NodeIp => "Node IP",
            Self::Status => "Status",
            Self::CreatedAt => "Created At",
            Self::EndedAt => "Ended At",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            Self::Asc => "▲",
            Self::Desc => "▼",
        }
    }
}

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub fn format_epoch_seconds(epoch: i64) -> String {
    match OffsetDateTime::from_unix_timestamp(epoch) {
        Ok(value) => value
            .format(TIMESTAMP_FORMAT)
            .unwrap_or_else(|_| epoch.to_string()),
        Err(_) => epoch.to_string(),
    }
}

pub fn format_timestamp(value: OffsetDateTime) -> String {
    value
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| value.unix_timestamp().to_string())
}

pub fn parse_timestamp(text: &str) -> Option<OffsetDateTime> {
    PrimitiveDateTime::parse(text.trim(), TIMESTAMP_FORMAT)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}
