use bitflags::bitflags;

use crate::uuid::Uuid;

/// ANCS service UUID.
pub const SVC_ANCS: Uuid = Uuid::from_u128(0x7905F431_B5CE_4E99_A40F_4B1E122D00D0);
/// Notification Source characteristic UUID (notify only).
pub const CHR_NOTIFICATION_SOURCE: Uuid = Uuid::from_u128(0x9FBF120D_6301_42D9_8C58_25E699A21DBD);
/// Control Point characteristic UUID (write only).
pub const CHR_CONTROL_POINT: Uuid = Uuid::from_u128(0x69D1D8F3_45E1_49A8_9821_9BBDFDAAD9D9);
/// Data Source characteristic UUID (notify only).
pub const CHR_DATA_SOURCE: Uuid = Uuid::from_u128(0x22EAC6E9_24D6_4BB5_BE44_B36ACE7C7BFB);

/// Default ceiling on a single attribute value's declared length. A Data
/// Source reply declaring a longer value is a protocol error.
pub const ATTR_MAXLEN: u16 = 128;

/// Fixed Notification Source PDU length.
pub(super) const NOTIFICATION_SOURCE_PDU_LEN: usize = 8;

/// Attribute reply header length (ID plus declared value length).
pub(super) const ATTR_HDR_LEN: usize = 3;

/// Control Point command IDs.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, num_enum::IntoPrimitive, num_enum::TryFromPrimitive,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum CommandId {
    GetNotificationAttributes = 0,
    GetAppAttributes = 1,
    PerformNotificationAction = 2,
}

/// Notification Source event IDs.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, num_enum::IntoPrimitive, num_enum::TryFromPrimitive,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum EventId {
    NotificationAdded = 0,
    NotificationModified = 1,
    NotificationRemoved = 2,
}

bitflags! {
    /// Notification event flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct EventFlags: u8 {
        /// The notification is low priority.
        const SILENT = 1 << 0;
        /// The notification is high priority.
        const IMPORTANT = 1 << 1;
        /// The notification pre-existed the subscription.
        const PRE_EXISTING = 1 << 2;
        /// The notification has a positive action.
        const POSITIVE_ACTION = 1 << 3;
        /// The notification has a negative action.
        const NEGATIVE_ACTION = 1 << 4;
    }
}

/// Notification category IDs.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, num_enum::FromPrimitive, num_enum::IntoPrimitive,
)]
#[repr(u8)]
pub enum CategoryId {
    Other = 0,
    IncomingCall = 1,
    MissedCall = 2,
    Voicemail = 3,
    Social = 4,
    Schedule = 5,
    Email = 6,
    News = 7,
    HealthAndFitness = 8,
    BusinessAndFinance = 9,
    Location = 10,
    Entertainment = 11,
    /// Category not defined by the ANCS specification at the time of
    /// writing.
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Notification metadata carried by every Notification Source record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NotificationInfo {
    /// Event flags.
    pub flags: EventFlags,
    /// Notification category.
    pub category: CategoryId,
    /// Number of active notifications in the category.
    pub category_count: u8,
}

/// Notification attribute IDs.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, num_enum::FromPrimitive, num_enum::IntoPrimitive,
)]
#[repr(u8)]
pub enum NotificationAttr {
    AppId = 0,
    /// Requires a declared maximum length.
    Title = 1,
    /// Requires a declared maximum length.
    Subtitle = 2,
    /// Requires a declared maximum length.
    Message = 3,
    MessageSize = 4,
    Date = 5,
    PositiveActionLabel = 6,
    NegativeActionLabel = 7,
    /// Attribute not defined by the ANCS specification at the time of
    /// writing. Delivered as-is; filtering is the caller's policy.
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl NotificationAttr {
    /// Requests this attribute with no declared maximum length.
    #[inline]
    #[must_use]
    pub const fn req(self) -> AttrReq {
        AttrReq {
            id: self,
            max_len: None,
        }
    }

    /// Requests this attribute with a declared maximum length. Only Title,
    /// Subtitle, and Message carry a maximum length on the wire; the value
    /// is ignored for other attributes.
    #[inline]
    #[must_use]
    pub const fn with_max_len(self, n: u16) -> AttrReq {
        AttrReq {
            id: self,
            max_len: Some(n),
        }
    }

    /// Returns whether the request wire format carries a 16-bit maximum
    /// length for this attribute.
    pub(super) const fn takes_max_len(self) -> bool {
        matches!(self, Self::Title | Self::Subtitle | Self::Message)
    }
}

/// One requested notification attribute.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AttrReq {
    /// Attribute ID.
    pub id: NotificationAttr,
    /// Declared maximum value length. Encoded as 0 when unset.
    pub max_len: Option<u16>,
}

/// Application attribute IDs.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, num_enum::FromPrimitive, num_enum::IntoPrimitive,
)]
#[repr(u8)]
pub enum AppAttr {
    DisplayName = 0,
    /// Attribute not defined by the ANCS specification at the time of
    /// writing. Delivered as-is; filtering is the caller's policy.
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Notification actions.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, num_enum::IntoPrimitive, num_enum::TryFromPrimitive,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum Action {
    Positive = 0,
    Negative = 1,
}

crate::impl_display_via_debug! { CommandId, EventId, CategoryId, NotificationAttr, AppAttr, Action }
