use super::*;

/// Completion status of an asynchronous GATT operation.
pub type Status = std::result::Result<(), ErrorCode>;

/// Incoming handle-value notification.
#[derive(Clone, Copy, Debug)]
pub struct NotificationEvt<'a> {
    /// Characteristic value handle.
    pub handle: Handle,
    /// Notified value. One PDU; higher-layer streams may be fragmented
    /// across several notifications.
    pub value: &'a [u8],
}

/// Result of a previously issued read.
#[derive(Clone, Copy, Debug)]
pub struct ReadCompletedEvt<'a> {
    /// Attribute handle that was read.
    pub handle: Handle,
    /// ATT status of the read.
    pub status: Status,
    /// Attribute value. Empty unless `status` is `Ok`.
    pub value: &'a [u8],
}

/// Result of a previously issued write.
#[derive(Clone, Copy, Debug)]
pub struct WriteCompletedEvt {
    /// Attribute handle that was written.
    pub handle: Handle,
    /// ATT status of the write.
    pub status: Status,
}
