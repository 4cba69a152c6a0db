//! GATT client transport abstraction.
//!
//! The ANCS core consumes the remote GATT server through this narrow
//! interface: commands that are accepted or rejected immediately, with
//! results delivered later as separate completion events by the host
//! stack's event loop.

pub use {browse::*, consts::*, event::*};

mod browse;
mod consts;
mod event;

/// Error returned when a GATT command cannot be issued.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Another operation is already pending on the transport.
    #[error("transport busy")]
    Busy,
    /// The attribute handle is unknown or does not permit the operation.
    #[error("invalid handle")]
    InvalidHandle,
    /// The connection no longer exists.
    #[error("not connected")]
    NotConnected,
}

/// Common GATT command result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Asynchronous GATT client operations.
///
/// A successful return means only that the command was queued. The outcome
/// arrives later as a [`ReadCompletedEvt`] or [`WriteCompletedEvt`] for the
/// same handle; notifications arrive as [`NotificationEvt`]s.
pub trait Transport {
    /// Issues a characteristic value write.
    fn write(&mut self, hdl: Handle, value: &[u8]) -> Result<()>;

    /// Issues a characteristic or descriptor read.
    fn read(&mut self, hdl: Handle) -> Result<()>;

    /// Writes a Client Characteristic Configuration descriptor.
    fn write_ccc(&mut self, hdl: Handle, ccc: Cccd) -> Result<()>;
}
