//! Apple Notification Center Service client ([ANCS]).
//!
//! ANCS exposes three characteristics: Notification Source streams fixed
//! "a notification changed" records, Control Point accepts commands, and
//! Data Source streams command replies as a fragmented byte stream that
//! the client reassembles into attribute records.
//!
//! [ANCS]: https://developer.apple.com/library/archive/documentation/CoreBluetooth/Reference/AppleNotificationCenterServiceSpecification/Specification/Specification.html

pub use {client::*, consts::*};

mod client;
mod consts;
