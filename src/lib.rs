//! Apple Notification Center Service ([ANCS]) client.
//!
//! Implements the accessory side of ANCS on top of an abstract GATT client
//! transport: service binding, Control Point request lifecycle, and
//! reassembly of fragmented Data Source replies into attribute records.
//!
//! The client is single-threaded and event-driven. All entry points are
//! expected to be called from one event-dispatch context, typically the
//! host stack's event loop. GATT reads and writes are asynchronous; their
//! results are fed back via [`gatt::ReadCompletedEvt`],
//! [`gatt::WriteCompletedEvt`], and [`gatt::NotificationEvt`].
//!
//! [ANCS]: https://developer.apple.com/library/archive/documentation/CoreBluetooth/Reference/AppleNotificationCenterServiceSpecification/Specification/Specification.html

#![warn(missing_debug_implementations)]
#![warn(non_ascii_idents)]
#![warn(single_use_lifetimes)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]
#![warn(unused_lifetimes)]
#![warn(unused_qualifications)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::inline_always)]
#![allow(clippy::module_name_repetitions)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::mod_module_files)]
#![warn(clippy::print_stdout)]
#![warn(clippy::str_to_string)]

pub mod ancs;
pub mod gatt;
pub mod uuid;

pub(crate) use util::*;

mod util;
