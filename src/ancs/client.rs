use bitflags::bitflags;
use smallvec::SmallVec;
use structbuf::{Pack, StructBuf, Unpack, Unpacker};
use tracing::{debug, warn};

use crate::gatt::{
    self, Cccd, CharProps, ErrorCode, Finder, Handle, NotificationEvt, ReadCompletedEvt,
    ServiceDef, Status, Transport, WriteCompletedEvt, CLIENT_CHAR_CFG,
};

use super::*;

bitflags! {
    /// Optional capabilities detected during service binding. Mandatory
    /// features are always supported if binding succeeded.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[repr(transparent)]
    pub struct Cap: u8 {
        /// Control Point characteristic is present and writable.
        const CONTROL_POINT = 1 << 0;
        /// Data Source characteristic is present with a CCC descriptor.
        const DATA_SOURCE = 1 << 1;
    }
}

/// Configurable event streams.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    /// Notification Source notifications.
    NotificationSource,
    /// Data Source notifications.
    DataSource,
}

/// Error returned when an operation cannot be started.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Another Control Point operation is in progress.
    #[error("request already in progress")]
    Busy,
    /// The peer does not expose the characteristic required for this
    /// operation.
    #[error("operation not supported by the peer")]
    NotSupported,
    /// The attribute list is empty or longer than 255 entries.
    #[error("invalid attribute list")]
    InvalidAttrList,
    /// The transport rejected the command.
    #[error(transparent)]
    Gatt(#[from] gatt::Error),
}

/// Common ANCS operation result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application callbacks.
///
/// Completion callbacks are invoked with the client already returned to an
/// idle state, so an implementation may start the next request
/// synchronously from within any `*_completed` method.
///
/// Attribute values are raw bytes as received from the peer; ANCS defines
/// them as UTF-8 strings, but decoding is left to the caller.
#[allow(unused_variables)]
pub trait Delegate<T: Transport> {
    /// A notification was added on the peer.
    fn notification_added(&mut self, client: &mut Client<T>, uid: u32, info: NotificationInfo) {}

    /// An existing notification was modified on the peer.
    fn notification_modified(&mut self, client: &mut Client<T>, uid: u32, info: NotificationInfo) {}

    /// A notification was removed on the peer.
    fn notification_removed(&mut self, client: &mut Client<T>, uid: u32) {}

    /// One attribute requested via [`Client::get_notification_attr`] was
    /// received.
    fn notification_attr(
        &mut self,
        client: &mut Client<T>,
        uid: u32,
        attr: NotificationAttr,
        value: Vec<u8>,
    ) {
    }

    /// A [`Client::get_notification_attr`] request finished. Fires exactly
    /// once per request, for success, failure, and cancellation alike.
    fn get_notification_attr_completed(
        &mut self,
        client: &mut Client<T>,
        uid: u32,
        status: Status,
    ) {
    }

    /// One attribute requested via [`Client::get_application_attr`] was
    /// received.
    fn application_attr(
        &mut self,
        client: &mut Client<T>,
        app_id: &str,
        attr: AppAttr,
        value: Vec<u8>,
    ) {
    }

    /// A [`Client::get_application_attr`] request finished. Fires exactly
    /// once per request, for success, failure, and cancellation alike.
    fn get_application_attr_completed(
        &mut self,
        client: &mut Client<T>,
        app_id: &str,
        status: Status,
    ) {
    }

    /// A [`Client::perform_notification_action`] command was acknowledged.
    fn perform_action_completed(&mut self, client: &mut Client<T>, status: Status) {}

    /// A [`Client::get_event_state`] read finished.
    fn get_event_state_completed(
        &mut self,
        client: &mut Client<T>,
        event: Event,
        status: Status,
        enabled: bool,
    ) {
    }

    /// A [`Client::set_event_state`] write finished.
    fn set_event_state_completed(&mut self, client: &mut Client<T>, event: Event, status: Status) {}
}

/// Correlation key of the outstanding attribute-fetch request. The variant
/// also determines which Control Point command is outstanding.
#[derive(Clone, Debug, Eq, PartialEq)]
enum Pending {
    /// `GetNotificationAttributes` keyed by notification UID.
    Notification { uid: u32 },
    /// `GetAppAttributes` keyed by application ID.
    App { id: String },
}

impl Pending {
    /// Returns the Control Point command for this key.
    const fn command(&self) -> CommandId {
        match *self {
            Self::Notification { .. } => CommandId::GetNotificationAttributes,
            Self::App { .. } => CommandId::GetAppAttributes,
        }
    }
}

/// Reassembly and lifecycle state of the one outstanding attribute-fetch
/// request. A request is in progress iff `pending` is set.
#[derive(Debug, Default)]
struct RequestState {
    /// Correlation key, held until the completion callback is delivered.
    pending: Option<Pending>,
    /// Command PDU write was issued but not yet acknowledged. Data Source
    /// PDUs are ignored until then.
    wait_write_cmp: bool,
    /// Leading CommandID byte was matched on the Data Source stream.
    has_command: bool,
    /// Correlation key echo was matched on the Data Source stream.
    has_id: bool,
    /// Attribute entries still expected for the current request.
    attr_remaining: u8,
    /// Partial ApplicationID echo, which may span PDUs.
    echo: Vec<u8>,
    /// Partial attribute header; ANCS may split even these 3 bytes across
    /// PDUs.
    hdr: [u8; ATTR_HDR_LEN],
    hdr_len: u8,
    /// Partial attribute value. Allocated once the header is complete.
    value: Option<Vec<u8>>,
}

impl RequestState {
    /// Clears all state, returning the correlation key.
    fn reset(&mut self) -> Option<Pending> {
        let pending = self.pending.take();
        *self = Self::default();
        pending
    }
}

/// ANCS client bound to the service of one peer connection.
///
/// All entry points must be called from a single event-dispatch context.
/// The client never blocks; GATT commands are issued through the
/// [`Transport`] and their results fed back via [`Self::notification`],
/// [`Self::read_completed`], and [`Self::write_completed`].
#[derive(Debug)]
pub struct Client<T: Transport> {
    transport: T,
    caps: Cap,
    maxlen: u16,
    notif_src: Handle,
    notif_src_ccc: Handle,
    ctrl_point: Option<Handle>,
    data_src: Option<Handle>,
    data_src_ccc: Option<Handle>,
    /// Outstanding Control Point command (`None` = idle).
    op: Option<CommandId>,
    req: RequestState,
}

impl<T: Transport> Client<T> {
    /// Binds a client to a browsed ANCS service instance.
    ///
    /// Returns `None` if the service UUID does not match, or if the
    /// mandatory Notification Source characteristic (with notify support
    /// and a CCC descriptor) is missing. Control Point and Data Source are
    /// optional; their absence limits which operations succeed (see
    /// [`Self::caps`]).
    pub fn bind(transport: T, svc: &ServiceDef) -> Option<Self> {
        if svc.uuid != SVC_ANCS {
            return None;
        }
        let mut find = Finder::new(svc);

        let Some(ns) = (find.characteristic(CHR_NOTIFICATION_SOURCE))
            .filter(|c| c.props.contains(CharProps::NOTIFY))
        else {
            warn!("Notification Source characteristic missing or not notifiable");
            return None;
        };
        let Some(ns_ccc) = find.descriptor(CLIENT_CHAR_CFG) else {
            warn!("Notification Source CCC descriptor missing");
            return None;
        };

        let mut caps = Cap::empty();
        let ctrl_point = find
            .characteristic(CHR_CONTROL_POINT)
            .filter(|c| c.props.contains(CharProps::WRITE))
            .map(|c| {
                caps |= Cap::CONTROL_POINT;
                c.value_handle
            });

        let (mut data_src, mut data_src_ccc) = (None, None);
        if let Some(c) = (find.characteristic(CHR_DATA_SOURCE))
            .filter(|c| c.props.contains(CharProps::NOTIFY))
        {
            data_src = Some(c.value_handle);
            if let Some(d) = find.descriptor(CLIENT_CHAR_CFG) {
                caps |= Cap::DATA_SOURCE;
                data_src_ccc = Some(d.handle);
            }
        }

        debug!("ANCS service bound ({caps:?})");
        Some(Self {
            transport,
            caps,
            maxlen: ATTR_MAXLEN,
            notif_src: ns.value_handle,
            notif_src_ccc: ns_ccc.handle,
            ctrl_point,
            data_src,
            data_src_ccc,
            op: None,
            req: RequestState::default(),
        })
    }

    /// Overrides the ceiling on a single attribute value's declared length
    /// (default [`ATTR_MAXLEN`]). Declared maximum lengths in requests are
    /// clamped to this value, and replies declaring more are rejected as a
    /// protocol error.
    #[inline]
    #[must_use]
    pub const fn with_attr_maxlen(mut self, maxlen: u16) -> Self {
        self.maxlen = maxlen;
        self
    }

    /// Returns the optional capabilities detected during binding.
    #[inline(always)]
    #[must_use]
    pub const fn caps(&self) -> Cap {
        self.caps
    }

    /// Returns the underlying transport.
    #[inline(always)]
    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Returns whether an attribute-fetch request is outstanding.
    #[inline(always)]
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.req.pending.is_some()
    }

    /// Issues a read of the CCC descriptor for `event`. The result is
    /// reported via [`Delegate::get_event_state_completed`].
    pub fn get_event_state(&mut self, event: Event) -> Result<()> {
        let ccc = self.event_ccc(event)?;
        Ok(self.transport.read(ccc)?)
    }

    /// Enables or disables notifications for `event` by writing its CCC
    /// descriptor. The result is reported via
    /// [`Delegate::set_event_state_completed`].
    pub fn set_event_state(&mut self, event: Event, enabled: bool) -> Result<()> {
        let ccc = self.event_ccc(event)?;
        let v = if enabled { Cccd::NOTIFY } else { Cccd::empty() };
        Ok(self.transport.write_ccc(ccc, v)?)
    }

    /// Requests attributes of the notification identified by `uid`.
    ///
    /// Each received attribute is reported via
    /// [`Delegate::notification_attr`], followed by exactly one
    /// [`Delegate::get_notification_attr_completed`]. Only one
    /// attribute-fetch request may be outstanding at a time.
    pub fn get_notification_attr(&mut self, uid: u32, attrs: &[AttrReq]) -> Result<()> {
        let ids: SmallVec<[(u8, Option<u16>); 8]> = attrs
            .iter()
            .map(|a| {
                let max_len = (a.id.takes_max_len())
                    .then(|| a.max_len.unwrap_or(0).min(self.maxlen));
                (u8::from(a.id), max_len)
            })
            .collect();
        self.send_attributes_req(Pending::Notification { uid }, &ids)
    }

    /// Requests attributes of the application identified by `app_id`.
    ///
    /// Each received attribute is reported via
    /// [`Delegate::application_attr`], followed by exactly one
    /// [`Delegate::get_application_attr_completed`]. Only one
    /// attribute-fetch request may be outstanding at a time.
    pub fn get_application_attr(&mut self, app_id: &str, attrs: &[AppAttr]) -> Result<()> {
        let ids: SmallVec<[(u8, Option<u16>); 8]> =
            attrs.iter().map(|&a| (u8::from(a), None)).collect();
        self.send_attributes_req(
            Pending::App {
                id: app_id.to_owned(),
            },
            &ids,
        )
    }

    /// Performs a positive or negative action on the notification
    /// identified by `uid`. The result is reported via
    /// [`Delegate::perform_action_completed`]. The command has no Data
    /// Source follow-up, but shares the Control Point with the
    /// attribute-fetch requests.
    pub fn perform_notification_action(&mut self, uid: u32, action: Action) -> Result<()> {
        let Some(ctrl) = self.ctrl_point else {
            return Err(Error::NotSupported);
        };
        if self.op.is_some() {
            return Err(Error::Busy);
        }
        let mut pdu = StructBuf::new(6);
        pdu.append()
            .u8(CommandId::PerformNotificationAction)
            .u32(uid)
            .u8(action);
        self.transport.write(ctrl, pdu.as_ref())?;
        self.op = Some(CommandId::PerformNotificationAction);
        Ok(())
    }

    /// Cancels the outstanding attribute-fetch request, if any. Returns
    /// whether a request was cancelled.
    ///
    /// Cancellation is purely local: nothing is sent to the peer, the
    /// completion callback fires with [`ErrorCode::ApplicationError`], and
    /// any late reply is silently dropped. The client has no built-in
    /// timeout; callers are expected to drive this from their own timer.
    pub fn cancel_request(&mut self, d: &mut impl Delegate<T>) -> bool {
        if !self.is_busy() {
            return false;
        }
        self.complete_request(d, Err(ErrorCode::ApplicationError));
        true
    }

    /// Tears down any in-flight request state after the connection
    /// dropped. No callbacks fire.
    pub fn disconnected(&mut self) {
        self.op = None;
        self.req.reset();
    }

    /// Feeds an incoming handle-value notification into the client.
    /// Notifications for unrelated handles are ignored.
    pub fn notification(&mut self, d: &mut impl Delegate<T>, evt: &NotificationEvt<'_>) {
        if evt.handle == self.notif_src {
            self.notification_source(d, evt.value);
        } else if self.data_src == Some(evt.handle) {
            self.data_source(d, evt.value);
        }
    }

    /// Feeds a read-completion event into the client. Events for unrelated
    /// handles are ignored.
    pub fn read_completed(&mut self, d: &mut impl Delegate<T>, evt: &ReadCompletedEvt<'_>) {
        let event = if evt.handle == self.notif_src_ccc {
            Event::NotificationSource
        } else if self.data_src_ccc == Some(evt.handle) {
            Event::DataSource
        } else {
            return;
        };
        if evt.status.is_err() {
            d.get_event_state_completed(self, event, evt.status, false);
            return;
        }
        if evt.value.len() < 2 {
            d.get_event_state_completed(self, event, Err(ErrorCode::UnlikelyError), false);
            return;
        }
        let ccc = Cccd::from_bits_truncate(evt.value.unpack().u16());
        d.get_event_state_completed(self, event, Ok(()), ccc.contains(Cccd::NOTIFY));
    }

    /// Feeds a write-completion event into the client. Events for
    /// unrelated handles are ignored.
    pub fn write_completed(&mut self, d: &mut impl Delegate<T>, evt: &WriteCompletedEvt) {
        if evt.handle == self.notif_src_ccc {
            d.set_event_state_completed(self, Event::NotificationSource, evt.status);
        } else if self.data_src_ccc == Some(evt.handle) {
            d.set_event_state_completed(self, Event::DataSource, evt.status);
        } else if self.ctrl_point == Some(evt.handle) {
            self.ctrl_point_write_completed(d, evt.status);
        }
    }

    /// Returns the CCC descriptor handle for `event`.
    fn event_ccc(&self, event: Event) -> Result<Handle> {
        match event {
            Event::NotificationSource => Ok(self.notif_src_ccc),
            Event::DataSource => self.data_src_ccc.ok_or(Error::NotSupported),
        }
    }

    /// Encodes and writes an attribute-fetch command PDU, then arms the
    /// request state. `ids` are `(attribute_id, declared_max_len)` pairs
    /// with the maximum length already normalized for the wire format.
    fn send_attributes_req(&mut self, pending: Pending, ids: &[(u8, Option<u16>)]) -> Result<()> {
        let Some(ctrl) = self.ctrl_point else {
            return Err(Error::NotSupported);
        };
        if self.op.is_some() || self.req.pending.is_some() {
            return Err(Error::Busy);
        }
        let Ok(attr_remaining @ 1..=u8::MAX) = u8::try_from(ids.len()) else {
            return Err(Error::InvalidAttrList);
        };
        debug_assert!(self.req.echo.is_empty(), "stale reassembly state");

        let key_len = match pending {
            Pending::Notification { .. } => 4,
            Pending::App { ref id } => id.len() + 1,
        };
        let n = 1
            + key_len
            + (ids.iter()).map(|&(_, max)| 1 + usize::from(max.is_some()) * 2).sum::<usize>();
        let mut pdu = StructBuf::new(n);
        let mut p = pdu.append();
        p.u8(pending.command());
        match pending {
            Pending::Notification { uid } => {
                p.u32(uid);
            }
            Pending::App { ref id } => {
                p.put(id.as_bytes()).u8(0_u8);
            }
        }
        for &(id, max) in ids {
            p.u8(id);
            if let Some(max) = max {
                p.u16(max);
            }
        }
        self.transport.write(ctrl, pdu.as_ref())?;

        self.op = Some(pending.command());
        self.req = RequestState {
            pending: Some(pending),
            wait_write_cmp: true,
            attr_remaining,
            ..RequestState::default()
        };
        Ok(())
    }

    /// Returns the client to idle and delivers the completion callback for
    /// the outstanding attribute-fetch request. State is reset strictly
    /// before the callback so the delegate may start a new request from
    /// within it.
    fn complete_request(&mut self, d: &mut impl Delegate<T>, status: Status) {
        self.op = None;
        match self.req.reset() {
            Some(Pending::Notification { uid }) => {
                d.get_notification_attr_completed(self, uid, status);
            }
            Some(Pending::App { id }) => d.get_application_attr_completed(self, &id, status),
            None => {}
        }
    }

    /// Handles the acknowledgement of a Control Point command write.
    fn ctrl_point_write_completed(&mut self, d: &mut impl Delegate<T>, status: Status) {
        self.req.wait_write_cmp = false;
        match self.op {
            Some(CommandId::PerformNotificationAction) => {
                self.op = None;
                d.perform_action_completed(self, status);
            }
            Some(CommandId::GetNotificationAttributes | CommandId::GetAppAttributes) => {
                // A peer-side failure arrives via Data Source; only a
                // rejected write terminates the request here
                if status.is_err() {
                    self.complete_request(d, status);
                }
            }
            _ => {}
        }
    }

    /// Dispatches one fixed-size Notification Source record.
    fn notification_source(&mut self, d: &mut impl Delegate<T>, value: &[u8]) {
        if value.len() < NOTIFICATION_SOURCE_PDU_LEN {
            warn!("Runt Notification Source PDU ({} bytes)", value.len());
            return;
        }
        let mut p = value.unpack();
        let event = EventId::try_from(p.u8());
        let info = NotificationInfo {
            flags: EventFlags::from_bits_truncate(p.u8()),
            category: CategoryId::from(p.u8()),
            category_count: p.u8(),
        };
        let uid = p.u32();
        match event {
            Ok(EventId::NotificationAdded) => d.notification_added(self, uid, info),
            Ok(EventId::NotificationModified) => d.notification_modified(self, uid, info),
            Ok(EventId::NotificationRemoved) => d.notification_removed(self, uid),
            Err(e) => debug!("Unknown Notification Source event: {}", e.number),
        }
    }

    /// Consumes one Data Source PDU, advancing reassembly of the
    /// outstanding request's reply. PDUs that arrive while no request is
    /// outstanding, before the command write is acknowledged, or whose
    /// CommandID/correlation key do not match are ignored as unrelated
    /// traffic.
    fn data_source(&mut self, d: &mut impl Delegate<T>, value: &[u8]) {
        if self.req.pending.is_none() || self.req.attr_remaining == 0 || self.req.wait_write_cmp {
            return;
        }
        let mut p = value.unpack();

        if !self.req.has_command {
            let cmd = p.u8();
            let expect = match self.req.pending {
                Some(ref pending) => pending.command(),
                None => return,
            };
            if !p.is_ok() || cmd != u8::from(expect) {
                debug!("Data Source CommandID mismatch ({cmd:#04X}), ignoring");
                return;
            }
            self.req.hdr_len = 0;
            self.req.has_command = true;
        }

        if !self.req.has_id {
            match self.req.pending {
                Some(Pending::Notification { uid }) => {
                    // The 4-byte NotificationUID always fits in the first
                    // PDU of a reply
                    let got = p.u32();
                    if !p.is_ok() || got != uid {
                        debug!("Data Source NotificationUID mismatch, ignoring");
                        self.req.has_command = false;
                        return;
                    }
                    self.req.has_id = true;
                }
                Some(Pending::App { ref id }) => {
                    // The ApplicationID echo is a NUL-terminated string of
                    // unknown length, possibly spanning PDUs
                    let rest = p.as_ref();
                    let Some(nul) = rest.iter().position(|&b| b == 0) else {
                        self.req.echo.extend_from_slice(rest);
                        return;
                    };
                    self.req.echo.extend_from_slice(&rest[..nul]);
                    p.skip(nul + 1);
                    if self.req.echo != id.as_bytes() {
                        debug!("Data Source ApplicationID mismatch, ignoring");
                        self.req.has_command = false;
                        self.req.echo.clear();
                        return;
                    }
                    self.req.has_id = true;
                }
                None => return,
            }
        }

        // One PDU may finish an attribute and begin the next, so keep
        // parsing until the PDU or the request is exhausted
        while !p.as_ref().is_empty() {
            while usize::from(self.req.hdr_len) < ATTR_HDR_LEN && !p.as_ref().is_empty() {
                self.req.hdr[usize::from(self.req.hdr_len)] = p.u8();
                self.req.hdr_len += 1;
            }
            if usize::from(self.req.hdr_len) < ATTR_HDR_LEN {
                return; // rest of the header arrives in a later PDU
            }
            let mut h = Unpacker::new(&self.req.hdr);
            let (attr_id, declared) = (h.u8(), h.u16());

            let buf = match self.req.value {
                Some(ref mut buf) => buf,
                None => {
                    if declared > self.maxlen {
                        warn!(
                            "Attribute {attr_id:#04X} declares {declared} bytes (limit {})",
                            self.maxlen
                        );
                        self.complete_request(d, Err(ErrorCode::UnlikelyError));
                        return;
                    }
                    self.req.value.insert(Vec::with_capacity(declared.into()))
                }
            };
            let rest = p.as_ref();
            let take = (usize::from(declared) - buf.len()).min(rest.len());
            buf.extend_from_slice(&rest[..take]);
            p.skip(take);
            if buf.len() < usize::from(declared) {
                return; // rest of the value arrives in a later PDU
            }

            let value = self.req.value.take().unwrap_or_default();
            self.req.hdr_len = 0;
            self.req.attr_remaining -= 1;
            if self.req.attr_remaining == 0 {
                // Return to idle before firing callbacks so the delegate
                // can start another request from within them
                self.op = None;
                match self.req.reset() {
                    Some(Pending::Notification { uid }) => {
                        d.notification_attr(self, uid, NotificationAttr::from(attr_id), value);
                        d.get_notification_attr_completed(self, uid, Ok(()));
                    }
                    Some(Pending::App { id }) => {
                        d.application_attr(self, &id, AppAttr::from(attr_id), value);
                        d.get_application_attr_completed(self, &id, Ok(()));
                    }
                    None => {}
                }
                return;
            }
            match self.req.pending.clone() {
                Some(Pending::Notification { uid }) => {
                    d.notification_attr(self, uid, NotificationAttr::from(attr_id), value);
                }
                Some(Pending::App { id }) => {
                    d.application_attr(self, &id, AppAttr::from(attr_id), value);
                }
                None => return,
            }
            // The delegate may cancel or replace the request from within
            // the callback. Any remaining bytes belong to the old reply.
            if self.req.pending.is_none() || self.req.wait_write_cmp {
                return;
            }
        }
    }
}
