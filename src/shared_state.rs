// Shared state between the radio stack's callback context and the status
// loop. Producers write under one critical section and raise atomic dirty
// flags; the loop drains a flag first and snapshots the text afterwards, so a
// write racing the drain re-raises the flag and is reported one tick late at
// worst. Nothing here blocks and nothing here performs I/O.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::text::{self, AddressText, MetadataText, NameText};
use crate::timer::OneShotTimer;

/// Link lifecycle of the remote device.
///
/// Transitions are strictly `Disconnected -> PendingIdentity -> Connected ->
/// Disconnected`. The producer side moves into `PendingIdentity`; only the
/// status loop promotes to `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    PendingIdentity,
    Connected,
}

/// Current audio stream state as reported through the playback producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Started,
}

/// Metadata fields tracked by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Title,
    Artist,
}

/// Address and name of the remote device.
///
/// The store keeps two copies: a pending one filled in piecemeal as the stack
/// resolves address and name, and a confirmed one committed exactly once per
/// connection when the status loop promotes the link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub address: AddressText,
    pub name: NameText,
}

impl DeviceIdentity {
    const fn new() -> Self {
        Self {
            address: AddressText::new(),
            name: NameText::new(),
        }
    }

    fn clear(&mut self) {
        self.address.clear();
        self.name.clear();
    }
}

struct Inner {
    connection: ConnectionState,
    pending: DeviceIdentity,
    confirmed: DeviceIdentity,
    title: MetadataText,
    artist: MetadataText,
    playback: PlaybackState,
    volume_timer: OneShotTimer,
}

impl Inner {
    const fn new() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            pending: DeviceIdentity::new(),
            confirmed: DeviceIdentity::new(),
            title: MetadataText::new(),
            artist: MetadataText::new(),
            playback: PlaybackState::Stopped,
            volume_timer: OneShotTimer::new(),
        }
    }
}

/// The store shared between both execution contexts.
///
/// All multi-field data lives behind one blocking mutex; the dirty markers
/// are standalone atomics because they only signal "new data might be
/// present". Associated data is still read under the lock.
pub struct SharedState {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner>>,
    title_dirty: AtomicBool,
    artist_dirty: AtomicBool,
    playback_dirty: AtomicBool,
    connect_pending: AtomicBool,
    disconnect_pending: AtomicBool,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner::new())),
            title_dirty: AtomicBool::new(false),
            artist_dirty: AtomicBool::new(false),
            playback_dirty: AtomicBool::new(false),
            connect_pending: AtomicBool::new(false),
            disconnect_pending: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------
    // Producer-side writes (radio stack context)
    // ------------------------------------------------------------------

    /// Record a new connection: move into `PendingIdentity` (when coming from
    /// `Disconnected`), raise the connection marker and arm the volume timer.
    /// Re-arming on a repeated event replaces the previous deadline.
    pub fn begin_connection(&self, now: u32, volume_delay_ms: u32) {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if inner.connection == ConnectionState::Disconnected {
                inner.connection = ConnectionState::PendingIdentity;
            }
            inner.volume_timer.arm(now, volume_delay_ms);
            self.connect_pending.store(true, Ordering::SeqCst);
        });
    }

    /// Reset the whole store on disconnection.
    ///
    /// Only acts when the link is actually `Connected`; a disconnect while
    /// disconnected or still pending is a no-op and returns false. The reset
    /// happens inside a single critical section so the status loop can never
    /// observe a half-cleared store.
    pub fn complete_disconnection(&self) -> bool {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if inner.connection != ConnectionState::Connected {
                return false;
            }

            inner.connection = ConnectionState::Disconnected;
            inner.pending.clear();
            inner.confirmed.clear();
            inner.title.clear();
            inner.artist.clear();
            inner.playback = PlaybackState::Stopped;
            inner.volume_timer.disarm();

            self.title_dirty.store(false, Ordering::SeqCst);
            self.artist_dirty.store(false, Ordering::SeqCst);
            self.playback_dirty.store(false, Ordering::SeqCst);
            self.connect_pending.store(false, Ordering::SeqCst);
            self.disconnect_pending.store(true, Ordering::SeqCst);
            true
        })
    }

    /// Store the resolved address of the not-yet-promoted connection.
    pub fn set_pending_address(&self, address: &str) {
        self.inner.lock(|cell| {
            cell.borrow_mut().pending.address = text::bounded(address);
        });
    }

    /// Store the resolved name of the not-yet-promoted connection.
    pub fn set_pending_name(&self, name: &str) {
        self.inner.lock(|cell| {
            cell.borrow_mut().pending.name = text::bounded(name);
        });
    }

    /// Overwrite a metadata field and mark it dirty.
    pub fn write_metadata(&self, kind: MetadataKind, value: &str) {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            let (slot, flag) = match kind {
                MetadataKind::Title => (&mut inner.title, &self.title_dirty),
                MetadataKind::Artist => (&mut inner.artist, &self.artist_dirty),
            };
            *slot = text::bounded(value);
            flag.store(true, Ordering::SeqCst);
        });
    }

    /// Overwrite the playback state and mark it dirty.
    pub fn set_playback(&self, state: PlaybackState) {
        self.inner.lock(|cell| {
            cell.borrow_mut().playback = state;
            self.playback_dirty.store(true, Ordering::SeqCst);
        });
    }

    // ------------------------------------------------------------------
    // Poll-side drains (status loop context)
    // ------------------------------------------------------------------

    /// Promote a pending connection to `Connected`.
    ///
    /// Drains the connection marker; when the link is not yet connected,
    /// commits pending identity to confirmed (the one write of the confirmed
    /// copy for this connection's lifetime) and returns it. A marker raised
    /// while already connected is swallowed as an out-of-order duplicate.
    pub fn take_connection_promotion(&self) -> Option<DeviceIdentity> {
        if !self.connect_pending.swap(false, Ordering::SeqCst) {
            return None;
        }

        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if inner.connection == ConnectionState::Connected {
                return None;
            }
            inner.confirmed = inner.pending.clone();
            inner.connection = ConnectionState::Connected;
            Some(inner.confirmed.clone())
        })
    }

    /// Poll the deferred volume timer; true exactly once per arm cycle.
    pub fn poll_volume_timer(&self, now: u32) -> bool {
        self.inner.lock(|cell| cell.borrow_mut().volume_timer.poll(now))
    }

    /// Drain the disconnection marker; true exactly once per disconnection.
    pub fn take_disconnection(&self) -> bool {
        self.disconnect_pending.swap(false, Ordering::SeqCst)
    }

    /// Drain the playback marker and snapshot the current state.
    pub fn take_playback(&self) -> Option<PlaybackState> {
        if !self.playback_dirty.swap(false, Ordering::SeqCst) {
            return None;
        }
        Some(self.inner.lock(|cell| cell.borrow().playback))
    }

    /// Drain a metadata marker and snapshot the current text.
    ///
    /// The flag is cleared before the snapshot is taken: a producer write
    /// landing in between simply re-raises the flag and the fresher text is
    /// reported on a later tick.
    pub fn take_metadata(&self, kind: MetadataKind) -> Option<MetadataText> {
        let flag = match kind {
            MetadataKind::Title => &self.title_dirty,
            MetadataKind::Artist => &self.artist_dirty,
        };
        if !flag.swap(false, Ordering::SeqCst) {
            return None;
        }

        Some(self.inner.lock(|cell| {
            let inner = cell.borrow();
            match kind {
                MetadataKind::Title => inner.title.clone(),
                MetadataKind::Artist => inner.artist.clone(),
            }
        }))
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn connection(&self) -> ConnectionState {
        self.inner.lock(|cell| cell.borrow().connection)
    }

    /// Identity committed at promotion; empty fields while disconnected.
    pub fn confirmed_identity(&self) -> DeviceIdentity {
        self.inner.lock(|cell| cell.borrow().confirmed.clone())
    }

    pub fn is_volume_timer_armed(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().volume_timer.is_armed())
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
