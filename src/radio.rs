//! Radio link contract and an in-process simulated implementation for tests
//! and the demonstration binary.
//!
//! The production adapter (SX1276 register configuration, SPI transport,
//! DIO interrupt handling) is out of scope for this crate; only the
//! [`RadioLink`] trait boundary is specified here. The simulated link pairs
//! two bounded `embassy_sync::channel::Channel`s, one per direction.

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;

use crate::codec::MAX_FRAME_LEN;

/// Capacity of the simulated link's internal queues. Small, since the core
/// never has more than one in-flight frame in either direction.
const QUEUE_DEPTH: usize = 8;

/// A received frame and the RSSI it arrived at.
#[derive(Debug, Clone)]
pub struct ReceivedFrame {
    pub bytes: Vec<u8>,
    pub rssi: i16,
}

/// Error surface for [`RadioLink`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RadioError {
    #[error("radio initialization failed")]
    InitFailed,
    #[error("transmit timed out")]
    TransmitTimeout,
    #[error("payload of {0} bytes exceeds the 230 byte frame limit")]
    PayloadTooLarge(usize),
}

/// Packet-oriented broadcast link.
///
/// Polling returns a fully-drained [`ReceivedFrame`] rather than separating
/// "ask for length" from "read each byte" — there is no byte-at-a-time
/// transport to accommodate here.
pub trait RadioLink {
    /// One-shot initialization; a failure aborts startup.
    async fn init(&mut self) -> Result<(), RadioError>;

    /// Broadcasts `bytes`. Blocks (awaits) until the PHY reports done or the
    /// internal transmit timeout expires.
    async fn send(&mut self, bytes: &[u8]) -> Result<(), RadioError>;

    /// Returns the next received frame, if any, without blocking.
    fn poll(&mut self) -> Option<ReceivedFrame>;
}

/// In-process simulated radio link backed by a pair of bounded channels.
pub struct SimulatedRadioLink {
    inbound: &'static Channel<NoopRawMutex, ReceivedFrame, QUEUE_DEPTH>,
    outbound: &'static Channel<NoopRawMutex, Vec<u8>, QUEUE_DEPTH>,
}

impl SimulatedRadioLink {
    /// Builds one simulated link plus a pair of handles: one to inject
    /// inbound frames at a chosen RSSI, one to drain outbound frames. A
    /// small mesh is assembled by creating one link per node and relaying
    /// `drain()` output from node A into `inject()` on node B's link at
    /// whatever RSSI the topology calls for — link attenuation is a property
    /// of the wiring, not of the link itself.
    pub fn new_standalone() -> (Self, InjectHandle, DrainHandle) {
        let inbound: &'static Channel<NoopRawMutex, ReceivedFrame, QUEUE_DEPTH> = Box::leak(Box::new(Channel::new()));
        let outbound: &'static Channel<NoopRawMutex, Vec<u8>, QUEUE_DEPTH> = Box::leak(Box::new(Channel::new()));
        let link = Self { inbound, outbound };
        (link, InjectHandle { inbound }, DrainHandle { outbound })
    }
}

/// Handle for pushing frames into a [`SimulatedRadioLink`]'s inbound queue.
#[derive(Clone, Copy)]
pub struct InjectHandle {
    inbound: &'static Channel<NoopRawMutex, ReceivedFrame, QUEUE_DEPTH>,
}

impl InjectHandle {
    pub async fn inject(&self, bytes: impl Into<Vec<u8>>, rssi: i16) {
        self.inbound.send(ReceivedFrame { bytes: bytes.into(), rssi }).await;
    }
}

/// Handle for draining a [`SimulatedRadioLink`]'s outbound queue.
#[derive(Clone, Copy)]
pub struct DrainHandle {
    outbound: &'static Channel<NoopRawMutex, Vec<u8>, QUEUE_DEPTH>,
}

impl DrainHandle {
    pub fn try_drain(&self) -> Option<Vec<u8>> {
        self.outbound.try_receive().ok()
    }

    pub async fn drain(&self) -> Vec<u8> {
        self.outbound.receive().await
    }
}

impl RadioLink for SimulatedRadioLink {
    async fn init(&mut self) -> Result<(), RadioError> {
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), RadioError> {
        if bytes.len() > MAX_FRAME_LEN {
            return Err(RadioError::PayloadTooLarge(bytes.len()));
        }
        self.outbound.send(bytes.to_vec()).await;
        Ok(())
    }

    fn poll(&mut self) -> Option<ReceivedFrame> {
        self.inbound.try_receive().ok()
    }
}
