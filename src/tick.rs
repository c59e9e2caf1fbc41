//! Cooperative tick scheduler.
//!
//! One `async` loop: poll the radio without blocking, fire whichever of the
//! four independent schedules is due, then await a short idle delay. The
//! idle delay is the only voluntary suspension point.
//!
//! `step()` performs one non-sleeping pass and is what the test suite drives
//! directly; `run()` wraps it with the real idle delay for production use.

use log::{info, warn};
use rand::Rng;

use crate::clock::{elapsed_exceeds, Clock, MillisTime};
use crate::codec::{self, check_framing};
use crate::engine::{RoutingEngine, ENTRY_TIMEOUT_MS};
use crate::radio::RadioLink;

const HELLO_BASE_MS: MillisTime = 10_000;
const HELLO_JITTER_MS: u32 = 300; // random(0..299) inclusive
const VECTOR_BASE_MS: MillisTime = 9_000;
const VECTOR_JITTER_MS: u32 = 3_000; // random(0..2999) inclusive
const RELAX_PERIOD_MS: MillisTime = 15_000;
const AGING_PERIOD_MS: MillisTime = 2_000;
const IDLE_DELAY_MS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Idle,
    FrameAdmitted,
    HelloSent,
    VectorBroadcast,
    Relaxed,
    Aged,
}

struct ScheduleState {
    last_hello: MillisTime,
    next_hello_period: MillisTime,
    last_vector: MillisTime,
    next_vector_period: MillisTime,
    last_relax: MillisTime,
    last_aging: MillisTime,
}

/// Drives one node's [`RoutingEngine`] against a [`RadioLink`].
pub struct TickDriver<R: RadioLink, C: Clock, Rng: rand::RngCore> {
    engine: RoutingEngine,
    radio: R,
    clock: C,
    rng: Rng,
    schedule: ScheduleState,
}

impl<R: RadioLink, C: Clock, Rg: rand::RngCore> TickDriver<R, C, Rg> {
    pub fn new(engine: RoutingEngine, radio: R, clock: C, mut rng: Rg) -> Self {
        let now = clock.now_millis();
        let schedule = ScheduleState {
            last_hello: now,
            next_hello_period: HELLO_BASE_MS + rng.gen_range(0..HELLO_JITTER_MS),
            last_vector: now,
            next_vector_period: VECTOR_BASE_MS + rng.gen_range(0..VECTOR_JITTER_MS),
            last_relax: now,
            last_aging: now,
        };
        Self { engine, radio, clock, rng, schedule }
    }

    pub fn engine(&self) -> &RoutingEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RoutingEngine {
        &mut self.engine
    }

    /// Initializes the radio, logging and propagating a fatal init failure —
    /// a radio that never comes up aborts startup rather than retrying.
    pub async fn init(&mut self) -> Result<(), crate::radio::RadioError> {
        self.radio.init().await?;
        info!("tick driver initialized for node {}", self.engine.own_id());
        Ok(())
    }

    /// Runs forever, alternating a non-blocking [`Self::step`] with the
    /// idle delay that is this driver's only voluntary suspension point.
    pub async fn run(&mut self) -> ! {
        loop {
            self.step().await;
            embassy_time::Timer::after(embassy_time::Duration::from_millis(IDLE_DELAY_MS)).await;
        }
    }

    /// One non-sleeping pass: admit at most one inbound frame, then fire
    /// whichever schedule (if any) is due. Returns what happened so callers
    /// (and tests) can assert on it without guessing at timing.
    pub async fn step(&mut self) -> StepOutcome {
        if let Some(outcome) = self.poll_and_admit().await {
            return outcome;
        }

        let now = self.clock.now_millis();

        if elapsed_exceeds(now, self.schedule.last_hello, self.schedule.next_hello_period) {
            self.fire_hello(now).await;
            return StepOutcome::HelloSent;
        }
        if elapsed_exceeds(now, self.schedule.last_vector, self.schedule.next_vector_period) {
            self.fire_vector(now).await;
            return StepOutcome::VectorBroadcast;
        }
        if elapsed_exceeds(now, self.schedule.last_relax, RELAX_PERIOD_MS) {
            self.engine.relax();
            self.schedule.last_relax = now;
            return StepOutcome::Relaxed;
        }
        if elapsed_exceeds(now, self.schedule.last_aging, AGING_PERIOD_MS) {
            self.engine.evict_stale(now, ENTRY_TIMEOUT_MS);
            self.schedule.last_aging = now;
            return StepOutcome::Aged;
        }

        StepOutcome::Idle
    }

    async fn poll_and_admit(&mut self) -> Option<StepOutcome> {
        let received = self.radio.poll()?;
        let text = match check_framing(&received.bytes) {
            Ok(text) => text,
            Err(err) => {
                warn!("dropped inbound frame: {err}");
                return Some(StepOutcome::Idle);
            }
        };
        let Some(frame) = codec::parse(text) else {
            return Some(StepOutcome::Idle);
        };
        let now = self.clock.now_millis();
        self.engine.admit_frame(frame, received.rssi, now);
        Some(StepOutcome::FrameAdmitted)
    }

    async fn fire_hello(&mut self, now: MillisTime) {
        let frame = self.engine.send_hello();
        self.transmit(frame.as_bytes()).await;
        self.schedule.last_hello = now;
        self.schedule.next_hello_period = HELLO_BASE_MS + self.rng.gen_range(0..HELLO_JITTER_MS);
    }

    async fn fire_vector(&mut self, now: MillisTime) {
        let frame = self.engine.broadcast_vector();
        self.transmit(frame.as_bytes()).await;
        self.schedule.last_vector = now;
        self.schedule.next_vector_period = VECTOR_BASE_MS + self.rng.gen_range(0..VECTOR_JITTER_MS);
    }

    async fn transmit(&mut self, bytes: &[u8]) {
        if let Err(err) = self.radio.send(bytes).await {
            warn!("transmit failed, frame considered lost: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use crate::identity::{IdentityTable, MAX_NODES, NodeId};
    use crate::mac::Mac;
    use crate::radio::SimulatedRadioLink;
    use crate::test_support::block_on;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn mac(n: u8) -> Mac {
        Mac::new([0, 0, 0, 0, 0, n])
    }

    fn directory() -> [Option<Mac>; MAX_NODES] {
        let mut dir = [None; MAX_NODES];
        for i in 0..MAX_NODES {
            dir[i] = Some(mac(i as u8));
        }
        dir
    }

    fn driver(own_id: NodeId) -> (TickDriver<SimulatedRadioLink, TestClock, StdRng>, crate::radio::InjectHandle, crate::radio::DrainHandle) {
        let identity = IdentityTable::new(own_id, directory()).unwrap();
        let engine = RoutingEngine::new(identity);
        let (radio, inject, drain) = SimulatedRadioLink::new_standalone();
        let clock = TestClock::new();
        let rng = StdRng::seed_from_u64(42);
        (TickDriver::new(engine, radio, clock, rng), inject, drain)
    }

    #[test]
    fn step_admits_an_inbound_hello() {
        let (mut driver, inject, _drain) = driver(0);
        block_on(inject.inject(codec::encode_hello(1, mac(1)).into_bytes(), -50));
        let outcome = block_on(driver.step());
        assert_eq!(outcome, StepOutcome::FrameAdmitted);
        assert!(driver.engine().table().find_by_destination(1).is_some());
    }

    #[test]
    fn step_drops_oversized_frame_without_admitting() {
        let (mut driver, inject, _drain) = driver(0);
        block_on(inject.inject(vec![b'a'; crate::codec::MAX_FRAME_LEN + 1], -50));
        let outcome = block_on(driver.step());
        assert_eq!(outcome, StepOutcome::Idle);
    }

    #[test]
    fn hello_schedule_fires_once_due_and_reschedules() {
        let (mut driver, _inject, drain) = driver(0);
        // Not due yet.
        assert_eq!(block_on(driver.step()), StepOutcome::Idle);
        driver.clock.advance(HELLO_BASE_MS + HELLO_JITTER_MS);
        let outcome = block_on(driver.step());
        assert_eq!(outcome, StepOutcome::HelloSent);
        let sent = drain.try_drain().unwrap();
        assert!(String::from_utf8(sent).unwrap().starts_with("Hello from NODE_0"));
    }
}
