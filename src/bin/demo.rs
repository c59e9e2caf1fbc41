//! Stands up a small in-process mesh and runs each node's tick driver to
//! convergence, logging admitted frames and table changes as they happen.
//!
//! Run with `RUST_LOG=meshroute_core=debug,meshroute_demo=info` to see the
//! routing tables settle. An optional first argument names a TOML topology
//! file in the shape `config::Topology` expects; without one, a built-in
//! four-node chain is used.

use std::env;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use embassy_executor::Executor;
use env_logger::Builder;
use log::{error, info, LevelFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;

use meshroute_core::clock::SystemClock;
use meshroute_core::config::{Topology, TopologyNode};
use meshroute_core::identity::{IdentityTable, MAX_NODES, NodeId};
use meshroute_core::mac::Mac;
use meshroute_core::radio::{DrainHandle, InjectHandle, SimulatedRadioLink};
use meshroute_core::{RoutingEngine, TickDriver};

/// How long the demo lets the mesh run before exiting.
const DEMO_DURATION: StdDuration = StdDuration::from_secs(30);

fn mac_for(id: NodeId) -> Mac {
    Mac::new([0, 0, 0, 0, 0, id])
}

/// A four-node chain (0-1-2-3) with lossy but usable links, used when no
/// topology file is given on the command line.
fn default_topology() -> Topology {
    Topology {
        nodes: vec![
            TopologyNode { id: 0, links: vec![(1, -50)] },
            TopologyNode { id: 1, links: vec![(0, -50), (2, -60)] },
            TopologyNode { id: 2, links: vec![(1, -60), (3, -55)] },
            TopologyNode { id: 3, links: vec![(2, -55)] },
        ],
    }
}

fn load_topology() -> Result<Topology> {
    match env::args().nth(1) {
        Some(path) => Topology::load(&PathBuf::from(&path)).with_context(|| format!("loading topology from {path}")),
        None => Ok(default_topology()),
    }
}

#[embassy_executor::task(pool_size = 10)]
async fn node_task(mut driver: TickDriver<SimulatedRadioLink, SystemClock, StdRng>) {
    let own_id = driver.engine().own_id();
    if let Err(err) = driver.init().await {
        error!("node {own_id} failed to initialize radio: {err}");
        return;
    }
    info!("node {own_id} online");
    driver.run().await;
}

/// Relays every frame node `from` transmits into node `to`'s inbound queue,
/// as if it had been received at `rssi`. One relay task per directed edge in
/// the topology.
#[embassy_executor::task(pool_size = 64)]
async fn relay_task(from: DrainHandle, to: InjectHandle, rssi: i16) {
    loop {
        let bytes = from.drain().await;
        to.inject(bytes, rssi).await;
    }
}

#[embassy_executor::task]
async fn shutdown_task() {
    embassy_time::Timer::after(embassy_time::Duration::from_millis(DEMO_DURATION.as_millis() as u64)).await;
    info!("demo duration elapsed, exiting");
    std::process::exit(0);
}

fn build_directory(topology: &Topology) -> [Option<Mac>; MAX_NODES] {
    let mut directory = [None; MAX_NODES];
    for node in &topology.nodes {
        directory[node.id as usize] = Some(mac_for(node.id));
    }
    directory
}

fn run(spawner: embassy_executor::Spawner, topology: Topology) -> Result<()> {
    let directory = build_directory(&topology);
    let mut links: Vec<(NodeId, DrainHandle)> = Vec::new();
    let mut injectors: Vec<(NodeId, InjectHandle)> = Vec::new();

    for node in &topology.nodes {
        let identity = IdentityTable::new(node.id, directory).context("building node identity")?;
        let engine = RoutingEngine::new(identity);
        let (radio, inject, drain) = SimulatedRadioLink::new_standalone();
        let clock = SystemClock;
        let rng = StdRng::seed_from_u64(u64::from(node.id) + 1);
        let driver = TickDriver::new(engine, radio, clock, rng);

        spawner.spawn(node_task(driver)).expect("node task pool exhausted");
        links.push((node.id, drain));
        injectors.push((node.id, inject));
    }

    for node in &topology.nodes {
        for &(neighbor_id, rssi) in &node.links {
            let Some((_, drain)) = links.iter().find(|(id, _)| *id == neighbor_id) else {
                continue;
            };
            let Some((_, inject)) = injectors.iter().find(|(id, _)| *id == node.id) else {
                continue;
            };
            spawner
                .spawn(relay_task(drain.clone(), inject.clone(), rssi))
                .expect("relay task pool exhausted");
        }
    }

    spawner.spawn(shutdown_task()).expect("shutdown task already spawned");
    Ok(())
}

fn main() -> Result<()> {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("meshroute_core"), LevelFilter::Debug)
        .parse_default_env()
        .init();

    let topology = load_topology()?;
    info!("starting demo mesh with {} nodes", topology.nodes.len());

    let executor: &'static mut Executor = Box::leak(Box::new(Executor::new()));
    executor.run(|spawner| {
        if let Err(err) = run(spawner, topology) {
            error!("failed to start mesh: {err:?}");
            std::process::exit(1);
        }
    });
}
