mod config;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use parkour::{
    LinkConditions, ModeObserver, MovementMode, NetConfig, Session, SessionConfig, TestingGround,
};

use config::SimConfig;
use scenario::Scenario;

#[derive(Parser)]
#[command(name = "parkour-sim")]
#[command(about = "Headless parkour movement session over a simulated link")]
struct Args {
    #[arg(short, long, value_enum, default_value_t = Scenario::Parkour)]
    scenario: Scenario,

    #[arg(short, long, default_value_t = parkour::net::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(long, default_value_t = 600)]
    ticks: u64,

    #[arg(long, default_value_t = 300, help = "Ticks of scripted input before idling")]
    active_ticks: u64,

    #[arg(long, default_value_t = 144, help = "Frames per second fed to the timestep")]
    frame_rate: u32,

    #[arg(long, default_value_t = 3, help = "One-way latency in ticks")]
    latency: u32,

    #[arg(long, default_value_t = 0, help = "Extra random delay in ticks")]
    jitter: u32,

    #[arg(long, default_value_t = 0.0, help = "Packet loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, help = "Send every move on its own")]
    no_combine: bool,
}

/// Mirrors mode changes into the log.
struct ModeLogger;

impl ModeObserver for ModeLogger {
    fn on_mode_changed(&mut self, previous: MovementMode, current: MovementMode) {
        log::info!("mode {previous:?} -> {current:?}");
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let link = LinkConditions {
        latency_ticks: args.latency,
        jitter_ticks: args.jitter,
        loss_percent: args.loss_percent.clamp(0.0, 100.0),
    };
    let config = SimConfig {
        scenario: args.scenario,
        ticks: args.ticks,
        active_ticks: args.active_ticks,
        frame_rate: args.frame_rate.max(1),
        session: SessionConfig {
            tick_rate: args.tick_rate,
            net: NetConfig {
                combine_moves: !args.no_combine,
                ..Default::default()
            },
            uplink: link,
            downlink: link,
            seed: args.seed,
        },
        ..Default::default()
    };

    run(&config)
}

fn run(config: &SimConfig) -> Result<()> {
    config.movement.validate().context("invalid movement config")?;
    config.session.net.validate().context("invalid net config")?;

    let world = TestingGround::new().build_world();
    let mut session = Session::new(
        world,
        config.scenario.spawn(),
        config.movement.clone(),
        config.session.clone(),
    );
    session.client_mut().set_observer(Box::new(ModeLogger));

    log::info!(
        "running {:?} for {} ticks at {} Hz",
        config.scenario,
        config.ticks,
        config.session.tick_rate
    );

    let frame_time = 1.0 / config.frame_rate as f32;
    while session.tick() < config.ticks {
        let input = config.scenario.input(session.tick(), config.active_ticks);
        session
            .advance(frame_time, input)
            .with_context(|| format!("session failed at tick {}", session.tick()))?;
    }
    session.flush()?;

    report(&session);
    Ok(())
}

fn report(session: &Session) {
    let client = session.client();
    let server = session.server().component();
    let drift = (client.position() - server.position()).length();
    let prediction = session.prediction().stats();
    let server_stats = session.server().stats();
    let uplink = session.uplink().stats();
    let downlink = session.downlink().stats();

    log::info!(
        "client {} in {:?}, server {} in {:?}, drift {drift:.4} m",
        client.position(),
        client.movement_mode(),
        server.position(),
        server.movement_mode()
    );
    log::info!(
        "moves sent {} combined {} replayed {}, corrections {}",
        prediction.moves_sent,
        prediction.moves_combined,
        prediction.moves_replayed,
        prediction.corrections
    );
    log::info!(
        "server processed {} stale {} rejected {} corrected {}",
        server_stats.processed,
        server_stats.stale,
        server_stats.rejected,
        server_stats.corrections
    );
    log::info!(
        "uplink {}/{} dropped, downlink {}/{} dropped",
        uplink.dropped,
        uplink.sent,
        downlink.dropped,
        downlink.sent
    );
}
