mod bot;
mod config;
mod events;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use arena::{
    ArenaConfig, ArenaMap, FixedTimestep, HostHandle, LoopbackChannel, LoopbackHub, PacketLossSimulation,
    PeerHandle, PlayerProfile, join,
};
use bot::Bot;
use config::SimConfig;
use events::{PeerTally, log_event, log_scoreboard};

#[derive(Parser)]
#[command(name = "arena-sim")]
#[command(about = "Headless arena session: one host and scripted peers over an in-memory channel")]
struct Args {
    #[arg(
        short,
        long,
        default_value_t = 60,
        value_parser = clap::value_parser!(u32).range(ArenaConfig::MIN_TICK_RATE as i64..),
        help = "Simulation ticks per second"
    )]
    tick_rate: u32,

    #[arg(short, long, default_value_t = 3, help = "Number of peers besides the host")]
    bots: usize,

    #[arg(short, long, default_value_t = 30.0, help = "Simulated seconds to run")]
    duration: f32,

    #[arg(long, help = "Pace ticks against the wall clock")]
    realtime: bool,

    #[arg(long, help = "RNG seed for spawns and bots")]
    seed: Option<u64>,

    #[arg(long, default_value_t = 0.0, help = "Data message loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(long, default_value_t = 0.0, help = "Data message reorder percentage (0-100)")]
    reorder_percent: f32,

    #[arg(long, default_value_t = 30, help = "Ticks between full state resyncs, 0 disables")]
    resync_interval: u32,
}

impl Args {
    fn into_config(self) -> SimConfig {
        let mut config = SimConfig {
            bots: self.bots,
            duration_secs: self.duration,
            realtime: self.realtime,
            ..Default::default()
        };
        config.arena.tick_rate = self.tick_rate;
        config.arena.seed = self.seed;
        config.arena.resync_interval_ticks = self.resync_interval;
        config.arena.max_players = config.arena.max_players.max(self.bots + 1);

        if self.loss_percent > 0.0 || self.reorder_percent > 0.0 {
            config.packet_loss = Some(PacketLossSimulation::lossy(
                self.loss_percent,
                self.reorder_percent,
            ));
        }
        config
    }
}

struct Match {
    host: HostHandle<LoopbackChannel>,
    host_bot: Bot,
    peers: Vec<(PeerHandle<LoopbackChannel>, Bot)>,
    tally: PeerTally,
}

impl Match {
    fn tick(&mut self, now_ms: u64, dt: f32) -> Result<()> {
        let views = self.host.players();
        let input = self.host_bot.decide(now_ms, &views);
        for event in self.host.tick(now_ms, dt, input)? {
            log_event(&event);
        }

        for (peer, bot) in &mut self.peers {
            let input = bot.decide(now_ms, &peer.players());
            for event in peer.tick(now_ms, input) {
                self.tally.record(peer.local(), &event);
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config();
    let seed = config.arena.seed.unwrap_or(0);
    let map = ArenaMap::testing_arena();

    let hub = match &config.packet_loss {
        Some(sim) => LoopbackHub::with_simulation(1, config.arena.max_players, sim.clone(), seed),
        None => LoopbackHub::new(1, config.arena.max_players),
    };

    let host = join(hub.channel(), PlayerProfile::new("host", [230, 80, 60]), config.arena.clone(), &map)
        .await?
        .into_host()
        .context("first peer was not granted host authority")?;
    let host_bot = Bot::new(host.local(), seed);

    let mut peers = Vec::with_capacity(config.bots);
    for i in 0..config.bots {
        let profile = PlayerProfile::new(format!("bot{}", i + 1), [60, 120 + (i as u8 % 4) * 30, 230]);
        let peer = join(hub.channel(), profile, config.arena.clone(), &map)
            .await?
            .into_peer()
            .context("late peer was granted host authority")?;
        let bot = Bot::new(peer.local(), seed);
        peers.push((peer, bot));
    }

    log::info!(
        "running {} players for {:.1}s at {} Hz",
        config.bots + 1,
        config.duration_secs,
        config.arena.tick_rate
    );

    let mut game = Match {
        host,
        host_bot,
        peers,
        tally: PeerTally::default(),
    };

    let mut timestep = FixedTimestep::new(config.arena.tick_rate);
    let total_ticks = config.total_ticks();
    let mut interval = tokio::time::interval(Duration::from_secs_f32(timestep.dt()));

    while timestep.tick() < total_ticks {
        if config.realtime {
            interval.tick().await;
        }
        timestep.accumulate(timestep.dt());
        while timestep.consume_tick() {
            let now_ms = timestep.now_ms();
            game.tick(now_ms, timestep.dt())?;
        }
    }

    let stats = hub.stats();
    log::info!(
        "channel: {} sent, {} delivered, {} dropped ({:.1}%), {} reordered",
        stats.messages_sent,
        stats.messages_received,
        stats.messages_dropped,
        stats.loss_percent(),
        stats.messages_reordered
    );
    log::info!(
        "peers observed {} deaths and {} respawns",
        game.tally.deaths_seen,
        game.tally.respawns_seen
    );

    log_scoreboard("host scoreboard", &game.host.scoreboard());
    if let Some((peer, _)) = game.peers.first() {
        log_scoreboard(&format!("as seen by player {}", peer.local()), &peer.scoreboard());
    }

    for (peer, _) in game.peers {
        peer.quit();
    }
    game.host.quit();
    Ok(())
}
