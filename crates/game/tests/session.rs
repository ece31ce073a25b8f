use glam::Vec3;

use arena::{
    ArenaConfig, ArenaMap, FieldValue, GameEvent, HostHandle, InputFrame, LoopbackChannel,
    LoopbackHub, PacketLossSimulation, PeerHandle, PlayerField, PlayerId, PlayerProfile,
    SessionError, join,
};

const DT: f32 = 1.0 / 60.0;

fn config() -> ArenaConfig {
    ArenaConfig {
        gravity: 0.0,
        seed: Some(11),
        ..Default::default()
    }
}

fn map() -> ArenaMap {
    ArenaMap::new()
        .with_marker("spawn_0", Vec3::new(-20.0, 0.0, -20.0))
        .with_marker("spawn_1", Vec3::new(20.0, 0.0, 20.0))
        .with_marker("spawn_2", Vec3::new(20.0, 0.0, -20.0))
}

fn spawn_points() -> Vec<Vec3> {
    map().markers().iter().map(|m| m.position).collect()
}

async fn host_on(hub: &LoopbackHub) -> HostHandle<LoopbackChannel> {
    join(hub.channel(), PlayerProfile::new("a", [255, 0, 0]), config(), &map())
        .await
        .unwrap()
        .into_host()
        .unwrap()
}

async fn peer_on(hub: &LoopbackHub, name: &str) -> PeerHandle<LoopbackChannel> {
    join(hub.channel(), PlayerProfile::new(name, [0, 0, 255]), config(), &map())
        .await
        .unwrap()
        .into_peer()
        .unwrap()
}

/// Host A and peer B, with A at the origin facing B three units down +Z.
struct Duel {
    hub: LoopbackHub,
    host: HostHandle<LoopbackChannel>,
    peer: PeerHandle<LoopbackChannel>,
    tick: u64,
}

impl Duel {
    async fn start() -> Self {
        let hub = LoopbackHub::new(1, 8);
        let host = host_on(&hub).await;
        let peer = peer_on(&hub, "b").await;
        let mut duel = Self {
            hub,
            host,
            peer,
            tick: 0,
        };

        duel.step(InputFrame::idle(), InputFrame::idle());
        let (a, b) = (duel.a(), duel.b());
        duel.host.teleport(a, Vec3::ZERO).unwrap();
        duel.host.teleport(b, Vec3::new(0.0, 0.0, 3.0)).unwrap();
        // Let the peer's smoothing settle on the new positions.
        duel.run(60, InputFrame::idle());
        duel
    }

    fn a(&self) -> PlayerId {
        self.host.local()
    }

    fn b(&self) -> PlayerId {
        self.peer.local()
    }

    fn now(&self) -> u64 {
        self.tick * 1000 / 60
    }

    fn step(&mut self, host_input: InputFrame, peer_input: InputFrame) -> (Vec<GameEvent>, Vec<GameEvent>) {
        let now = self.now();
        let host_events = self.host.tick(now, DT, host_input).unwrap();
        let peer_events = self.peer.tick(now, peer_input);
        self.tick += 1;
        (host_events, peer_events)
    }

    fn run(&mut self, ticks: u64, host_input: InputFrame) -> (Vec<GameEvent>, Vec<GameEvent>) {
        let mut host_events = Vec::new();
        let mut peer_events = Vec::new();
        for _ in 0..ticks {
            let (h, p) = self.step(host_input, InputFrame::idle());
            host_events.extend(h);
            peer_events.extend(p);
        }
        (host_events, peer_events)
    }
}

#[tokio::test]
async fn exactly_one_host_per_session() {
    let hub = LoopbackHub::new(9, 8);
    let host = host_on(&hub).await;
    let b = peer_on(&hub, "b").await;
    let c = peer_on(&hub, "c").await;

    assert!(host.is_host());
    assert!(!b.is_host());
    assert!(!c.is_host());
    assert_eq!(b.session().host, host.local());
    assert_eq!(c.session().host, host.local());
    assert_eq!(hub.host(), Some(host.local()));
}

#[tokio::test]
async fn full_session_rejects_join() {
    let hub = LoopbackHub::new(1, 1);
    let _host = host_on(&hub).await;

    let result = join(hub.channel(), PlayerProfile::default(), config(), &map()).await;
    assert!(matches!(result, Err(SessionError::SessionFull { capacity: 1 })));
}

#[tokio::test]
async fn host_without_spawn_markers_fails_loudly() {
    let hub = LoopbackHub::new(1, 4);
    let result = join(hub.channel(), PlayerProfile::default(), config(), &ArenaMap::new()).await;
    assert!(matches!(result, Err(SessionError::MissingSpawnPoint)));
}

#[tokio::test]
async fn joined_players_start_with_initial_state() {
    let duel = Duel::start().await;
    let b = duel.b();

    assert_eq!(duel.peer.get_state(b, PlayerField::Health), FieldValue::Health(100));
    assert_eq!(duel.peer.get_state(b, PlayerField::Dead), FieldValue::Dead(false));
    assert_eq!(duel.peer.get_state(b, PlayerField::Kills), FieldValue::Kills(0));
    assert_eq!(duel.peer.get_state(b, PlayerField::Deaths), FieldValue::Deaths(0));
    assert_eq!(duel.host.list_players().count(), 2);
    assert_eq!(duel.peer.list_players().count(), 2);
}

#[tokio::test]
async fn hit_reduces_health_everywhere() {
    let mut duel = Duel::start().await;
    let (a, b) = (duel.a(), duel.b());

    let (host_events, peer_events) = duel.run(30, InputFrame::idle().with_fire(true));

    assert!(host_events.contains(&GameEvent::PlayerDamaged {
        victim: b,
        attacker: a,
        health: 90,
    }));
    assert!(peer_events.contains(&GameEvent::PlayerHurt { player: b, health: 90 }));
    assert_eq!(duel.host.get_state(b, PlayerField::Health), FieldValue::Health(90));
    assert_eq!(duel.peer.get_state(b, PlayerField::Health), FieldValue::Health(90));
    assert_eq!(duel.peer.get_state(b, PlayerField::Dead), FieldValue::Dead(false));
}

#[tokio::test]
async fn lethal_hit_kills_scores_and_respawns() {
    let mut duel = Duel::start().await;
    let (a, b) = (duel.a(), duel.b());
    assert!(duel.host.set_health(b, 5).unwrap());

    let mut died_at = None;
    for _ in 0..30 {
        let now = duel.now();
        let (events, _) = duel.step(InputFrame::idle().with_fire(true), InputFrame::idle());
        if events.contains(&GameEvent::PlayerKilled { victim: b, killer: a }) {
            died_at = Some(now);
            break;
        }
    }
    let died_at = died_at.unwrap();

    for view in [duel.host.players(), duel.peer.players()] {
        let victim = view.iter().find(|p| p.id == b).unwrap();
        assert_eq!(victim.health, 0);
        assert!(victim.dead);
        assert_eq!(victim.deaths, 1);
        let killer = view.iter().find(|p| p.id == a).unwrap();
        assert_eq!(killer.kills, 1);
    }
    let body = duel.host.simulation().body(b).unwrap();
    assert!(!duel.host.simulation().physics().is_enabled(body));

    // Dead players ignore further hits.
    duel.run(30, InputFrame::idle());
    duel.run(40, InputFrame::idle().with_fire(true));
    assert_eq!(duel.host.get_state(b, PlayerField::Deaths), FieldValue::Deaths(1));
    assert_eq!(duel.host.get_state(b, PlayerField::Health), FieldValue::Health(0));

    let mut respawned_at = None;
    for _ in 0..200 {
        let now = duel.now();
        let (events, _) = duel.step(InputFrame::idle(), InputFrame::idle());
        if events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerRespawned { player, .. } if *player == b))
        {
            respawned_at = Some(now);
            break;
        }
    }
    let respawned_at = respawned_at.unwrap();
    assert!(respawned_at >= died_at + 2_000);
    assert!(respawned_at < died_at + 2_000 + 17);

    assert_eq!(duel.peer.get_state(b, PlayerField::Dead), FieldValue::Dead(false));
    assert_eq!(duel.peer.get_state(b, PlayerField::Health), FieldValue::Health(100));
    let position = duel.host.get_state(b, PlayerField::Position).as_position().unwrap();
    assert!(spawn_points().contains(&position));
    assert!(duel.host.simulation().physics().is_enabled(body));
}

#[tokio::test]
async fn fire_rate_suppresses_rapid_presses() {
    let mut duel = Duel::start().await;
    let a = duel.a();
    duel.host.teleport(duel.b(), Vec3::new(10.0, 0.0, -10.0)).unwrap();

    let fire = InputFrame::idle().with_fire(true);
    let idle = InputFrame::idle();
    let base = 10_000;
    let mut fired = Vec::new();
    for (offset, input) in [(0, fire), (50, idle), (100, fire), (200, idle), (400, fire)] {
        let events = duel.host.tick(base + offset, DT, input).unwrap();
        fired.extend(events.into_iter().filter_map(|e| match e {
            GameEvent::BulletFired { bullet } => Some(bullet),
            _ => None,
        }));
    }

    assert_eq!(fired.len(), 2);
    assert!(fired.iter().all(|b| b.owner == a));
    assert_eq!(fired[1].fired_at_ms - fired[0].fired_at_ms, 400);
}

#[tokio::test]
async fn replica_write_is_rejected() {
    let mut duel = Duel::start().await;
    let b = duel.b();

    let result = duel.peer.try_set_state(b, FieldValue::Health(0));

    assert!(matches!(result, Err(SessionError::NotAuthorized)));
    duel.run(2, InputFrame::idle());
    assert_eq!(duel.peer.get_state(b, PlayerField::Health), FieldValue::Health(100));
    assert_eq!(duel.host.get_state(b, PlayerField::Health), FieldValue::Health(100));
}

#[tokio::test]
async fn peer_input_drives_host_physics() {
    let mut duel = Duel::start().await;
    let b = duel.b();

    for _ in 0..20 {
        duel.step(InputFrame::idle(), InputFrame::moving_at(std::f32::consts::FRAC_PI_2));
    }

    let authoritative = duel.host.get_state(b, PlayerField::Position).as_position().unwrap();
    assert!(authoritative.x > 0.0);

    let smoothed = duel.peer.players().into_iter().find(|p| p.id == b).unwrap();
    assert!(smoothed.position.x > 0.0);
    assert!(smoothed.position.x <= authoritative.x);
}

#[tokio::test]
async fn peer_mirrors_bullet_set() {
    let mut duel = Duel::start().await;
    duel.host.teleport(duel.b(), Vec3::new(10.0, 0.0, -10.0)).unwrap();

    duel.run(2, InputFrame::idle().with_fire(true));

    assert_eq!(duel.peer.bullets().len(), 1);
    assert_eq!(duel.peer.bullets()[0].owner, duel.a());
    assert_eq!(duel.peer.bullets()[0].damage, 10);
}

#[tokio::test]
async fn late_joiner_sees_current_state() {
    let mut duel = Duel::start().await;
    let a = duel.a();
    duel.host.set_health(a, 40).unwrap();
    duel.run(1, InputFrame::idle());

    let mut late = peer_on(&duel.hub, "c").await;
    late.tick(duel.now(), InputFrame::idle());

    assert_eq!(late.get_state(a, PlayerField::Health), FieldValue::Health(40));
    assert_eq!(late.list_players().count(), 3);
}

#[tokio::test]
async fn quit_removes_player_everywhere() {
    let mut duel = Duel::start().await;
    let c = peer_on(&duel.hub, "c").await;
    let c_id = c.local();
    duel.run(1, InputFrame::idle());
    assert_eq!(duel.peer.list_players().count(), 3);

    c.quit();
    let (host_events, peer_events) = duel.run(1, InputFrame::idle());

    assert!(host_events.contains(&GameEvent::PlayerLeft { player: c_id }));
    assert!(peer_events.contains(&GameEvent::PlayerLeft { player: c_id }));
    assert_eq!(duel.host.list_players().count(), 2);
    assert_eq!(duel.peer.list_players().count(), 2);
}

#[tokio::test]
async fn lossy_channel_converges_through_resync() {
    let mut duel = Duel::start().await;
    let b = duel.b();
    duel.hub
        .set_simulation(PacketLossSimulation::lossy(50.0, 50.0));

    duel.host.set_health(b, 40).unwrap();
    duel.run(300, InputFrame::idle());

    assert_eq!(duel.peer.get_state(b, PlayerField::Health), FieldValue::Health(40));
    assert!(duel.hub.stats().messages_dropped > 0);
}
