use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::bullet::BulletSnapshot;
use crate::replication::PlayerField;
use crate::session::{PlayerId, PlayerProfile, SessionId};

use super::channel::{Admission, Channel, ChannelError};
use super::protocol::{Envelope, Message, StateUpdate};
use super::stats::{NetworkStats, PacketLossSimulation};

/// Sender id used for messages the hub itself emits.
const HUB_SENDER: PlayerId = 0;

#[derive(Debug, Default)]
struct Inbox {
    queue: VecDeque<Vec<u8>>,
    /// Entries before this index may not be reordered.
    fence: usize,
}

#[derive(Debug)]
struct HubState {
    session_id: SessionId,
    capacity: usize,
    next_player: PlayerId,
    host: Option<PlayerId>,
    members: Vec<(PlayerId, PlayerProfile)>,
    inboxes: HashMap<PlayerId, Inbox>,
    retained: BTreeMap<(PlayerId, PlayerField), StateUpdate>,
    latest_bullets: Option<BulletSnapshot>,
    hub_sequence: u32,
    sim: PacketLossSimulation,
    rng: StdRng,
    stats: NetworkStats,
    closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Reliable,
    Lossy,
}

impl HubState {
    fn admit(&mut self, profile: PlayerProfile) -> Result<Admission, ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        if self.members.len() >= self.capacity {
            log::warn!(
                "rejected {}: session {} is full",
                profile.name,
                self.session_id
            );
            return Err(ChannelError::SessionFull {
                capacity: self.capacity,
            });
        }

        let player = self.next_player;
        self.next_player += 1;
        let host = *self.host.get_or_insert(player);

        self.inboxes.insert(player, Inbox::default());

        let existing: Vec<Message> = self
            .members
            .iter()
            .map(|(id, profile)| Message::Joined {
                player: *id,
                profile: profile.clone(),
            })
            .collect();
        for message in existing {
            self.deliver_from_hub(player, message);
        }

        self.members.push((player, profile.clone()));
        self.broadcast_from_hub(Message::Joined { player, profile });

        // Late joiners start from the last retained value of every field.
        let replay: Vec<Message> = self
            .retained
            .values()
            .copied()
            .map(Message::State)
            .chain(self.latest_bullets.clone().map(Message::Bullets))
            .collect();
        for message in replay {
            self.deliver_from_hub(player, message);
        }

        log::info!(
            "player {} joined session {} (host {})",
            player,
            self.session_id,
            host
        );

        Ok(Admission {
            session_id: self.session_id,
            local_player: player,
            host,
        })
    }

    fn leave(&mut self, player: PlayerId) {
        let Some(index) = self.members.iter().position(|(id, _)| *id == player) else {
            return;
        };
        self.members.remove(index);
        self.inboxes.remove(&player);
        self.retained.retain(|(id, _), _| *id != player);

        if self.host == Some(player) {
            log::warn!("host {} left session {}", player, self.session_id);
        }
        self.broadcast_from_hub(Message::Quit { player });
    }

    fn route(&mut self, envelope: Envelope) {
        self.stats.messages_sent += 1;
        let sender = envelope.sender;

        match &envelope.message {
            Message::Joined { .. } | Message::Quit { .. } => {
                log::warn!("peer {} sent a membership message, ignored", sender);
            }
            Message::Input { .. } => match self.host {
                Some(host) if host != sender => self.deliver(host, &envelope, Delivery::Lossy),
                _ => {}
            },
            Message::State(update) => {
                if self.host != Some(sender) {
                    log::warn!("state update from non-host {} dropped", sender);
                    return;
                }
                let slot = (update.player, update.value.field());
                let newer = self
                    .retained
                    .get(&slot)
                    .is_none_or(|held| held.version <= update.version);
                if newer && self.members.iter().any(|(id, _)| *id == update.player) {
                    self.retained.insert(slot, *update);
                }
                self.deliver_to_others(sender, &envelope);
            }
            Message::Bullets(snapshot) => {
                if self.host != Some(sender) {
                    log::warn!("bullet snapshot from non-host {} dropped", sender);
                    return;
                }
                self.latest_bullets = Some(snapshot.clone());
                self.deliver_to_others(sender, &envelope);
            }
        }
    }

    fn deliver_to_others(&mut self, sender: PlayerId, envelope: &Envelope) {
        let targets: Vec<PlayerId> = self
            .members
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| *id != sender)
            .collect();
        for target in targets {
            self.deliver(target, envelope, Delivery::Lossy);
        }
    }

    fn broadcast_from_hub(&mut self, message: Message) {
        let targets: Vec<PlayerId> = self.members.iter().map(|(id, _)| *id).collect();
        let envelope = self.hub_envelope(message);
        for target in targets {
            self.deliver(target, &envelope, Delivery::Reliable);
        }
    }

    fn deliver_from_hub(&mut self, target: PlayerId, message: Message) {
        let envelope = self.hub_envelope(message);
        self.deliver(target, &envelope, Delivery::Reliable);
    }

    fn hub_envelope(&mut self, message: Message) -> Envelope {
        let sequence = self.hub_sequence;
        self.hub_sequence = self.hub_sequence.wrapping_add(1);
        Envelope::new(HUB_SENDER, sequence, message)
    }

    fn deliver(&mut self, target: PlayerId, envelope: &Envelope, delivery: Delivery) {
        let bytes = match envelope.serialize() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("failed to encode message for {}: {}", target, e);
                return;
            }
        };

        if delivery == Delivery::Lossy && self.sim.should_drop(&mut self.rng) {
            self.stats.messages_dropped += 1;
            return;
        }
        let reorder = delivery == Delivery::Lossy && self.sim.should_reorder(&mut self.rng);

        let Some(inbox) = self.inboxes.get_mut(&target) else {
            return;
        };
        self.stats.bytes_sent += bytes.len() as u64;
        inbox.queue.push_back(bytes);

        match delivery {
            Delivery::Reliable => inbox.fence = inbox.queue.len(),
            Delivery::Lossy => {
                let len = inbox.queue.len();
                if reorder && len >= inbox.fence + 2 {
                    inbox.queue.swap(len - 1, len - 2);
                    self.stats.messages_reordered += 1;
                }
            }
        }
    }

    fn drain(&mut self, player: PlayerId) -> Vec<Message> {
        let Some(inbox) = self.inboxes.get_mut(&player) else {
            return Vec::new();
        };
        inbox.fence = 0;
        let raw: Vec<Vec<u8>> = inbox.queue.drain(..).collect();

        let mut messages = Vec::with_capacity(raw.len());
        for bytes in raw {
            self.stats.bytes_received += bytes.len() as u64;
            match Envelope::deserialize(&bytes) {
                Ok(envelope) => {
                    self.stats.messages_received += 1;
                    messages.push(envelope.message);
                }
                Err(e) => log::warn!("dropping undecodable message for {}: {}", player, e),
            }
        }
        messages
    }
}

/// In-process session hub. Every peer holds a [`LoopbackChannel`] onto the same hub.
#[derive(Debug, Clone)]
pub struct LoopbackHub {
    inner: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    pub fn new(session_id: SessionId, capacity: usize) -> Self {
        Self::with_simulation(session_id, capacity, PacketLossSimulation::default(), 0)
    }

    pub fn with_simulation(
        session_id: SessionId,
        capacity: usize,
        sim: PacketLossSimulation,
        seed: u64,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubState {
                session_id,
                capacity,
                next_player: 1,
                host: None,
                members: Vec::new(),
                inboxes: HashMap::new(),
                retained: BTreeMap::new(),
                latest_bullets: None,
                hub_sequence: 0,
                sim,
                rng: StdRng::seed_from_u64(seed),
                stats: NetworkStats::default(),
                closed: false,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, HubState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn channel(&self) -> LoopbackChannel {
        LoopbackChannel {
            hub: self.clone(),
            local: None,
            sequence: 0,
        }
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.state().host
    }

    pub fn members(&self) -> Vec<PlayerId> {
        self.state().members.iter().map(|(id, _)| *id).collect()
    }

    pub fn set_simulation(&self, sim: PacketLossSimulation) {
        self.state().sim = sim;
    }

    pub fn stats(&self) -> NetworkStats {
        self.state().stats.clone()
    }

    pub fn close(&self) {
        self.state().closed = true;
    }
}

#[derive(Debug)]
pub struct LoopbackChannel {
    hub: LoopbackHub,
    local: Option<PlayerId>,
    sequence: u32,
}

impl LoopbackChannel {
    fn admit_now(&mut self, profile: PlayerProfile) -> Result<Admission, ChannelError> {
        if let Some(local) = self.local {
            log::warn!("channel already admitted as {}", local);
        }
        let admission = self.hub.state().admit(profile)?;
        self.local = Some(admission.local_player);
        Ok(admission)
    }
}

impl Channel for LoopbackChannel {
    async fn admit(&mut self, profile: PlayerProfile) -> Result<Admission, ChannelError> {
        self.admit_now(profile)
    }

    fn send(&mut self, message: Message) {
        let Some(sender) = self.local else {
            log::warn!("send before admission dropped");
            return;
        };
        let envelope = Envelope::new(sender, self.sequence, message);
        self.sequence = self.sequence.wrapping_add(1);
        self.hub.state().route(envelope);
    }

    fn receive(&mut self) -> Vec<Message> {
        match self.local {
            Some(player) => self.hub.state().drain(player),
            None => Vec::new(),
        }
    }

    fn leave(&mut self) {
        if let Some(player) = self.local.take() {
            self.hub.state().leave(player);
        }
    }
}

impl Drop for LoopbackChannel {
    fn drop(&mut self) {
        self.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputFrame;
    use crate::replication::FieldValue;

    fn profile(name: &str) -> PlayerProfile {
        PlayerProfile::new(name, [10, 20, 30])
    }

    fn state(player: PlayerId, version: u64, health: u8) -> Message {
        Message::State(StateUpdate {
            player,
            version,
            value: FieldValue::Health(health),
        })
    }

    #[tokio::test]
    async fn first_admitted_peer_is_host() {
        let hub = LoopbackHub::new(1, 4);
        let mut a = hub.channel();
        let mut b = hub.channel();

        let first = a.admit(profile("a")).await.unwrap();
        let second = b.admit(profile("b")).await.unwrap();

        assert!(first.is_host());
        assert!(!second.is_host());
        assert_eq!(second.host, first.local_player);
    }

    #[tokio::test]
    async fn capacity_is_enforced() {
        let hub = LoopbackHub::new(1, 1);
        let mut a = hub.channel();
        let mut b = hub.channel();

        a.admit(profile("a")).await.unwrap();
        let err = b.admit(profile("b")).await.unwrap_err();
        assert_eq!(err, ChannelError::SessionFull { capacity: 1 });
    }

    #[tokio::test]
    async fn closed_hub_rejects_admission() {
        let hub = LoopbackHub::new(1, 4);
        hub.close();
        assert_eq!(
            hub.channel().admit(profile("a")).await.unwrap_err(),
            ChannelError::Closed
        );
    }

    #[tokio::test]
    async fn joiner_sees_existing_members_then_itself() {
        let hub = LoopbackHub::new(1, 4);
        let mut a = hub.channel();
        let mut b = hub.channel();
        let host = a.admit(profile("a")).await.unwrap().local_player;
        let joiner = b.admit(profile("b")).await.unwrap().local_player;

        let joined: Vec<PlayerId> = b
            .receive()
            .into_iter()
            .filter_map(|m| match m {
                Message::Joined { player, .. } => Some(player),
                _ => None,
            })
            .collect();
        assert_eq!(joined, vec![host, joiner]);
    }

    #[tokio::test]
    async fn late_joiner_receives_retained_state() {
        let hub = LoopbackHub::new(1, 4);
        let mut host = hub.channel();
        let host_id = host.admit(profile("host")).await.unwrap().local_player;

        host.send(state(host_id, 1, 100));
        host.send(state(host_id, 5, 70));

        let mut late = hub.channel();
        late.admit(profile("late")).await.unwrap();

        let states: Vec<Message> = late
            .receive()
            .into_iter()
            .filter(|m| matches!(m, Message::State(_)))
            .collect();
        assert_eq!(states, vec![state(host_id, 5, 70)]);
    }

    #[tokio::test]
    async fn input_goes_to_host_only() {
        let hub = LoopbackHub::new(1, 4);
        let mut host = hub.channel();
        let mut b = hub.channel();
        let mut c = hub.channel();
        host.admit(profile("host")).await.unwrap();
        let b_id = b.admit(profile("b")).await.unwrap().local_player;
        c.admit(profile("c")).await.unwrap();
        host.receive();
        c.receive();

        b.send(Message::Input {
            player: b_id,
            input: InputFrame::moving_at(0.0),
        });

        assert_eq!(host.receive().len(), 1);
        assert!(c.receive().is_empty());
    }

    #[tokio::test]
    async fn non_host_state_is_dropped() {
        let hub = LoopbackHub::new(1, 4);
        let mut host = hub.channel();
        let mut b = hub.channel();
        host.admit(profile("host")).await.unwrap();
        let b_id = b.admit(profile("b")).await.unwrap().local_player;
        host.receive();

        b.send(state(b_id, 1, 0));

        assert!(host.receive().is_empty());
    }

    #[tokio::test]
    async fn quit_is_broadcast_on_drop() {
        let hub = LoopbackHub::new(1, 4);
        let mut host = hub.channel();
        host.admit(profile("host")).await.unwrap();
        let b_id = {
            let mut b = hub.channel();
            b.admit(profile("b")).await.unwrap().local_player
        };

        let messages = host.receive();
        assert_eq!(messages.last(), Some(&Message::Quit { player: b_id }));
        assert_eq!(hub.members().len(), 1);
    }

    #[tokio::test]
    async fn loss_never_touches_membership() {
        let hub = LoopbackHub::with_simulation(1, 4, PacketLossSimulation::lossy(100.0, 0.0), 7);
        let mut host = hub.channel();
        let mut b = hub.channel();
        let host_id = host.admit(profile("host")).await.unwrap().local_player;
        b.admit(profile("b")).await.unwrap();

        host.send(state(host_id, 1, 50));

        let messages = b.receive();
        assert!(messages.iter().all(Message::is_system));
        assert_eq!(messages.len(), 2);
        assert!(hub.stats().messages_dropped >= 1);
    }

    #[tokio::test]
    async fn reordering_stays_behind_membership() {
        let hub = LoopbackHub::with_simulation(1, 4, PacketLossSimulation::lossy(0.0, 100.0), 7);
        let mut host = hub.channel();
        let mut b = hub.channel();
        let host_id = host.admit(profile("host")).await.unwrap().local_player;
        b.admit(profile("b")).await.unwrap();

        host.send(state(host_id, 1, 90));
        host.send(state(host_id, 2, 80));

        let messages = b.receive();
        assert!(messages[0].is_system());
        assert!(messages[1].is_system());
        assert_eq!(&messages[2..], &[state(host_id, 2, 80), state(host_id, 1, 90)]);
    }
}
