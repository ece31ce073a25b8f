use glam::Vec3;

use crate::movement::Animation;
use crate::session::PlayerId;

/// Read-only snapshot of one player for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub color: [u8; 3],
    pub position: Vec3,
    pub health: u8,
    pub dead: bool,
    pub kills: u32,
    pub deaths: u32,
    pub animation: Animation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreLine {
    pub id: PlayerId,
    pub name: String,
    pub kills: u32,
    pub deaths: u32,
}

/// Kill-sorted scoreboard. Ties keep roster order after fewer deaths.
pub fn scoreboard(players: &[PlayerView]) -> Vec<ScoreLine> {
    let mut lines: Vec<ScoreLine> = players
        .iter()
        .map(|p| ScoreLine {
            id: p.id,
            name: p.name.clone(),
            kills: p.kills,
            deaths: p.deaths,
        })
        .collect();
    lines.sort_by(|a, b| b.kills.cmp(&a.kills).then(a.deaths.cmp(&b.deaths)));
    lines
}
