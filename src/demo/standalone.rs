//! Standalone entry point: pair two simulated runners and race them locally.

use std::time::Duration;

use actix::prelude::*;
use log::info;

use super::runner::{SimulatedRunner, COLLISION_RATE};
use crate::client::host::{LoggingHost, RaceContext};
use crate::client::pairing::join_and_wait;
use crate::client::sync::{AddScore, Collision, GetRaceStatus, MatchSyncClient};
use crate::config::matchmaking::MAX_LIVES;
use crate::config::race::RaceConfig;
use crate::error::StoreError;
use crate::race::result::MatchResult;
use crate::race::rewards::{PlayerRecord, RewardLedger};
use crate::race::state_machine::RacePhase;
use crate::race::types::{MatchAssignment, PlayerProfile};
use crate::server::match_room::messages::GetMatchRoom;
use crate::server::match_room::server::MatchRegistry;
use crate::server::matchmaking::server::MatchmakingServer;

/// Shorter countdown than the game's, same race rules.
fn demo_config() -> RaceConfig {
    RaceConfig {
        countdown_step: Duration::from_millis(300),
        sync_interval: Duration::from_millis(250),
        ..RaceConfig::default()
    }
}

/// Progress both demo players bring from an earlier session.
fn saved_record() -> PlayerRecord {
    PlayerRecord {
        high_score: 5000,
        wins: 1,
        losses: 1,
        ..Default::default()
    }
}

async fn start_client(
    registry: &Addr<MatchRegistry>,
    assignment: MatchAssignment,
    config: RaceConfig,
) -> Result<Addr<MatchSyncClient>, StoreError> {
    let room = registry.send(GetMatchRoom { match_id: assignment.match_id }).await??;
    let host = LoggingHost::new(assignment.client_id.clone());
    let mut ledger = RewardLedger::default();
    ledger.merge(&saved_record());
    let context = RaceContext::new(Box::new(host), ledger, config);
    Ok(MatchSyncClient::new(assignment, room, context).start())
}

/// Run the demo race to completion and return both results.
pub async fn run() -> Result<Vec<MatchResult>, StoreError> {
    let registry = MatchRegistry::new(MAX_LIVES).start();
    let matchmaking = MatchmakingServer::new(registry.clone()).start();
    let config = demo_config();

    let fox = PlayerProfile::new("demo-fox".into(), Some("Fox".into()), None, Some("explorer".into()));
    let owl = PlayerProfile::new("demo-owl".into(), Some("Owl".into()), None, Some("arctic".into()));

    let (first, second) = tokio::join!(join_and_wait(&matchmaking, fox), join_and_wait(&matchmaking, owl));
    let assignments = [first?, second?];
    for assignment in &assignments {
        info!("[Demo] {} paired as {} in match {}", assignment.client_id, assignment.role, assignment.match_id);
    }

    let mut racers = Vec::new();
    for assignment in assignments {
        let name = assignment.client_id.clone();
        let client = start_client(&registry, assignment, config).await?;
        racers.push((name, SimulatedRunner::new(COLLISION_RATE), client));
    }

    let dt = config.frame_interval.as_secs_f64();
    loop {
        tokio::time::sleep(config.frame_interval).await;

        let mut finished = Vec::new();
        for (name, runner, client) in racers.iter_mut() {
            let status = client.send(GetRaceStatus).await?;
            if status.result.is_some() {
                finished.push((name.clone(), status, runner.speed()));
                continue;
            }
            if status.phase != RacePhase::Racing {
                continue;
            }
            let step = runner.step(dt);
            if step.points > 0 {
                client.do_send(AddScore { points: step.points });
            }
            if step.collided {
                client.do_send(Collision);
            }
        }

        if finished.len() == racers.len() {
            let mut results = Vec::new();
            for (name, status, speed) in finished {
                info!(
                    "[Demo] {} ran {} (top speed {:.1}) against {} at {}, record {:?}",
                    name, status.local.score, speed, status.opponent.profile.client_id, status.opponent.score, status.record
                );
                if let Some(result) = status.result {
                    info!("[Demo] Race over: {}", result);
                    results.push(result);
                }
            }
            return Ok(results);
        }
    }
}
