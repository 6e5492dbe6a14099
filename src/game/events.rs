//! Domain events and the presentation event bus
//!
//! The rule core emits discrete notifications toward the presentation layer
//! and, for the animated ones, awaits a matching acknowledgement before
//! proceeding. Awaits are bounded: a missing acknowledgement is absorbed by
//! proceeding, never by hanging.

use crate::core::{PlayerId, Position};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Duration};

/// Notifications emitted toward the presentation/animation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    UnitMoved { from: Position, to: Position },
    UnitAttacked { attacker: Position, target: Position },
    UnitDamaged { pos: Position },
    UnitFlipped { pos: Position, face_down: bool },
    UnitRemoved { pos: Position },
    UnitHealed { pos: Position },
    UnitStatModified { pos: Position },
    HighlightsCleared,
    TurnStarted { owner: PlayerId },
    TurnEnded { owner: PlayerId },
}

/// Acknowledgement kinds the presentation layer sends back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckKind {
    AttackAnimDone,
    FlipAnimDone,
    DamageAnimDone,
    DeathAnimDone,
    HealAnimDone,
}

/// An acknowledgement, correlated to the original notification's position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckEvent {
    pub kind: AckKind,
    pub pos: Position,
}

const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_STEP_PAUSE_SECS: f32 = 0.1;

/// Event channel between the rule core and a presentation layer
///
/// Headless mode (tests, terminal play) has no channels: acknowledgements
/// resolve immediately and timed waits are skipped. Every emitted event is
/// also recorded in an in-memory log regardless of mode.
#[derive(Debug)]
pub struct EventBus {
    tx: Option<mpsc::UnboundedSender<GameEvent>>,
    ack_rx: Option<mpsc::UnboundedReceiver<AckEvent>>,
    ack_timeout: Duration,
    time_scale: f32,
    step_pause_secs: f32,
    log: Vec<GameEvent>,
}

impl EventBus {
    /// No presentation attached; everything resolves immediately
    pub fn headless() -> Self {
        EventBus {
            tx: None,
            ack_rx: None,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            time_scale: 0.0,
            step_pause_secs: 0.0,
            log: Vec::new(),
        }
    }

    /// Wired to a presentation layer that animates events and acks them
    pub fn attached(
        tx: mpsc::UnboundedSender<GameEvent>,
        ack_rx: mpsc::UnboundedReceiver<AckEvent>,
    ) -> Self {
        EventBus {
            tx: Some(tx),
            ack_rx: Some(ack_rx),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            time_scale: 1.0,
            step_pause_secs: DEFAULT_STEP_PAUSE_SECS,
            log: Vec::new(),
        }
    }

    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    /// Scale factor applied to Wait steps and pauses (0 disables sleeping)
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.log.push(event);
        if let Some(tx) = &self.tx {
            // a closed receiver is a presentation that went away; not an error
            let _ = tx.send(event);
        }
    }

    /// Await the matching acknowledgement, bounded by the ack timeout
    ///
    /// Returns false when the wait was absorbed (timeout or closed channel);
    /// execution proceeds either way.
    pub async fn wait_for(&mut self, kind: AckKind, pos: Position) -> bool {
        let Some(rx) = &mut self.ack_rx else {
            return true;
        };
        let matching = async {
            loop {
                match rx.recv().await {
                    Some(ack) if ack.kind == kind && ack.pos == pos => break true,
                    Some(_) => continue,
                    None => break false,
                }
            }
        };
        timeout(self.ack_timeout, matching).await.unwrap_or(false)
    }

    /// Suspend for a scaled duration; cooperative yield when scaled to zero
    pub async fn wait_secs(&self, seconds: f32) {
        let scaled = seconds * self.time_scale;
        if scaled > 0.0 {
            sleep(Duration::from_secs_f32(scaled)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }

    /// Brief suspension between action steps for presentation catch-up
    pub async fn step_pause(&self) {
        self.wait_secs(self.step_pause_secs).await;
    }

    /// Every event emitted so far, in order
    pub fn events(&self) -> &[GameEvent] {
        &self.log
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.log)
    }

    /// One JSON object per line, for machine-readable dumps
    pub fn events_as_json_lines(&self) -> String {
        self.log
            .iter()
            .map(|e| serde_json::to_string(e).expect("events serialize"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_headless_acks_immediately() {
        let mut bus = EventBus::headless();
        bus.emit(GameEvent::HighlightsCleared);
        assert!(bus.wait_for(AckKind::AttackAnimDone, Position::new(0, 0)).await);
        assert_eq!(bus.events().len(), 1);
    }

    #[tokio::test]
    async fn test_attached_receives_matching_ack() {
        let (tx, mut event_rx) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        let mut bus = EventBus::attached(tx, ack_rx).with_ack_timeout(Duration::from_secs(5));

        let pos = Position::new(2, 3);
        bus.emit(GameEvent::UnitDamaged { pos });
        assert_eq!(event_rx.recv().await, Some(GameEvent::UnitDamaged { pos }));

        // an unrelated ack is drained, then the matching one resumes the wait
        ack_tx
            .send(AckEvent {
                kind: AckKind::HealAnimDone,
                pos,
            })
            .unwrap();
        ack_tx
            .send(AckEvent {
                kind: AckKind::DamageAnimDone,
                pos,
            })
            .unwrap();
        assert!(bus.wait_for(AckKind::DamageAnimDone, pos).await);
    }

    #[tokio::test]
    async fn test_ack_timeout_is_absorbed() {
        let (tx, _event_rx) = mpsc::unbounded_channel();
        let (_ack_tx, ack_rx) = mpsc::unbounded_channel();
        let mut bus = EventBus::attached(tx, ack_rx).with_ack_timeout(Duration::from_millis(10));

        // nobody acks; the wait resolves as absorbed rather than hanging
        assert!(!bus.wait_for(AckKind::DeathAnimDone, Position::new(0, 0)).await);
    }

    #[tokio::test]
    async fn test_closed_ack_channel_is_absorbed() {
        let (tx, _event_rx) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        let mut bus = EventBus::attached(tx, ack_rx);
        drop(ack_tx);
        assert!(!bus.wait_for(AckKind::FlipAnimDone, Position::new(1, 1)).await);
    }

    #[test]
    fn test_json_lines_dump() {
        let mut bus = EventBus::headless();
        bus.emit(GameEvent::TurnStarted {
            owner: PlayerId::PLAYER,
        });
        let dump = bus.events_as_json_lines();
        assert!(dump.contains("TurnStarted"));
    }
}
