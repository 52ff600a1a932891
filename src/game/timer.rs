//! Scheduled events
//!
//! Delayed and repeating game events. A timer may be bound to an entity;
//! when that entity is gone by the time the timer fires, the event is
//! dropped instead of delivered.

use hecs::Entity;
use slotmap::{new_key_type, SlotMap};

use crate::ecs::Vec2;

new_key_type! {
    pub struct TimerKey;
}

#[derive(Debug, Clone)]
struct Timer<E> {
    remaining: f32,
    duration: f32,
    looping: bool,
    owner: Option<Entity>,
    /// Insertion order, used to break ties between timers due in the same step
    seq: u64,
    event: E,
}

/// Queue of pending events keyed by generation-checked handles
#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    timers: SlotMap<TimerKey, Timer<E>>,
    next_seq: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            timers: SlotMap::with_key(),
            next_seq: 0,
        }
    }
}

impl<E: Clone> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `event` once after `delay` seconds
    pub fn schedule(&mut self, delay: f32, event: E) -> TimerKey {
        self.insert(delay, false, None, event)
    }

    /// Fire `event` once after `delay` seconds if `owner` is still alive then
    pub fn schedule_for(&mut self, owner: Entity, delay: f32, event: E) -> TimerKey {
        self.insert(delay, false, Some(owner), event)
    }

    /// Fire `event` every `period` seconds until cancelled or the owner dies
    pub fn schedule_looping(&mut self, owner: Option<Entity>, period: f32, event: E) -> TimerKey {
        self.insert(period, true, owner, event)
    }

    fn insert(&mut self, delay: f32, looping: bool, owner: Option<Entity>, event: E) -> TimerKey {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.insert(Timer {
            remaining: delay.max(0.0),
            duration: delay.max(0.0),
            looping,
            owner,
            seq,
            event,
        })
    }

    pub fn cancel(&mut self, key: TimerKey) -> Option<E> {
        self.timers.remove(key).map(|t| t.event)
    }

    /// Drop every timer bound to `owner`
    pub fn cancel_owned(&mut self, owner: Entity) {
        self.timers.retain(|_, t| t.owner != Some(owner));
    }

    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.timers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Advance every timer by `dt` seconds and return the events that fired,
    /// most overdue first
    pub fn advance(&mut self, dt: f32, is_alive: impl Fn(Entity) -> bool) -> Vec<E> {
        let mut fired: Vec<(f32, u64, E)> = Vec::new();
        let mut finished = Vec::new();

        for (key, timer) in self.timers.iter_mut() {
            if let Some(owner) = timer.owner {
                if !is_alive(owner) {
                    log::debug!("Dropping timer for despawned entity {:?}", owner);
                    finished.push(key);
                    continue;
                }
            }

            timer.remaining -= dt;
            if timer.remaining > 0.0 {
                continue;
            }

            fired.push((timer.remaining, timer.seq, timer.event.clone()));
            if timer.looping && timer.duration > 0.0 {
                while timer.remaining <= 0.0 {
                    timer.remaining += timer.duration;
                }
            } else {
                finished.push(key);
            }
        }

        for key in finished {
            self.timers.remove(key);
        }

        fired.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        fired.into_iter().map(|(_, _, event)| event).collect()
    }
}

/// Everything the game defers to a later frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduledEvent {
    /// Replace a spawn indicator with its enemy
    SpawnEnemy { indicator: Entity },
    /// One shot of a burst fired from the caster's current position
    BurstShot {
        caster: Entity,
        slot: usize,
        direction: Vec2,
    },
    EndDash { entity: Entity },
    BlinkArrive { entity: Entity, offset: Vec2 },
}
