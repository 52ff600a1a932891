//! NPC entity creation
//!
//! NPCs are non-hostile entities that talk. Each one picks a conversation
//! when it spawns and hands out one line per interaction; once the lines run
//! out it stops being interactable.

use hecs::{Entity, World};
use rand::Rng;

use crate::combat::CollisionLayer;
use crate::ecs::{Hitbox, Interactable, Position, Vec2};

const NPC_HITBOX: Vec2 = Vec2::new(20.0, 40.0);

/// Types of NPCs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NpcKind {
    /// Lives in the hub and explains the basics
    OldMan,
    /// Waits in the in-between room
    ShopKeeper,
}

impl NpcKind {
    pub fn name(&self) -> &'static str {
        match self {
            NpcKind::OldMan => "Old Man",
            NpcKind::ShopKeeper => "Shop Keeper",
        }
    }

    pub fn conversations(&self) -> &'static [&'static [&'static str]] {
        match self {
            NpcKind::OldMan => &[
                &[
                    "Another one heading down?",
                    "The door at the top goes to the first floor.",
                    "If you need practice, the side door leads to the training rooms.",
                ],
                &[
                    "Relics stick to whichever spell you put them on.",
                    "Choose carefully. They don't come off.",
                ],
                &[
                    "Walk into a sealed room and the walls go up behind you.",
                    "They only come down when every wave is dead.",
                ],
                &["I went down once.", "Once."],
                &[
                    "Beat the clock and the in-between room opens up.",
                    "Miss a goal and its reward stays locked.",
                    "Simple enough.",
                ],
            ],
            NpcKind::ShopKeeper => &[
                &["Made it this far? Good.", "Take what the gates let you take."],
                &[
                    "Nothing's for sale, I'm afraid.",
                    "I'm mostly here for the company.",
                ],
                &["The next floor is worse.", "They always are."],
                &[
                    "A relic here, a relic there.",
                    "Numbers is the one you want. Trust me.",
                ],
            ],
        }
    }
}

/// Talking state of an NPC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Npc {
    pub kind: NpcKind,
    pub conversation: usize,
    /// Index of the next line to say
    pub line: usize,
}

impl Npc {
    pub fn new(kind: NpcKind, rng: &mut impl Rng) -> Self {
        let conversation = rng.gen_range(0..kind.conversations().len());
        Self { kind, conversation, line: 0 }
    }

    pub fn lines(&self) -> &'static [&'static str] {
        self.kind.conversations().get(self.conversation).copied().unwrap_or(&[])
    }

    /// Next line, or `None` once the conversation is over
    pub fn next_line(&mut self) -> Option<&'static str> {
        let line = self.lines().get(self.line).copied()?;
        self.line += 1;
        Some(line)
    }
}

/// Spawn an NPC at a world position
pub fn spawn_npc(world: &mut World, at: Vec2, kind: NpcKind, rng: &mut impl Rng) -> Entity {
    let npc = Npc::new(kind, rng);
    log::debug!("Spawned {} with conversation {}", kind.name(), npc.conversation);
    world.spawn((
        Position(at),
        Hitbox::new(NPC_HITBOX, CollisionLayer::INTERACTABLE, CollisionLayer::PLAYER),
        npc,
        Interactable::Npc,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_conversation_has_lines() {
        for kind in [NpcKind::OldMan, NpcKind::ShopKeeper] {
            assert!(kind.conversations().iter().all(|c| !c.is_empty()));
        }
        assert_eq!(NpcKind::OldMan.conversations().len(), 5);
        assert_eq!(NpcKind::ShopKeeper.conversations().len(), 4);
    }

    #[test]
    fn test_lines_come_in_order_then_stop() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut npc = Npc::new(NpcKind::ShopKeeper, &mut rng);
        let expected = npc.lines().to_vec();
        let said: Vec<&str> = std::iter::from_fn(|| npc.next_line()).collect();
        assert_eq!(said, expected);
        assert_eq!(npc.next_line(), None);
    }

    #[test]
    fn test_spawned_npc_is_interactable() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(4);
        let e = spawn_npc(&mut world, Vec2::new(32.0, 0.0), NpcKind::OldMan, &mut rng);
        assert!(matches!(*world.get::<&Interactable>(e).unwrap(), Interactable::Npc));
        assert_eq!(world.get::<&Npc>(e).unwrap().line, 0);
    }
}
