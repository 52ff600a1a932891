//! Game state
//!
//! Owns the world and everything that outlives a single frame, and runs one
//! frame of simulation in a fixed order.

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use super::goals::GoalManager;
use super::screens::{Destination, GameScreen};
use super::timer::{ScheduledEvent, Scheduler};
use crate::combat::HitEvent;
use crate::data::DataManager;
use crate::ecs::systems;
use crate::ecs::{BoundaryWall, ChoiceSibling, Health, Hitbox, Interactable, Lootable, Motion, Position, SpawnIndicator, Vec2};
use crate::entities::bosses::{spawn_boss, BossSegment, BossSegments};
use crate::entities::enemies::{spawn_enemy, Enemy, EnemyKind, SpawnOptions};
use crate::entities::loot::{random_common_relic, random_relic, random_spell, spell_choice, LootDrop};
use crate::entities::npcs::{spawn_npc, Npc, NpcKind};
use crate::entities::player::{self, spawn_player, PlayerInput, MOVEMENT_SLOT, PROJECTILE_SLOT};
use crate::spells::{CastError, ProjectileSpellId, Relic, SpellCastManager, SpellRef, SpellSlots};
use crate::world::encounter::EncounterEvent;
use crate::world::generation::{generate_floor, ArenaKind, ArenaLayout, Floor, FloorStats, GenerationError, UniqueRoom};
use crate::world::{tile_to_world, EncounterKey, EncounterRoomManager, EncounterSet, TileGrid, TILE_SIZE};

/// How close the player must be to use something
pub const INTERACT_RANGE: f32 = 1.5 * TILE_SIZE;
pub const CHEST_HEALTH: i32 = 20;
pub const BOX_HEALTH: i32 = 20;
/// Enough to fill any health pool
pub const FOUNTAIN_HEAL: i32 = 500;
pub const SACRIFICE_RELICS: u32 = 2;
/// What a mimic turns into
pub const MIMIC_KIND: EnemyKind = EnemyKind::Melee;
/// The tutorial chest always teaches the same spell
pub const TUTORIAL_CHEST_SPELL: SpellRef = SpellRef::Projectile(ProjectileSpellId::Waterball);
pub const TUTORIAL_RELIC: Relic = Relic::Numbers;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("floor generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("cast failed: {0}")]
    Cast(#[from] CastError),
}

/// What happened during one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub hits: Vec<HitEvent>,
    pub kills: u32,
    pub player_died: bool,
    /// Screen entered at the end of the frame
    pub entered: Option<GameScreen>,
    /// Line an NPC said this frame
    pub dialogue: Option<&'static str>,
}

/// The whole simulation
pub struct Game {
    world: World,
    data: DataManager,
    rng: StdRng,
    scheduler: Scheduler<ScheduledEvent>,
    encounters: EncounterSet,
    goals: GoalManager,
    screen: GameScreen,
    player: Entity,
    grid: TileGrid,
    floor_stats: Option<FloorStats>,
    /// Door the player walked through this frame
    pending_door: Option<Destination>,
}

impl Game {
    /// Start in the hub
    pub fn new(data: DataManager, seed: u64) -> Result<Self, GameError> {
        let mut world = World::new();
        let player = spawn_player(&mut world, Vec2::ZERO);
        let mut game = Self {
            world,
            data,
            rng: StdRng::seed_from_u64(seed),
            scheduler: Scheduler::new(),
            encounters: EncounterSet::with_key(),
            goals: GoalManager::default(),
            screen: GameScreen::Hub,
            player,
            grid: TileGrid::new(0, 0),
            floor_stats: None,
            pending_door: None,
        };
        game.enter_screen(GameScreen::Hub)?;
        Ok(game)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn data(&self) -> &DataManager {
        &self.data
    }

    pub fn screen(&self) -> GameScreen {
        self.screen
    }

    pub fn player(&self) -> Entity {
        self.player
    }

    pub fn goals(&self) -> &GoalManager {
        &self.goals
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Stats of the last generated floor
    pub fn floor_stats(&self) -> Option<&FloorStats> {
        self.floor_stats.as_ref()
    }

    pub fn encounters(&self) -> &EncounterSet {
        &self.encounters
    }

    pub fn player_position(&self) -> Option<Vec2> {
        self.world.get::<&Position>(self.player).ok().map(|p| p.0)
    }

    pub fn player_health(&self) -> Option<Health> {
        self.world.get::<&Health>(self.player).ok().map(|h| *h)
    }

    pub fn is_player_dead(&self) -> bool {
        self.player_health().map(|h| h.is_dead()).unwrap_or(true)
    }

    /// Positions of every hittable enemy body
    pub fn enemy_positions(&self) -> Vec<Vec2> {
        self.world
            .query::<(&Position, &Hitbox, &Enemy)>()
            .iter()
            .filter(|(_, (_, hitbox, _))| hitbox.layer == crate::combat::CollisionLayer::ENEMY)
            .map(|(_, (pos, _, _))| pos.0)
            .collect()
    }

    // ========================================================================
    // Screens
    // ========================================================================

    /// Tear down the current screen and build `screen`. The player is kept.
    pub fn enter_screen(&mut self, screen: GameScreen) -> Result<(), GameError> {
        self.clear_world();

        match screen {
            GameScreen::Hub => {
                self.goals.reset();
                self.goals.set_timer_running(false);
                self.restore_player();
                let layout = ArenaLayout::load(ArenaKind::Hub, self.data.generation.min_wall_collision)?;
                self.populate_arena(&layout);
                self.spawn_door(layout.door, Destination::NextFloor);
                self.spawn_door(layout.side_door, Destination::Tutorial);
                self.spawn_layout_npc(&layout, NpcKind::OldMan);
                log::info!("Entered the hub");
                self.grid = layout.grid;
            }
            GameScreen::Tutorial => {
                self.goals.set_timer_running(false);
                let layout = ArenaLayout::load(ArenaKind::Tutorial, self.data.generation.min_wall_collision)?;
                self.populate_arena(&layout);
                for encounter in &layout.encounters {
                    let room = EncounterRoomManager::from_waves(encounter.zone, vec![encounter.wave.clone()]);
                    self.add_encounter(room);
                }
                for &tile in &layout.chests {
                    let chest = systems::spawn_box(&mut self.world, tile, CHEST_HEALTH);
                    self.attach(chest, Lootable(LootDrop::Spell(TUTORIAL_CHEST_SPELL)));
                }
                for &(x, y) in &layout.relic_spots {
                    systems::spawn_interactable(
                        &mut self.world,
                        tile_to_world(x, y),
                        Interactable::Pickup(LootDrop::Relic(TUTORIAL_RELIC)),
                    );
                }
                self.spawn_door(layout.door, Destination::Hub);
                log::info!("Entered the tutorial: {} encounters", layout.encounters.len());
                self.grid = layout.grid;
            }
            GameScreen::Floor { depth } => {
                let floor = generate_floor(&self.data.generation, &self.data.templates, &mut self.rng)?;
                self.goals.reset();
                self.goals.set_timer_running(true);
                self.populate_floor(&floor);
                log::info!(
                    "Entered floor {}: {} rooms, {} encounters",
                    depth,
                    floor.stats.rooms,
                    floor.stats.encounter_rooms
                );
                self.floor_stats = Some(floor.stats.clone());
                self.grid = floor.grid;
            }
            GameScreen::BossArena { boss, .. } => {
                self.goals.set_timer_running(false);
                let layout = ArenaLayout::load(ArenaKind::Boss, self.data.generation.min_wall_collision)?;
                self.populate_arena(&layout);
                let at = match layout.boss_spawn {
                    Some((x, y)) => tile_to_world(x, y),
                    None => layout.grid.bounds().world_center(),
                };
                spawn_boss(&mut self.world, boss, at, &self.data.enemies);
                log::info!("Entered {} arena", boss.name());
                self.grid = layout.grid;
            }
            GameScreen::InBetween { .. } => {
                self.goals.set_timer_running(false);
                let layout = ArenaLayout::load(ArenaKind::InBetween, self.data.generation.min_wall_collision)?;
                self.populate_arena(&layout);

                let results = self.goals.results();
                for (i, met) in results.into_iter().enumerate() {
                    if let (false, Some(gate)) = (met, layout.goal_gates[i]) {
                        systems::spawn_wall(&mut self.world, gate);
                    }
                    if let Some((x, y)) = layout.reward_spots[i] {
                        let relic = random_relic(&mut self.rng);
                        systems::spawn_interactable(
                            &mut self.world,
                            tile_to_world(x, y),
                            Interactable::Pickup(LootDrop::Relic(relic)),
                        );
                    }
                }
                self.spawn_door(layout.door, Destination::NextFloor);
                self.spawn_layout_npc(&layout, NpcKind::ShopKeeper);
                log::info!("Floor goals met: {:?}", results);
                self.grid = layout.grid;
            }
        }

        self.screen = screen;
        Ok(())
    }

    fn clear_world(&mut self) {
        let doomed: Vec<Entity> = self
            .world
            .iter()
            .map(|e| e.entity())
            .filter(|e| *e != self.player)
            .collect();
        for entity in doomed {
            self.despawn(entity);
        }
        self.scheduler.clear();
        self.encounters.clear();
        self.pending_door = None;
    }

    /// Despawn an entity that is expected to still exist
    fn despawn(&mut self, entity: Entity) {
        if let Err(e) = self.world.despawn(entity) {
            log::warn!("Despawn of {:?} failed: {}", entity, e);
        }
    }

    fn attach<C: hecs::Component>(&mut self, entity: Entity, component: C) {
        if let Err(e) = self.world.insert_one(entity, component) {
            log::warn!("Could not attach {} to {:?}: {}", std::any::type_name::<C>(), entity, e);
        }
    }

    fn detach<C: hecs::Component>(&mut self, entity: Entity) {
        if let Err(e) = self.world.remove_one::<C>(entity) {
            log::warn!("Could not detach {} from {:?}: {}", std::any::type_name::<C>(), entity, e);
        }
    }

    fn move_player(&mut self, at: Vec2) {
        if let Ok(mut pos) = self.world.get::<&mut Position>(self.player) {
            pos.0 = at;
        }
        if let Ok(mut motion) = self.world.get::<&mut Motion>(self.player) {
            *motion = Motion::default();
        }
    }

    fn populate_floor(&mut self, floor: &Floor) {
        systems::spawn_colliders(&mut self.world, &floor.colliders);
        let content = &floor.content;

        if let Some((x, y)) = content.spawn_point {
            self.move_player(tile_to_world(x, y));
        }
        for &tile in &content.boxes {
            systems::spawn_box(&mut self.world, tile, BOX_HEALTH);
        }
        for &tile in &content.chests {
            let chest = systems::spawn_box(&mut self.world, tile, CHEST_HEALTH);
            let drop = LootDrop::Spell(random_spell(&mut self.rng));
            self.attach(chest, Lootable(drop));
        }
        for spot in &content.unique_rooms {
            self.place_unique_room(spot.kind, tile_to_world(spot.center.0, spot.center.1));
        }
        if let Some(exit) = content.exit {
            systems::spawn_interactable(
                &mut self.world,
                tile_to_world(exit.tile.0, exit.tile.1),
                Interactable::Door(Destination::BossArena(exit.boss)),
            );
        }
        for spec in &content.encounters {
            let room = EncounterRoomManager::init(spec.rect, &floor.grid, &self.data.encounters, &mut self.rng);
            self.add_encounter(room);
        }
    }

    fn add_encounter(&mut self, room: EncounterRoomManager) -> EncounterKey {
        let trigger = room.trigger_rect();
        let key = self.encounters.insert(room);
        systems::spawn_room_trigger(&mut self.world, key, trigger);
        key
    }

    fn place_unique_room(&mut self, kind: UniqueRoom, at: Vec2) {
        match kind {
            UniqueRoom::Fountain => {
                systems::spawn_interactable(&mut self.world, at, Interactable::Fountain { heal: FOUNTAIN_HEAL });
            }
            UniqueRoom::Sacrifice => {
                systems::spawn_interactable(
                    &mut self.world,
                    at,
                    Interactable::Sacrifice { relics: SACRIFICE_RELICS },
                );
            }
            UniqueRoom::Choice => {
                let [left, right] = spell_choice(&mut self.rng);
                let offset = Vec2::new(TILE_SIZE * 1.5, 0.0);
                let left = systems::spawn_interactable(
                    &mut self.world,
                    at - offset,
                    Interactable::Pickup(LootDrop::Spell(left)),
                );
                let right = systems::spawn_interactable(
                    &mut self.world,
                    at + offset,
                    Interactable::Pickup(LootDrop::Spell(right)),
                );
                self.attach(left, ChoiceSibling(right));
                self.attach(right, ChoiceSibling(left));
            }
            UniqueRoom::Mimic => {
                systems::spawn_interactable(&mut self.world, at, Interactable::Mimic);
            }
        }
    }

    fn populate_arena(&mut self, layout: &ArenaLayout) {
        systems::spawn_colliders(&mut self.world, &layout.colliders);
        let (x, y) = layout.player_spawn;
        self.move_player(tile_to_world(x, y));
    }

    fn spawn_door(&mut self, tile: Option<(i32, i32)>, destination: Destination) {
        if let Some((x, y)) = tile {
            systems::spawn_interactable(&mut self.world, tile_to_world(x, y), Interactable::Door(destination));
        }
    }

    fn spawn_layout_npc(&mut self, layout: &ArenaLayout, kind: NpcKind) {
        if let Some((x, y)) = layout.npc {
            spawn_npc(&mut self.world, tile_to_world(x, y), kind, &mut self.rng);
        }
    }

    /// Full health and the starting spells, for a fresh run from the hub
    fn restore_player(&mut self) {
        if let Ok(mut health) = self.world.get::<&mut Health>(self.player) {
            health.current = health.max;
        }
        if let Ok(mut slots) = self.world.get::<&mut SpellSlots>(self.player) {
            *slots = player::starting_slots();
        }
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Advance the simulation by `dt` seconds.
    ///
    /// Order: scheduled events, player, enemy AI, movement, projectiles and
    /// contacts, deaths, encounter triggers, cooldowns, goal timer. A door
    /// taken this frame switches screens last.
    pub fn tick(&mut self, dt: f32, input: &PlayerInput) -> Result<FrameReport, GameError> {
        let mut report = FrameReport::default();

        self.run_scheduled(dt)?;
        self.drive_player(input, dt, &mut report)?;
        self.run_enemies(dt)?;
        systems::update_motion(&mut self.world, dt);
        systems::sync_boss_controllers(&mut self.world);
        self.run_projectiles(dt, &mut report);
        self.process_deaths(&mut report);
        self.check_triggers();
        systems::decay_spell_slots(&mut self.world, dt);
        self.goals.tick(dt);

        if let Some(destination) = self.pending_door.take() {
            let next = self.screen.through(destination);
            self.enter_screen(next)?;
            report.entered = Some(next);
        }
        Ok(report)
    }

    fn run_scheduled(&mut self, dt: f32) -> Result<(), GameError> {
        let world = &self.world;
        let events = self.scheduler.advance(dt, |e| world.contains(e));

        for event in events {
            match event {
                ScheduledEvent::SpawnEnemy { indicator } => self.spawn_from_indicator(indicator),
                ScheduledEvent::BurstShot { caster, slot, direction } => {
                    let manager = SpellCastManager::new(&self.data.spells);
                    systems::cast_unpaced(
                        &mut self.world,
                        &mut self.scheduler,
                        &manager,
                        caster,
                        slot,
                        direction,
                        &mut self.rng,
                    )?;
                }
                ScheduledEvent::EndDash { entity } => {
                    if let Ok(mut motion) = self.world.get::<&mut Motion>(entity) {
                        motion.is_dashing = false;
                        motion.velocity = Vec2::ZERO;
                    }
                }
                ScheduledEvent::BlinkArrive { entity, offset } => {
                    let walls = systems::collect_walls(&self.world);
                    if let Ok((pos, hitbox)) = self.world.query_one_mut::<(&mut Position, &Hitbox)>(entity) {
                        pos.0 = systems::blink_destination(&walls, pos.0, hitbox, offset);
                    }
                }
            }
        }
        Ok(())
    }

    fn spawn_from_indicator(&mut self, entity: Entity) {
        let Ok(indicator) = self.world.get::<&SpawnIndicator>(entity).map(|i| *i) else {
            return;
        };
        let at = self.world.get::<&Position>(entity).map(|p| p.0).unwrap_or(Vec2::ZERO);
        self.despawn(entity);
        let options = SpawnOptions {
            encounter: indicator.encounter,
            minion: indicator.minion,
        };
        spawn_enemy(&mut self.world, indicator.kind, at, &self.data.enemies, options, &mut self.rng);
    }

    fn drive_player(&mut self, input: &PlayerInput, dt: f32, report: &mut FrameReport) -> Result<(), GameError> {
        if self.is_player_dead() {
            return Ok(());
        }
        if let Ok(mut motion) = self.world.get::<&mut Motion>(self.player) {
            player::steer(&mut motion, input.movement, dt);
        }

        let manager = SpellCastManager::new(&self.data.spells);
        let aim = input.aim.normalize_or_zero();
        if input.cast_projectile && aim != Vec2::ZERO {
            systems::cast_from_slot(
                &mut self.world,
                &mut self.scheduler,
                &manager,
                self.player,
                PROJECTILE_SLOT,
                aim,
                &mut self.rng,
            )?;
        }
        if input.cast_movement {
            let heading = input.movement.normalize_or_zero();
            let direction = if heading == Vec2::ZERO { aim } else { heading };
            if direction != Vec2::ZERO {
                systems::cast_from_slot(
                    &mut self.world,
                    &mut self.scheduler,
                    &manager,
                    self.player,
                    MOVEMENT_SLOT,
                    direction,
                    &mut self.rng,
                )?;
            }
        }
        if input.interact {
            self.interact(input.apply_to_movement, report);
        }
        Ok(())
    }

    fn run_enemies(&mut self, dt: f32) -> Result<(), GameError> {
        let Some(player_at) = self.player_position() else {
            return Ok(());
        };
        let batches = systems::run_enemy_ai(&mut self.world, player_at, &self.data.enemies, dt, &mut self.rng);
        let manager = SpellCastManager::new(&self.data.spells);
        systems::apply_enemy_effects(
            &mut self.world,
            &mut self.scheduler,
            &manager,
            batches,
            self.data.encounters.spawn_indicator_delay,
            &mut self.rng,
        )?;
        Ok(())
    }

    fn run_projectiles(&mut self, dt: f32, report: &mut FrameReport) {
        let mut retired = systems::update_projectiles(&mut self.world, dt);
        let contacts = systems::resolve_contacts(&mut self.world);
        retired.extend(contacts.retired.iter().copied());
        systems::retire_projectiles(&mut self.world, &self.data.spells, &retired, &mut self.rng);

        for hit in &contacts.hits {
            if hit.target == self.player {
                self.goals.on_player_hit();
            }
        }
        report.hits = contacts.hits;
    }

    fn process_deaths(&mut self, report: &mut FrameReport) {
        for death in systems::collect_deaths(&self.world) {
            if death.is_player {
                report.player_died = true;
                if self.screen != GameScreen::Hub {
                    self.pending_door = Some(Destination::Hub);
                }
                continue;
            }
            self.scheduler.cancel_owned(death.entity);
            self.despawn(death.entity);

            match death.loot {
                Some(LootDrop::NextLevelDoor) => {
                    systems::spawn_interactable(
                        &mut self.world,
                        death.position,
                        Interactable::Door(Destination::InBetween),
                    );
                }
                Some(drop) => {
                    systems::spawn_interactable(&mut self.world, death.position, Interactable::Pickup(drop));
                }
                None => {}
            }

            if death.enemy.is_some() {
                report.kills += 1;
                self.goals.on_kill();
            }
            if let Some(segment) = death.segment {
                self.segment_died(segment);
            }
            if let Some(key) = death.room {
                if let Some(room) = self.encounters.get_mut(key) {
                    let event = room.enemy_died();
                    self.apply_encounter_event(key, event);
                }
            }
        }
    }

    fn segment_died(&mut self, segment: BossSegment) {
        let empty = match self.world.get::<&mut BossSegments>(segment.controller) {
            Ok(mut segments) => {
                if let Some(slot) = segments.0.get_mut(segment.index) {
                    *slot = None;
                }
                segments.0.iter().all(Option::is_none)
            }
            Err(_) => return,
        };
        if empty {
            self.scheduler.cancel_owned(segment.controller);
            self.despawn(segment.controller);
        }
    }

    fn check_triggers(&mut self) {
        if self.is_player_dead() {
            return;
        }
        for (trigger, key) in systems::touched_triggers(&self.world, self.player) {
            self.despawn(trigger);
            let Some(room) = self.encounters.get_mut(key) else {
                continue;
            };
            let event = room.on_player_entered();
            let walls = room.boundary_walls();
            if matches!(event, EncounterEvent::SpawnWave { .. }) {
                for rect in walls {
                    systems::spawn_boundary_wall(&mut self.world, key, rect);
                }
            }
            self.apply_encounter_event(key, event);
        }
    }

    fn apply_encounter_event(&mut self, key: EncounterKey, event: EncounterEvent) {
        match event {
            EncounterEvent::SpawnWave { wave, enemies } => {
                log::debug!("Encounter wave {} incoming: {} enemies", wave, enemies.len());
                for spawn in enemies {
                    let indicator = SpawnIndicator {
                        kind: spawn.kind,
                        encounter: Some(key),
                        minion: false,
                    };
                    systems::spawn_indicator(
                        &mut self.world,
                        &mut self.scheduler,
                        indicator,
                        tile_to_world(spawn.tile.0, spawn.tile.1),
                        self.data.encounters.spawn_indicator_delay,
                    );
                }
            }
            EncounterEvent::Cleared => {
                let walls: Vec<Entity> = self
                    .world
                    .query::<&BoundaryWall>()
                    .iter()
                    .filter(|(_, wall)| wall.0 == key)
                    .map(|(e, _)| e)
                    .collect();
                for wall in walls {
                    self.despawn(wall);
                }
            }
            EncounterEvent::Waiting { .. } | EncounterEvent::Ignored => {}
        }
    }

    // ========================================================================
    // Interaction
    // ========================================================================

    fn interact(&mut self, apply_to_movement: bool, report: &mut FrameReport) {
        let Some(at) = self.player_position() else {
            return;
        };
        let Some((entity, interactable)) = systems::nearest_interactable(&self.world, at, INTERACT_RANGE) else {
            return;
        };

        match interactable {
            Interactable::Pickup(drop) => self.take_pickup(entity, drop, apply_to_movement),
            Interactable::Door(destination) => self.pending_door = Some(destination),
            Interactable::Fountain { heal } => {
                if let Ok(mut health) = self.world.get::<&mut Health>(self.player) {
                    health.heal(heal);
                }
                self.detach::<Interactable>(entity);
            }
            Interactable::Sacrifice { relics } => {
                if let Ok(mut health) = self.world.get::<&mut Health>(self.player) {
                    let cost = health.current / 2;
                    health.take_damage(cost);
                }
                let origin = self.world.get::<&Position>(entity).map(|p| p.0).unwrap_or(at);
                for i in 0..relics {
                    let side = if i % 2 == 0 { 1.0 } else { -1.0 };
                    let offset = Vec2::new(side * 2.5, 1.0 + (i / 2) as f32) * TILE_SIZE;
                    let relic = random_common_relic(&mut self.rng);
                    systems::spawn_interactable(
                        &mut self.world,
                        origin + offset,
                        Interactable::Pickup(LootDrop::Relic(relic)),
                    );
                }
                self.detach::<Interactable>(entity);
            }
            Interactable::Mimic => {
                let origin = self.world.get::<&Position>(entity).map(|p| p.0).unwrap_or(at);
                self.despawn(entity);
                spawn_enemy(
                    &mut self.world,
                    MIMIC_KIND,
                    origin,
                    &self.data.enemies,
                    SpawnOptions::default(),
                    &mut self.rng,
                );
                log::info!("The chest was a mimic");
            }
            Interactable::Npc => {
                let line = match self.world.get::<&mut Npc>(entity) {
                    Ok(mut npc) => npc.next_line(),
                    Err(_) => None,
                };
                match line {
                    Some(line) => report.dialogue = Some(line),
                    None => self.detach::<Interactable>(entity),
                }
            }
        }
    }

    fn take_pickup(&mut self, entity: Entity, drop: LootDrop, apply_to_movement: bool) {
        match drop {
            LootDrop::Relic(relic) => {
                let index = if apply_to_movement { MOVEMENT_SLOT } else { PROJECTILE_SLOT };
                if let Ok(mut slots) = self.world.get::<&mut SpellSlots>(self.player) {
                    if let Some(slot) = slots.get_mut(index) {
                        slot.equip(relic);
                    }
                }
                self.despawn(entity);
            }
            LootDrop::Heal(amount) => {
                if let Ok(mut health) = self.world.get::<&mut Health>(self.player) {
                    health.heal(amount);
                }
                self.despawn(entity);
            }
            LootDrop::Spell(spell) => {
                let index = match spell {
                    SpellRef::Projectile(_) => PROJECTILE_SLOT,
                    SpellRef::Movement(_) => MOVEMENT_SLOT,
                };
                let old = match self.world.get::<&mut SpellSlots>(self.player) {
                    Ok(mut slots) => slots.get_mut(index).map(|slot| {
                        let old = slot.spell;
                        slot.replace_spell(spell);
                        old
                    }),
                    Err(_) => None,
                };

                if let Ok(sibling) = self.world.get::<&ChoiceSibling>(entity).map(|s| s.0) {
                    self.despawn(sibling);
                    self.detach::<ChoiceSibling>(entity);
                }

                // The old spell is left on the floor next to the player
                match (old, self.player_position()) {
                    (Some(old), Some(at)) => {
                        if let Ok((pos, interactable)) =
                            self.world.query_one_mut::<(&mut Position, &mut Interactable)>(entity)
                        {
                            pos.0 = at + Vec2::new(0.0, TILE_SIZE);
                            *interactable = Interactable::Pickup(LootDrop::Spell(old));
                        }
                    }
                    _ => {
                        self.despawn(entity);
                    }
                }
            }
            LootDrop::NextLevelDoor => self.pending_door = Some(Destination::InBetween),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::CollisionLayer;
    use crate::entities::BossKind;
    use crate::spells::MovementSpellId;
    use crate::world::encounter::{EncounterState, EnemySpawn, EnemyWave};
    use crate::world::generation::GenerationConfig;
    use crate::world::Rect;

    fn game() -> Game {
        let mut data = DataManager::builtin().unwrap();
        data.generation = GenerationConfig::compact();
        let mut game = Game::new(data, 7).unwrap();
        game.enter_screen(GameScreen::Floor { depth: 1 }).unwrap();
        game
    }

    fn hub_game() -> Game {
        Game::new(DataManager::builtin().unwrap(), 11).unwrap()
    }

    fn interactable_at(game: &Game, wanted: fn(&Interactable) -> bool) -> Vec2 {
        game.world
            .query::<(&Position, &Interactable)>()
            .iter()
            .find(|(_, (_, i))| wanted(i))
            .map(|(_, (p, _))| p.0)
            .unwrap()
    }

    /// A game with an empty world and the player at the origin
    fn empty_game() -> Game {
        let mut game = game();
        game.clear_world();
        game.move_player(Vec2::ZERO);
        game
    }

    fn idle() -> PlayerInput {
        PlayerInput::default()
    }

    fn interact() -> PlayerInput {
        PlayerInput {
            interact: true,
            ..PlayerInput::default()
        }
    }

    #[test]
    fn test_new_game_starts_in_hub() {
        let game = hub_game();
        assert_eq!(game.screen(), GameScreen::Hub);
        assert!(game.encounters().is_empty());
        assert!(game.floor_stats().is_none());
        let doors: Vec<Destination> = game
            .world
            .query::<&Interactable>()
            .iter()
            .filter_map(|(_, i)| match i {
                Interactable::Door(d) => Some(*d),
                _ => None,
            })
            .collect();
        assert!(doors.contains(&Destination::NextFloor));
        assert!(doors.contains(&Destination::Tutorial));
        assert_eq!(game.world.query::<&Npc>().iter().count(), 1);
    }

    #[test]
    fn test_hub_door_leads_to_first_floor() {
        let mut game = hub_game();
        game.move_player(interactable_at(&game, |i| matches!(i, Interactable::Door(Destination::NextFloor))));
        let report = game.tick(0.016, &interact()).unwrap();
        assert_eq!(report.entered, Some(GameScreen::Floor { depth: 1 }));
        assert!(game.floor_stats().is_some());
    }

    #[test]
    fn test_tutorial_dummy_room_clears() {
        let mut game = hub_game();
        game.move_player(interactable_at(&game, |i| matches!(i, Interactable::Door(Destination::Tutorial))));
        let report = game.tick(0.016, &interact()).unwrap();
        assert_eq!(report.entered, Some(GameScreen::Tutorial));
        assert_eq!(game.encounters().len(), 3);
        assert!(game.encounters().values().all(|r| r.state() == EncounterState::Idle));

        let layout = ArenaLayout::load(ArenaKind::Tutorial, game.data.generation.min_wall_collision).unwrap();
        let zone = layout.encounters[0].zone;
        let key = game
            .encounters()
            .iter()
            .find(|(_, r)| r.rect == zone)
            .map(|(k, _)| k)
            .unwrap();

        // Step just inside the dummy room
        game.move_player(tile_to_world(zone.x + 2, zone.y + 2));
        game.tick(0.016, &idle()).unwrap();
        assert_eq!(game.encounters()[key].state(), EncounterState::Active { wave: 0 });
        assert_eq!(game.world.query::<&BoundaryWall>().iter().count(), 4);
        assert_eq!(game.goals().elapsed, 0.0);

        game.tick(game.data.encounters.spawn_indicator_delay + 0.01, &idle()).unwrap();
        let dummy = game
            .world
            .query::<(&Enemy, &crate::ecs::RoomMember)>()
            .iter()
            .find(|(_, (_, member))| member.0 == key)
            .map(|(e, (enemy, _))| {
                assert_eq!(enemy.kind, EnemyKind::Dummy);
                e
            })
            .unwrap();

        game.world.get::<&mut Health>(dummy).unwrap().current = 0;
        let report = game.tick(0.016, &idle()).unwrap();
        assert_eq!(report.kills, 1);
        assert_eq!(game.encounters()[key].state(), EncounterState::Cleared);
        assert_eq!(game.world.query::<&BoundaryWall>().iter().count(), 0);
    }

    #[test]
    fn test_tutorial_chest_holds_waterball() {
        let mut game = hub_game();
        game.enter_screen(GameScreen::Tutorial).unwrap();
        let chests: Vec<LootDrop> = game
            .world
            .query::<&Lootable>()
            .iter()
            .map(|(_, l)| l.0)
            .collect();
        assert_eq!(chests, vec![LootDrop::Spell(TUTORIAL_CHEST_SPELL)]);
        interactable_at(&game, |i| matches!(i, Interactable::Pickup(LootDrop::Relic(Relic::Numbers))));
        interactable_at(&game, |i| matches!(i, Interactable::Door(Destination::Hub)));
    }

    #[test]
    fn test_old_man_talks_until_he_runs_out() {
        let mut game = hub_game();
        let (npc, at, lines) = game
            .world
            .query::<(&Npc, &Position)>()
            .iter()
            .map(|(e, (npc, pos))| (e, pos.0, npc.lines()))
            .next()
            .unwrap();
        game.move_player(at);

        let mut said = Vec::new();
        for _ in 0..lines.len() {
            said.extend(game.tick(0.016, &interact()).unwrap().dialogue);
        }
        assert_eq!(said, lines);
        assert!(game.world.get::<&Interactable>(npc).is_ok());

        let report = game.tick(0.016, &interact()).unwrap();
        assert_eq!(report.dialogue, None);
        assert!(game.world.get::<&Interactable>(npc).is_err());
        assert!(game.world.contains(npc));
    }

    #[test]
    fn test_death_returns_to_hub_restored() {
        let mut game = game();
        if let Some(slot) = game.world.get::<&mut SpellSlots>(game.player).unwrap().get_mut(PROJECTILE_SLOT) {
            slot.equip(Relic::Speed);
        }
        game.tick(0.5, &idle()).unwrap();
        game.world.get::<&mut Health>(game.player).unwrap().current = 0;

        let report = game.tick(0.016, &idle()).unwrap();
        assert!(report.player_died);
        assert_eq!(report.entered, Some(GameScreen::Hub));
        assert!(!game.is_player_dead());
        let health = game.player_health().unwrap();
        assert_eq!(health.current, health.max);
        let slots = game.world.get::<&SpellSlots>(game.player).unwrap();
        assert!(slots.get(PROJECTILE_SLOT).unwrap().relics.is_empty());
        drop(slots);
        assert_eq!(game.goals().elapsed, 0.0);
    }

    #[test]
    fn test_despawning_a_missing_entity_is_tolerated() {
        let mut game = empty_game();
        let gone = systems::spawn_interactable(&mut game.world, Vec2::ZERO, Interactable::Mimic);
        game.despawn(gone);
        game.despawn(gone);
        game.detach::<Interactable>(gone);
        game.attach(gone, ChoiceSibling(game.player));
        assert!(!game.world.contains(gone));
    }

    #[test]
    fn test_new_game_places_player_on_spawn() {
        let game = game();
        assert_eq!(game.screen(), GameScreen::Floor { depth: 1 });
        let stats = game.floor_stats().unwrap();
        assert!(stats.rooms > 0);
        assert_eq!(game.encounters().len(), stats.encounter_rooms);
        let (x, y) = crate::world::world_to_tile(game.player_position().unwrap());
        assert!(game.grid().is_walkable(x, y));
        assert!(game.goals().elapsed == 0.0);
    }

    #[test]
    fn test_goal_timer_runs_on_floors_only() {
        let mut game = game();
        game.tick(0.5, &idle()).unwrap();
        assert!(game.goals().elapsed > 0.0);
        game.enter_screen(GameScreen::InBetween { depth: 1 }).unwrap();
        let elapsed = game.goals().elapsed;
        game.tick(0.5, &idle()).unwrap();
        assert_eq!(game.goals().elapsed, elapsed);
    }

    #[test]
    fn test_player_fireball_kills_dummy() {
        let mut game = empty_game();
        let dummy = spawn_enemy(
            &mut game.world,
            EnemyKind::Dummy,
            Vec2::new(120.0, 0.0),
            &game.data.enemies,
            SpawnOptions::default(),
            &mut game.rng,
        );
        let input = PlayerInput {
            aim: Vec2::new(1.0, 0.0),
            cast_projectile: true,
            ..PlayerInput::default()
        };

        let mut kills = 0;
        for _ in 0..300 {
            kills += game.tick(1.0 / 60.0, &input).unwrap().kills;
            if kills > 0 {
                break;
            }
        }
        assert_eq!(kills, 1);
        assert!(!game.world.contains(dummy));
        assert_eq!(game.goals().kills, 1);
    }

    #[test]
    fn test_encounter_seals_then_releases_room() {
        let mut game = empty_game();
        let dummy = |x| EnemySpawn { kind: EnemyKind::Dummy, tile: (x, 5) };
        let room = EncounterRoomManager::from_waves(
            Rect::new(0, 0, 10, 10),
            vec![
                EnemyWave { enemies: vec![dummy(2)] },
                EnemyWave { enemies: vec![dummy(3), dummy(7)] },
            ],
        );
        let trigger = room.trigger_rect();
        let key = game.encounters.insert(room);
        systems::spawn_room_trigger(&mut game.world, key, trigger);
        game.move_player(tile_to_world(5, 2));

        game.tick(0.016, &idle()).unwrap();
        let walls = game.world.query::<&BoundaryWall>().iter().count();
        assert_eq!(walls, 4);

        let delay = game.data.encounters.spawn_indicator_delay;
        for expected in [1, 2] {
            game.tick(delay + 0.01, &idle()).unwrap();
            let members: Vec<Entity> = game
                .world
                .query::<&crate::ecs::RoomMember>()
                .iter()
                .map(|(e, _)| e)
                .collect();
            assert_eq!(members.len(), expected);
            for member in members {
                game.world.get::<&mut Health>(member).unwrap().current = 0;
            }
            game.tick(0.016, &idle()).unwrap();
        }

        assert_eq!(game.world.query::<&BoundaryWall>().iter().count(), 0);
        assert_eq!(game.goals().kills, 3);
    }

    #[test]
    fn test_screen_cycle_through_doors() {
        let mut game = game();
        game.enter_screen(GameScreen::BossArena { depth: 1, boss: BossKind::Boss1 }).unwrap();
        let boss = game
            .world
            .query::<&Enemy>()
            .iter()
            .map(|(e, _)| e)
            .next()
            .unwrap();
        let boss_at = game.world.get::<&Position>(boss).unwrap().0;
        game.world.get::<&mut Health>(boss).unwrap().current = 0;
        game.tick(0.016, &idle()).unwrap();
        assert!(!game.world.contains(boss));

        game.move_player(boss_at);
        let report = game.tick(0.016, &interact()).unwrap();
        assert_eq!(report.entered, Some(GameScreen::InBetween { depth: 1 }));

        // One kill is far short of the kill goal
        assert!(!game.goals().results()[0]);
        let layout = ArenaLayout::load(ArenaKind::InBetween, game.data.generation.min_wall_collision).unwrap();
        let gate = layout.goal_gates[0].unwrap();
        let sealed = game
            .world
            .query::<(&Position, &Hitbox, &crate::ecs::Wall)>()
            .iter()
            .any(|(_, (pos, hitbox, _))| {
                pos.0 == gate.world_center() && hitbox.size == gate.world_size() && hitbox.layer == CollisionLayer::WALL
            });
        assert!(sealed);

        let door = game
            .world
            .query::<(&Position, &Interactable)>()
            .iter()
            .find(|(_, (_, i))| matches!(i, Interactable::Door(Destination::NextFloor)))
            .map(|(_, (p, _))| p.0)
            .unwrap();
        game.move_player(door);
        let report = game.tick(0.016, &interact()).unwrap();
        assert_eq!(report.entered, Some(GameScreen::Floor { depth: 2 }));
    }

    #[test]
    fn test_sacrifice_halves_health_for_relics() {
        let mut game = empty_game();
        let altar = systems::spawn_interactable(
            &mut game.world,
            Vec2::new(16.0, 0.0),
            Interactable::Sacrifice { relics: SACRIFICE_RELICS },
        );
        game.world.get::<&mut Health>(game.player).unwrap().current = 81;
        game.tick(0.016, &interact()).unwrap();

        assert_eq!(game.player_health().unwrap().current, 41);
        assert!(game.world.get::<&Interactable>(altar).is_err());
        let relics = game
            .world
            .query::<&Interactable>()
            .iter()
            .filter(|(_, i)| matches!(i, Interactable::Pickup(LootDrop::Relic(r)) if *r != Relic::Numbers))
            .count();
        assert_eq!(relics, SACRIFICE_RELICS as usize);
    }

    #[test]
    fn test_spell_pickup_swaps_and_clears_choice() {
        let mut game = empty_game();
        let offered = SpellRef::Projectile(ProjectileSpellId::Lightning);
        let taken = systems::spawn_interactable(
            &mut game.world,
            Vec2::new(10.0, 0.0),
            Interactable::Pickup(LootDrop::Spell(offered)),
        );
        let other = systems::spawn_interactable(
            &mut game.world,
            Vec2::new(200.0, 0.0),
            Interactable::Pickup(LootDrop::Spell(SpellRef::Projectile(ProjectileSpellId::Magnet))),
        );
        game.world.insert_one(taken, ChoiceSibling(other)).unwrap();
        game.world.insert_one(other, ChoiceSibling(taken)).unwrap();

        game.tick(0.016, &interact()).unwrap();

        let slots = game.world.get::<&SpellSlots>(game.player).unwrap();
        assert_eq!(slots.get(PROJECTILE_SLOT).unwrap().spell, offered);
        assert_eq!(
            slots.get(MOVEMENT_SLOT).unwrap().spell,
            SpellRef::Movement(MovementSpellId::Dash)
        );
        drop(slots);
        assert!(!game.world.contains(other));
        assert!(matches!(
            *game.world.get::<&Interactable>(taken).unwrap(),
            Interactable::Pickup(LootDrop::Spell(SpellRef::Projectile(ProjectileSpellId::Fireball)))
        ));
    }

    #[test]
    fn test_relic_goes_to_chosen_slot() {
        let mut game = empty_game();
        systems::spawn_interactable(
            &mut game.world,
            Vec2::new(10.0, 0.0),
            Interactable::Pickup(LootDrop::Relic(Relic::Speed)),
        );
        let input = PlayerInput {
            interact: true,
            apply_to_movement: true,
            ..PlayerInput::default()
        };
        game.tick(0.016, &input).unwrap();
        let slots = game.world.get::<&SpellSlots>(game.player).unwrap();
        assert_eq!(slots.get(MOVEMENT_SLOT).unwrap().relics, vec![Relic::Speed]);
        assert!(slots.get(PROJECTILE_SLOT).unwrap().relics.is_empty());
    }

    #[test]
    fn test_mimic_wakes_up() {
        let mut game = empty_game();
        systems::spawn_interactable(&mut game.world, Vec2::new(10.0, 0.0), Interactable::Mimic);
        game.tick(0.016, &interact()).unwrap();
        let kinds: Vec<EnemyKind> = game.world.query::<&Enemy>().iter().map(|(_, e)| e.kind).collect();
        assert_eq!(kinds, vec![MIMIC_KIND]);
    }

    #[test]
    fn test_boss2_controller_outlives_first_segment() {
        let mut game = empty_game();
        let controller = spawn_boss(&mut game.world, BossKind::Boss2, Vec2::new(400.0, 0.0), &game.data.enemies);
        let segments = *game.world.get::<&BossSegments>(controller).unwrap();
        let [Some(first), Some(second)] = segments.0 else {
            panic!("boss 2 spawned without both segments");
        };

        game.world.get::<&mut Health>(first).unwrap().current = 0;
        game.tick(0.016, &idle()).unwrap();
        assert!(game.world.contains(controller));
        game.tick(0.016, &idle()).unwrap();
        assert!(game.world.get::<&Lootable>(second).is_ok());

        game.world.get::<&mut Health>(second).unwrap().current = 0;
        game.tick(0.016, &idle()).unwrap();
        assert!(!game.world.contains(controller));
        let doors = game
            .world
            .query::<&Interactable>()
            .iter()
            .filter(|(_, i)| matches!(i, Interactable::Door(Destination::InBetween)))
            .count();
        assert_eq!(doors, 1);
    }
}
