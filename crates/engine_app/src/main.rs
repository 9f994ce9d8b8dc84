//! # engine_app — demo host
//!
//! Builds a small arena of moving entities and drives it with a
//! [`TickLoop`]:
//!
//! 1. One space holding a few `Position` + `Velocity` entities.
//! 2. A subspace tracking the entities that are moving.
//! 3. A movement system, and a bounds system that brakes entities leaving the
//!    arena and announces it through the space's dispatcher.
//!
//! Tick rate and run length come from `ENGINE_TICK_RATE` and
//! `ENGINE_MAX_TICKS` (default here: 120 ticks).

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use engine_app::{Game, TickConfig, TickLoop};
use engine_component::AnyComponent;
use engine_ecs::{Entity, EntityRef, EntitySelector, Space, Subspace, SubspaceHooks};
use engine_event::GameEvent;
use engine_math::{Position, Velocity};
use engine_system::{System, system_fn};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const ARENA_RADIUS: f32 = 50.0;

/// Entity type flag for anything that moves on its own.
const MOBILE: u64 = 0b01;

/// Dispatched when an entity crosses the arena edge.
struct LeftArena {
    entity: u64,
}

impl GameEvent for LeftArena {
    fn type_name() -> &'static str {
        "LeftArena"
    }
}

/// Dispatched at the game level once the demo is set up.
struct RoundStarted;

impl GameEvent for RoundStarted {
    fn type_name() -> &'static str {
        "RoundStarted"
    }
}

/// Logs membership changes of the "moving" subspace.
#[derive(Default)]
struct MovingLog {
    joined: u32,
    left: u32,
}

impl SubspaceHooks for MovingLog {
    fn entity_added(&mut self, entity: &EntityRef) {
        self.joined += 1;
        debug!(entity = entity.borrow().id, "started moving");
    }

    fn entity_removed(&mut self, entity: &EntityRef) {
        self.left += 1;
        debug!(entity = entity.borrow().id, "stopped moving");
    }

    fn will_remove_component(&mut self, entity: &Entity, component: &dyn AnyComponent) {
        debug!(entity = entity.id, component = component.component_name(), "component removed");
    }
}

/// Strips the velocity of anything outside the arena.
struct Bounds {
    selector: EntitySelector,
}

impl System for Bounds {
    fn update(&mut self, space: &mut Space, _interval: f64) {
        let escaped: Vec<EntityRef> = self
            .selector
            .select(space.entities())
            .filter(|entity| {
                entity
                    .borrow()
                    .component::<Position>()
                    .is_some_and(|p| p.distance(Position::ORIGIN) > ARENA_RADIUS)
            })
            .cloned()
            .collect();

        for entity in escaped {
            space.remove_components::<Velocity>(&entity);
            let id = entity.borrow().id;
            space
                .event_dispatcher()
                .dispatch_event(&LeftArena { entity: id });
        }
    }
}

fn build_space() -> Space {
    let mut space = Space::new();
    let speeds = [(8.0, 0.0), (0.0, -3.0), (-12.0, 12.0), (0.5, 0.5)];
    for (id, (vx, vy)) in (1..).zip(speeds) {
        space.spawn(
            Entity::empty()
                .with(Position::ORIGIN)
                .with(Velocity::new(vx, vy))
                .with_id(id)
                .with_type_flags(MOBILE),
        );
    }
    // A fixed landmark: positioned, never moves.
    space.spawn(Entity::empty().with(Position::new(10.0, 10.0)).with_id(100));
    space
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let mut config = TickConfig::from_env()?;
    if config.max_ticks == 0 {
        config.max_ticks = 120;
    }

    let moving_selector = EntitySelector::component::<Position>()
        & EntitySelector::component::<Velocity>()
        & EntitySelector::type_flag(MOBILE);

    let space = Rc::new(RefCell::new(build_space()));
    let moving = Subspace::with_hooks(moving_selector.clone(), MovingLog::default()).into_shared();
    space.borrow_mut().add_subspace(&moving);

    space
        .borrow()
        .event_dispatcher()
        .subscribe::<LeftArena, _>(|event| info!(entity = event.entity, "left the arena"));
    space
        .borrow()
        .event_dispatcher()
        .subscribe::<RoundStarted, _>(|_| info!("round started"));

    let mut game = Game::new();
    game.add_space(&space);
    game.add_system(system_fn("movement", |space, interval| {
        for entity in space.entities() {
            let mut entity = entity.borrow_mut();
            let Some(velocity) = entity.component::<Velocity>().copied() else {
                continue;
            };
            if let Some(position) = entity.component_mut::<Position>() {
                *position = position.advanced(velocity, interval);
            }
        }
    }));
    game.add_system(Bounds {
        selector: moving_selector,
    });

    info!(
        entities = space.borrow().entities().len(),
        moving = moving.borrow().len(),
        "demo ready"
    );
    game.dispatch_event(&RoundStarted);

    let mut tick_loop = TickLoop::new(config, game);
    tick_loop.run();

    let moving = moving.borrow();
    info!(
        ticks = tick_loop.tick_id(),
        still_moving = moving.len(),
        joined = moving.hooks().joined,
        left = moving.hooks().left,
        "demo finished"
    );
    Ok(())
}
