//! The collection of live particle systems.
//!
//! The registry creates systems, advances all of them once per tick, and
//! removes the ones that have finished. Every creation and removal is
//! recorded as a [`RegistryEvent`]; the host drains these each frame to
//! allocate and release its render resources exactly once per system.

use log::debug;
use rand::Rng;

use crate::system::{ParticleSystem, SystemId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryEvent {
    Spawned { id: SystemId, particles: usize },
    Removed { id: SystemId },
}

#[derive(Debug, Default)]
pub struct Registry {
    systems: Vec<ParticleSystem>,
    next_id: u64,
    events:  Vec<RegistryEvent>,
}

impl Registry {
    pub fn new() -> Self { Registry::default() }

    /// Reserve the id for the next system.
    pub fn next_id(&mut self) -> SystemId {
        self.next_id += 1;
        SystemId(self.next_id)
    }

    /// Take ownership of a freshly launched system.
    pub fn insert(&mut self, system: ParticleSystem) -> SystemId {
        let id = system.id();
        self.events.push(RegistryEvent::Spawned { id, particles: system.particle_count() });
        self.systems.push(system);
        id
    }

    /// Advance every live system; drop those that finished this tick.
    pub fn tick<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) {
        let events = &mut self.events;
        self.systems.retain_mut(|s| {
            if s.tick(dt, rng) {
                debug!("system {:?} finished, releasing {} particles", s.id(), s.particle_count());
                events.push(RegistryEvent::Removed { id: s.id() });
                false
            } else {
                true
            }
        });
    }

    /// Drain pending lifecycle events (non-blocking). Nothing is dropped
    /// while they wait, so call this every tick.
    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn systems(&self) -> &[ParticleSystem] { &self.systems }

    pub fn get(&self, id: SystemId) -> Option<&ParticleSystem> {
        self.systems.iter().find(|s| s.id() == id)
    }

    pub fn len(&self) -> usize { self.systems.len() }

    pub fn is_empty(&self) -> bool { self.systems.is_empty() }

    /// Total particles across all live systems.
    pub fn particle_count(&self) -> usize {
        self.systems.iter().map(|s| s.particle_count()).sum()
    }
}
