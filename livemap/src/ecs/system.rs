// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Systems and the fixed-order schedule that runs them.

use std::fmt;
use std::time::{Duration, Instant};

use super::world::World;

/// One step of the per-tick pipeline.
///
/// `C` is the context shared by all systems of a schedule (viewport, output
/// surface, and so on). Systems must not block: long work belongs in a
/// micro-task.
pub trait System<C> {
    /// Name used in logs and timings.
    fn name(&self) -> &'static str;

    /// Called once before the first update.
    fn init(&mut self, _world: &mut World, _ctx: &mut C) {}

    /// Advance by one tick.
    fn update(&mut self, world: &mut World, ctx: &mut C, dt: Duration);
}

/// Wall-clock time spent in each system during the last tick.
#[derive(Clone, Debug, Default)]
pub struct SystemTimings {
    per_system: Vec<(&'static str, Duration)>,
    total: Duration,
}

impl SystemTimings {
    /// Time of the named system, if it ran.
    pub fn get(&self, name: &str) -> Option<Duration> {
        self.per_system
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, d)| *d)
    }

    /// The system that took longest.
    pub fn slowest(&self) -> Option<(&'static str, Duration)> {
        self.per_system.iter().copied().max_by_key(|(_, d)| *d)
    }

    /// Sum over all systems.
    pub fn total(&self) -> Duration {
        self.total
    }

    /// `(name, duration)` in run order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.per_system.iter().copied()
    }
}

/// Systems run to completion, one after another, in the order they were added.
pub struct SystemSchedule<C> {
    systems: Vec<Box<dyn System<C>>>,
    initialized: bool,
    timings: SystemTimings,
    ticks: u64,
}

impl<C> fmt::Debug for SystemSchedule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.systems.iter().map(|s| s.name()).collect();
        f.debug_struct("SystemSchedule")
            .field("systems", &names)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl<C> Default for SystemSchedule<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SystemSchedule<C> {
    /// An empty schedule.
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            initialized: false,
            timings: SystemTimings::default(),
            ticks: 0,
        }
    }

    /// Append a system; it runs after every system added before it.
    pub fn add(&mut self, system: impl System<C> + 'static) -> &mut Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Names in run order.
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Timings of the last tick.
    pub fn timings(&self) -> &SystemTimings {
        &self.timings
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run every system once.
    pub fn tick(&mut self, world: &mut World, ctx: &mut C, dt: Duration) {
        if !self.initialized {
            for system in &mut self.systems {
                tracing::debug!(target: "livemap::ecs", system = system.name(), "system.init");
                system.init(world, ctx);
            }
            self.initialized = true;
        }
        self.timings.per_system.clear();
        let mut total = Duration::ZERO;
        for system in &mut self.systems {
            let span = tracing::trace_span!("system", name = system.name());
            let _guard = span.enter();
            let start = Instant::now();
            system.update(world, ctx, dt);
            let elapsed = start.elapsed();
            total += elapsed;
            self.timings.per_system.push((system.name(), elapsed));
        }
        self.timings.total = total;
        self.ticks += 1;
        if let Some((name, slowest)) = self.timings.slowest() {
            tracing::trace!(
                target: "livemap::ecs",
                tick = self.ticks,
                total_us = total.as_micros() as u64,
                slowest = name,
                slowest_us = slowest.as_micros() as u64,
                "schedule.tick"
            );
        }
    }
}
