// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Driving micro-tasks attached to entities.

use std::fmt;
use std::time::Duration;

use livemap_geometry::{MicroTask, MicroTaskExt};

use crate::ecs::{EntityId, System, World};

/// A change to apply to the world once a task finishes.
pub type WorldEdit = Box<dyn FnOnce(&mut World, EntityId)>;

/// A micro-task owned by an entity.
///
/// Despawning the entity, or replacing this component, drops the task, which
/// cancels it.
pub struct MicroThreadComponent {
    task: Box<dyn MicroTask<Output = WorldEdit>>,
}

impl fmt::Debug for MicroThreadComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicroThreadComponent")
            .field("alive", &self.task.alive())
            .finish()
    }
}

impl MicroThreadComponent {
    /// Wrap a task that produces its own world edit.
    pub fn new<T>(task: T) -> Self
    where
        T: MicroTask<Output = WorldEdit> + 'static,
    {
        Self {
            task: Box::new(task),
        }
    }

    /// Wrap a task and a function that applies its result to the owning entity.
    pub fn with_edit<T, F>(task: T, edit: F) -> Self
    where
        T: MicroTask + 'static,
        T::Output: 'static,
        F: FnOnce(T::Output, &mut World, EntityId) + 'static,
    {
        Self::new(task.map(move |output| -> WorldEdit {
            Box::new(move |world: &mut World, entity: EntityId| edit(output, world, entity))
        }))
    }

    /// Whether the task has steps left.
    pub fn alive(&self) -> bool {
        self.task.alive()
    }
}

/// Resumes up to `quantum` micro-tasks per tick, round robin.
///
/// Each selected task gets exactly one `resume()`, so the cost of a tick is
/// bounded no matter how much work is queued. A finished task's component is
/// removed and its edit applied to the owning entity.
#[derive(Debug)]
pub struct MicroTaskSystem {
    quantum: usize,
    cursor: usize,
    finished: u64,
}

impl MicroTaskSystem {
    /// Create the system.
    pub fn new(quantum: usize) -> Self {
        Self {
            quantum: quantum.max(1),
            cursor: 0,
            finished: 0,
        }
    }

    /// Tasks completed since creation.
    pub fn finished(&self) -> u64 {
        self.finished
    }
}

impl<C> System<C> for MicroTaskSystem {
    fn name(&self) -> &'static str {
        "micro_tasks"
    }

    fn update(&mut self, world: &mut World, _ctx: &mut C, _dt: Duration) {
        let entities = world.entities_with::<MicroThreadComponent>();
        if entities.is_empty() {
            self.cursor = 0;
            return;
        }
        let start = self.cursor % entities.len();
        let budget = self.quantum.min(entities.len());
        for &entity in entities.iter().cycle().skip(start).take(budget) {
            let Some(thread) = world.get_mut::<MicroThreadComponent>(entity) else {
                continue;
            };
            if thread.task.alive() {
                thread.task.resume();
            }
            if thread.task.alive() {
                continue;
            }
            let Some(mut thread) = world.remove::<MicroThreadComponent>(entity) else {
                continue;
            };
            self.finished += 1;
            match thread.task.take_result() {
                Some(edit) => edit(world, entity),
                None => tracing::warn!(
                    target: "livemap::tasks",
                    %entity,
                    "micro_task.finished_without_result"
                ),
            }
        }
        self.cursor = start + budget;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livemap_geometry::{ready, run_to_completion};

    /// Finishes after `left` resumes.
    struct Steps {
        left: u32,
        done: bool,
    }

    impl MicroTask for Steps {
        type Output = u32;

        fn resume(&mut self) {
            self.left = self.left.saturating_sub(1);
        }

        fn alive(&self) -> bool {
            self.left > 0
        }

        fn take_result(&mut self) -> Option<u32> {
            (!self.alive() && !std::mem::replace(&mut self.done, true)).then_some(7)
        }
    }

    #[derive(Debug, PartialEq)]
    struct Done(u32);

    fn attach(world: &mut World, name: &str, steps: u32) -> EntityId {
        let id = world.spawn(name);
        let task = Steps {
            left: steps,
            done: false,
        };
        world.insert(
            id,
            MicroThreadComponent::with_edit(task, |value, world: &mut World, id| {
                world.insert(id, Done(value));
            }),
        );
        id
    }

    #[test]
    fn finished_tasks_apply_their_edit() {
        let mut world = World::new();
        let id = attach(&mut world, "one", 2);
        let mut system = MicroTaskSystem::new(4);
        System::<()>::update(&mut system, &mut world, &mut (), Duration::ZERO);
        assert!(world.contains::<MicroThreadComponent>(id));
        assert_eq!(world.get::<Done>(id), None);
        System::<()>::update(&mut system, &mut world, &mut (), Duration::ZERO);
        assert!(!world.contains::<MicroThreadComponent>(id));
        assert_eq!(world.get::<Done>(id), Some(&Done(7)));
        assert_eq!(system.finished(), 1);
    }

    #[test]
    fn quantum_bounds_work_per_tick() {
        let mut world = World::new();
        let ids: Vec<_> = (0..5).map(|i| attach(&mut world, &format!("t{i}"), 1)).collect();
        let mut system = MicroTaskSystem::new(2);
        System::<()>::update(&mut system, &mut world, &mut (), Duration::ZERO);
        assert_eq!(world.count::<Done>(), 2);
        System::<()>::update(&mut system, &mut world, &mut (), Duration::ZERO);
        assert_eq!(world.count::<Done>(), 4);
        System::<()>::update(&mut system, &mut world, &mut (), Duration::ZERO);
        assert!(ids.iter().all(|id| world.contains::<Done>(*id)));
    }

    #[test]
    fn round_robin_reaches_every_task() {
        let mut world = World::new();
        let ids: Vec<_> = (0..3).map(|i| attach(&mut world, &format!("t{i}"), 3)).collect();
        let mut system = MicroTaskSystem::new(1);
        for _ in 0..9 {
            System::<()>::update(&mut system, &mut world, &mut (), Duration::ZERO);
        }
        assert!(ids.iter().all(|id| world.contains::<Done>(*id)));
    }

    #[test]
    fn despawn_cancels() {
        let mut world = World::new();
        let id = attach(&mut world, "gone", 3);
        world.despawn(id);
        let mut system = MicroTaskSystem::new(4);
        System::<()>::update(&mut system, &mut world, &mut (), Duration::ZERO);
        assert_eq!(system.finished(), 0);
        assert_eq!(run_to_completion(ready(1)), Some(1));
    }
}
