// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resumable units of work.
//!
//! A [`MicroTask`] is an explicit state machine. Each [`resume`](MicroTask::resume)
//! call performs one bounded step, so a scheduler can interleave many tasks
//! across frames without any of them stalling the render loop. Tasks hold no
//! references to the outside world: dropping a task cancels it.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

/// A unit of incremental computation.
pub trait MicroTask {
    /// Value produced when the task finishes.
    type Output;

    /// Advance by one bounded step. Calling this on a finished task does nothing.
    fn resume(&mut self);

    /// Whether more steps remain.
    fn alive(&self) -> bool;

    /// Take the result of a finished task.
    ///
    /// Returns `None` while the task is alive and after the result was taken.
    fn take_result(&mut self) -> Option<Self::Output>;
}

impl<T: MicroTask + ?Sized> MicroTask for Box<T> {
    type Output = T::Output;

    fn resume(&mut self) {
        (**self).resume();
    }

    fn alive(&self) -> bool {
        (**self).alive()
    }

    fn take_result(&mut self) -> Option<Self::Output> {
        (**self).take_result()
    }
}

/// Combinators for [`MicroTask`].
pub trait MicroTaskExt: MicroTask + Sized {
    /// Transform the result once the task finishes.
    fn map<U, F>(self, f: F) -> Map<Self, F, U>
    where
        F: FnOnce(Self::Output) -> U,
    {
        Map {
            task: self,
            f: Some(f),
            output: None,
        }
    }

    /// Continue with a second task built from the first one's result.
    ///
    /// The second task starts on the step after the first one finishes.
    fn flat_map<N, F>(self, f: F) -> FlatMap<Self, F, N>
    where
        N: MicroTask,
        F: FnOnce(Self::Output) -> N,
    {
        FlatMap {
            state: FlatMapState::First(self, f),
        }
    }

    /// Erase the concrete task type.
    fn boxed<'a>(self) -> Box<dyn MicroTask<Output = Self::Output> + 'a>
    where
        Self: 'a,
    {
        Box::new(self)
    }
}

impl<T: MicroTask> MicroTaskExt for T {}

/// Drive a task until it finishes and return its result.
///
/// Intended for tests and for callers that do not need to spread the work.
pub fn run_to_completion<T: MicroTask>(mut task: T) -> Option<T::Output> {
    while task.alive() {
        task.resume();
    }
    task.take_result()
}

/// A task that is finished from the start.
pub fn ready<T>(value: T) -> Ready<T> {
    Ready(Some(value))
}

/// Run tasks one after another and collect their results in order.
pub fn join<T: MicroTask>(tasks: Vec<T>) -> Join<T> {
    Join {
        results: Vec::with_capacity(tasks.len()),
        tasks,
        current: 0,
        done: false,
    }
}

/// See [`ready`].
#[derive(Debug)]
pub struct Ready<T>(Option<T>);

impl<T> MicroTask for Ready<T> {
    type Output = T;

    fn resume(&mut self) {}

    fn alive(&self) -> bool {
        false
    }

    fn take_result(&mut self) -> Option<T> {
        self.0.take()
    }
}

/// See [`MicroTaskExt::map`].
pub struct Map<T, F, U> {
    task: T,
    f: Option<F>,
    output: Option<U>,
}

impl<T: fmt::Debug, F, U> fmt::Debug for Map<T, F, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("task", &self.task)
            .field("pending", &self.f.is_some())
            .finish_non_exhaustive()
    }
}

impl<T, F, U> MicroTask for Map<T, F, U>
where
    T: MicroTask,
    F: FnOnce(T::Output) -> U,
{
    type Output = U;

    fn resume(&mut self) {
        if self.f.is_none() {
            return;
        }
        if self.task.alive() {
            self.task.resume();
        }
        if !self.task.alive()
            && let Some(f) = self.f.take()
        {
            self.output = self.task.take_result().map(f);
        }
    }

    fn alive(&self) -> bool {
        self.f.is_some()
    }

    fn take_result(&mut self) -> Option<U> {
        self.output.take()
    }
}

enum FlatMapState<T, F, N> {
    First(T, F),
    Second(N),
    Done,
}

/// See [`MicroTaskExt::flat_map`].
pub struct FlatMap<T, F, N> {
    state: FlatMapState<T, F, N>,
}

impl<T, F, N> fmt::Debug for FlatMap<T, F, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.state {
            FlatMapState::First(..) => "first",
            FlatMapState::Second(_) => "second",
            FlatMapState::Done => "done",
        };
        f.debug_struct("FlatMap").field("stage", &stage).finish()
    }
}

impl<T, F, N> MicroTask for FlatMap<T, F, N>
where
    T: MicroTask,
    N: MicroTask,
    F: FnOnce(T::Output) -> N,
{
    type Output = N::Output;

    fn resume(&mut self) {
        if let FlatMapState::Second(next) = &mut self.state {
            if next.alive() {
                next.resume();
            }
            return;
        }
        if let FlatMapState::First(mut task, f) = mem::replace(&mut self.state, FlatMapState::Done) {
            if task.alive() {
                task.resume();
            }
            if task.alive() {
                self.state = FlatMapState::First(task, f);
            } else if let Some(value) = task.take_result() {
                self.state = FlatMapState::Second(f(value));
            }
        }
    }

    fn alive(&self) -> bool {
        match &self.state {
            FlatMapState::First(..) => true,
            FlatMapState::Second(next) => next.alive(),
            FlatMapState::Done => false,
        }
    }

    fn take_result(&mut self) -> Option<N::Output> {
        match &mut self.state {
            FlatMapState::Second(next) if !next.alive() => {
                let out = next.take_result();
                self.state = FlatMapState::Done;
                out
            }
            _ => None,
        }
    }
}

/// See [`join`].
pub struct Join<T: MicroTask> {
    tasks: Vec<T>,
    results: Vec<T::Output>,
    current: usize,
    done: bool,
}

impl<T: MicroTask> fmt::Debug for Join<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Join")
            .field("tasks", &self.tasks.len())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<T: MicroTask> MicroTask for Join<T> {
    type Output = Vec<T::Output>;

    fn resume(&mut self) {
        let Some(task) = self.tasks.get_mut(self.current) else {
            return;
        };
        if task.alive() {
            task.resume();
        }
        if !task.alive() {
            if let Some(value) = task.take_result() {
                self.results.push(value);
            }
            self.current += 1;
        }
    }

    fn alive(&self) -> bool {
        self.current < self.tasks.len()
    }

    fn take_result(&mut self) -> Option<Self::Output> {
        if self.alive() || self.done {
            return None;
        }
        self.done = true;
        Some(mem::take(&mut self.results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Counts down, one step per resume.
    #[derive(Debug)]
    struct Countdown {
        left: u32,
        steps: u32,
        taken: bool,
    }

    fn countdown(left: u32) -> Countdown {
        Countdown {
            left,
            steps: 0,
            taken: false,
        }
    }

    impl MicroTask for Countdown {
        type Output = u32;

        fn resume(&mut self) {
            if self.left > 0 {
                self.left -= 1;
                self.steps += 1;
            }
        }

        fn alive(&self) -> bool {
            self.left > 0
        }

        fn take_result(&mut self) -> Option<u32> {
            if self.alive() || self.taken {
                return None;
            }
            self.taken = true;
            Some(self.steps)
        }
    }

    #[test]
    fn run_to_completion_counts_steps() {
        assert_eq!(run_to_completion(countdown(5)), Some(5));
        assert_eq!(run_to_completion(ready("x")), Some("x"));
    }

    #[test]
    fn map_applies_once() {
        let mut task = countdown(2).map(|n| n * 10);
        assert!(task.alive());
        task.resume();
        assert!(task.alive());
        assert_eq!(task.take_result(), None);
        task.resume();
        assert!(!task.alive());
        assert_eq!(task.take_result(), Some(20));
        assert_eq!(task.take_result(), None);
    }

    #[test]
    fn flat_map_chains_tasks() {
        let mut task = countdown(1).flat_map(|n| countdown(n + 2));
        let mut resumes = 0;
        while task.alive() {
            task.resume();
            resumes += 1;
        }
        // One step for the first task, three for the second.
        assert_eq!(resumes, 4);
        assert_eq!(task.take_result(), Some(3));
    }

    #[test]
    fn join_collects_in_order() {
        let task = join(vec![countdown(1), countdown(0), countdown(3)]);
        assert_eq!(run_to_completion(task), Some(vec![1, 0, 3]));
        assert_eq!(run_to_completion(join(Vec::<Countdown>::new())), Some(vec![]));
    }

    #[test]
    fn boxed_tasks_are_object_safe() {
        let tasks: Vec<Box<dyn MicroTask<Output = u32>>> =
            vec![countdown(2).boxed(), ready(7).boxed()];
        let results: Vec<_> = tasks.into_iter().filter_map(run_to_completion).collect();
        assert_eq!(results, vec![2, 7]);
    }
}
