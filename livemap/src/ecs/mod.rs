// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small entity/component/system runtime.
//!
//! [`World`] owns entities and their components; [`SystemSchedule`] runs
//! [`System`]s in a fixed declared order once per tick. Everything is single
//! threaded and deterministic: no system observes another one half done.

mod system;
mod world;

pub use system::{System, SystemSchedule, SystemTimings};
pub use world::{Component, EntityId, World};
