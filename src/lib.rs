//! # Transit Simulation Core
//!
//! A discrete-event simulation engine for evaluating bus-dispatching
//! policies under stochastic passenger demand.
//!
//! ## Overview
//!
//! This crate provides the core simulation engine, including:
//!
//! - **Event Scheduling**: Second-precision discrete event system
//! - **ECS Framework**: Entity Component System for buses and passengers
//! - **Demand Model**: Tabulated arrival rates and destination weights
//! - **Dispatch Policies**: Pluggable timetable, fixed-interval, and
//!   adaptive-headway strategies, with an in-trip holding controller
//! - **Telemetry**: Domain event log and stop-visit export
//!
//! ## Key Concepts
//!
//! - **Discrete Events**: All simulation progress happens through scheduled
//!   events popped off a single timeline
//! - **Targeted Events**: Events target a specific stop, dispatcher, or bus
//! - **Deterministic**: A single seeded RNG makes a run reproducible
//! - **Two Directions, One Corridor**: Each physical corridor is modeled as
//!   two independent [`route::RouteConfig`]s sharing [`route::StopId`]s
//!
//! ## Example
//!
//! ```rust,no_run
//! use bevy_ecs::prelude::World;
//! use transit_sim_core::scenario::{build_scenario, ScenarioParams};
//! use transit_sim_core::runner::{initialize_simulation, run_until_empty};
//!
//! let mut world = World::new();
//! build_scenario(&mut world, ScenarioParams::default().with_seed(42)).unwrap();
//! initialize_simulation(&mut world);
//!
//! let steps = run_until_empty(&mut world, 1_000_000);
//! ```

pub mod clock;
pub mod error;
pub mod route;
pub mod demand;
pub mod distributions;
pub mod ecs;
pub mod traffic;
pub mod telemetry;
pub mod stop_ops;
pub mod generator;
pub mod dispatch;
pub mod profiling;
pub mod telemetry_export;
pub mod systems;
pub mod runner;
pub mod scenario;

#[cfg(test)]
pub mod test_support;
