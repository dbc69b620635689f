//! # kickoff-rs
//!
//! Campaign kickoff execution engine.
//!
//! Given a campaign whose entry points are "kickoff" events and a population
//! of newly eligible contacts, the executioner decides per (contact, event)
//! pair whether the event fires now or is deferred, dispatches the immediate
//! ones, persists the deferred ones, and reports progress. Contacts are
//! processed in bounded batches so campaigns with millions of members never
//! load everything at once.

#![allow(async_fn_in_trait)]

pub mod actions;
pub mod config;
pub mod contacts;
pub mod db;
pub mod error;
pub mod executioner;
pub mod executor;
pub mod host;
pub mod model;
pub mod scheduler;
pub mod telemetry;
