//! Membercore - Membership lifecycle and quota consumption engine.
//!
//! This crate implements the subscription core of a services marketplace:
//! the membership state machine, per-period quota ledgers with atomic
//! check-and-consume semantics, and single-use coupon redemption.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
