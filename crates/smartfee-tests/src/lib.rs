//! End-to-end test suite for Smart Fee.
//!
//! Runs the planner against loopback fakes of the Smart Fee API and of an
//! Express wallet gateway, plus an in-process scripted wallet engine.

pub mod helpers;
