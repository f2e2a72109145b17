// ABOUTME: Terminal front end for the handoff widget session core.
// ABOUTME: Input parsing, file loading and presentation sinks used by the handoff binary.

pub mod app;
pub mod commands;
pub mod presentation;
pub mod uploads;
