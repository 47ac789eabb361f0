//! HTTP route handlers

pub mod league;
pub mod player;
pub mod referee;
