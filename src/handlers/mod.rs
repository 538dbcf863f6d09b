// src/handlers/mod.rs

pub mod auth;
pub mod course;
pub mod curriculum;
pub mod enrollment;
pub mod profile;
pub mod progress;
pub mod quiz;
