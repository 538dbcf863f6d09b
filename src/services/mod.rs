// src/services/mod.rs

pub mod course;
pub mod curriculum;
pub mod enrollment;
pub mod grading;
pub mod ordering;
pub mod progress;
pub mod quiz;
