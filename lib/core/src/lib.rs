//! Core domain types and utilities for the clinic-relay platform.
//!
//! This crate provides the foundational types, error handling, and shared
//! utilities used throughout the clinic-relay real-time chat service.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{AgentId, AppointmentId, DoctorId, MessageId, RoomId, SlotId, UserId};
