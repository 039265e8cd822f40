//! Clinic scheduling domain.
//!
//! Doctors publish availability windows; appointments are booked against
//! those windows with conflict detection; human agents can take over a
//! conversation. The [`SchedulingService`] exposes every operation as a
//! user-facing text outcome so the assistant can relay results verbatim.

pub mod domain;
pub mod error;
pub mod service;
pub mod store;

pub use domain::{
    AccountRef, Appointment, AppointmentStatus, AvailabilitySlot, Doctor, HumanAgent,
};
pub use error::StoreError;
pub use service::{AccountLookup, BookingRequest, NoAccounts, SchedulingService, StaticAccounts};
pub use store::{
    AgentStore, AppointmentStore, DoctorStore, InMemoryAgentStore, InMemoryAppointmentStore,
    InMemoryDoctorStore, InMemorySlotStore, SlotStore,
};
