//! Clinic domain records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clinic_relay_core::{AgentId, AppointmentId, DoctorId, RoomId, SlotId, UserId};
use serde::{Deserialize, Serialize};

/// Appointment slot granularity, in minutes.
pub const SLOT_DURATION_MINUTES: i64 = 30;

/// A doctor on the clinic roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    /// Unique doctor identifier.
    pub id: DoctorId,
    /// Display name, e.g. "Dr. Smith".
    pub name: String,
    /// Medical specialty, e.g. "Cardiology".
    pub specialty: String,
    /// Short description shown to patients.
    pub description: String,
}

impl Doctor {
    /// Creates a roster entry.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        specialty: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: DoctorId::new(),
            name: name.into(),
            specialty: specialty.into(),
            description: description.into(),
        }
    }
}

/// A bookable availability window of a doctor on one date.
///
/// Windows of the same doctor may overlap; bookings are deconflicted per
/// appointment, not per window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    /// Unique slot identifier.
    pub id: SlotId,
    /// Owning doctor.
    pub doctor: DoctorId,
    /// Calendar date of the window.
    pub date: NaiveDate,
    /// Window start, inclusive.
    pub start_time: NaiveTime,
    /// Window end, inclusive for containment checks.
    pub end_time: NaiveTime,
    /// Whether the window is open for booking.
    pub available: bool,
}

impl AvailabilitySlot {
    /// Creates an open window.
    #[must_use]
    pub fn new(doctor: DoctorId, date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: SlotId::new(),
            doctor,
            date,
            start_time,
            end_time,
            available: true,
        }
    }

    /// Returns true if the window contains the given time.
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start_time <= time && time <= self.end_time
    }
}

/// Appointment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Booked,
    Cancelled,
    Completed,
}

/// A booked appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    /// Unique appointment identifier.
    pub id: AppointmentId,
    /// The doctor seen.
    pub doctor: DoctorId,
    /// Linked account, when the patient name resolved to a registered user.
    pub patient: Option<UserId>,
    /// Username of the linked account, kept for name-based lookup.
    pub patient_username: Option<String>,
    /// Free-text patient name.
    pub patient_name: String,
    /// Contact phone, if given.
    pub patient_phone: Option<String>,
    /// Contact email, if given.
    pub patient_email: Option<String>,
    /// Scheduled date and time.
    pub datetime: NaiveDateTime,
    /// Lifecycle status.
    pub status: AppointmentStatus,
    /// Conversation the booking originated from.
    pub room: RoomId,
    /// Booking timestamp.
    pub created_at: DateTime<Utc>,
}

/// A reference to a registered account, resolved by username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRef {
    /// Account identifier.
    pub id: UserId,
    /// Account username.
    pub username: String,
}

/// A human agent that can take over a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanAgent {
    /// Unique agent identifier.
    pub id: AgentId,
    /// Agent name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Whether the agent can take a new conversation.
    pub available: bool,
    /// The conversation currently bound to the agent, if any.
    pub current_room: Option<RoomId>,
}

impl HumanAgent {
    /// Creates an available agent.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            email: email.into(),
            available: true,
            current_room: None,
        }
    }
}
