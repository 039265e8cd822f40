//! Scheduling operations with user-facing text outcomes.
//!
//! Every operation returns text the assistant can relay verbatim. "Not
//! found" and "not available" are outcomes, not errors; store failures are
//! logged and folded into an apologetic reply.

use crate::domain::{
    Appointment, AppointmentStatus, AvailabilitySlot, Doctor, SLOT_DURATION_MINUTES,
};
use crate::store::{AgentStore, AppointmentStore, DoctorStore, SlotStore};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clinic_relay_core::{AppointmentId, DoctorId, RoomId, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Resolves a free-text patient name to a registered account.
#[async_trait]
pub trait AccountLookup: Send + Sync {
    /// Returns the account whose username matches the name, if any.
    async fn find_account(&self, username: &str) -> Option<crate::domain::AccountRef>;
}

/// Account lookup that never resolves. Used when no directory is wired.
#[derive(Debug, Default)]
pub struct NoAccounts;

#[async_trait]
impl AccountLookup for NoAccounts {
    async fn find_account(&self, _username: &str) -> Option<crate::domain::AccountRef> {
        None
    }
}

/// A booking request, already parsed into typed fields.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    /// Doctor display name.
    pub doctor_name: String,
    /// Appointment date.
    pub date: NaiveDate,
    /// Appointment time.
    pub time: NaiveTime,
    /// Free-text patient name.
    pub patient_name: String,
    /// Contact phone, if given.
    pub patient_phone: Option<String>,
    /// Contact email, if given.
    pub patient_email: Option<String>,
    /// Conversation the booking originates from.
    pub room: RoomId,
}

/// The clinic scheduling service.
pub struct SchedulingService {
    doctors: Arc<dyn DoctorStore>,
    slots: Arc<dyn SlotStore>,
    appointments: Arc<dyn AppointmentStore>,
    agents: Arc<dyn AgentStore>,
    accounts: Arc<dyn AccountLookup>,
    // One mutex per doctor held across the availability check, conflict
    // check, write, and verification read, so concurrent bookings for the
    // same doctor serialize and exactly one of two colliders wins.
    booking_locks: Mutex<HashMap<DoctorId, Arc<tokio::sync::Mutex<()>>>>,
}

impl SchedulingService {
    /// Creates the service over its stores.
    #[must_use]
    pub fn new(
        doctors: Arc<dyn DoctorStore>,
        slots: Arc<dyn SlotStore>,
        appointments: Arc<dyn AppointmentStore>,
        agents: Arc<dyn AgentStore>,
        accounts: Arc<dyn AccountLookup>,
    ) -> Self {
        Self {
            doctors,
            slots,
            appointments,
            agents,
            accounts,
            booking_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Lists doctors with a given specialty.
    pub async fn search_by_specialty(&self, specialty: &str) -> String {
        let doctors = match self.doctors.find_by_specialty(specialty).await {
            Ok(doctors) => doctors,
            Err(error) => {
                tracing::error!(%error, specialty, "doctor search failed");
                return storage_apology();
            }
        };

        if doctors.is_empty() {
            return format!(
                "Sorry, we do not have any doctors with the specialty '{specialty}' at our \
                 clinic. Is there anything else I could help you with?"
            );
        }

        let listing = doctors
            .iter()
            .map(|d| format!("{} - {}", d.name, d.specialty))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Here are the {specialty} doctors available: {listing}")
    }

    /// Checks a doctor's availability on a date, optionally at a time.
    ///
    /// The date defaults to today. A time filter keeps only windows that
    /// contain the requested time.
    pub async fn check_availability(
        &self,
        doctor_name: &str,
        date: Option<NaiveDate>,
        time: Option<NaiveTime>,
    ) -> String {
        let doctor = match self.doctors.find_by_name(doctor_name).await {
            Ok(doctor) => doctor,
            Err(_) => return format!("Doctor {doctor_name} not found."),
        };

        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let date_str = date.format(DATE_FORMAT);

        let mut windows = match self.slots.find_open(doctor.id, date).await {
            Ok(windows) => windows,
            Err(error) => {
                tracing::error!(%error, doctor = %doctor.id, "availability lookup failed");
                return storage_apology();
            }
        };

        if windows.is_empty() {
            return format!("Doctor {doctor_name} is not available on {date_str}");
        }

        if let Some(requested) = time {
            windows.retain(|w| w.contains(requested));
            let time_str = requested.format(TIME_FORMAT);
            if windows.is_empty() {
                return format!(
                    "Doctor {doctor_name} is not available at {time_str} on {date_str}"
                );
            }
            return format!(
                "{doctor_name} is available at {time_str} on {date_str}. Would you like to \
                 book this appointment?"
            );
        }

        let times = windows
            .iter()
            .map(|w| {
                format!(
                    "{} - {}",
                    w.start_time.format(TIME_FORMAT),
                    w.end_time.format(TIME_FORMAT)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{doctor_name} is available on {date_str} at the following times: {times}")
    }

    /// Lists all doctors with open windows on a date, grouped per doctor.
    pub async fn find_available_on_date(&self, date: NaiveDate) -> String {
        let date_str = date.format(DATE_FORMAT);
        let windows = match self.slots.find_open_on(date).await {
            Ok(windows) => windows,
            Err(error) => {
                tracing::error!(%error, "availability lookup failed");
                return storage_apology();
            }
        };

        if windows.is_empty() {
            return format!("No doctors are available on {date_str}. Please try another date.");
        }

        let roster = match self.roster_by_id().await {
            Ok(roster) => roster,
            Err(text) => return text,
        };

        let mut per_doctor: HashMap<DoctorId, Vec<&AvailabilitySlot>> = HashMap::new();
        for window in &windows {
            per_doctor.entry(window.doctor).or_default().push(window);
        }

        let mut entries: Vec<String> = Vec::new();
        for doctor in sorted_roster(&roster) {
            let Some(slots) = per_doctor.get(&doctor.id) else {
                continue;
            };
            let times = slots
                .iter()
                .map(|w| {
                    format!(
                        "{}-{}",
                        w.start_time.format(TIME_FORMAT),
                        w.end_time.format(TIME_FORMAT)
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            entries.push(format!(
                "{} ({}) - Available at: {}",
                doctor.name, doctor.specialty, times
            ));
        }

        format!(
            "The following doctors are available on {date_str}: {}",
            entries.join("; ")
        )
    }

    /// Lists every open window over the coming horizon, one line per
    /// window. The same listing is embedded in the assistant's system
    /// prompt.
    pub async fn list_all_slots(&self, horizon_days: u32) -> String {
        let roster = match self.roster_by_id().await {
            Ok(roster) => roster,
            Err(text) => return text,
        };

        let start = Utc::now().date_naive();
        let mut lines: Vec<String> = Vec::new();

        for offset in 0..=i64::from(horizon_days) {
            let date = start + Duration::days(offset);
            let windows = match self.slots.find_open_on(date).await {
                Ok(windows) => windows,
                Err(error) => {
                    tracing::error!(%error, "availability lookup failed");
                    return storage_apology();
                }
            };

            let mut per_doctor: HashMap<DoctorId, Vec<&AvailabilitySlot>> = HashMap::new();
            for window in &windows {
                per_doctor.entry(window.doctor).or_default().push(window);
            }
            for doctor in sorted_roster(&roster) {
                let Some(slots) = per_doctor.get(&doctor.id) else {
                    continue;
                };
                for window in slots {
                    lines.push(format!(
                        "- {} on {} at {}-{}",
                        doctor.name,
                        date.format(DATE_FORMAT),
                        window.start_time.format(TIME_FORMAT),
                        window.end_time.format(TIME_FORMAT)
                    ));
                }
            }
        }

        if lines.is_empty() {
            return format!("No available slots found in the next {horizon_days} days.");
        }
        lines.join("\n")
    }

    /// Books an appointment.
    ///
    /// The requested time must fall inside an open window, and no other
    /// booking for the same doctor may sit within 30 minutes of the
    /// requested time. Conflicts are text outcomes.
    pub async fn book(&self, request: BookingRequest) -> String {
        let doctor = match self.doctors.find_by_name(&request.doctor_name).await {
            Ok(doctor) => doctor,
            Err(_) => return format!("Doctor {} not found.", request.doctor_name),
        };

        let lock = self.booking_lock(doctor.id);
        let _booking_guard = lock.lock().await;

        self.book_locked(&doctor, &request).await
    }

    async fn book_locked(&self, doctor: &Doctor, request: &BookingRequest) -> String {
        let date_str = request.date.format(DATE_FORMAT).to_string();
        let time_str = request.time.format(TIME_FORMAT).to_string();

        let windows = match self.slots.find_open(doctor.id, request.date).await {
            Ok(windows) => windows,
            Err(error) => {
                tracing::error!(%error, doctor = %doctor.id, "availability lookup failed");
                return booking_apology();
            }
        };
        if !windows.iter().any(|w| w.contains(request.time)) {
            return format!(
                "Sorry, {} is not available at {time_str} on {date_str}. Please check \
                 available times.",
                doctor.name
            );
        }

        let datetime = NaiveDateTime::new(request.date, request.time);
        let window_start = datetime - Duration::minutes(SLOT_DURATION_MINUTES);
        let window_end = datetime + Duration::minutes(SLOT_DURATION_MINUTES);
        let existing = match self
            .appointments
            .find_by_doctor_between(doctor.id, window_start, window_end)
            .await
        {
            Ok(existing) => existing,
            Err(error) => {
                tracing::error!(%error, doctor = %doctor.id, "conflict lookup failed");
                return booking_apology();
            }
        };
        if !existing.is_empty() {
            return "Sorry, that time slot is already booked. Please choose another time."
                .to_string();
        }

        let account = self.accounts.find_account(&request.patient_name).await;
        let patient_name = request.patient_name.trim().to_string();
        tracing::info!(
            patient = %patient_name,
            doctor = %doctor.name,
            date = %date_str,
            time = %time_str,
            "booking appointment"
        );

        let appointment = Appointment {
            id: AppointmentId::new(),
            doctor: doctor.id,
            patient: account.as_ref().map(|a| a.id),
            patient_username: account.map(|a| a.username),
            patient_name: patient_name.clone(),
            patient_phone: request.patient_phone.as_deref().map(|p| p.trim().to_string()),
            patient_email: request.patient_email.as_deref().map(|e| e.trim().to_string()),
            datetime,
            status: AppointmentStatus::Booked,
            room: request.room,
            created_at: Utc::now(),
        };
        let id = appointment.id;

        if let Err(error) = self.appointments.insert(appointment).await {
            tracing::error!(%error, appointment = %id, "appointment write failed");
            return booking_apology();
        }

        // Read back before confirming to the patient.
        if let Err(error) = self.appointments.get(id).await {
            tracing::error!(%error, appointment = %id, "appointment not found after save");
            return "Sorry, there was an error saving your appointment. Please try again."
                .to_string();
        }

        tracing::info!(appointment = %id, "appointment booked");
        format!(
            "Great! Appointment successfully booked:\nPatient: {patient_name}\nDoctor: {}\n\
             Date: {date_str}\nTime: {time_str}\nWe'll send you a confirmation shortly.",
            doctor.name
        )
    }

    /// Lists a patient's appointments, matching both the free-text name
    /// and any linked account username, case-insensitively.
    pub async fn appointments_for(&self, patient_name: &str) -> String {
        let by_name = self.appointments.find_by_patient_name(patient_name).await;
        let by_username = self
            .appointments
            .find_by_patient_username(patient_name)
            .await;
        let (by_name, by_username) = match (by_name, by_username) {
            (Ok(n), Ok(u)) => (n, u),
            (Err(error), _) | (_, Err(error)) => {
                tracing::error!(%error, patient = patient_name, "appointment lookup failed");
                return storage_apology();
            }
        };

        let mut seen: Vec<AppointmentId> = Vec::new();
        let mut found: Vec<Appointment> = Vec::new();
        for appointment in by_name.into_iter().chain(by_username) {
            if !seen.contains(&appointment.id) {
                seen.push(appointment.id);
                found.push(appointment);
            }
        }

        if found.is_empty() {
            return format!("No appointments found under the name: {patient_name}");
        }

        let roster = match self.roster_by_id().await {
            Ok(roster) => roster,
            Err(text) => return text,
        };
        found.sort_by_key(|a| a.datetime);

        let mut result = format!(
            "Found {} appointment(s) for {patient_name}:\n",
            found.len()
        );
        for appointment in &found {
            let doctor_name = roster
                .get(&appointment.doctor)
                .map(|d| d.name.as_str())
                .unwrap_or("Unknown");
            result.push_str(&format!(
                "- Doctor: {doctor_name}, Date: {}, Time: {}\n",
                appointment.datetime.date().format(DATE_FORMAT),
                appointment.datetime.time().format(TIME_FORMAT)
            ));
        }
        result
    }

    /// Hands the conversation to the first available human agent,
    /// marking the agent busy and binding them to the room.
    pub async fn request_handover(&self, room: RoomId) -> String {
        let available = match self.agents.find_available().await {
            Ok(available) => available,
            Err(error) => {
                tracing::error!(%error, "agent lookup failed");
                return storage_apology();
            }
        };

        let Some(mut agent) = available.into_iter().next() else {
            return "I apologize, but no human agents are currently available. Please try \
                    again later or continue chatting with me."
                .to_string();
        };

        agent.available = false;
        agent.current_room = Some(room);
        let name = agent.name.clone();
        if let Err(error) = self.agents.update(agent).await {
            tracing::error!(%error, "agent handover update failed");
            return storage_apology();
        }

        tracing::info!(agent = %name, room = %room, "conversation handed to human agent");
        format!("I'm transferring you to a human agent ({name}). They will be with you shortly.")
    }

    /// Returns the roster, comma-separated. Used by the system prompt.
    pub async fn doctor_names(&self) -> String {
        match self.doctors.all().await {
            Ok(doctors) if doctors.is_empty() => "No doctors found.".to_string(),
            Ok(doctors) => doctors
                .iter()
                .map(|d| d.name.clone())
                .collect::<Vec<_>>()
                .join(", "),
            Err(error) => {
                tracing::error!(%error, "roster lookup failed");
                "Error retrieving doctor list.".to_string()
            }
        }
    }

    async fn roster_by_id(&self) -> Result<HashMap<DoctorId, Doctor>, String> {
        match self.doctors.all().await {
            Ok(doctors) => Ok(doctors.into_iter().map(|d| (d.id, d)).collect()),
            Err(error) => {
                tracing::error!(%error, "roster lookup failed");
                Err(storage_apology())
            }
        }
    }

    fn booking_lock(&self, doctor: DoctorId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .booking_locks
            .lock()
            .expect("booking lock table poisoned");
        Arc::clone(locks.entry(doctor).or_default())
    }
}

fn sorted_roster(roster: &HashMap<DoctorId, Doctor>) -> Vec<&Doctor> {
    let mut doctors: Vec<&Doctor> = roster.values().collect();
    doctors.sort_by(|a, b| a.name.cmp(&b.name));
    doctors
}

fn storage_apology() -> String {
    "Sorry, I encountered an error while looking that up. Please try again.".to_string()
}

fn booking_apology() -> String {
    "Sorry, I encountered an error while booking your appointment. Please try again.".to_string()
}

/// Resolves a user id for patients that book under their own username.
#[derive(Debug, Default)]
pub struct StaticAccounts {
    accounts: std::sync::RwLock<Vec<crate::domain::AccountRef>>,
}

impl StaticAccounts {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account.
    pub fn register(&self, id: UserId, username: impl Into<String>) {
        self.accounts
            .write()
            .expect("account table lock poisoned")
            .push(crate::domain::AccountRef {
                id,
                username: username.into(),
            });
    }
}

#[async_trait]
impl AccountLookup for StaticAccounts {
    async fn find_account(&self, username: &str) -> Option<crate::domain::AccountRef> {
        self.accounts
            .read()
            .expect("account table lock poisoned")
            .iter()
            .find(|a| a.username == username)
            .cloned()
    }
}
