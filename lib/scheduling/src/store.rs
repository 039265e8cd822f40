//! Scheduling persistence boundaries with in-memory implementations.

use crate::domain::{Appointment, AvailabilitySlot, Doctor, HumanAgent};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use clinic_relay_core::{AgentId, AppointmentId, DoctorId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for doctor roster storage.
#[async_trait]
pub trait DoctorStore: Send + Sync {
    /// Adds a doctor to the roster.
    async fn insert(&self, doctor: Doctor) -> Result<(), StoreError>;

    /// Resolves a doctor by display name.
    async fn find_by_name(&self, name: &str) -> Result<Doctor, StoreError>;

    /// Lists doctors with a given specialty, case-insensitively.
    async fn find_by_specialty(&self, specialty: &str) -> Result<Vec<Doctor>, StoreError>;

    /// Lists the full roster.
    async fn all(&self) -> Result<Vec<Doctor>, StoreError>;
}

/// Trait for availability window storage.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Publishes a window.
    async fn insert(&self, slot: AvailabilitySlot) -> Result<(), StoreError>;

    /// Open windows of one doctor on one date.
    async fn find_open(
        &self,
        doctor: DoctorId,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilitySlot>, StoreError>;

    /// Open windows of all doctors on one date.
    async fn find_open_on(&self, date: NaiveDate) -> Result<Vec<AvailabilitySlot>, StoreError>;
}

/// Trait for appointment storage.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Persists a booking.
    async fn insert(&self, appointment: Appointment) -> Result<(), StoreError>;

    /// Gets a booking by id.
    async fn get(&self, id: AppointmentId) -> Result<Appointment, StoreError>;

    /// Bookings of one doctor inside a datetime range, bounds inclusive.
    async fn find_by_doctor_between(
        &self,
        doctor: DoctorId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Bookings whose free-text patient name matches, case-insensitively.
    async fn find_by_patient_name(&self, name: &str) -> Result<Vec<Appointment>, StoreError>;

    /// Bookings whose linked account username matches, case-insensitively.
    async fn find_by_patient_username(&self, username: &str)
        -> Result<Vec<Appointment>, StoreError>;
}

/// Trait for human agent storage.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Registers an agent.
    async fn insert(&self, agent: HumanAgent) -> Result<(), StoreError>;

    /// Lists agents currently free to take a conversation.
    async fn find_available(&self) -> Result<Vec<HumanAgent>, StoreError>;

    /// Replaces an agent record.
    async fn update(&self, agent: HumanAgent) -> Result<(), StoreError>;
}

/// In-memory doctor roster.
#[derive(Debug, Default)]
pub struct InMemoryDoctorStore {
    doctors: RwLock<Vec<Doctor>>,
}

impl InMemoryDoctorStore {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DoctorStore for InMemoryDoctorStore {
    async fn insert(&self, doctor: Doctor) -> Result<(), StoreError> {
        self.doctors
            .write()
            .expect("doctor store lock poisoned")
            .push(doctor);
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Doctor, StoreError> {
        self.doctors
            .read()
            .expect("doctor store lock poisoned")
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "doctor",
                id: name.to_string(),
            })
    }

    async fn find_by_specialty(&self, specialty: &str) -> Result<Vec<Doctor>, StoreError> {
        Ok(self
            .doctors
            .read()
            .expect("doctor store lock poisoned")
            .iter()
            .filter(|d| d.specialty.eq_ignore_ascii_case(specialty))
            .cloned()
            .collect())
    }

    async fn all(&self) -> Result<Vec<Doctor>, StoreError> {
        Ok(self
            .doctors
            .read()
            .expect("doctor store lock poisoned")
            .clone())
    }
}

/// In-memory availability windows.
#[derive(Debug, Default)]
pub struct InMemorySlotStore {
    slots: RwLock<Vec<AvailabilitySlot>>,
}

impl InMemorySlotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlotStore for InMemorySlotStore {
    async fn insert(&self, slot: AvailabilitySlot) -> Result<(), StoreError> {
        self.slots
            .write()
            .expect("slot store lock poisoned")
            .push(slot);
        Ok(())
    }

    async fn find_open(
        &self,
        doctor: DoctorId,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilitySlot>, StoreError> {
        Ok(self
            .slots
            .read()
            .expect("slot store lock poisoned")
            .iter()
            .filter(|s| s.doctor == doctor && s.date == date && s.available)
            .cloned()
            .collect())
    }

    async fn find_open_on(&self, date: NaiveDate) -> Result<Vec<AvailabilitySlot>, StoreError> {
        Ok(self
            .slots
            .read()
            .expect("slot store lock poisoned")
            .iter()
            .filter(|s| s.date == date && s.available)
            .cloned()
            .collect())
    }
}

/// In-memory appointment book.
#[derive(Debug, Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<AppointmentId, Appointment>>,
}

impl InMemoryAppointmentStore {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored appointments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.appointments
            .read()
            .expect("appointment store lock poisoned")
            .len()
    }

    /// Returns whether the book is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<(), StoreError> {
        self.appointments
            .write()
            .expect("appointment store lock poisoned")
            .insert(appointment.id, appointment);
        Ok(())
    }

    async fn get(&self, id: AppointmentId) -> Result<Appointment, StoreError> {
        self.appointments
            .read()
            .expect("appointment store lock poisoned")
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "appointment",
                id: id.to_string(),
            })
    }

    async fn find_by_doctor_between(
        &self,
        doctor: DoctorId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Appointment>, StoreError> {
        Ok(self
            .appointments
            .read()
            .expect("appointment store lock poisoned")
            .values()
            .filter(|a| a.doctor == doctor && start <= a.datetime && a.datetime <= end)
            .cloned()
            .collect())
    }

    async fn find_by_patient_name(&self, name: &str) -> Result<Vec<Appointment>, StoreError> {
        Ok(self
            .appointments
            .read()
            .expect("appointment store lock poisoned")
            .values()
            .filter(|a| a.patient_name.eq_ignore_ascii_case(name))
            .cloned()
            .collect())
    }

    async fn find_by_patient_username(
        &self,
        username: &str,
    ) -> Result<Vec<Appointment>, StoreError> {
        Ok(self
            .appointments
            .read()
            .expect("appointment store lock poisoned")
            .values()
            .filter(|a| {
                a.patient_username
                    .as_deref()
                    .is_some_and(|u| u.eq_ignore_ascii_case(username))
            })
            .cloned()
            .collect())
    }
}

/// In-memory agent pool.
#[derive(Debug, Default)]
pub struct InMemoryAgentStore {
    agents: RwLock<HashMap<AgentId, HumanAgent>>,
}

impl InMemoryAgentStore {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentStore for InMemoryAgentStore {
    async fn insert(&self, agent: HumanAgent) -> Result<(), StoreError> {
        self.agents
            .write()
            .expect("agent store lock poisoned")
            .insert(agent.id, agent);
        Ok(())
    }

    async fn find_available(&self) -> Result<Vec<HumanAgent>, StoreError> {
        let mut available: Vec<HumanAgent> = self
            .agents
            .read()
            .expect("agent store lock poisoned")
            .values()
            .filter(|a| a.available)
            .cloned()
            .collect();
        // Stable order so "first available" is deterministic.
        available.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(available)
    }

    async fn update(&self, agent: HumanAgent) -> Result<(), StoreError> {
        let mut agents = self.agents.write().expect("agent store lock poisoned");
        if !agents.contains_key(&agent.id) {
            return Err(StoreError::NotFound {
                entity: "agent",
                id: agent.id.to_string(),
            });
        }
        agents.insert(agent.id, agent);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn specialty_lookup_is_case_insensitive() {
        let store = InMemoryDoctorStore::new();
        store
            .insert(Doctor::new("Dr. Smith", "Cardiology", "Heart specialist"))
            .await
            .expect("insert");

        let found = store.find_by_specialty("cardiology").await.expect("find");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Dr. Smith");
    }

    #[tokio::test]
    async fn open_windows_filter_by_doctor_and_date() {
        let store = InMemorySlotStore::new();
        let smith = DoctorId::new();
        let jones = DoctorId::new();
        store
            .insert(AvailabilitySlot::new(smith, date(28), t(10), t(12)))
            .await
            .expect("insert");
        store
            .insert(AvailabilitySlot::new(jones, date(28), t(14), t(17)))
            .await
            .expect("insert");
        store
            .insert(AvailabilitySlot::new(smith, date(29), t(9), t(12)))
            .await
            .expect("insert");

        let smith_today = store.find_open(smith, date(28)).await.expect("find");
        assert_eq!(smith_today.len(), 1);

        let everyone_today = store.find_open_on(date(28)).await.expect("find");
        assert_eq!(everyone_today.len(), 2);
    }

    #[tokio::test]
    async fn closed_windows_are_not_returned() {
        let store = InMemorySlotStore::new();
        let smith = DoctorId::new();
        let mut slot = AvailabilitySlot::new(smith, date(28), t(10), t(12));
        slot.available = false;
        store.insert(slot).await.expect("insert");

        assert!(store.find_open(smith, date(28)).await.expect("find").is_empty());
    }

    #[tokio::test]
    async fn available_agents_come_back_in_stable_order() {
        let store = InMemoryAgentStore::new();
        store
            .insert(HumanAgent::new("Sarah Johnson", "sarah.johnson@superclinic.com"))
            .await
            .expect("insert");
        store
            .insert(HumanAgent::new("Michael Chen", "michael.chen@superclinic.com"))
            .await
            .expect("insert");

        let available = store.find_available().await.expect("find");
        assert_eq!(available.len(), 2);
        assert_eq!(available[0].name, "Michael Chen");
    }

    #[tokio::test]
    async fn busy_agents_are_excluded() {
        let store = InMemoryAgentStore::new();
        let mut agent = HumanAgent::new("Sarah Johnson", "sarah.johnson@superclinic.com");
        store.insert(agent.clone()).await.expect("insert");

        agent.available = false;
        store.update(agent).await.expect("update");

        assert!(store.find_available().await.expect("find").is_empty());
    }
}
