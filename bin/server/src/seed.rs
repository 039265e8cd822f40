//! Clinic seed data.
//!
//! Populates the roster, availability windows, and agent pool so a fresh
//! server has something to schedule against.

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use clinic_relay_scheduling::{
    AgentStore, AvailabilitySlot, Doctor, DoctorStore, HumanAgent, SlotStore, StoreError,
};

/// Seeds the doctor roster and their availability windows.
pub async fn seed_doctors(
    doctors: &dyn DoctorStore,
    slots: &dyn SlotStore,
) -> Result<(), StoreError> {
    let today = Utc::now().date_naive();
    let day = |offset: i64| today + Duration::days(offset);
    let t = |h: u32, m: u32| NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default();

    let smith = Doctor::new(
        "Dr. Smith",
        "Cardiology",
        "Expert in heart diseases and cardiovascular health",
    );
    let jones = Doctor::new(
        "Dr. Jones",
        "Dermatology",
        "Specialist in skin conditions and dermatological treatments",
    );
    let williams = Doctor::new(
        "Dr. Williams",
        "Orthopedics",
        "Expert in bone, joint, and muscle conditions",
    );
    let brown = Doctor::new(
        "Dr. Brown",
        "General Medicine",
        "General practitioner for common health issues",
    );

    let windows: Vec<(&Doctor, NaiveDate, NaiveTime, NaiveTime)> = vec![
        (&smith, day(0), t(10, 0), t(12, 0)),
        (&smith, day(1), t(9, 0), t(12, 0)),
        (&smith, day(1), t(14, 0), t(17, 0)),
        (&smith, day(2), t(10, 0), t(13, 0)),
        (&smith, day(3), t(9, 0), t(11, 0)),
        (&jones, day(0), t(14, 0), t(17, 0)),
        (&jones, day(1), t(10, 0), t(13, 0)),
        (&jones, day(2), t(9, 0), t(12, 0)),
        (&jones, day(3), t(10, 0), t(13, 0)),
        (&williams, day(0), t(9, 0), t(11, 0)),
        (&williams, day(1), t(8, 0), t(11, 0)),
        (&williams, day(1), t(15, 0), t(18, 0)),
        (&williams, day(2), t(9, 0), t(12, 0)),
        (&williams, day(3), t(14, 0), t(17, 0)),
        (&brown, day(0), t(9, 0), t(17, 0)),
        (&brown, day(1), t(9, 0), t(17, 0)),
        (&brown, day(2), t(9, 0), t(17, 0)),
        (&brown, day(3), t(9, 0), t(17, 0)),
        (&brown, day(4), t(9, 0), t(17, 0)),
    ];

    for (doctor, date, start, end) in windows {
        slots
            .insert(AvailabilitySlot::new(doctor.id, date, start, end))
            .await?;
    }
    for doctor in [smith, jones, williams, brown] {
        doctors.insert(doctor).await?;
    }

    tracing::info!("seeded doctor roster and availability");
    Ok(())
}

/// Seeds the human agent pool.
pub async fn seed_agents(agents: &dyn AgentStore) -> Result<(), StoreError> {
    agents
        .insert(HumanAgent::new(
            "Sarah Johnson",
            "sarah.johnson@superclinic.com",
        ))
        .await?;
    agents
        .insert(HumanAgent::new(
            "Michael Chen",
            "michael.chen@superclinic.com",
        ))
        .await?;

    tracing::info!("seeded human agents");
    Ok(())
}
