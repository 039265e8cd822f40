//! The closed set of actions the assistant can execute.
//!
//! A provider-issued [`FunctionCall`] is parsed into a typed action before
//! anything runs. Unknown names and malformed arguments are rejected here,
//! so the dispatcher only ever executes calls it understands.

use crate::error::ActionError;
use crate::provider::FunctionCall;
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value as JsonValue;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// A parsed, executable assistant action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantAction {
    /// List doctors with a specialty.
    SearchDoctorsBySpecialty {
        specialty: String,
    },
    /// Check one doctor's availability.
    CheckDoctorAvailability {
        doctor_name: String,
        date: Option<NaiveDate>,
        time: Option<NaiveTime>,
    },
    /// Book an appointment.
    BookAppointment {
        doctor_name: String,
        date: NaiveDate,
        time: NaiveTime,
        patient_name: Option<String>,
        patient_phone: Option<String>,
        patient_email: Option<String>,
    },
    /// List all doctors with open windows on a date.
    FindDoctorsAvailableOnDate {
        date: NaiveDate,
    },
    /// List every open window over the horizon.
    GetAllAvailableSlots,
    /// List a patient's appointments.
    CheckAppointmentsByPatientName {
        patient_name: Option<String>,
    },
    /// Hand the conversation to a human agent.
    TransferToHumanAgent,
}

impl AssistantAction {
    /// Parses a provider-issued call into an action.
    pub fn parse(call: &FunctionCall) -> Result<Self, ActionError> {
        let args: JsonValue =
            serde_json::from_str(&call.arguments).map_err(|e| ActionError::InvalidArguments {
                function: call.name.clone(),
                reason: e.to_string(),
            })?;

        match call.name.as_str() {
            "search_doctors_by_specialty" => Ok(Self::SearchDoctorsBySpecialty {
                specialty: required_str(&call.name, &args, "specialty")?,
            }),
            "check_doctor_availability" => Ok(Self::CheckDoctorAvailability {
                doctor_name: required_str(&call.name, &args, "doctor_name")?,
                date: optional_date(&call.name, &args, "date")?,
                time: optional_time(&call.name, &args, "time")?,
            }),
            "book_appointment" => Ok(Self::BookAppointment {
                doctor_name: required_str(&call.name, &args, "doctor_name")?,
                date: required_date(&call.name, &args, "date")?,
                time: required_time(&call.name, &args, "time")?,
                patient_name: optional_str(&args, "patient_name"),
                patient_phone: optional_str(&args, "patient_phone"),
                patient_email: optional_str(&args, "patient_email"),
            }),
            "find_doctors_available_on_date" => Ok(Self::FindDoctorsAvailableOnDate {
                date: required_date(&call.name, &args, "date")?,
            }),
            "get_all_available_slots" => Ok(Self::GetAllAvailableSlots),
            "check_appointments_by_patient_name" => Ok(Self::CheckAppointmentsByPatientName {
                patient_name: optional_str(&args, "patient_name"),
            }),
            "transfer_to_human_agent" => Ok(Self::TransferToHumanAgent),
            other => Err(ActionError::UnknownFunction {
                name: other.to_string(),
            }),
        }
    }
}

fn optional_str(args: &JsonValue, field: &str) -> Option<String> {
    args.get(field)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

fn required_str(function: &str, args: &JsonValue, field: &str) -> Result<String, ActionError> {
    optional_str(args, field).ok_or_else(|| ActionError::InvalidArguments {
        function: function.to_string(),
        reason: format!("missing field: {field}"),
    })
}

fn parse_date(function: &str, text: &str) -> Result<NaiveDate, ActionError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| ActionError::InvalidArguments {
        function: function.to_string(),
        reason: format!("bad date: {text}"),
    })
}

fn parse_time(function: &str, text: &str) -> Result<NaiveTime, ActionError> {
    NaiveTime::parse_from_str(text, TIME_FORMAT).map_err(|_| ActionError::InvalidArguments {
        function: function.to_string(),
        reason: format!("bad time: {text}"),
    })
}

fn required_date(function: &str, args: &JsonValue, field: &str) -> Result<NaiveDate, ActionError> {
    parse_date(function, &required_str(function, args, field)?)
}

fn required_time(function: &str, args: &JsonValue, field: &str) -> Result<NaiveTime, ActionError> {
    parse_time(function, &required_str(function, args, field)?)
}

fn optional_date(
    function: &str,
    args: &JsonValue,
    field: &str,
) -> Result<Option<NaiveDate>, ActionError> {
    optional_str(args, field)
        .map(|text| parse_date(function, &text))
        .transpose()
}

fn optional_time(
    function: &str,
    args: &JsonValue,
    field: &str,
) -> Result<Option<NaiveTime>, ActionError> {
    optional_str(args, field)
        .map(|text| parse_time(function, &text))
        .transpose()
}
