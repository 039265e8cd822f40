//! System prompt assembly.

use chrono::NaiveDate;

/// Builds the system prompt for one turn.
///
/// The prompt pins today's date and embeds the live availability listing
/// and roster, so the model grounds its answers in current data instead of
/// inventing slots.
#[must_use]
pub fn system_prompt(today: NaiveDate, availability: &str, doctor_names: &str) -> String {
    format!(
        "You are a helpful healthcare assistant. Today's date is {today}.\n\
         You help users book appointments with doctors based on available slots.\n\
         Here are the current available appointment slots:\n{availability}\n\n\
         Only accept doctor names from this list: {doctor_names}.\n\
         If a user enters a name not in the list, respond with an error and ask them to \
         choose a valid doctor.\n\n\
         You must also verify that the doctor is available exactly on the requested date \
         and time.\n\
         If the requested slot does not appear in the availability list above, respond with:\n\
         'Sorry, Dr. <name> is not available on <date> at <time>. Please choose another \
         available slot.'\n\n\
         If the user provides all required fields (Patient's name, Doctor's name, Date, and \
         Time) and the slot is available, respond with:\n\
         Patient: <patient name>\nDoctor: Dr. <doctor name>\nDate: <appointment date>\n\
         Time: <appointment time>\n\
         If any information is missing, only ask for the missing fields, and do not repeat \
         already provided ones.\n\n\
         IMPORTANT: If the user does not provide a patient name, use the logged-in username \
         as the patient name. Before final booking, confirm the patient name with the user \
         by saying: 'I'll book this appointment for <username>. Is that correct?'",
        today = today.format("%Y-%m-%d"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_date_availability_and_roster() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        let prompt = system_prompt(
            today,
            "- Dr. Smith on 2026-08-28 at 10:00-12:00",
            "Dr. Smith, Dr. Jones",
        );

        assert!(prompt.contains("Today's date is 2026-08-28."));
        assert!(prompt.contains("- Dr. Smith on 2026-08-28 at 10:00-12:00"));
        assert!(prompt.contains("Only accept doctor names from this list: Dr. Smith, Dr. Jones."));
    }
}
