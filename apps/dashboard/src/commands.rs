use chrono::NaiveDate;
use clinic_shared::dashboard::{doctor, patient, receptionist, ActionMessage, BookingForm, Dashboard};
use clinic_shared::fixtures::FixtureSource;
use clinic_shared::storage::KeyValueStore;
use clinic_shared::types::{AppointmentRequest, AppointmentStatus, RegisterRequest};
use clinic_shared::AppState;

use crate::render;

const HELP: &str = "\
Commands:
  login <email> <password>
  register <json>
  logout
  show [yyyy-mm-dd]
  book <doctor-id> <date> <time> <reason...>               (patient)
  book <patient-id> <doctor-id> <date> <time> <reason...>  (receptionist)
  status <appointment-id> <status> [notes...]              (doctor, receptionist)
  cancel <appointment-id>
  reschedule <appointment-id> <date> <time>
  refresh
  quit";

#[derive(Debug, PartialEq)]
pub(crate) enum Command {
    Help,
    Quit,
    Login { email: String, password: String },
    Register(String),
    Logout,
    Show(Option<NaiveDate>),
    Book(Vec<String>),
    Status {
        appointment_id: String,
        status: AppointmentStatus,
        notes: Option<String>,
    },
    Cancel(String),
    Reschedule {
        appointment_id: String,
        date: String,
        time: String,
    },
    Refresh,
    Invalid(String),
}

pub(crate) enum Flow {
    Continue,
    Quit,
}

impl Command {
    pub(crate) fn parse(line: &str) -> Self {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, rest)) = words.split_first() else {
            return Command::Help;
        };

        match (name, rest) {
            ("help", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            ("login", [email, password]) => Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            ("register", [_, ..]) => {
                let json = line.trim_start().trim_start_matches("register").trim();
                Command::Register(json.to_string())
            }
            ("logout", []) => Command::Logout,
            ("show", []) => Command::Show(None),
            ("show", [date]) => match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
                Ok(date) => Command::Show(Some(date)),
                Err(_) => Command::Invalid(format!("Not a date: {}", date)),
            },
            ("book", args) if args.len() >= 4 => {
                Command::Book(args.iter().map(|s| s.to_string()).collect())
            }
            ("status", [id, status, notes @ ..]) => match status.parse() {
                Ok(status) => Command::Status {
                    appointment_id: id.to_string(),
                    status,
                    notes: (!notes.is_empty()).then(|| notes.join(" ")),
                },
                Err(e) => Command::Invalid(e.to_string()),
            },
            ("cancel", [id]) => Command::Cancel(id.to_string()),
            ("reschedule", [id, date, time]) => Command::Reschedule {
                appointment_id: id.to_string(),
                date: date.to_string(),
                time: time.to_string(),
            },
            ("refresh", []) => Command::Refresh,
            _ => Command::Invalid(format!("Unrecognised command: {}", line.trim())),
        }
    }
}

pub(crate) async fn execute<F, S>(state: &mut AppState<F, S>, command: Command) -> Flow
where
    F: FixtureSource + Clone,
    S: KeyValueStore,
{
    match command {
        Command::Help => println!("{}", HELP),
        Command::Quit => return Flow::Quit,
        Command::Invalid(reason) => println!("{}\n\n{}", reason, HELP),
        Command::Login { email, password } => {
            if state.session.login(&email, &password).await {
                println!("{}", render::dashboard(&state.session, &state.appointments, None));
            } else {
                println!("Invalid email or password.");
            }
        }
        Command::Register(json) => match serde_json::from_str::<RegisterRequest>(&json) {
            Ok(request) => {
                if state.session.register(request) {
                    println!("{}", render::dashboard(&state.session, &state.appointments, None));
                } else {
                    println!("Registration failed. Please try again.");
                }
            }
            Err(e) => println!("Invalid registration details: {}", e),
        },
        Command::Logout => {
            state.session.logout();
            println!("Signed out.");
        }
        Command::Show(date) => {
            println!("{}", render::dashboard(&state.session, &state.appointments, date));
        }
        Command::Refresh => {
            state.appointments.refresh().await;
            println!("Reloaded {} appointments.", state.appointments.appointments().len());
        }
        Command::Reschedule {
            appointment_id,
            date,
            time,
        } => {
            if state
                .appointments
                .reschedule_appointment(&appointment_id, &date, &time)
            {
                println!("Appointment rescheduled to {} at {}.", date, time);
            } else {
                println!("{}", ActionMessage::UpdateFailed);
            }
        }
        Command::Book(args) => println!("{}", book(state, args)),
        Command::Status {
            appointment_id,
            status,
            notes,
        } => println!("{}", set_status(state, &appointment_id, status, notes.as_deref())),
        Command::Cancel(appointment_id) => println!("{}", cancel(state, &appointment_id)),
    }
    Flow::Continue
}

fn book<F: FixtureSource, S: KeyValueStore>(state: &mut AppState<F, S>, args: Vec<String>) -> String {
    let Some(user) = state.session.user() else {
        return "Please log in first.".to_string();
    };

    match Dashboard::for_user(user) {
        Dashboard::Patient => {
            let mut args = args.into_iter();
            let form = BookingForm {
                doctor_id: args.next().unwrap_or_default(),
                date: args.next().unwrap_or_default(),
                time: args.next().unwrap_or_default(),
                reason: args.collect::<Vec<_>>().join(" "),
            };
            patient::request_appointment(&mut state.appointments, user, form).to_string()
        }
        Dashboard::Receptionist => {
            if args.len() < 5 {
                return ActionMessage::MissingFields.to_string();
            }
            let mut args = args.into_iter();
            let request = AppointmentRequest {
                patient_id: args.next().unwrap_or_default(),
                doctor_id: args.next().unwrap_or_default(),
                date: args.next().unwrap_or_default(),
                time: args.next().unwrap_or_default(),
                reason: args.collect::<Vec<_>>().join(" "),
            };
            receptionist::book(&mut state.appointments, request).to_string()
        }
        Dashboard::Doctor => "Doctors cannot book appointments.".to_string(),
    }
}

fn set_status<F: FixtureSource, S: KeyValueStore>(
    state: &mut AppState<F, S>,
    appointment_id: &str,
    status: AppointmentStatus,
    notes: Option<&str>,
) -> String {
    let Some(user) = state.session.user() else {
        return "Please log in first.".to_string();
    };

    match Dashboard::for_user(user) {
        Dashboard::Doctor => {
            doctor::set_status(&mut state.appointments, appointment_id, status, notes).to_string()
        }
        Dashboard::Receptionist => {
            receptionist::set_status(&mut state.appointments, appointment_id, status).to_string()
        }
        Dashboard::Patient => "Patients can only cancel their appointments.".to_string(),
    }
}

fn cancel<F: FixtureSource, S: KeyValueStore>(state: &mut AppState<F, S>, appointment_id: &str) -> String {
    let Some(user) = state.session.user() else {
        return "Please log in first.".to_string();
    };

    match Dashboard::for_user(user) {
        Dashboard::Patient => patient::cancel(&mut state.appointments, appointment_id).to_string(),
        Dashboard::Receptionist => {
            receptionist::cancel(&mut state.appointments, appointment_id).to_string()
        }
        Dashboard::Doctor => doctor::set_status(
            &mut state.appointments,
            appointment_id,
            AppointmentStatus::Cancelled,
            None,
        )
        .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_and_show() {
        assert_eq!(
            Command::parse("login patient1@example.com patient123"),
            Command::Login {
                email: "patient1@example.com".to_string(),
                password: "patient123".to_string(),
            }
        );
        assert_eq!(
            Command::parse("show 2025-01-06"),
            Command::Show(NaiveDate::from_ymd_opt(2025, 1, 6))
        );
        assert!(matches!(Command::parse("show tomorrow"), Command::Invalid(_)));
    }

    #[test]
    fn test_parse_status_with_notes() {
        assert_eq!(
            Command::parse("status a1 completed BP stable, review in May"),
            Command::Status {
                appointment_id: "a1".to_string(),
                status: AppointmentStatus::Completed,
                notes: Some("BP stable, review in May".to_string()),
            }
        );
        assert!(matches!(Command::parse("status a1 finished"), Command::Invalid(_)));
    }

    #[test]
    fn test_parse_register_keeps_json_intact() {
        let line = r#"register {"email": "a@b.c", "role": "receptionist"}"#;
        assert_eq!(
            Command::parse(line),
            Command::Register(r#"{"email": "a@b.c", "role": "receptionist"}"#.to_string())
        );
    }

    #[test]
    fn test_parse_rejects_short_book() {
        assert!(matches!(Command::parse("book d1 2025-01-10"), Command::Invalid(_)));
        assert!(matches!(Command::parse("book d1 2025-01-10 09:00 checkup"), Command::Book(_)));
    }
}
