use chrono::NaiveDate;
use clinic_shared::appointments::AppointmentStore;
use clinic_shared::dashboard::{
    self, AppointmentFilter, Dashboard, DoctorDashboard, PatientDashboard, ReceptionistDashboard,
    StatusCounts,
};
use clinic_shared::fixtures::FixtureSource;
use clinic_shared::session::SessionStore;
use clinic_shared::storage::KeyValueStore;
use clinic_shared::types::{Appointment, AppointmentStatus, User};

/// Text rendering of the dashboard for whoever is signed in.
pub(crate) fn dashboard<F, S>(
    session: &SessionStore<F, S>,
    store: &AppointmentStore<F>,
    date: Option<NaiveDate>,
) -> String
where
    F: FixtureSource,
    S: KeyValueStore,
{
    let Some(user) = session.user() else {
        return "Not signed in. Use `login <email> <password>`.".to_string();
    };
    if store.is_loading() {
        return "Loading...".to_string();
    }

    let date = date.unwrap_or_else(dashboard::today);
    let mut out = vec![format!(
        "Welcome, {} ({})",
        user.full_name(),
        user.role()
    )];

    match Dashboard::for_user(user) {
        Dashboard::Patient => patient(&mut out, &PatientDashboard::new(user, store)),
        Dashboard::Doctor => doctor(&mut out, &DoctorDashboard::new(user, store), date),
        Dashboard::Receptionist => receptionist(&mut out, &ReceptionistDashboard::new(store), date),
    }
    out.join("\n")
}

fn patient(out: &mut Vec<String>, view: &PatientDashboard<'_>) {
    out.push(counts_line(&view.counts()));

    out.push(String::new());
    out.push("Doctors:".to_string());
    for specialty in view.specialties() {
        let names: Vec<String> = view
            .doctors_for(Some(specialty))
            .iter()
            .map(|doctor| format!("{} [{}]", doctor.full_name(), doctor.id))
            .collect();
        out.push(format!("  {}: {}", specialty, names.join(", ")));
    }

    out.push(String::new());
    out.push(format!("Booking times: {}", view.time_slots().join(" ")));

    out.push(String::new());
    out.push("My appointments:".to_string());
    push_rows(out, &view.appointments(), |appt| {
        format!("Dr. {}", view.name_of(&appt.doctor_id))
    });
}

fn doctor(out: &mut Vec<String>, view: &DoctorDashboard<'_>, date: NaiveDate) {
    let counts = view.counts();
    out.push(format!(
        "Today: {}  Pending: {}  Confirmed: {}",
        view.today().len(),
        counts.pending,
        counts.confirmed
    ));

    out.push(String::new());
    out.push(format!("Schedule for {}:", date.format("%A, %B %-d, %Y")));
    push_rows(out, &view.schedule(date), |appt| {
        format!(
            "{} ({})",
            view.patient_name(&appt.patient_id),
            view.patient_phone(&appt.patient_id)
        )
    });

    out.push(String::new());
    out.push("All appointments:".to_string());
    push_rows(out, &view.history(), |appt| view.patient_name(&appt.patient_id));
}

fn receptionist(out: &mut Vec<String>, view: &ReceptionistDashboard<'_>, date: NaiveDate) {
    out.push(format!(
        "Today: {}  Pending: {}  Doctors: {}  Patients: {}",
        view.today().len(),
        view.counts().get(AppointmentStatus::Pending),
        view.doctors().len(),
        view.patients().len()
    ));

    out.push(String::new());
    out.push("Doctor load:".to_string());
    for load in view.doctor_load(dashboard::today()) {
        out.push(format!(
            "  {} - today {}, total {}",
            describe_doctor(load.doctor),
            load.today,
            load.total
        ));
    }

    out.push(String::new());
    out.push(format!("Booking times: {}", view.time_slots().join(" ")));

    out.push(String::new());
    out.push(format!("Schedule for {}:", date.format("%A, %B %-d, %Y")));
    push_rows(out, &view.schedule(date), |appt| {
        format!(
            "{} with Dr. {}",
            view.name_of(&appt.patient_id),
            view.name_of(&appt.doctor_id)
        )
    });

    out.push(String::new());
    out.push("All appointments:".to_string());
    push_rows(out, &view.appointments(&AppointmentFilter::default()), |appt| {
        format!(
            "{} with Dr. {}",
            view.name_of(&appt.patient_id),
            view.name_of(&appt.doctor_id)
        )
    });
}

fn counts_line(counts: &StatusCounts) -> String {
    AppointmentStatus::ALL
        .iter()
        .map(|status| format!("{}: {}", status, counts.get(*status)))
        .collect::<Vec<_>>()
        .join("  ")
}

fn describe_doctor(doctor: &User) -> String {
    match doctor.as_doctor() {
        Some(profile) => format!("Dr. {} ({})", doctor.full_name(), profile.specialty),
        None => doctor.full_name(),
    }
}

fn push_rows(out: &mut Vec<String>, appointments: &[&Appointment], who: impl Fn(&Appointment) -> String) {
    if appointments.is_empty() {
        out.push("  (none)".to_string());
        return;
    }
    for &appt in appointments {
        let mut row = format!(
            "  [{}] {} {} {:<9} {} - {}",
            appt.id,
            appt.date,
            appt.time,
            appt.status.as_str(),
            who(appt),
            appt.reason
        );
        if let Some(notes) = appt.notes.as_deref().filter(|n| !n.is_empty()) {
            row.push_str(&format!(" (notes: {})", notes));
        }
        out.push(row);
    }
}
