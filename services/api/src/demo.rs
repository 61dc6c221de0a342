use crate::infra::{
    build_core, default_accounts, parse_datetime, parse_time_range, InMemoryCleanerConfigStore,
};
use chrono::{Duration, Local, NaiveDateTime};
use clap::Args;
use std::sync::Arc;
use stay_ops::error::AppError;
use stay_ops::operations::cleaning::domain::{MAX_CLEANING_MINUTES, MIN_CLEANING_MINUTES};
use stay_ops::operations::cleaning::{
    compute_slot, ChecklistBlueprint, CleanerConfig, CleanerRoster, JobError, RosterImporter,
    TimeRange,
};
use stay_ops::operations::stays::{GuestDraft, NewStay};

#[derive(Args, Debug)]
pub(crate) struct SlotArgs {
    /// Checkout instant (YYYY-MM-DDTHH:MM)
    #[arg(long, value_parser = parse_datetime)]
    pub(crate) checkout: NaiveDateTime,
    /// Cleaning duration in minutes (clamped to 15..=1440)
    #[arg(long, default_value_t = 60)]
    pub(crate) duration: i64,
    /// Allowed daily range (HH:MM-HH:MM); repeatable, scanned in the given order
    #[arg(long = "range", value_parser = parse_time_range)]
    pub(crate) ranges: Vec<TimeRange>,
}

#[derive(Args, Debug)]
pub(crate) struct RosterArgs {
    /// Path to a Name,Phone CSV export
    #[arg(long)]
    pub(crate) csv: std::path::PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Apartment identifier used throughout the demo
    #[arg(long, default_value = "apt-demo-01")]
    pub(crate) apt_id: String,
}

pub(crate) fn run_slot(args: SlotArgs) -> Result<(), AppError> {
    let SlotArgs {
        checkout,
        duration,
        ranges,
    } = args;

    let duration = duration.clamp(MIN_CLEANING_MINUTES, MAX_CLEANING_MINUTES);
    let slot = compute_slot(checkout, &ranges, duration);

    println!("Cleaning slot for checkout {checkout}");
    if ranges.is_empty() {
        println!("No daily ranges configured: the window is unconstrained");
    } else {
        println!("Daily ranges (scan order):");
        for range in &ranges {
            println!("- {} -> {}", range.from, range.to);
        }
    }
    println!("Requested duration: {duration} minutes");
    println!("Slot: {} -> {}", slot.from, slot.to);

    let slot_minutes = (slot.to - slot.from).num_minutes();
    if slot_minutes < duration {
        println!("Note: clipped to {slot_minutes} minutes by the range end");
    }

    Ok(())
}

pub(crate) fn run_roster(args: RosterArgs) -> Result<(), AppError> {
    let roster = RosterImporter::from_path(&args.csv)?;

    if roster.is_empty() {
        println!("Roster is empty");
        return Ok(());
    }

    println!("Imported {} cleaner(s)", roster.cleaners().len());
    for cleaner in roster.cleaners() {
        println!("- {} ({})", cleaner.name, cleaner.phone);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let apt_id = args.apt_id;
    let now = Local::now().naive_local();

    let cleaner_configs = Arc::new(InMemoryCleanerConfigStore::default());
    cleaner_configs.set(
        &apt_id,
        CleanerConfig::new(90, Vec::new(), CleanerRoster::default()),
    );
    let core = build_core(cleaner_configs, Arc::new(default_accounts()));

    println!("Stay operations demo ({apt_id})");

    let check_in = now + Duration::hours(2);
    let check_out = check_in + Duration::days(3);
    let stay = core.stays.create_stay(
        NewStay {
            apt_id: apt_id.clone(),
            check_in,
            check_out,
            guests: vec![
                GuestDraft {
                    first_name: "Mario".to_string(),
                    last_name: "Rossi".to_string(),
                    phone: "+39 333 111111".to_string(),
                    email: Some("mario.rossi@example.com".to_string()),
                },
                GuestDraft {
                    first_name: "Anna".to_string(),
                    last_name: "Verdi".to_string(),
                    phone: "+39 333 222222".to_string(),
                    email: None,
                },
            ],
            cleaner_name: Some("Lucia Bianchi".to_string()),
        },
        now,
    )?;

    println!("\nStay {} ({} -> {})", stay.stay_id, stay.check_in, stay.check_out);
    println!("Issued PINs:");
    for pin in core.pins.pins_for_stay(&stay.stay_id) {
        println!(
            "- {} [{}] for {} | valid {} -> {}",
            pin.code,
            pin.role.label(),
            pin.issued_to,
            pin.valid_from,
            pin.valid_to
        );
    }

    println!("\nCleaning job walkthrough");
    let job = core.jobs.open(
        &apt_id,
        Some(stay.stay_id.clone()),
        ChecklistBlueprint::standard().instantiate(),
    )?;
    core.jobs.start(&job.id, now)?;
    println!("Job {} started", job.id);

    for item_id in ["air_rooms", "change_linens", "clean_bathroom"] {
        core.jobs.toggle_item(&job.id, item_id)?;
    }
    core.jobs.report_problem(
        &job.id,
        Some("Previous guest left a broken chair".to_string()),
        vec!["media/demo/chair.jpg".to_string()],
        now,
    )?;
    println!("Problem reported; resolving and resuming");
    core.jobs.resolve_problem(&job.id)?;

    for item_id in ["clean_kitchen", "wash_floors", "empty_trash", "final_photos"] {
        core.jobs.toggle_item(&job.id, item_id)?;
    }

    match core.jobs.complete(&job.id, now) {
        Err(JobError::CompletionBlocked(readiness)) => {
            println!(
                "Completion blocked as expected (checklist complete: {}, final photos satisfied: {})",
                readiness.checklist_complete, readiness.final_photos_satisfied
            );
        }
        Ok(_) => println!("Unexpected: completion passed without photos"),
        Err(other) => return Err(other.into()),
    }

    core.jobs
        .set_final_photos(&job.id, vec!["media/demo/final.jpg".to_string()])?;
    let done = core.jobs.complete(&job.id, now)?;
    println!("Job {} completed with status {}", done.id, done.status.label());

    println!("\nEvent log (newest first)");
    for event in core.events.events_for(&apt_id, 20) {
        println!("- [{}] {} ({})", event.kind.as_str(), event.label, event.actor);
    }
    println!(
        "Derived door state: {}",
        core.events.derive_door_state(&apt_id).label()
    );

    Ok(())
}
