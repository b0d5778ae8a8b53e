//! clinic — a small outpatient clinic on the rust_rcs framework.
//!
//! Patients check in at the front desk, see a doctor (or a nurse when no
//! doctor is free) in an exam room, and every third patient gets a
//! follow-up with a nurse.  One nurse also covers the front desk, so the
//! desk and the exam rooms run in separate scheduling groups that share
//! her.
//!
//! ```text
//! cargo run -p clinic                  # three days, built-in config
//! cargo run -p clinic -- clinic.toml   # config from file
//! RUST_LOG=rcs_sim=debug cargo run -p clinic
//! ```

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tracing::info;

use rcs_activity::{Activity, FlowContext, FlowIntent, FlowLayer, WorkGroup, WorkItem};
use rcs_core::{ActivityId, ElementId, ResourceTypeId, SimConfig, Tick, TimeFunction};
use rcs_resource::{ResourceStore, ResourceStoreBuilder};
use rcs_schedule::{Cycle, CycleEnd};
use rcs_sim::{EventLog, Partitioned, SimBuilder, SimEvent, load_config};

// ── Constants ─────────────────────────────────────────────────────────────────

const DAY:            u64 = 1_440; // 1 tick = 1 minute
const SIM_DAYS:       u64 = 3;
const SEED:           u64 = 42;
const PATIENTS_DAILY: u64 = 40;

const CHECK_IN:  ActivityId = ActivityId(0);
const EXAM:      ActivityId = ActivityId(1);
const FOLLOW_UP: ActivityId = ActivityId(2);

// ── Model ─────────────────────────────────────────────────────────────────────

struct Roles {
    doctor: ResourceTypeId,
    nurse:  ResourceTypeId,
    room:   ResourceTypeId,
    desk:   ResourceTypeId,
}

/// A shift starting `start` minutes into every day.
fn daily(start: u64) -> Cycle {
    Cycle::periodic(start, DAY, CycleEnd::Unbounded)
}

fn build_staff() -> Result<(ResourceStore, Roles)> {
    let mut b = ResourceStoreBuilder::new();
    let roles = Roles {
        doctor: b.add_type("Doctor"),
        nurse:  b.add_type("Nurse"),
        room:   b.add_type("ExamRoom"),
        desk:   b.add_type("FrontDesk"),
    };

    for (name, start) in [("Dr. Alvarez", 480), ("Dr. Brandt", 600)] {
        let r = b.add_resource(name);
        b.add_timetable(r, daily(start), TimeFunction::Constant(480), roles.doctor);
        // Lunch.
        b.add_cancellation(r, daily(start + 240), TimeFunction::Constant(30));
    }

    let nurse = b.add_resource("Nurse Okafor");
    b.add_timetable(nurse, daily(480), TimeFunction::Constant(540), roles.nurse);

    // Covers the desk in the morning, then joins the exam rooms.
    let float = b.add_resource("Nurse Lindqvist");
    b.add_timetable(float, daily(450), TimeFunction::Constant(210), roles.desk);
    b.add_timetable(float, daily(660), TimeFunction::Constant(300), roles.nurse);

    let clerk = b.add_resource("Clerk Haddad");
    b.add_timetable(clerk, daily(660), TimeFunction::Constant(360), roles.desk);

    for i in 1..=3 {
        let room = b.add_resource(format!("Room {i}"));
        b.add_timetable(room, Cycle::once(0), TimeFunction::Constant(SIM_DAYS * DAY), roles.room);
    }

    Ok((b.build()?, roles))
}

fn build_activities(roles: &Roles) -> Vec<Activity> {
    vec![
        Activity::new("check-in").with_work_group(
            0,
            WorkGroup::new([(roles.desk, 1)]),
            TimeFunction::Uniform { min: 2, max: 5 },
        ),
        Activity::new("exam")
            .with_priority(1)
            .with_work_group(
                10,
                WorkGroup::new([(roles.doctor, 1), (roles.room, 1)]),
                TimeFunction::Exponential { mean: 18.0 },
            )
            .with_work_group(
                0,
                WorkGroup::new([(roles.nurse, 1), (roles.room, 1)]),
                TimeFunction::Uniform { min: 15, max: 25 },
            ),
        Activity::new("follow-up")
            .interruptible()
            .with_work_group(0, WorkGroup::new([(roles.nurse, 1)]), TimeFunction::Constant(12)),
    ]
}

// ── Patient flow ──────────────────────────────────────────────────────────────

/// Arrivals every few minutes from 8:00, then check-in → exam → follow-up.
struct PatientFlow {
    days:       u64,
    discharged: usize,
}

impl FlowLayer for PatientFlow {
    fn on_start(&mut self, ctx: &FlowContext<'_>) -> Vec<FlowIntent> {
        let mut intents = Vec::new();
        for day in 0..self.days {
            for p in 0..PATIENTS_DAILY {
                let at = ctx.tick + day * DAY + 480 + p * 11;
                let element = ElementId((day * PATIENTS_DAILY + p) as u32);
                intents.push(FlowIntent::RequestAt { at, element, activity: CHECK_IN });
            }
        }
        intents
    }

    fn on_finish(&mut self, item: &WorkItem, _ctx: &FlowContext<'_>) -> Vec<FlowIntent> {
        let next = match item.activity {
            CHECK_IN => Some(EXAM),
            EXAM if item.element.0 % 3 == 0 => Some(FOLLOW_UP),
            _ => None,
        };
        match next {
            Some(activity) => vec![FlowIntent::Request { element: item.element, activity }],
            None => {
                self.discharged += 1;
                vec![]
            }
        }
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

fn report(log: &EventLog, activities: &[Activity]) {
    println!("{:<12} {:>9} {:>9} {:>12}", "Activity", "Started", "Finished", "Interrupted");
    println!("{}", "-".repeat(45));
    for a in activities {
        let count = |f: fn(&SimEvent) -> Option<ActivityId>| {
            log.events.iter().filter(|e| f(e) == Some(a.id)).count()
        };
        println!(
            "{:<12} {:>9} {:>9} {:>12}",
            a.description,
            count(|e| match e {
                SimEvent::ActivityStarted { activity, .. } => Some(*activity),
                _ => None,
            }),
            count(|e| match e {
                SimEvent::ActivityFinished { activity, .. } => Some(*activity),
                _ => None,
            }),
            count(|e| match e {
                SimEvent::ActivityInterrupted { activity, .. } => Some(*activity),
                _ => None,
            }),
        );
    }
    println!();
    println!(
        "Timed-out holds: {}",
        log.count(|e| matches!(e, SimEvent::ResourceTimedOut { .. }))
    );
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path)?,
        None => SimConfig {
            start_tick: Tick(0),
            end_tick: Tick(SIM_DAYS * DAY),
            seed: SEED,
            ..SimConfig::default()
        },
    };
    let days = (config.end_tick - config.start_tick).div_ceil(DAY);
    println!("=== clinic — rust_rcs ===");
    println!("Days: {days}  |  Seed: {}  |  Patients/day: {PATIENTS_DAILY}", config.seed);
    println!();

    let (store, roles) = build_staff()?;
    let activities = build_activities(&roles);
    let strategy = Partitioned::new(vec![vec![roles.doctor, roles.nurse, roles.room], vec![roles.desk]]);

    let mut sim = SimBuilder::new(config, store, activities, PatientFlow { days, discharged: 0 })
        .strategy(strategy)
        .build()?;

    let mut log = EventLog::new();
    let t0 = Instant::now();
    sim.run(&mut log)?;
    info!(events = log.len(), elapsed_ms = t0.elapsed().as_millis() as u64, "run complete");

    report(&log, sim.activities());
    println!("Discharged: {}", sim.flow().discharged);

    let out = Path::new("output/clinic");
    std::fs::create_dir_all(out)?;
    std::fs::write(out.join("events.json"), serde_json::to_string(&log)?)?;
    println!("Event log: {}", out.join("events.json").display());

    Ok(())
}
