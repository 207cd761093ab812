use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use hrdesk_core::clock::ManualClock;
use hrdesk_core::desk::{Desk, NewTicket};
use hrdesk_core::model::actor::{Actor, ActorId, Role};
use hrdesk_core::model::category::Category;
use hrdesk_core::model::ticket::{Status, Ticket};
use proptest::prelude::*;
use std::sync::Arc;

const EMPLOYEE: &str = "emp-ana";
const HR_A: &str = "hr-kofi";
const HR_B: &str = "hr-mei";

#[derive(Debug, Clone)]
enum Step {
    SetStatus(Status, bool),
    Escalate(bool),
    Resolve,
    Confirm,
    Reopen,
    ClosePermanently,
    Reassign(bool),
    Comment(bool),
    Advance(u32),
    RemoveHrA,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        1 => (prop::sample::select(Status::ALL.to_vec()), any::<bool>())
            .prop_map(|(to, by_hr)| Step::SetStatus(to, by_hr)),
        1 => any::<bool>().prop_map(Step::Escalate),
        3 => Just(Step::Resolve),
        2 => Just(Step::Confirm),
        3 => Just(Step::Reopen),
        1 => Just(Step::ClosePermanently),
        1 => any::<bool>().prop_map(Step::Reassign),
        1 => any::<bool>().prop_map(Step::Comment),
        2 => (1u32..=96).prop_map(Step::Advance),
        1 => Just(Step::RemoveHrA),
    ]
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn id(raw: &str) -> ActorId {
    ActorId::new_unchecked(raw)
}

fn setup() -> (Desk, Arc<ManualClock>, Ticket) {
    let clock = Arc::new(ManualClock::new(t0()));
    let mut desk = Desk::in_memory().expect("desk").with_clock(clock.clone());
    for (raw, role) in [
        (EMPLOYEE, Role::Employee),
        (HR_A, Role::HrExecutive),
        (HR_B, Role::HrExecutive),
    ] {
        desk.register_actor(&Actor::new(id(raw), raw, role))
            .expect("register");
    }
    let ticket = desk
        .create_ticket(NewTicket::new(
            Category::LeaveIssue,
            id(EMPLOYEE),
            "Leave request stuck in approval",
        ))
        .expect("create");
    (desk, clock, ticket)
}

fn hr(second: bool) -> ActorId {
    if second { id(HR_B) } else { id(HR_A) }
}

/// Runs one step. `None` means the step does not touch the ticket.
fn run(desk: &mut Desk, clock: &ManualClock, ticket: &Ticket, step: &Step) -> Option<bool> {
    let tid = &ticket.id;
    let employee = id(EMPLOYEE);
    let outcome = match step {
        Step::SetStatus(to, by_hr) => {
            let actor = if *by_hr { hr(true) } else { employee };
            desk.set_status(tid, &actor, *to, Some("update")).is_ok()
        }
        Step::Escalate(by_hr) => {
            let actor = if *by_hr { hr(true) } else { employee };
            desk.escalate(tid, &actor, "waiting too long").is_ok()
        }
        Step::Resolve => desk.resolve_by_hr(tid, &hr(true), Some("fixed")).is_ok(),
        Step::Confirm => desk.confirm_by_employee(tid, &employee).is_ok(),
        Step::Reopen => desk.reopen_by_employee(tid, &employee, "still broken").is_ok(),
        Step::ClosePermanently => desk.close_permanently(tid, &hr(true), None).is_ok(),
        Step::Reassign(second) => desk.reassign(tid, &hr(true), &hr(*second)).is_ok(),
        Step::Comment(by_hr) => {
            let actor = if *by_hr { hr(true) } else { employee };
            desk.post_message(tid, &actor, "any news?").is_ok()
        }
        Step::Advance(hours) => {
            clock.advance(TimeDelta::hours(i64::from(*hours)));
            return None;
        }
        Step::RemoveHrA => {
            let _ = desk.remove_actor(&id(HR_A));
            return None;
        }
    };
    Some(outcome)
}

fn check_invariants(desk: &Desk, ticket: &Ticket) -> Result<(), TestCaseError> {
    let res = &ticket.resolution;
    prop_assert!(res.reopen_count <= res.max_reopen_allowed);
    if matches!(ticket.status, Status::Resolved | Status::Closed) {
        prop_assert!(ticket.resolved_at.is_some(), "{:?} without resolved_at", ticket.status);
    }
    if let (Some(deadline), Some(resolved)) = (res.reopen_deadline, ticket.resolved_at) {
        prop_assert!(deadline >= resolved);
    }
    if res.permanently_closed_by_hr {
        prop_assert_eq!(ticket.status, Status::Closed);
    }
    let drift = desk.verify_workload().expect("verify");
    prop_assert!(drift.is_empty(), "workload drift: {:?}", drift);
    Ok(())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(64))]

    #[test]
    fn random_command_sequences_keep_invariants(steps in prop::collection::vec(arb_step(), 1..40)) {
        let (mut desk, clock, mut ticket) = setup();
        check_invariants(&desk, &ticket)?;

        for step in &steps {
            let closed_before = ticket.is_terminal();
            let applied = run(&mut desk, &clock, &ticket, step);
            let reloaded = desk.get_ticket(&ticket.id).expect("reload");

            if closed_before && applied.is_some() {
                prop_assert_eq!(applied, Some(false), "{:?} succeeded on a closed ticket", step);
                prop_assert_eq!(&reloaded, &ticket);
            }
            prop_assert!(reloaded.version >= ticket.version);
            if applied == Some(false) {
                prop_assert_eq!(reloaded.version, ticket.version);
            }

            ticket = reloaded;
            check_invariants(&desk, &ticket)?;
        }
    }

    #[test]
    fn reopens_never_exceed_the_limit(rounds in 1usize..8, gap_hours in 0u32..100) {
        let (mut desk, clock, ticket) = setup();
        let mut reopened = 0u32;
        for _ in 0..rounds {
            let current = desk.get_ticket(&ticket.id).expect("reload");
            if current.status != Status::Resolved {
                desk.resolve_by_hr(&ticket.id, &hr(true), None).expect("resolve");
            }
            clock.advance(TimeDelta::hours(i64::from(gap_hours)));
            if desk.reopen_by_employee(&ticket.id, &id(EMPLOYEE), "again").is_ok() {
                reopened += 1;
            }
        }
        let stored = desk.get_ticket(&ticket.id).expect("reload");
        prop_assert_eq!(stored.resolution.reopen_count, reopened);
        prop_assert!(reopened <= stored.resolution.max_reopen_allowed);
        if gap_hours > 72 {
            prop_assert_eq!(reopened, 0);
        } else {
            prop_assert_eq!(reopened as usize, rounds.min(3));
        }
    }
}
