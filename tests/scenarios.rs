use std::time::{Duration, Instant};
use timetable_solver::constraints::violations;
use timetable_solver::decode::Timetable;
use timetable_solver::model::Problem;
use timetable_solver::report::ScheduleReport;
use timetable_solver::solver::termination::{DecisionBudget, Indefinite, TimeBudget};
use timetable_solver::solver::{Assignment, SolveOutcome, Solver, Status};
use timetable_solver::{SchedulingInput, solve};

fn feasible(problem: &Problem) -> Assignment {
    let result = Solver::new(problem).solve(&mut Indefinite);
    match result.outcome {
        SolveOutcome::Feasible(assignment) => {
            assert!(
                violations(problem, assignment.placements(), true).is_empty(),
                "solution breaks a rule: {:?}",
                violations(problem, assignment.placements(), true)
            );
            assignment
        }
        other => panic!("expected a feasible timetable, got {:?}", other),
    }
}

#[test]
fn shared_faculty_never_double_booked() {
    let problem = Problem::builder(1, 2)
        .rooms(["R1", "R2"])
        .course("AI", "Dr.A", 1)
        .course("ML", "Dr.A", 1)
        .build()
        .unwrap();
    let assignment = feasible(&problem);

    let slots: Vec<_> = assignment.placements().iter().map(|p| p.slot).collect();
    assert_eq!(slots.len(), 2);
    assert_ne!(slots[0], slots[1]);
}

#[test]
fn pigeonhole_is_infeasible() {
    let problem = Problem::builder(1, 2)
        .room("R1")
        .course("AI", "Dr.A", 1)
        .course("ML", "Dr.B", 1)
        .course("Math", "Dr.C", 1)
        .build()
        .unwrap();
    let result = Solver::new(&problem).solve(&mut Indefinite);
    assert_eq!(result.outcome, SolveOutcome::Infeasible);
}

#[test]
fn unavailable_faculty_is_scheduled_later() {
    let problem = Problem::builder(5, 8)
        .rooms(["R1", "R2", "R3"])
        .course("AI", "Dr.A", 1)
        .unavailable("Dr.A", 0..4)
        .build()
        .unwrap();
    let assignment = feasible(&problem);

    assert_eq!(assignment.len(), 1);
    assert_eq!(assignment.placements()[0].slot, 4);
}

#[test]
fn conflicting_courses_use_different_slots() {
    let problem = Problem::builder(5, 8)
        .rooms(["R1", "R2", "R3"])
        .course("AI", "Dr.A", 1)
        .course("ML", "Dr.B", 1)
        .conflict("AI", "ML")
        .build()
        .unwrap();
    let assignment = feasible(&problem);

    assert_eq!(assignment.lectures_of(0), 1);
    assert_eq!(assignment.lectures_of(1), 1);
    let slots: Vec<_> = assignment.placements().iter().map(|p| p.slot).collect();
    assert_ne!(slots[0], slots[1]);
}

#[test]
fn sample_week_meets_every_rule() {
    let problem = SchedulingInput::sample().build().unwrap();
    let assignment = feasible(&problem);

    let ai = problem.course_index("AI").unwrap();
    let ml = problem.course_index("ML").unwrap();
    let ai_slot = assignment
        .placements()
        .iter()
        .find(|p| p.course == ai)
        .unwrap()
        .slot;
    assert!(ai_slot >= 4);
    assert!(
        assignment
            .placements()
            .iter()
            .filter(|p| p.course == ml)
            .all(|p| p.slot != ai_slot)
    );
}

#[test]
fn multiple_lectures_meet_quota() {
    let problem = Problem::builder(2, 3)
        .rooms(["R1", "R2"])
        .course("AI", "Dr.A", 3)
        .course("ML", "Dr.A", 2)
        .course("Math", "Dr.B", 2)
        .conflict("Math", "AI")
        .unavailable("Dr.B", [0, 1])
        .build()
        .unwrap();
    let assignment = feasible(&problem);
    assert_eq!(assignment.lectures_of(0), 3);
    assert_eq!(assignment.lectures_of(1), 2);
    assert_eq!(assignment.lectures_of(2), 2);
}

#[test]
fn repeated_solves_agree() {
    let problem = SchedulingInput::sample().build().unwrap();
    let first = Solver::new(&problem).solve(&mut Indefinite);
    let second = Solver::new(&problem).solve(&mut Indefinite);
    assert_eq!(first.outcome, second.outcome);
    assert_eq!(first.statistics.decisions, second.statistics.decisions);
}

#[test]
fn decoding_twice_is_identical() {
    let problem = SchedulingInput::sample().build().unwrap();
    let assignment = feasible(&problem);
    assert_eq!(
        Timetable::decode(&problem, &assignment).rows(),
        Timetable::decode(&problem, &assignment).rows()
    );
}

#[test]
fn expired_deadline_times_out() {
    let problem = SchedulingInput::sample().build().unwrap();
    let result = Solver::new(&problem).solve(&mut TimeBudget::until(Instant::now()));

    assert_eq!(result.outcome.status(), Status::TimedOut);
    assert_eq!(result.statistics.decisions, 0);
}

#[test]
fn decision_budget_returns_consistent_partial() {
    let problem = Problem::builder(5, 8)
        .rooms(["R1", "R2", "R3"])
        .course("AI", "Dr.A", 3)
        .course("ML", "Dr.B", 3)
        .course("Math", "Dr.A", 2)
        .build()
        .unwrap();
    let result = Solver::new(&problem).solve(&mut DecisionBudget::new(4));

    let SolveOutcome::TimedOut(partial) = &result.outcome else {
        panic!("expected a timeout, got {:?}", result.outcome);
    };
    assert_eq!(partial.len(), 4);
    assert!(violations(&problem, partial.placements(), false).is_empty());

    let report = ScheduleReport::calculate(&problem, &result);
    assert!(!report.all_quotas_met());
    assert_eq!(report.utilization.occupied, 4);
}

#[test]
fn generous_budget_solves() {
    let problem = SchedulingInput::sample().build().unwrap();
    let result = solve(&problem, Duration::from_secs(30));
    assert_eq!(result.outcome.status(), Status::Feasible);

    let report = ScheduleReport::calculate(&problem, &result);
    assert!(report.all_quotas_met());
    assert_eq!(report.utilization.capacity, 120);
}
