use uta_engine::{
    Alternative, Criterion, CriterionDirection, Instance, SolveResult, SolveStatus, SolverOptions, UtaError, UtaSolver,
};

const DELTA: f64 = 1e-6;

fn options() -> SolverOptions {
    SolverOptions::new().with_delta_threshold(DELTA)
}

/// Five cars, each dominating the next, plus one unranked car
fn cars() -> Instance {
    let car = |name: &str, price: f64, speed: f64, comfort: f64| {
        Alternative::new(name)
            .with_value("price", price)
            .with_value("speed", speed)
            .with_value("comfort", comfort)
    };
    let mut instance = Instance {
        criteria: vec![
            Criterion::new("price", CriterionDirection::Cost, 2),
            Criterion::new("speed", CriterionDirection::Gain, 2),
            Criterion::new("comfort", CriterionDirection::Gain, 1),
        ],
        alternatives: vec![
            car("A", 10.0, 9.0, 5.0).with_rank(0),
            car("B", 20.0, 8.0, 4.0).with_rank(1),
            car("C", 30.0, 6.0, 3.0).with_rank(2),
            car("D", 40.0, 4.0, 2.0).with_rank(3),
            car("E", 50.0, 2.0, 1.0).with_rank(4),
            car("F", 25.0, 7.0, 3.0),
        ],
        ..Instance::default()
    };
    instance.update_criteria_ranges();
    instance
}

/// Two criteria, `[A] > [B, C]`
fn tied() -> Instance {
    let mut instance = Instance {
        criteria: vec![
            Criterion::new("g", CriterionDirection::Gain, 2),
            Criterion::new("c", CriterionDirection::Cost, 1),
        ],
        alternatives: vec![
            Alternative::new("A").with_value("g", 10.0).with_value("c", 1.0).with_rank(0),
            Alternative::new("B").with_value("g", 5.0).with_value("c", 5.0).with_rank(1),
            Alternative::new("C").with_value("g", 0.0).with_value("c", 1.0).with_rank(1),
        ],
        ..Instance::default()
    };
    instance.update_criteria_ranges();
    instance
}

/// `cars` with C and D tied
fn tied_chain() -> Instance {
    let mut instance = cars();
    instance.alternatives[3].reference_rank = Some(2);
    instance.alternatives[4].reference_rank = Some(3);
    instance
}

fn solved(instance: &Instance) -> UtaSolver {
    let mut solver = instance.solver(options()).unwrap();
    solver.solve().unwrap();
    solver
}

fn utility(result: &SolveResult, name: &str) -> f64 {
    result
        .ranking
        .iter()
        .find(|e| e.alternative == name)
        .map(|e| e.utility)
        .unwrap()
}

fn assert_normalized(result: &SolveResult) {
    let total: f64 = result.utility_functions.iter().map(|f| f.weight()).sum();
    assert!((total - 1.0).abs() < 1e-10, "weights sum to {total}");
}

fn assert_monotone(result: &SolveResult) {
    for function in &result.utility_functions {
        assert_eq!(function.points[0].ordinate, 0.0, "{} does not start at 0", function.criterion);
        for pair in function.points.windows(2) {
            assert!(
                pair[1].ordinate >= pair[0].ordinate - 1e-12,
                "{} decreases: {:?}",
                function.criterion,
                function.points
            );
        }
    }
}

#[test]
fn test_tied_scenario() {
    let solver = solved(&tied());
    let result = solver.result().unwrap();

    assert_eq!(result.status, SolveStatus::Optimal);
    assert_eq!(result.kendall_tau, 1.0);
    assert_normalized(result);
    assert_monotone(result);

    let (a, b, c) = (utility(result, "A"), utility(result, "B"), utility(result, "C"));
    assert!(a - b >= DELTA - 1e-12, "A = {a}, B = {b}");
    assert!(a - c >= DELTA - 1e-12, "A = {a}, C = {c}");
    assert!((b - c).abs() < DELTA, "B = {b}, C = {c}");
}

#[test]
fn test_strict_chain_is_reproduced() {
    let solver = solved(&cars());
    let result = solver.result().unwrap();

    assert_eq!(result.kendall_tau, 1.0);
    assert_normalized(result);
    assert_monotone(result);
    assert!(result.lp.as_ref().unwrap().total_violation.abs() < 1e-9);

    let ranked = ["A", "B", "C", "D", "E"];
    for pair in ranked.windows(2) {
        let (better, worse) = (utility(result, pair[0]), utility(result, pair[1]));
        assert!(better >= worse - DELTA, "{} = {better} below {} = {worse}", pair[0], pair[1]);
    }

    assert_eq!(result.ranking.len(), 6);
    let positions: Vec<usize> = result.ranking.iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4, 5, 6]);
    let f = result.ranking.iter().find(|e| e.alternative == "F").unwrap();
    assert_eq!(f.reference_rank, None);
}

#[test]
fn test_ranges_contain_ordinates() {
    let mut solver = solved(&cars());
    for preserve in [true, false] {
        let result = solver.set_preserve_kendall_coefficient(preserve).unwrap();
        for function in &result.utility_functions {
            for point in &function.points {
                assert!(point.min_value <= point.max_value, "{}: {point:?}", function.criterion);
                assert!(
                    point.min_value <= point.ordinate && point.ordinate <= point.max_value,
                    "{}: {point:?}",
                    function.criterion
                );
                assert!(point.min_value >= 0.0 && point.max_value <= 1.0 + 1e-12);
            }
        }
    }
}

#[test]
fn test_published_bounds_are_reachable() {
    let mut instance = cars();
    instance.criteria[1].segments = 3;
    let mut solver = instance.solver(options().with_delta_threshold(1e-3)).unwrap();
    solver.solve().unwrap();
    let before = solver.result().unwrap().clone();

    for function in &before.utility_functions {
        for (index, point) in function.points.iter().enumerate().skip(1) {
            assert!(point.min_value <= point.ordinate && point.ordinate <= point.max_value);
            for target in [point.min_value, point.max_value] {
                let mut moved = solver.clone();
                let result = moved.adjust_point(&function.criterion, index, target).unwrap();
                assert_normalized(result);
                assert_monotone(result);
            }
        }
    }
}

#[test]
fn test_adjusting_within_preserved_ranges_keeps_tau() {
    let instance = tied_chain();
    for delta in [1e-3, DELTA] {
        let mut solver = instance.solver(options().with_delta_threshold(delta)).unwrap();
        solver.solve().unwrap();
        let before = solver.result().unwrap().clone();

        for function in &before.utility_functions {
            for (index, point) in function.points.iter().enumerate().skip(1) {
                for target in [point.min_value, point.max_value] {
                    let mut moved = solver.clone();
                    let result = moved.adjust_point(&function.criterion, index, target).unwrap();
                    assert_eq!(
                        result.kendall_tau, before.kendall_tau,
                        "{}[{index}] -> {target} (delta = {delta})",
                        function.criterion
                    );
                    assert_normalized(result);
                    assert_monotone(result);
                }
            }
        }
    }
}

#[test]
fn test_inconsistent_reference_lowers_tau() {
    let mut instance = tied();
    // C now dominates A yet is ranked below it
    instance.alternatives[2].values.insert("g".to_string(), Some(10.0));
    instance.alternatives[2].values.insert("c".to_string(), Some(0.5));
    instance.update_criteria_ranges();

    let solver = solved(&instance);
    let result = solver.result().unwrap();
    assert!((-1.0..=1.0).contains(&result.kendall_tau));
    assert!(result.kendall_tau < 1.0);
    assert!(result.lp.as_ref().unwrap().total_violation > 0.0);
    assert_normalized(result);
    assert_monotone(result);
}

#[test]
fn test_adjust_is_idempotent() {
    let mut solver = solved(&cars());
    let point = solver.result().unwrap().utility_function("speed").unwrap().points[1];
    let target = (point.min_value + point.max_value) / 2.0;

    let first = solver.adjust_point("speed", 1, target).unwrap().clone();
    let coefficients = solver.coefficients().unwrap().clone();
    let ordinate = first.utility_function("speed").unwrap().points[1].ordinate;
    assert!((ordinate - target).abs() < 1e-12, "{ordinate} != {target}");
    assert_normalized(&first);

    let second = solver.adjust_point("speed", 1, target).unwrap();
    assert_eq!(second, &first);
    assert_eq!(solver.coefficients().unwrap(), &coefficients);
}

#[test]
fn test_adjust_weight_keeps_normalization() {
    let mut solver = solved(&cars());
    let function = solver.result().unwrap().utility_function("comfort").unwrap().clone();
    let last = function.points.len() - 1;
    let point = function.points[last];
    let target = (point.min_value + point.max_value) / 2.0;

    let result = solver.adjust_point("comfort", last, target).unwrap();
    assert_normalized(result);
    assert_monotone(result);
    let weight = result.utility_function("comfort").unwrap().weight();
    assert!((weight - target).abs() < 1e-12);
}

#[test]
fn test_out_of_range_adjust_leaves_state() {
    let mut solver = solved(&cars());
    let before = solver.result().unwrap().clone();
    let coefficients = solver.coefficients().unwrap().clone();
    let point = before.utility_function("price").unwrap().points[1];

    let err = solver.adjust_point("price", 1, point.max_value + 0.1).unwrap_err();
    assert!(matches!(err, UtaError::ValueOutOfRange { index: 1, .. }), "{err}");
    assert_eq!(solver.result().unwrap(), &before);
    assert_eq!(solver.coefficients().unwrap(), &coefficients);
}

#[test]
fn test_load_state_round_trip() {
    let instance = cars();
    let solver = solved(&instance);
    let saved = solver.result().unwrap().clone();

    let mut resumed = instance.solver(options()).unwrap();
    let restored = resumed
        .load_state(&saved.utility_functions, instance.reference_ranking(), instance.unranked())
        .unwrap();

    assert_eq!(restored.status, SolveStatus::Restored);
    assert!(restored.lp.is_none());
    assert_eq!(restored.kendall_tau, saved.kendall_tau);
    assert_eq!(restored.ranking.len(), saved.ranking.len());
    for (a, b) in restored.ranking.iter().zip(&saved.ranking) {
        assert_eq!(a.alternative, b.alternative);
        assert_eq!(a.position, b.position);
        assert!((a.utility - b.utility).abs() < 1e-12);
    }
}

#[test]
fn test_load_state_rejects_foreign_functions() {
    let saved = solved(&cars()).result().unwrap().clone();
    let instance = tied();
    let mut solver = instance.solver(options()).unwrap();
    let err = solver
        .load_state(&saved.utility_functions, instance.reference_ranking(), instance.unranked())
        .unwrap_err();
    assert!(matches!(err, UtaError::UnknownCriterion(_)), "{err}");
}

#[test]
fn test_degenerate_criterion_is_rejected() {
    let mut instance = tied();
    for alternative in &mut instance.alternatives {
        alternative.values.insert("c".to_string(), Some(2.0));
    }
    instance.update_criteria_ranges();

    let err = instance.solver(options()).unwrap_err();
    assert!(matches!(err, UtaError::DegenerateCriterion { ref criterion, .. } if criterion == "c"), "{err}");
}

#[test]
fn test_missing_value_is_rejected() {
    let mut instance = cars();
    instance.alternatives[5].values.remove("comfort");
    let err = instance.solver(options()).unwrap_err();
    assert_eq!(
        err,
        UtaError::MissingValue {
            alternative: "F".to_string(),
            criterion: "comfort".to_string(),
        }
    );
}

#[test]
fn test_iteration_cap_is_reported() {
    let instance = cars();
    let mut solver = instance.solver(options().with_max_iterations(1)).unwrap();
    let result = solver.solve().unwrap();
    assert_eq!(result.status, SolveStatus::IterationLimit);
    assert!(result.lp.as_ref().unwrap().iterations <= 1);
}

#[cfg(feature = "serde")]
mod serde_format {
    use super::*;

    const INSTANCE: &str = r#"{
        "criteria": [
            { "name": "g", "direction": "Gain", "segments": 2 },
            { "name": "c", "direction": "Cost", "segments": 1 }
        ],
        "alternatives": [
            { "name": "A", "values": { "g": 10, "c": 1 }, "reference_rank": 0 },
            { "name": "B", "values": { "g": 5, "c": 5 }, "reference_rank": 1 },
            { "name": "C", "values": { "g": 0, "c": 1 }, "reference_rank": 1 },
            { "name": "D", "values": { "g": 7, "c": null } }
        ],
        "settings": { "delta_threshold": 0.000001 }
    }"#;

    #[test]
    fn test_parse_instance() {
        let mut instance: Instance = serde_json::from_str(INSTANCE).unwrap();
        instance.update_criteria_ranges();

        assert_eq!(instance.criteria[1].direction, CriterionDirection::Cost);
        assert_eq!(instance.criteria[0].max_value, 10.0);
        assert_eq!(instance.alternatives[3].value("c"), None);
        assert_eq!(instance.reference_ranking().len(), 2);
        assert_eq!(instance.options(SolverOptions::default()).delta_threshold, 1e-6);
    }

    #[test]
    fn test_invalid_direction() {
        let json = INSTANCE.replace("\"Cost\"", "\"cost\"");
        let err = serde_json::from_str::<Instance>(&json).unwrap_err();
        assert!(err.to_string().contains("Gain"), "{err}");
    }

    #[test]
    fn test_saved_result_reloads() {
        let instance = tied();
        let saved = solved(&instance).result().unwrap().clone();
        let json = serde_json::to_string(&saved).unwrap();
        let parsed: SolveResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.utility_functions.len(), 2);

        let mut solver = instance.solver(options()).unwrap();
        let restored = solver
            .load_state(&parsed.utility_functions, instance.reference_ranking(), instance.unranked())
            .unwrap();
        assert_eq!(restored.kendall_tau, saved.kendall_tau);
    }
}
