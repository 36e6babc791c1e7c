//! Property-based tests for the graph solver

use super::*;
use proptest::prelude::*;

const CONTEXTS: [&str; 5] = ["C0", "C1", "C2", "C3", "C4"];

fn arb_context_set() -> impl Strategy<Value = BTreeSet<String>> {
    proptest::collection::btree_set(
        (0..CONTEXTS.len()).prop_map(|index| CONTEXTS[index].to_string()),
        0..3,
    )
}

fn arb_actions() -> impl Strategy<Value = Vec<TickAction>> {
    proptest::collection::vec((arb_context_set(), arb_context_set()), 1..8).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(index, (inputs, outputs))| {
                TickAction::new(format!("A{index}"))
                    .with_inputs(inputs)
                    .with_outputs(outputs)
            })
            .collect()
    })
}

fn arb_scenario() -> impl Strategy<Value = (Vec<TickAction>, usize, BTreeSet<String>, usize)> {
    arb_actions().prop_flat_map(|actions| {
        let count = actions.len();
        (Just(actions), 0..count, arb_context_set(), 0..=count)
    })
}

/// Every step runs with its inputs bound by the start state or an earlier step
fn respects_dependencies(actions: &[TickAction], contexts: &ContextMap, plan: &Plan) -> bool {
    let mut known: BTreeSet<&str> = contexts.keys().map(String::as_str).collect();
    for step in &plan.steps {
        let Some(action) = actions.iter().find(|action| &action.name == step) else {
            return false;
        };
        if !action
            .input_context_names
            .iter()
            .all(|name| known.contains(name.as_str()))
        {
            return false;
        }
        known.extend(action.output_context_names.iter().map(String::as_str));
    }
    true
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Plans are ordered producer-before-consumer, complete or not
    #[test]
    fn prop_plans_respect_dependencies((actions, target, bound, visited_count) in arb_scenario()) {
        let contexts: ContextMap = bound.into_iter().map(|name| (name, None)).collect();
        let visited: BTreeSet<String> = actions
            .iter()
            .filter(|action| action.name != actions[target].name)
            .take(visited_count)
            .map(|action| action.name.clone())
            .collect();
        let request = SolveRequest::new(&actions[target].name, &contexts, &[], &visited);
        let plan = GraphSolver::new(&actions).solve(&request);

        prop_assert!(respects_dependencies(&actions, &contexts, &plan), "{:?}", plan);
        prop_assert!(plan.steps.iter().all(|step| !visited.contains(step)));

        let unique: BTreeSet<&String> = plan.steps.iter().collect();
        prop_assert_eq!(unique.len(), plan.steps.len());

        if plan.complete {
            prop_assert_eq!(plan.steps.last(), Some(&actions[target].name));
        } else {
            prop_assert!(!plan.steps.contains(&actions[target].name));
        }
    }

    // Same inputs, same plan
    #[test]
    fn prop_solver_is_deterministic((actions, target, bound, _) in arb_scenario()) {
        let contexts: ContextMap = bound.into_iter().map(|name| (name, None)).collect();
        let visited = BTreeSet::new();
        let ran: Vec<String> = actions.iter().map(|action| action.name.clone()).collect();
        let request = SolveRequest::new(&actions[target].name, &contexts, &ran, &visited)
            .with_stack(&ran);
        let solver = GraphSolver::new(&actions);
        prop_assert_eq!(solver.solve(&request), solver.solve(&request));
    }

    // A target whose inputs are all bound is planned alone
    #[test]
    fn prop_satisfied_target_runs_alone((actions, target, _, _) in arb_scenario()) {
        let contexts: ContextMap = actions[target]
            .input_context_names
            .iter()
            .map(|name| (name.clone(), None))
            .collect();
        let visited = BTreeSet::new();
        let request = SolveRequest::new(&actions[target].name, &contexts, &[], &visited);
        let plan = GraphSolver::new(&actions).solve(&request);
        prop_assert!(plan.complete);
        prop_assert_eq!(plan.steps, vec![actions[target].name.clone()]);
    }
}
