//! Property-based tests for the state machine
//!
//! Random trees are built from a parent table so every generated tree is
//! well formed; transitions never target their own source.

use super::*;
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

const EVENTS: [&str; 3] = ["alpha", "beta", "gamma"];

fn state_id(index: usize) -> String {
    format!("S{index}")
}

/// Node 0 is the root; node `i` hangs under `parents[i - 1] % i`.
fn build(parents: &[usize], transitions: &[(usize, usize, usize)]) -> State {
    let count = parents.len() + 1;
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (offset, parent) in parents.iter().enumerate() {
        let node = offset + 1;
        children[parent % node].push(node);
    }

    make(0, &children, transitions, count)
}

fn make(
    node: usize,
    children: &[Vec<usize>],
    transitions: &[(usize, usize, usize)],
    count: usize,
) -> State {
    let mut state = match children[node].first() {
        Some(first) => State::group(
            state_id(node),
            state_id(*first),
            children[node]
                .iter()
                .map(|child| make(*child, children, transitions, count)),
        ),
        None => State::new(state_id(node)),
    };
    for (from, to, event) in transitions {
        let (from, to) = (from % count, to % count);
        if from == node && from != to {
            state = state.on(EVENTS[event % EVENTS.len()], &state_id(to));
        }
    }
    state
}

fn arb_tree() -> impl Strategy<Value = State> {
    (
        proptest::collection::vec(any::<usize>(), 0..15),
        proptest::collection::vec((any::<usize>(), any::<usize>(), any::<usize>()), 0..20),
    )
        .prop_map(|(parents, transitions)| build(&parents, &transitions))
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Well-formed trees always load
    #[test]
    fn prop_generated_trees_load(root in arb_tree()) {
        prop_assert!(StateMachine::new(root).is_ok());
    }

    // Entering any state lands on a leaf, and entering a leaf is a no-op
    #[test]
    fn prop_enter_reaches_leaf(root in arb_tree()) {
        let machine = StateMachine::new(root).unwrap();
        for id in machine.state_ids() {
            let leaf = machine.enter(id);
            prop_assert!(leaf.is_some(), "enter({}) found nothing", id);
            let leaf = leaf.unwrap();
            prop_assert!(machine.is_leaf(leaf));
            prop_assert_eq!(machine.enter(leaf), Some(leaf));
        }
    }

    // Resolved targets are always leaves, and resolution only succeeds
    // for events declared somewhere in the tree
    #[test]
    fn prop_resolve_event_yields_leaf(root in arb_tree(), event in 0usize..4) {
        let machine = StateMachine::new(root).unwrap();
        let event = EVENTS.get(event).copied().unwrap_or("unhandled");
        for id in machine.state_ids() {
            if let Some(target) = machine.resolve_event(id, event) {
                prop_assert!(machine.is_leaf(target));
                prop_assert!(machine.contains_transition(event));
            }
        }
    }

    // A transition declared on an ancestor is visible from every descendant
    #[test]
    fn prop_ancestor_transitions_inherited(root in arb_tree()) {
        let machine = StateMachine::new(root).unwrap();
        for id in machine.state_ids() {
            let mut ancestor = machine.parent(id);
            while let Some(parent) = ancestor {
                for event in machine.get_state(parent).unwrap().on.keys() {
                    prop_assert!(machine.resolve_event(id, event).is_some());
                }
                ancestor = machine.parent(parent);
            }
        }
    }
}
