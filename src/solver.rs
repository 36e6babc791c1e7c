//! Graph solver
//!
//! Backward-chaining planner over the action graph. Actions are operators
//! whose input contexts are preconditions and whose output contexts are
//! effects; a plan is the ordered list of actions that must run this turn
//! so that the target's preconditions hold when it runs.
//!
//! The solver is pure: it reads the session snapshot it is handed and
//! returns a [`Plan`]. Producers are tried in a fixed order (the resumed
//! objective, then pending objectives from the top of the stack, then
//! producers ready to run, then declaration order), so identical inputs
//! always give identical plans.

use crate::model::{ContextMap, TickAction, TickStorySettings};
use std::collections::BTreeSet;

#[cfg(test)]
mod proptests;

/// Inputs of one planning call
#[derive(Debug, Clone, Copy)]
pub struct SolveRequest<'a> {
    /// Leaf action to reach
    pub target: &'a str,
    pub contexts: &'a ContextMap,
    /// Whole-session execution history, oldest first
    pub ran_handlers: &'a [String],
    /// Actions already executed this turn; never planned again
    pub visited: &'a BTreeSet<String>,
    /// Pending objectives, bottom first
    pub objectives_stack: &'a [String],
    /// Event just raised, by the user's intent or an executed action's trigger
    pub raised_event: Option<&'a str>,
    /// Objective most recently popped from the stack
    pub resumed: Option<&'a str>,
}

impl<'a> SolveRequest<'a> {
    pub fn new(
        target: &'a str,
        contexts: &'a ContextMap,
        ran_handlers: &'a [String],
        visited: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            target,
            contexts,
            ran_handlers,
            visited,
            objectives_stack: &[],
            raised_event: None,
            resumed: None,
        }
    }

    #[must_use]
    pub fn with_stack(mut self, objectives_stack: &'a [String]) -> Self {
        self.objectives_stack = objectives_stack;
        self
    }

    #[must_use]
    pub fn with_raised_event(mut self, event: Option<&'a str>) -> Self {
        self.raised_event = event;
        self
    }

    #[must_use]
    pub fn with_resumed(mut self, resumed: Option<&'a str>) -> Self {
        self.resumed = resumed;
        self
    }
}

/// Ordered action names to execute
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    pub steps: Vec<String>,
    /// False when some precondition of the target has no available producer;
    /// `steps` is then the longest prefix that could be resolved.
    pub complete: bool,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Working state of one search
struct Search<'r> {
    known: BTreeSet<String>,
    steps: Vec<String>,
    in_progress: BTreeSet<String>,
    request: &'r SolveRequest<'r>,
}

pub struct GraphSolver<'a> {
    actions: &'a [TickAction],
    settings: Option<&'a TickStorySettings>,
}

impl<'a> GraphSolver<'a> {
    pub fn new(actions: &'a [TickAction]) -> Self {
        Self {
            actions,
            settings: None,
        }
    }

    /// Also skip producers that already ran more often than the story's
    /// repetition limit
    #[must_use]
    pub fn with_settings(mut self, settings: &'a TickStorySettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn solve(&self, request: &SolveRequest<'_>) -> Plan {
        if request.visited.contains(request.target) {
            return Plan {
                steps: Vec::new(),
                complete: true,
            };
        }
        let Some(target) = self.action(request.target) else {
            tracing::warn!(objective = %request.target, "Planning toward an undeclared action");
            return Plan::default();
        };

        let mut search = Search {
            known: request.contexts.keys().cloned().collect(),
            steps: Vec::new(),
            in_progress: BTreeSet::new(),
            request,
        };

        if let Some(event) = request.raised_event {
            self.plan_detours(event, target, &mut search);
        }

        let complete = self.satisfy(target, &mut search);
        tracing::debug!(
            objective = %request.target,
            steps = ?search.steps,
            complete,
            "Plan computed"
        );
        Plan {
            steps: search.steps,
            complete,
        }
    }

    fn action(&self, name: &str) -> Option<&'a TickAction> {
        self.actions.iter().find(|action| action.name == name)
    }

    /// Actions triggered by `event` that can run right away go first
    fn plan_detours(&self, event: &str, target: &TickAction, search: &mut Search<'_>) {
        for action in self.actions {
            if action.trigger.as_deref() == Some(event)
                && action.name != target.name
                && !search.request.visited.contains(&action.name)
                && action
                    .input_context_names
                    .iter()
                    .all(|name| search.known.contains(name))
            {
                search.steps.push(action.name.clone());
                search.known.extend(action.output_context_names.iter().cloned());
            }
        }
    }

    /// Plan `action` after whatever its missing inputs need.
    ///
    /// Inputs resolved before a dead end stay planned; the caller rolls back
    /// failed producer attempts, so at the top level they form the prefix.
    fn satisfy(&self, action: &'a TickAction, search: &mut Search<'_>) -> bool {
        search.in_progress.insert(action.name.clone());

        for input in &action.input_context_names {
            if search.known.contains(input) {
                continue;
            }
            let mut produced = false;
            for producer in self.candidates(input, search) {
                let checkpoint = (search.known.clone(), search.steps.len());
                if self.satisfy(producer, search) {
                    produced = true;
                    break;
                }
                search.known = checkpoint.0;
                search.steps.truncate(checkpoint.1);
            }
            if !produced {
                tracing::debug!(action = %action.name, context = %input, "No producer available");
                search.in_progress.remove(&action.name);
                return false;
            }
        }

        search.in_progress.remove(&action.name);
        search.steps.push(action.name.clone());
        search
            .known
            .extend(action.output_context_names.iter().cloned());
        true
    }

    /// Producers of `context` still eligible, in tie-break order
    fn candidates(&self, context: &str, search: &Search<'_>) -> Vec<&'a TickAction> {
        let request = search.request;
        let preferred: Vec<&str> = request
            .resumed
            .into_iter()
            .chain(request.objectives_stack.iter().rev().map(String::as_str))
            .collect();

        let mut producers: Vec<&'a TickAction> = self
            .actions
            .iter()
            .filter(|action| action.produces(context))
            .filter(|action| {
                !search.in_progress.contains(&action.name)
                    && !request.visited.contains(&action.name)
                    && !search.steps.contains(&action.name)
                    && !self.exhausted(action, request.ran_handlers)
            })
            .collect();
        // Producers runnable right away beat those needing more steps.
        // Stable: declaration order among equally preferred producers
        producers.sort_by_key(|action| {
            let position = preferred
                .iter()
                .position(|name| *name == action.name)
                .unwrap_or(usize::MAX);
            let ready = action
                .input_context_names
                .iter()
                .all(|name| search.known.contains(name));
            (position, !ready)
        });
        producers
    }

    fn exhausted(&self, action: &TickAction, ran_handlers: &[String]) -> bool {
        self.settings.is_some_and(|settings| {
            let runs = ran_handlers.iter().filter(|name| **name == action.name).count();
            u32::try_from(runs).map_or(true, |runs| settings.exceeded(runs))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(names: &[&str]) -> ContextMap {
        names.iter().map(|name| ((*name).to_string(), None)).collect()
    }

    fn names(plan: &Plan) -> Vec<&str> {
        plan.steps.iter().map(String::as_str).collect()
    }

    /// BONJOUR -> VEUX -> TIC -> {TANT_PIS | TANT_MIEUX} -> AU_REVOIR
    fn bonjour_actions() -> Vec<TickAction> {
        vec![
            TickAction::new("BONJOUR_HUMAIN").with_outputs(["DEV_CONTEXT_1"]),
            TickAction::new("VEUX_TU_JOUER")
                .with_inputs(["DEV_CONTEXT_1"])
                .with_outputs(["DEV_CONTEXT_2"]),
            TickAction::new("TIC_TAC_TOE")
                .with_inputs(["DEV_CONTEXT_2"])
                .with_outputs(["JE_VEUX_JOUER", "JE_NE_VEUX_PAS_JOUER"]),
            TickAction::new("TANT_PIS")
                .with_inputs(["JE_NE_VEUX_PAS_JOUER"])
                .with_outputs(["DEV_CONTEXT_3"]),
            TickAction::new("TANT_MIEUX")
                .with_inputs(["JE_VEUX_JOUER"])
                .with_outputs(["DEV_CONTEXT_3"]),
            TickAction::new("AU_REVOIR_HUMAIN")
                .with_inputs(["DEV_CONTEXT_3"])
                .final_action(),
        ]
    }

    #[test]
    fn test_satisfied_target_is_planned_alone() {
        let actions = bonjour_actions();
        let contexts = bound(&["DEV_CONTEXT_3"]);
        let visited = BTreeSet::new();
        let plan = GraphSolver::new(&actions)
            .solve(&SolveRequest::new("AU_REVOIR_HUMAIN", &contexts, &[], &visited));
        assert_eq!(names(&plan), vec!["AU_REVOIR_HUMAIN"]);
        assert!(plan.complete);
    }

    #[test]
    fn test_full_chain_from_empty_contexts() {
        let actions = bonjour_actions();
        let contexts = ContextMap::new();
        let visited = BTreeSet::new();
        let plan = GraphSolver::new(&actions)
            .solve(&SolveRequest::new("AU_REVOIR_HUMAIN", &contexts, &[], &visited));
        assert_eq!(
            names(&plan),
            vec![
                "BONJOUR_HUMAIN",
                "VEUX_TU_JOUER",
                "TIC_TAC_TOE",
                "TANT_PIS",
                "AU_REVOIR_HUMAIN"
            ]
        );
        assert!(plan.complete);
    }

    #[test]
    fn test_bound_context_selects_producer() {
        let actions = bonjour_actions();
        let contexts = bound(&["DEV_CONTEXT_1", "DEV_CONTEXT_2", "JE_VEUX_JOUER"]);
        let ran = vec!["TIC_TAC_TOE".to_string()];
        let visited = BTreeSet::new();
        let plan = GraphSolver::new(&actions)
            .solve(&SolveRequest::new("AU_REVOIR_HUMAIN", &contexts, &ran, &visited));
        // TANT_PIS is declared first but would need TIC_TAC_TOE again
        assert_eq!(names(&plan), vec!["TANT_MIEUX", "AU_REVOIR_HUMAIN"]);

        // Without an answer the question is asked again
        let contexts = bound(&["DEV_CONTEXT_1", "DEV_CONTEXT_2"]);
        let plan = GraphSolver::new(&actions)
            .solve(&SolveRequest::new("AU_REVOIR_HUMAIN", &contexts, &ran, &visited));
        assert_eq!(names(&plan), vec!["TIC_TAC_TOE", "TANT_PIS", "AU_REVOIR_HUMAIN"]);
    }

    #[test]
    fn test_resumed_objective_wins_tie() {
        let actions = bonjour_actions();
        let contexts = bound(&["JE_VEUX_JOUER", "JE_NE_VEUX_PAS_JOUER"]);
        let visited = BTreeSet::new();
        let solver = GraphSolver::new(&actions);

        let request = SolveRequest::new("AU_REVOIR_HUMAIN", &contexts, &[], &visited);
        assert_eq!(names(&solver.solve(&request)), vec!["TANT_PIS", "AU_REVOIR_HUMAIN"]);

        let request = request.with_resumed(Some("TANT_MIEUX"));
        assert_eq!(names(&solver.solve(&request)), vec!["TANT_MIEUX", "AU_REVOIR_HUMAIN"]);

        let stack = vec!["TANT_MIEUX".to_string()];
        let request = SolveRequest::new("AU_REVOIR_HUMAIN", &contexts, &[], &visited)
            .with_stack(&stack);
        assert_eq!(names(&solver.solve(&request)), vec!["TANT_MIEUX", "AU_REVOIR_HUMAIN"]);
    }

    #[test]
    fn test_dead_end_returns_prefix() {
        let actions = vec![
            TickAction::new("A").with_outputs(["X"]),
            TickAction::new("B").with_inputs(["NOBODY"]).with_outputs(["Y"]),
            TickAction::new("C").with_inputs(["X", "Y"]),
        ];
        let contexts = ContextMap::new();
        let visited = BTreeSet::new();
        let plan = GraphSolver::new(&actions).solve(&SolveRequest::new("C", &contexts, &[], &visited));
        assert_eq!(names(&plan), vec!["A"]);
        assert!(!plan.complete);
    }

    #[test]
    fn test_visited_actions_are_not_replanned() {
        let actions = bonjour_actions();
        let contexts = bound(&["DEV_CONTEXT_2"]);
        let visited: BTreeSet<String> = ["TIC_TAC_TOE".to_string()].into();
        let plan = GraphSolver::new(&actions)
            .solve(&SolveRequest::new("AU_REVOIR_HUMAIN", &contexts, &[], &visited));
        assert!(plan.is_empty());
        assert!(!plan.complete);

        let plan = GraphSolver::new(&actions)
            .solve(&SolveRequest::new("TIC_TAC_TOE", &contexts, &[], &visited));
        assert!(plan.is_empty());
        assert!(plan.complete);
    }

    #[test]
    fn test_cyclic_dependencies_terminate() {
        let actions = vec![
            TickAction::new("A").with_inputs(["Y"]).with_outputs(["X"]),
            TickAction::new("B").with_inputs(["X"]).with_outputs(["Y"]),
            TickAction::new("C").with_inputs(["X"]),
        ];
        let contexts = ContextMap::new();
        let visited = BTreeSet::new();
        let plan = GraphSolver::new(&actions).solve(&SolveRequest::new("C", &contexts, &[], &visited));
        assert!(plan.is_empty());
        assert!(!plan.complete);
    }

    #[test]
    fn test_repetition_limit_excludes_producer() {
        let actions = bonjour_actions();
        let contexts = ContextMap::new();
        let visited = BTreeSet::new();
        let ran: Vec<String> = vec!["BONJOUR_HUMAIN".to_string(); 3];
        let settings = TickStorySettings::default();

        let request = SolveRequest::new("VEUX_TU_JOUER", &contexts, &ran, &visited);
        let plan = GraphSolver::new(&actions).solve(&request);
        assert_eq!(names(&plan), vec!["BONJOUR_HUMAIN", "VEUX_TU_JOUER"]);

        let plan = GraphSolver::new(&actions).with_settings(&settings).solve(&request);
        assert!(!plan.complete);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_triggered_detour_goes_first() {
        let actions = vec![
            TickAction::new("NOTIFY").with_trigger("alert").with_outputs(["NOTIFIED"]),
            TickAction::new("ASK").with_outputs(["ANSWER"]),
            TickAction::new("DONE").with_inputs(["ANSWER"]),
        ];
        let contexts = ContextMap::new();
        let visited = BTreeSet::new();
        let request =
            SolveRequest::new("DONE", &contexts, &[], &visited).with_raised_event(Some("alert"));
        let plan = GraphSolver::new(&actions).solve(&request);
        assert_eq!(names(&plan), vec!["NOTIFY", "ASK", "DONE"]);

        let visited: BTreeSet<String> = ["NOTIFY".to_string()].into();
        let request =
            SolveRequest::new("DONE", &contexts, &[], &visited).with_raised_event(Some("alert"));
        assert_eq!(names(&GraphSolver::new(&actions).solve(&request)), vec!["ASK", "DONE"]);
    }
}
