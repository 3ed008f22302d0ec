//! Building and validating a workflow graph.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use super::executor::Executor;
use super::graph::{StateFactory, Workflow};
use crate::error::RelayError;

/// Collects executors and edges; `build` checks the graph is a DAG.
pub struct WorkflowBuilder<S: Send> {
    executors: Vec<Arc<dyn Executor<S>>>,
    edges: Vec<(String, String)>,
    start: Option<String>,
    state_factory: Option<StateFactory<S>>,
}

impl<S: Send + 'static> Default for WorkflowBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send + 'static> WorkflowBuilder<S> {
    pub fn new() -> Self {
        Self {
            executors: Vec::new(),
            edges: Vec::new(),
            start: None,
            state_factory: None,
        }
    }

    pub fn add_executor(mut self, executor: impl Executor<S> + 'static) -> Self {
        self.executors.push(Arc::new(executor));
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    pub fn set_start(mut self, id: impl Into<String>) -> Self {
        self.start = Some(id.into());
        self
    }

    /// How each run creates its state from the initial input.
    pub fn with_state<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> S + Send + Sync + 'static,
    {
        self.state_factory = Some(Arc::new(factory));
        self
    }

    /// Validate and freeze the graph.
    ///
    /// Fails with [`RelayError::InvalidWorkflow`] on duplicate executor ids,
    /// edges naming unknown executors, duplicate edges, a missing or unknown
    /// start executor, a missing state factory, or a cycle.
    pub fn build(self) -> Result<Workflow<S>, RelayError> {
        let mut executors: HashMap<String, Arc<dyn Executor<S>>> = HashMap::new();
        for executor in self.executors {
            let id = executor.id().to_string();
            if executors.insert(id.clone(), executor).is_some() {
                return Err(invalid(format!("duplicate executor id '{id}'")));
            }
        }

        let mut edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut seen = HashSet::new();
        for (from, to) in self.edges {
            for id in [&from, &to] {
                if !executors.contains_key(id) {
                    return Err(invalid(format!("edge {from} -> {to} names unknown executor '{id}'")));
                }
            }
            if !seen.insert((from.clone(), to.clone())) {
                return Err(invalid(format!("duplicate edge {from} -> {to}")));
            }
            edges.entry(from).or_default().push(to);
        }

        let start = self.start.ok_or_else(|| invalid("no start executor set"))?;
        if !executors.contains_key(&start) {
            return Err(invalid(format!("start executor '{start}' is not registered")));
        }
        let state_factory = self
            .state_factory
            .ok_or_else(|| invalid("no state factory set"))?;

        check_acyclic(&executors, &edges)?;

        let reachable = reachable_from(&start, &edges);
        for id in executors.keys().filter(|id| !reachable.contains(*id)) {
            tracing::warn!(executor = %id, "executor is unreachable from the start executor");
        }

        Ok(Workflow::from_parts(executors, edges, start, state_factory))
    }
}

fn invalid(message: impl Into<String>) -> RelayError {
    RelayError::InvalidWorkflow(message.into())
}

/// Kahn's algorithm: every executor must be removable in topological order.
fn check_acyclic<S: Send>(
    executors: &HashMap<String, Arc<dyn Executor<S>>>,
    edges: &HashMap<String, Vec<String>>,
) -> Result<(), RelayError> {
    let mut in_degree: HashMap<&str, usize> = executors.keys().map(|id| (id.as_str(), 0)).collect();
    for targets in edges.values() {
        for to in targets {
            if let Some(d) = in_degree.get_mut(to.as_str()) {
                *d += 1;
            }
        }
    }

    let mut ready: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut visited = 0usize;

    while let Some(id) = ready.pop_front() {
        visited += 1;
        for to in edges.get(id).into_iter().flatten() {
            if let Some(d) = in_degree.get_mut(to.as_str()) {
                *d -= 1;
                if *d == 0 {
                    ready.push_back(to.as_str());
                }
            }
        }
    }

    if visited == executors.len() {
        Ok(())
    } else {
        Err(invalid("edges form a cycle"))
    }
}

fn reachable_from(start: &str, edges: &HashMap<String, Vec<String>>) -> HashSet<String> {
    let mut seen = HashSet::from([start.to_string()]);
    let mut queue = VecDeque::from([start.to_string()]);
    while let Some(id) = queue.pop_front() {
        for to in edges.get(&id).into_iter().flatten() {
            if seen.insert(to.clone()) {
                queue.push_back(to.clone());
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Next, WorkflowContext};
    use async_trait::async_trait;

    struct Step(&'static str);

    #[async_trait]
    impl Executor<Vec<String>> for Step {
        fn id(&self) -> &str {
            self.0
        }

        async fn handle(
            &self,
            state: &mut Vec<String>,
            _ctx: &mut WorkflowContext,
        ) -> Result<Next, RelayError> {
            state.push(self.0.to_string());
            Ok(Next::Continue)
        }
    }

    fn base() -> WorkflowBuilder<Vec<String>> {
        WorkflowBuilder::new()
            .add_executor(Step("a"))
            .add_executor(Step("b"))
            .set_start("a")
            .with_state(|_| Vec::new())
    }

    fn message(result: Result<Workflow<Vec<String>>, RelayError>) -> String {
        match result {
            Err(RelayError::InvalidWorkflow(message)) => message,
            Err(other) => panic!("expected InvalidWorkflow, got {other:?}"),
            Ok(_) => panic!("expected build to fail"),
        }
    }

    #[test]
    fn valid_chain_builds() {
        assert!(base().add_edge("a", "b").build().is_ok());
    }

    #[test]
    fn duplicate_executor_is_rejected() {
        assert!(message(base().add_executor(Step("a")).build()).contains("duplicate executor"));
    }

    #[test]
    fn edge_to_unknown_executor_is_rejected() {
        assert!(message(base().add_edge("a", "z").build()).contains("unknown executor 'z'"));
    }

    #[test]
    fn duplicate_edge_is_rejected() {
        let result = base().add_edge("a", "b").add_edge("a", "b").build();
        assert!(message(result).contains("duplicate edge"));
    }

    #[test]
    fn missing_start_is_rejected() {
        let result = WorkflowBuilder::new()
            .add_executor(Step("a"))
            .with_state(|_| Vec::new())
            .build();
        assert!(message(result).contains("start"));

        let unknown = base().set_start("z").build();
        assert!(message(unknown).contains("'z'"));
    }

    #[test]
    fn cycle_is_rejected() {
        let result = base().add_edge("a", "b").add_edge("b", "a").build();
        assert!(message(result).contains("cycle"));
    }
}
