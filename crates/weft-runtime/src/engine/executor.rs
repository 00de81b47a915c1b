//! Workflow execution engine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::config::{EngineConfig, ExecutionMode};
use super::context::{ResolvedInputs, RunContext};
use super::nodes::Executors;
use crate::TRACING_TARGET;
use crate::error::WorkflowError;
use crate::graph::{Node, WorkflowGraph};
use crate::run::{NodeResult, RunOutcome};

/// The workflow execution engine.
///
/// Validates the graph, walks nodes in dependency order, resolves each
/// node's inputs from upstream results, and aggregates per-node results
/// into a terminal run outcome. A single node's failure never aborts the
/// run; downstream nodes see absent inputs instead.
pub struct Engine {
    config: EngineConfig,
    executors: Arc<Executors>,
    semaphore: Arc<Semaphore>,
}

impl Engine {
    /// Creates a new engine with the given configuration and executors.
    pub fn new(config: EngineConfig, executors: Executors) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_runs));

        tracing::info!(
            target: TRACING_TARGET,
            max_concurrent_runs = config.max_concurrent_runs,
            node_timeout_secs = config.node_timeout.as_secs(),
            mode = ?config.mode,
            "Workflow engine initialized"
        );

        Self {
            config,
            executors: Arc::new(executors),
            semaphore,
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the number of available run slots.
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Executes a workflow graph to completion.
    ///
    /// Structural problems (a cycle) fail the run before any node executes;
    /// per-node failures are recorded in the results and the run still
    /// finishes as `SUCCESS`.
    pub async fn run(&self, graph: &WorkflowGraph) -> RunOutcome {
        let started = Instant::now();

        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return RunOutcome::failed(
                    "engine is shut down".to_string(),
                    Vec::new(),
                    elapsed_ms(started),
                );
            }
        };

        if let Err(err) = graph.validate() {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %err,
                "Workflow validation failed"
            );
            return RunOutcome::failed(err.to_string(), Vec::new(), elapsed_ms(started));
        }

        tracing::debug!(
            target: TRACING_TARGET,
            node_count = graph.node_count(),
            mode = ?self.config.mode,
            "Starting workflow run"
        );

        let outcome = match self.config.mode {
            ExecutionMode::Sequential => self.run_sequential(graph, started).await,
            ExecutionMode::Batched => self.run_batched(graph, started).await,
        };

        tracing::debug!(
            target: TRACING_TARGET,
            status = ?outcome.status,
            node_results = outcome.results.len(),
            duration_ms = outcome.duration,
            "Workflow run finished"
        );

        outcome
    }

    async fn run_sequential(&self, graph: &WorkflowGraph, started: Instant) -> RunOutcome {
        let mut ctx = RunContext::new();

        for node_id in graph.topological_order() {
            let Some(node) = graph.get_node(&node_id) else {
                continue;
            };
            let inputs = ctx.resolve_inputs(graph, &node_id);
            let result =
                execute_node(&self.executors, node, inputs, self.config.node_timeout).await;
            ctx.push(result);
        }

        RunOutcome::success(ctx.into_results(), elapsed_ms(started))
    }

    /// Batched-parallel mode: the nodes of one batch run concurrently, and
    /// the batch settles completely before the next one starts.
    async fn run_batched(&self, graph: &WorkflowGraph, started: Instant) -> RunOutcome {
        let batches = graph.parallel_batches();
        let covered: usize = batches.iter().map(Vec::len).sum();
        if covered < graph.node_count() {
            // An unbatchable remainder means a residual cycle.
            return RunOutcome::failed(
                WorkflowError::CyclicDependency.to_string(),
                Vec::new(),
                elapsed_ms(started),
            );
        }

        let mut ctx = RunContext::new();

        for batch in batches {
            let mut set: JoinSet<NodeResult> = JoinSet::new();

            for node_id in &batch {
                let Some(node) = graph.get_node(node_id) else {
                    continue;
                };
                let node = node.clone();
                let inputs = ctx.resolve_inputs(graph, node_id);
                let executors = Arc::clone(&self.executors);
                let timeout = self.config.node_timeout;
                set.spawn(async move { execute_node(&executors, &node, inputs, timeout).await });
            }

            let mut settled: Vec<NodeResult> = Vec::with_capacity(batch.len());
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(result) => settled.push(result),
                    Err(err) => {
                        // A panicked node task is an engine fault, not a
                        // node failure; keep what already settled for
                        // diagnosis.
                        for result in settled {
                            ctx.push(result);
                        }
                        return RunOutcome::failed(
                            format!("node task failed: {}", err),
                            ctx.into_results(),
                            elapsed_ms(started),
                        );
                    }
                }
            }

            // Store settled results in batch node order so the result list
            // stays deterministic regardless of completion order.
            for node_id in &batch {
                if let Some(pos) = settled.iter().position(|r| &r.node_id == node_id) {
                    ctx.push(settled.swap_remove(pos));
                }
            }
        }

        RunOutcome::success(ctx.into_results(), elapsed_ms(started))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("available_slots", &self.available_slots())
            .finish()
    }
}

/// Executes one node under the per-node wall-clock budget.
async fn execute_node(
    executors: &Executors,
    node: &Node,
    inputs: ResolvedInputs,
    timeout: Duration,
) -> NodeResult {
    let started = Instant::now();

    tracing::debug!(
        target: TRACING_TARGET,
        node_id = %node.id(),
        node_type = node.type_name(),
        "Executing node"
    );

    match tokio::time::timeout(timeout, executors.execute(node, &inputs)).await {
        Ok(Ok(output)) => NodeResult::success(node, output.into_value(), started.elapsed()),
        Ok(Err(err)) => {
            tracing::warn!(
                target: TRACING_TARGET,
                node_id = %node.id(),
                error = %err,
                "Node execution failed"
            );
            NodeResult::failure(node, err.to_string(), started.elapsed())
        }
        Err(_) => {
            tracing::warn!(
                target: TRACING_TARGET,
                node_id = %node.id(),
                timeout_ms = timeout.as_millis() as u64,
                "Node execution timed out"
            );
            NodeResult::failure(
                node,
                format!("node timed out after {}ms", timeout.as_millis()),
                started.elapsed(),
            )
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use weft_media::backend::MockMediaBackend;
    use weft_rig::provider::{MockBackend, MockConfig};
    use weft_rig::CompletionRouter;

    use super::*;
    use crate::engine::EngineConfigBuilder;
    use crate::graph::{Edge, NodeKind, SYSTEM_PROMPT_HANDLE};
    use crate::run::{NodeStatus, RunStatus};

    fn echo_router() -> (Arc<MockBackend>, CompletionRouter) {
        let mock = Arc::new(MockBackend::echo());
        let router = CompletionRouter::new().register(["mock-"], mock.clone());
        (mock, router)
    }

    fn engine(router: CompletionRouter, mode: ExecutionMode) -> Engine {
        let config = EngineConfigBuilder::default().mode(mode).build().unwrap();
        let executors = Executors::with_media_backend(router, Arc::new(MockMediaBackend::new()));
        Engine::new(config, executors)
    }

    #[tokio::test]
    async fn test_linear_pipeline() {
        let (_, router) = echo_router();
        let engine = engine(router, ExecutionMode::Sequential);

        let graph = WorkflowGraph::new(
            vec![
                Node::text("a", "hello"),
                Node::llm("b", "mock-model"),
                Node::output("c"),
            ],
            vec![Edge::new("a", "b"), Edge::new("b", "c")],
        );

        let outcome = engine.run(&graph).await;
        assert_eq!(outcome.status, RunStatus::Success);
        assert!(outcome.error.is_none());

        let ids: Vec<&str> = outcome.results.iter().map(|r| r.node_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);

        assert_eq!(outcome.results[0].output, Some(json!({"text": "hello"})));
        assert_eq!(
            outcome.results[1].output,
            Some(json!({"response": "hello"}))
        );
        // The output node passes its upstream output through unchanged.
        assert_eq!(outcome.results[2].output, outcome.results[1].output);
    }

    #[tokio::test]
    async fn test_fan_in_merges_texts_in_edge_order() {
        let (mock, router) = echo_router();
        let engine = engine(router, ExecutionMode::Sequential);

        let graph = WorkflowGraph::new(
            vec![
                Node::text("a1", "foo"),
                Node::text("a2", "bar"),
                Node::llm("b", "mock-model"),
            ],
            vec![Edge::new("a1", "b"), Edge::new("a2", "b")],
        );

        let outcome = engine.run(&graph).await;
        assert_eq!(outcome.status, RunStatus::Success);
        assert_eq!(
            outcome.results[2].output,
            Some(json!({"response": "foo\nbar"}))
        );

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_message, "foo\nbar");
    }

    #[tokio::test]
    async fn test_system_prompt_handle_reaches_provider() {
        let (mock, router) = echo_router();
        let engine = engine(router, ExecutionMode::Sequential);

        let graph = WorkflowGraph::new(
            vec![Node::text("s", "Be terse."), Node::llm("b", "mock-model")],
            vec![Edge::new("s", "b").with_target_handle(SYSTEM_PROMPT_HANDLE)],
        );

        let outcome = engine.run(&graph).await;
        assert_eq!(outcome.status, RunStatus::Success);

        let requests = mock.requests();
        assert_eq!(requests[0].system_prompt.as_deref(), Some("Be terse."));
        // No default-handle text inputs: the configured fallback applies.
        assert_eq!(requests[0].user_message, "No input provided");
    }

    #[tokio::test]
    async fn test_node_failure_is_isolated() {
        let (_, router) = echo_router();
        let engine = engine(router, ExecutionMode::Sequential);

        // "bogus-model" matches no routing rule, so the LLM node fails.
        let graph = WorkflowGraph::new(
            vec![
                Node::text("a", "hello"),
                Node::llm("b", "bogus-model"),
                Node::output("c"),
            ],
            vec![Edge::new("a", "b"), Edge::new("b", "c")],
        );

        let outcome = engine.run(&graph).await;
        assert_eq!(outcome.status, RunStatus::Success);
        assert_eq!(outcome.results.len(), 3);

        assert_eq!(outcome.results[1].status, NodeStatus::Failed);
        assert!(
            outcome.results[1]
                .error
                .as_deref()
                .unwrap()
                .contains("bogus-model")
        );

        // The downstream output node still ran, with an absent input.
        assert_eq!(outcome.results[2].status, NodeStatus::Success);
        assert_eq!(outcome.results[2].output, Some(json!({})));
    }

    #[tokio::test]
    async fn test_cycle_fails_run_without_results() {
        let (_, router) = echo_router();
        let engine = engine(router, ExecutionMode::Sequential);

        let graph = WorkflowGraph::new(
            vec![Node::text("a", "x"), Node::text("b", "y")],
            vec![Edge::new("a", "b"), Edge::new("b", "a")],
        );

        let outcome = engine.run(&graph).await;
        assert_eq!(outcome.status, RunStatus::Failed);
        assert!(outcome.results.is_empty());
        assert!(
            outcome
                .error
                .as_deref()
                .unwrap()
                .contains("circular dependencies")
        );
    }

    #[tokio::test]
    async fn test_unknown_node_type_passes_data_through() {
        let (_, router) = echo_router();
        let engine = engine(router, ExecutionMode::Sequential);

        let node: Node = serde_json::from_value(json!({
            "id": "w-1",
            "type": "webhookNode",
            "data": {"endpoint": "https://example.com"}
        }))
        .unwrap();
        let graph = WorkflowGraph::new(vec![node], vec![]);

        let outcome = engine.run(&graph).await;
        assert_eq!(outcome.status, RunStatus::Success);
        assert_eq!(outcome.results[0].node_type, "webhookNode");
        assert_eq!(
            outcome.results[0].output,
            Some(json!({"endpoint": "https://example.com"}))
        );
    }

    #[tokio::test]
    async fn test_batched_mode_matches_sequential_results() {
        let diamond = || {
            WorkflowGraph::new(
                vec![
                    Node::text("a", "seed"),
                    Node::llm("b", "mock-model"),
                    Node::llm("c", "mock-model"),
                    Node::new("d", NodeKind::Merge(Default::default())),
                ],
                vec![
                    Edge::new("a", "b"),
                    Edge::new("a", "c"),
                    Edge::new("b", "d"),
                    Edge::new("c", "d"),
                ],
            )
        };

        let (_, router) = echo_router();
        let sequential = engine(router, ExecutionMode::Sequential)
            .run(&diamond())
            .await;

        let (_, router) = echo_router();
        let batched = engine(router, ExecutionMode::Batched).run(&diamond()).await;

        assert_eq!(batched.status, RunStatus::Success);
        assert_eq!(batched.results.len(), 4);

        let sequential_ids: Vec<&str> =
            sequential.results.iter().map(|r| r.node_id.as_str()).collect();
        let batched_ids: Vec<&str> =
            batched.results.iter().map(|r| r.node_id.as_str()).collect();
        assert_eq!(sequential_ids, batched_ids);

        for (s, b) in sequential.results.iter().zip(batched.results.iter()) {
            assert_eq!(s.output, b.output, "outputs differ for {}", s.node_id);
        }

        // Both siblings fed the merge node.
        let merged = batched.results[3].output.as_ref().unwrap();
        assert_eq!(merged["merged"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_batched_mode_rejects_cycles() {
        let (_, router) = echo_router();
        let engine = engine(router, ExecutionMode::Batched);

        let graph = WorkflowGraph::new(
            vec![Node::text("a", "x"), Node::text("b", "y")],
            vec![Edge::new("a", "b"), Edge::new("b", "a")],
        );

        let outcome = engine.run(&graph).await;
        assert_eq!(outcome.status, RunStatus::Failed);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_slow_node_times_out_as_failure() {
        let slow = Arc::new(MockBackend::new(MockConfig {
            latency: Some(Duration::from_secs(5)),
            ..Default::default()
        }));
        let router = CompletionRouter::new().register(["mock-"], slow);

        let config = EngineConfigBuilder::default()
            .node_timeout(Duration::from_millis(20))
            .build()
            .unwrap();
        let executors =
            Executors::with_media_backend(router, Arc::new(MockMediaBackend::new()));
        let engine = Engine::new(config, executors);

        let graph = WorkflowGraph::new(vec![Node::llm("b", "mock-model")], vec![]);

        let outcome = engine.run(&graph).await;
        assert_eq!(outcome.status, RunStatus::Success);
        assert_eq!(outcome.results[0].status, NodeStatus::Failed);
        assert!(
            outcome.results[0]
                .error
                .as_deref()
                .unwrap()
                .contains("timed out")
        );
    }

    #[tokio::test]
    async fn test_empty_graph_succeeds_with_no_results() {
        let (_, router) = echo_router();
        let engine = engine(router, ExecutionMode::Sequential);

        let outcome = engine.run(&WorkflowGraph::new(vec![], vec![])).await;
        assert_eq!(outcome.status, RunStatus::Success);
        assert!(outcome.results.is_empty());
    }
}
