//! Executor: runs tools against the host API strictly one at a time
//! (§4.2.2, invariant 5 in §8).

use chrono::Utc;
use tokio::sync::{mpsc, watch};

use crate::circuit::CircuitBreaker;
use crate::config::ExecutorConfig;
use crate::errors::ToolError;
use crate::health::ActorHealth;
use crate::tools::ToolRegistry;
use relay_protocol::{QueuedRequest, ResponseEnvelope, ResultBundle};

pub struct Executor {
    config: ExecutorConfig,
    registry: ToolRegistry,
    requests_rx: mpsc::UnboundedReceiver<QueuedRequest>,
    responses_tx: mpsc::UnboundedSender<ResponseEnvelope>,
    health_tx: watch::Sender<ActorHealth>,
}

impl Executor {
    pub fn new(
        config: ExecutorConfig,
        registry: ToolRegistry,
        requests_rx: mpsc::UnboundedReceiver<QueuedRequest>,
        responses_tx: mpsc::UnboundedSender<ResponseEnvelope>,
        health_tx: watch::Sender<ActorHealth>,
    ) -> Self {
        Self {
            config,
            registry,
            requests_rx,
            responses_tx,
            health_tx,
        }
    }

    fn record_progress(&self, is_error: bool) {
        self.health_tx.send_modify(|h| {
            h.alive = true;
            h.last_progress_at = Some(Utc::now().to_rfc3339());
            if is_error {
                h.error_count += 1;
            }
        });
    }

    pub async fn run(mut self, mut stop: watch::Receiver<bool>, mut circuit: CircuitBreaker) {
        loop {
            let request = tokio::select! {
                _ = stop.changed() => break,
                request = self.requests_rx.recv() => match request {
                    Some(r) => r,
                    None => break,
                },
            };

            let result = self.run_one(&request, &mut circuit).await;
            let envelope = ResponseEnvelope {
                code: request.code,
                id: request.id,
                result,
            };
            if self.responses_tx.send(envelope).is_err() {
                break;
            }
        }
        self.health_tx.send_modify(|h| h.alive = false);
    }

    /// Runs exactly one tool invocation, converting any failure into a
    /// human-readable text result rather than propagating an error — the
    /// Executor never reorders or retries; that's the Supervisor's concern.
    async fn run_one(&self, request: &QueuedRequest, circuit: &mut CircuitBreaker) -> ResultBundle {
        if !circuit.allow() {
            self.record_progress(true);
            return error_bundle(&ToolError::ExecutionError(
                "host API circuit is open".to_owned(),
            ));
        }

        let Some(tool) = self.registry.get(&request.tool) else {
            self.record_progress(true);
            return error_bundle(&ToolError::NotFound(request.tool.clone()));
        };

        if let Err(err) = tool.validate_args(&request.args) {
            self.record_progress(true);
            return error_bundle(&err);
        }

        let invocation = tool.invoke(&request.args);
        let outcome = tokio::time::timeout(self.config.invocation_timeout, invocation).await;

        match outcome {
            Ok(Ok(result)) => {
                circuit.record_success();
                self.record_progress(false);
                result
            }
            Ok(Err(err)) => {
                circuit.record_failure();
                self.record_progress(true);
                error_bundle(&err)
            }
            Err(_) => {
                circuit.record_failure();
                self.record_progress(true);
                error_bundle(&ToolError::Timeout)
            }
        }
    }
}

fn error_bundle(err: &ToolError) -> ResultBundle {
    ResultBundle::text(format!("{}: {err}", err.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::CircuitConfig;
    use crate::tools::EchoTool;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn config() -> ExecutorConfig {
        ExecutorConfig {
            invocation_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn unknown_tool_yields_tool_not_found() {
        let registry = ToolRegistry::new();
        let (_req_tx, req_rx) = mpsc::unbounded_channel();
        let (res_tx, _res_rx) = mpsc::unbounded_channel();
        let (health_tx, _health_rx) = watch::channel(crate::health::ActorHealth::default());
        let executor = Executor::new(config(), registry, req_rx, res_tx, health_tx);
        let mut circuit = CircuitBreaker::new(CircuitConfig::default());

        let request = QueuedRequest {
            code: "ABCDEFGH".to_owned(),
            id: "r1".to_owned(),
            tool: "nonexistent".to_owned(),
            args: BTreeMap::new(),
            enqueued_at: "now".to_owned(),
        };
        let result = executor.run_one(&request, &mut circuit).await;
        assert!(result.content[0].text.starts_with("tool_not_found"));
    }

    #[tokio::test]
    async fn invalid_args_yields_invalid_args_error() {
        let mut registry = ToolRegistry::new();
        registry.register("echo", Box::new(EchoTool));
        let (_req_tx, req_rx) = mpsc::unbounded_channel();
        let (res_tx, _res_rx) = mpsc::unbounded_channel();
        let (health_tx, _health_rx) = watch::channel(crate::health::ActorHealth::default());
        let executor = Executor::new(config(), registry, req_rx, res_tx, health_tx);
        let mut circuit = CircuitBreaker::new(CircuitConfig::default());

        let request = QueuedRequest {
            code: "ABCDEFGH".to_owned(),
            id: "r1".to_owned(),
            tool: "echo".to_owned(),
            args: BTreeMap::new(),
            enqueued_at: "now".to_owned(),
        };
        let result = executor.run_one(&request, &mut circuit).await;
        assert!(result.content[0].text.starts_with("invalid_args"));
    }

    #[tokio::test]
    async fn successful_invocation_round_trips_the_tool_result() {
        let mut registry = ToolRegistry::new();
        registry.register("echo", Box::new(EchoTool));
        let (_req_tx, req_rx) = mpsc::unbounded_channel();
        let (res_tx, _res_rx) = mpsc::unbounded_channel();
        let (health_tx, _health_rx) = watch::channel(crate::health::ActorHealth::default());
        let executor = Executor::new(config(), registry, req_rx, res_tx, health_tx);
        let mut circuit = CircuitBreaker::new(CircuitConfig::default());

        let mut args = BTreeMap::new();
        args.insert("text".to_owned(), serde_json::json!("hi"));
        let request = QueuedRequest {
            code: "ABCDEFGH".to_owned(),
            id: "r1".to_owned(),
            tool: "echo".to_owned(),
            args,
            enqueued_at: "now".to_owned(),
        };
        let result = executor.run_one(&request, &mut circuit).await;
        assert_eq!(result.content[0].text, "hi");
    }

    #[tokio::test]
    async fn open_circuit_short_circuits_without_invoking() {
        let mut registry = ToolRegistry::new();
        registry.register("echo", Box::new(EchoTool));
        let (_req_tx, req_rx) = mpsc::unbounded_channel();
        let (res_tx, _res_rx) = mpsc::unbounded_channel();
        let (health_tx, _health_rx) = watch::channel(crate::health::ActorHealth::default());
        let executor = Executor::new(config(), registry, req_rx, res_tx, health_tx);
        let mut circuit = CircuitBreaker::new(CircuitConfig {
            failure_threshold: 1,
            ..CircuitConfig::default()
        });
        circuit.record_failure();
        assert_eq!(circuit.state(), crate::circuit::CircuitState::Open);

        let mut args = BTreeMap::new();
        args.insert("text".to_owned(), serde_json::json!("hi"));
        let request = QueuedRequest {
            code: "ABCDEFGH".to_owned(),
            id: "r1".to_owned(),
            tool: "echo".to_owned(),
            args,
            enqueued_at: "now".to_owned(),
        };
        let result = executor.run_one(&request, &mut circuit).await;
        assert!(result.content[0].text.starts_with("execution_error"));
    }

    #[tokio::test]
    async fn successful_and_failed_invocations_both_update_health() {
        let mut registry = ToolRegistry::new();
        registry.register("echo", Box::new(EchoTool));
        let (_req_tx, req_rx) = mpsc::unbounded_channel();
        let (res_tx, _res_rx) = mpsc::unbounded_channel();
        let (health_tx, health_rx) = watch::channel(crate::health::ActorHealth::default());
        let executor = Executor::new(config(), registry, req_rx, res_tx, health_tx);
        let mut circuit = CircuitBreaker::new(CircuitConfig::default());

        assert!(health_rx.borrow().last_progress_at.is_none());

        let request = QueuedRequest {
            code: "ABCDEFGH".to_owned(),
            id: "r1".to_owned(),
            tool: "nonexistent".to_owned(),
            args: BTreeMap::new(),
            enqueued_at: "now".to_owned(),
        };
        executor.run_one(&request, &mut circuit).await;
        assert!(health_rx.borrow().last_progress_at.is_some());
        assert_eq!(health_rx.borrow().error_count, 1);

        let mut args = BTreeMap::new();
        args.insert("text".to_owned(), serde_json::json!("hi"));
        let request = QueuedRequest {
            code: "ABCDEFGH".to_owned(),
            id: "r2".to_owned(),
            tool: "echo".to_owned(),
            args,
            enqueued_at: "now".to_owned(),
        };
        executor.run_one(&request, &mut circuit).await;
        assert_eq!(health_rx.borrow().error_count, 1, "success must not bump error_count");
    }
}
