//! Flow engine: drives a context through a flow definition.
//!
//! The engine owns a read-only registry of flow definitions and a context
//! store. It executes nodes in sequence, suspends on indeterminate
//! outcomes, and re-enters suspended executions at their recorded node.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::FlowContext;
use super::definition::{FlowDefinition, NodeDef, NodeKind, Transition};
use super::error::FlowError;
use super::store::ContextStore;

pub struct FlowEngine<C: FlowContext> {
    flows: HashMap<&'static str, Arc<FlowDefinition<C>>>,
    store: Arc<dyn ContextStore<C>>,
}

impl<C: FlowContext> FlowEngine<C> {
    pub fn new(store: Arc<dyn ContextStore<C>>) -> Self {
        Self {
            flows: HashMap::new(),
            store,
        }
    }

    /// Register a flow definition. The registry is built at startup and
    /// read-only afterwards; registration is not thread-safe by design.
    pub fn register(&mut self, flow: FlowDefinition<C>) {
        debug!(flow = flow.name(), "flow registered");
        self.flows.insert(flow.name(), Arc::new(flow));
    }

    pub fn store(&self) -> &Arc<dyn ContextStore<C>> {
        &self.store
    }

    fn flow(&self, name: &str) -> Result<&Arc<FlowDefinition<C>>, FlowError> {
        self.flows
            .get(name)
            .ok_or_else(|| FlowError::FlowNotFound(name.to_string()))
    }

    /// Run a fresh execution from the flow's declared start node.
    ///
    /// Returns the context once it reaches a terminal node or suspends;
    /// suspension is not an error. Terminal contexts come back untouched.
    pub async fn execute(&self, flow_name: &str, ctx: C) -> Result<C, FlowError> {
        let flow = self.flow(flow_name)?;
        if ctx.finished() {
            debug!(
                flow = flow_name,
                biz_no = ctx.biz_no(),
                "context already terminal, nothing to do"
            );
            return Ok(ctx);
        }
        self.run(flow, ctx, flow.start_node()).await
    }

    /// Re-enter a previously suspended execution at `resume_at`.
    ///
    /// The target must exist in the flow and match the suspension point the
    /// store recorded for this instance; anything else is an
    /// invalid-resume defect.
    pub async fn resume(&self, flow_name: &str, ctx: C, resume_at: &str) -> Result<C, FlowError> {
        let flow = self.flow(flow_name)?;
        if ctx.finished() {
            debug!(
                flow = flow_name,
                biz_no = ctx.biz_no(),
                "context already terminal, nothing to do"
            );
            return Ok(ctx);
        }
        if !flow.contains(resume_at) {
            return Err(FlowError::NodeNotFound {
                flow: flow_name.to_string(),
                node: resume_at.to_string(),
            });
        }

        let invalid = |reason: String| FlowError::InvalidResumeTarget {
            flow: flow_name.to_string(),
            node: resume_at.to_string(),
            reason,
        };
        let recorded = self
            .store
            .load(ctx.biz_no())
            .await?
            .and_then(|stored| stored.resume_at);
        match recorded.as_deref() {
            Some(node) if node == resume_at => {}
            Some(node) => return Err(invalid(format!("instance is suspended at `{node}`"))),
            None => return Err(invalid("instance has no recorded suspension".to_string())),
        }

        info!(
            flow = flow_name,
            node = resume_at,
            biz_no = ctx.biz_no(),
            "resuming suspended execution"
        );
        self.run(flow, ctx, resume_at).await
    }

    async fn run(
        &self,
        flow: &Arc<FlowDefinition<C>>,
        mut ctx: C,
        entry: &str,
    ) -> Result<C, FlowError> {
        let mut current: &str = entry;
        let mut at_entry = true;

        loop {
            let node = flow.node(current).ok_or_else(|| FlowError::NodeNotFound {
                flow: flow.name().to_string(),
                node: current.to_string(),
            })?;

            let (kind, processor, transition) = match node {
                NodeDef::End { action } => {
                    action(&mut ctx);
                    self.store.save(&ctx, None).await?;
                    info!(
                        flow = flow.name(),
                        node = current,
                        biz_no = ctx.biz_no(),
                        "flow reached end node"
                    );
                    return Ok(ctx);
                }
                NodeDef::Step {
                    kind,
                    processor,
                    transition,
                } => (*kind, processor, transition),
            };

            // Wait nodes never auto-chain: suspend unless this node is the
            // entry of the current execution.
            if kind == NodeKind::Wait && !at_entry {
                self.store.save(&ctx, Some(current)).await?;
                info!(
                    flow = flow.name(),
                    node = current,
                    biz_no = ctx.biz_no(),
                    "wait node reached mid-flow, suspending"
                );
                return Ok(ctx);
            }

            // Durability boundary: snapshot before the remote call, so a
            // crash re-runs this node and nothing earlier.
            self.store.save(&ctx, Some(current)).await?;

            let status = processor.execute(&mut ctx).await?;
            debug!(
                flow = flow.name(),
                node = current,
                processor = processor.name(),
                status = %status,
                biz_no = ctx.biz_no(),
                "step processed"
            );

            let next = (transition)(status, &mut ctx).ok_or_else(|| {
                FlowError::IllegalProcessorOutput {
                    flow: flow.name().to_string(),
                    node: current.to_string(),
                    status,
                }
            })?;

            match next {
                Transition::Suspend => {
                    self.store.save(&ctx, Some(current)).await?;
                    info!(
                        flow = flow.name(),
                        node = current,
                        biz_no = ctx.biz_no(),
                        "flow suspended, waiting for external trigger"
                    );
                    return Ok(ctx);
                }
                Transition::Goto(next_node) => {
                    // Commit this node's outcome: a resume never re-runs it.
                    self.store.save(&ctx, Some(next_node)).await?;
                    current = next_node;
                    at_entry = false;
                }
            }
        }
    }
}
