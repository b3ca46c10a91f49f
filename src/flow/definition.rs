//! Flow definitions: immutable node graphs with declarative transitions.
//!
//! A definition is a statically constructed table mapping node name to
//! `{processor, transition rule}`, built once at startup and read-only
//! thereafter. No reflection, no runtime wiring.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::FlowContext;
use super::error::FlowError;
use super::processor::{ResultStatus, StepProcessor};

/// Where an execution goes after a node's transition rule is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Continue to the named node.
    Goto(&'static str),
    /// Park the execution; an external trigger resumes it later.
    Suspend,
}

/// Transition rule of a single node.
///
/// The mapping is total over the statuses the node declares; `None` marks a
/// status outside that domain, which the engine raises as an illegal
/// processor output.
pub type TransitionFn<C> = fn(ResultStatus, &mut C) -> Option<Transition>;

/// Terminal action of an end node: stamps the context's final status.
pub type EndAction<C> = fn(&mut C);

/// Node kind within a flow definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The only node eligible to run as the very first node of an
    /// execution.
    Start,
    /// Mid-flow node, reachable via a transition.
    Phase,
    /// Does not auto-chain from a predecessor: the engine suspends when it
    /// reaches a wait node mid-flow, and runs it only as the entry node of
    /// an execution (i.e. as a resumption target).
    Wait,
    /// Terminal sink; no processor, no remote call.
    End,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::Phase => "phase",
            NodeKind::Wait => "wait",
            NodeKind::End => "end",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub(crate) enum NodeDef<C: FlowContext> {
    Step {
        kind: NodeKind,
        processor: Arc<dyn StepProcessor<C>>,
        transition: TransitionFn<C>,
    },
    End {
        action: EndAction<C>,
    },
}

impl<C: FlowContext> NodeDef<C> {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            NodeDef::Step { kind, .. } => *kind,
            NodeDef::End { .. } => NodeKind::End,
        }
    }
}

/// A named, immutable flow graph.
pub struct FlowDefinition<C: FlowContext> {
    name: &'static str,
    start: &'static str,
    nodes: HashMap<&'static str, NodeDef<C>>,
}

impl<C: FlowContext> fmt::Debug for FlowDefinition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowDefinition")
            .field("name", &self.name)
            .field("start", &self.start)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<C: FlowContext> FlowDefinition<C> {
    pub fn builder(name: &'static str) -> FlowBuilder<C> {
        FlowBuilder {
            name,
            start: None,
            extra_start: None,
            duplicate: None,
            nodes: HashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declared entry node of a fresh execution.
    pub fn start_node(&self) -> &'static str {
        self.start
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.contains_key(node)
    }

    pub(crate) fn node(&self, name: &str) -> Option<&NodeDef<C>> {
        self.nodes.get(name)
    }
}

/// Builder for [`FlowDefinition`]; validation happens in [`build`].
///
/// [`build`]: FlowBuilder::build
pub struct FlowBuilder<C: FlowContext> {
    name: &'static str,
    start: Option<&'static str>,
    extra_start: Option<&'static str>,
    duplicate: Option<&'static str>,
    nodes: HashMap<&'static str, NodeDef<C>>,
}

impl<C: FlowContext> FlowBuilder<C> {
    pub fn start(
        mut self,
        name: &'static str,
        processor: Arc<dyn StepProcessor<C>>,
        transition: TransitionFn<C>,
    ) -> Self {
        if self.start.is_some() {
            self.extra_start = Some(name);
        }
        self.start = self.start.or(Some(name));
        self.insert(name, NodeDef::Step {
            kind: NodeKind::Start,
            processor,
            transition,
        })
    }

    pub fn phase(
        self,
        name: &'static str,
        processor: Arc<dyn StepProcessor<C>>,
        transition: TransitionFn<C>,
    ) -> Self {
        self.insert(name, NodeDef::Step {
            kind: NodeKind::Phase,
            processor,
            transition,
        })
    }

    pub fn wait(
        self,
        name: &'static str,
        processor: Arc<dyn StepProcessor<C>>,
        transition: TransitionFn<C>,
    ) -> Self {
        self.insert(name, NodeDef::Step {
            kind: NodeKind::Wait,
            processor,
            transition,
        })
    }

    pub fn end(self, name: &'static str, action: EndAction<C>) -> Self {
        self.insert(name, NodeDef::End { action })
    }

    fn insert(mut self, name: &'static str, def: NodeDef<C>) -> Self {
        if self.nodes.insert(name, def).is_some() {
            self.duplicate = Some(name);
        }
        self
    }

    pub fn build(self) -> Result<FlowDefinition<C>, FlowError> {
        let invalid = |reason: String| FlowError::InvalidDefinition {
            flow: self.name.to_string(),
            reason,
        };

        if let Some(name) = self.duplicate {
            return Err(invalid(format!("duplicate node `{name}`")));
        }
        if let Some(name) = self.extra_start {
            return Err(invalid(format!("second start node `{name}`")));
        }
        let start = self
            .start
            .ok_or_else(|| invalid("no start node declared".to_string()))?;

        Ok(FlowDefinition {
            name: self.name,
            start,
            nodes: self.nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::error::FlowError;

    #[derive(Debug, Clone)]
    struct Ctx {
        biz_no: String,
        done: bool,
    }

    impl FlowContext for Ctx {
        fn biz_no(&self) -> &str {
            &self.biz_no
        }
        fn finished(&self) -> bool {
            self.done
        }
    }

    struct Noop;

    #[async_trait::async_trait]
    impl StepProcessor<Ctx> for Noop {
        fn name(&self) -> &'static str {
            "noop"
        }
        async fn execute(&self, _ctx: &mut Ctx) -> Result<ResultStatus, FlowError> {
            Ok(ResultStatus::Success)
        }
    }

    fn always_end(_status: ResultStatus, _ctx: &mut Ctx) -> Option<Transition> {
        Some(Transition::Goto("done"))
    }

    #[test]
    fn test_build_valid_flow() {
        let flow = FlowDefinition::builder("demo")
            .start("first", Arc::new(Noop), always_end)
            .end("done", |ctx| ctx.done = true)
            .build()
            .unwrap();

        assert_eq!(flow.name(), "demo");
        assert_eq!(flow.start_node(), "first");
        assert!(flow.contains("first"));
        assert!(flow.contains("done"));
        assert!(!flow.contains("missing"));
        assert_eq!(flow.node("done").unwrap().kind(), NodeKind::End);
    }

    #[test]
    fn test_build_rejects_missing_start() {
        let err = FlowDefinition::<Ctx>::builder("demo")
            .end("done", |ctx| ctx.done = true)
            .build()
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidDefinition { .. }));
    }

    #[test]
    fn test_build_rejects_duplicate_node() {
        let err = FlowDefinition::builder("demo")
            .start("first", Arc::new(Noop), always_end)
            .phase("first", Arc::new(Noop), always_end)
            .build()
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidDefinition { .. }));
    }

    #[test]
    fn test_build_rejects_second_start() {
        let err = FlowDefinition::builder("demo")
            .start("first", Arc::new(Noop), always_end)
            .start("second", Arc::new(Noop), always_end)
            .build()
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidDefinition { .. }));
    }
}
