//! Ordered traversal of one syntax tree against the check registry.
//!
//! The walk is depth-first pre-order with an explicit stack. A check that
//! errors or panics is disabled for the rest of the file and its findings
//! for that file are dropped; the traversal itself always continues.

use crate::cancel::CancellationToken;
use crate::checks::{CheckContext, CheckDescriptor, CheckRegistry};
use crate::context::{ContextFrame, NodeContext};
use crate::models::Finding;
use crate::tree::{NodeId, NodeRef, SyntaxTree};
use std::any::Any;
use std::cell::Cell;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use tracing::{debug, warn};

thread_local! {
    static IN_CHECK: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Silence the panic hook for panics raised inside a check; they are
/// reported through `tracing` instead. Other panics reach the previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !IN_CHECK.with(|c| c.get()) {
                previous(info);
            }
        }));
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultedCheck {
    pub check_id: String,
    pub message: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum WalkOutcome {
    Completed { faults: Vec<FaultedCheck> },
    /// Cancellation was observed; findings gathered so far are incomplete.
    Interrupted,
}

enum Step {
    Enter(NodeId),
    Leave,
}

pub struct TreeWalker<'r> {
    registry: &'r CheckRegistry,
    cancel: &'r CancellationToken,
}

impl<'r> TreeWalker<'r> {
    pub fn new(registry: &'r CheckRegistry, cancel: &'r CancellationToken) -> Self {
        install_quiet_hook();
        Self { registry, cancel }
    }

    /// Walk `tree`, appending findings to `sink` in traversal order.
    ///
    /// Entries already in `sink` are never touched.
    pub fn walk(&self, tree: &SyntaxTree, file: &str, sink: &mut Vec<Finding>) -> WalkOutcome {
        let file_start = sink.len();
        let mut scope = NodeContext::new();
        let mut disabled: HashSet<&'r str> = HashSet::new();
        let mut faults: Vec<FaultedCheck> = Vec::new();
        let mut stack = vec![Step::Enter(tree.root().id())];

        while let Some(step) = stack.pop() {
            let id = match step {
                Step::Leave => {
                    scope.pop();
                    continue;
                }
                Step::Enter(id) => id,
            };
            if self.cancel.is_cancelled() {
                debug!(file, node = id, "walk interrupted");
                return WalkOutcome::Interrupted;
            }
            let node = tree.node(id);
            if let Some(s) = node.scope() {
                scope.push(ContextFrame {
                    kind: s.kind,
                    name: s.name.clone(),
                    node: id,
                });
                stack.push(Step::Leave);
            }
            let mut state = FileState {
                disabled: &mut disabled,
                faults: &mut faults,
                sink: &mut *sink,
                file_start,
            };
            let skip = self.visit_node(node, file, &scope, &mut state);
            if !skip {
                stack.extend(tree.children_of(id).iter().rev().map(|&c| Step::Enter(c)));
            }
        }
        WalkOutcome::Completed { faults }
    }

    /// Run every subscriber on `node`; returns whether children are skipped.
    fn visit_node(
        &self,
        node: NodeRef<'_>,
        file: &str,
        scope: &NodeContext,
        state: &mut FileState<'_, 'r>,
    ) -> bool {
        let mut skip = false;
        for desc in self.registry.subscribers_for(node.kind()) {
            if state.disabled.contains(desc.id.as_str()) {
                continue;
            }
            match invoke(desc, node, file, scope) {
                Ok(visit) => {
                    state.sink.extend(visit.findings);
                    skip |= visit.skip_children;
                }
                Err(message) => {
                    warn!(
                        file,
                        check = %desc.id,
                        line = node.start().line,
                        "check failed, skipping it for the rest of this file: {}",
                        message
                    );
                    state.disabled.insert(desc.id.as_str());
                    state.drop_findings_of(&desc.id);
                    state.faults.push(FaultedCheck {
                        check_id: desc.id.clone(),
                        message,
                    });
                }
            }
        }
        skip
    }
}

/// Mutable per-file bookkeeping shared by the node visits of one walk.
struct FileState<'a, 'r> {
    disabled: &'a mut HashSet<&'r str>,
    faults: &'a mut Vec<FaultedCheck>,
    sink: &'a mut Vec<Finding>,
    file_start: usize,
}

impl FileState<'_, '_> {
    /// A faulted check contributes nothing to the current file.
    fn drop_findings_of(&mut self, check_id: &str) {
        let file_start = self.file_start;
        let mut index = 0;
        self.sink.retain(|f| {
            let keep = index < file_start || f.check_id() != check_id;
            index += 1;
            keep
        });
    }
}

fn invoke(
    desc: &CheckDescriptor,
    node: NodeRef<'_>,
    file: &str,
    scope: &NodeContext,
) -> Result<crate::checks::Visit, String> {
    let ctx = CheckContext::new(file, &desc.id, scope);
    IN_CHECK.with(|c| c.set(true));
    let result = panic::catch_unwind(AssertUnwindSafe(|| desc.check.visit(node, &ctx)));
    IN_CHECK.with(|c| c.set(false));
    match result {
        Ok(Ok(visit)) => Ok(visit),
        Ok(Err(fault)) => Err(fault.message),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
