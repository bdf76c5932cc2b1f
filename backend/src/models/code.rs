//! Module code hooks
//!
//! A module may carry one hook that the project runs at a phase boundary. The
//! hook is either a Rust function or user-authored source text. Source text is
//! handed to a [`ScriptHost`] registered on the project; the framework itself
//! never interprets it.

use crate::scene::SceneBackend;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use super::fields::get_str;

/// Phase boundary at which a hook runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeOrder {
    PreProxy,
    PostProxy,
    PreSkeleton,
    PostSkeleton,
    PreControlRig,
    PostControlRig,
    PostBuild,
}

impl CodeOrder {
    pub const ALL: [CodeOrder; 7] = [
        CodeOrder::PreProxy,
        CodeOrder::PostProxy,
        CodeOrder::PreSkeleton,
        CodeOrder::PostSkeleton,
        CodeOrder::PreControlRig,
        CodeOrder::PostControlRig,
        CodeOrder::PostBuild,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeOrder::PreProxy => "pre_proxy",
            CodeOrder::PostProxy => "post_proxy",
            CodeOrder::PreSkeleton => "pre_skeleton",
            CodeOrder::PostSkeleton => "post_skeleton",
            CodeOrder::PreControlRig => "pre_control_rig",
            CodeOrder::PostControlRig => "post_control_rig",
            CodeOrder::PostBuild => "post_build",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|order| order.as_str() == value)
    }
}

/// What a hook sees while it runs
pub struct HookContext<'a> {
    pub scene: &'a mut dyn SceneBackend,
    pub module_name: &'a str,
    pub module_uuid: &'a str,
    pub order: CodeOrder,
}

/// Signature of a compiled hook
pub type HookFn = fn(&mut HookContext<'_>) -> Result<(), String>;

/// Interpreter for source-text hooks
pub trait ScriptHost {
    fn run(&mut self, source: &str, context: &mut HookContext<'_>) -> Result<(), String>;
}

#[derive(Debug, Clone)]
pub enum CodePayload {
    Callable(HookFn),
    SourceText(String),
}

/// Hook attached to a module
#[derive(Debug, Clone)]
pub struct CodeHook {
    pub order: CodeOrder,
    pub payload: CodePayload,
}

impl CodeHook {
    pub fn callable(order: CodeOrder, hook: HookFn) -> Self {
        Self {
            order,
            payload: CodePayload::Callable(hook),
        }
    }

    pub fn source(order: CodeOrder, source: impl Into<String>) -> Self {
        Self {
            order,
            payload: CodePayload::SourceText(source.into()),
        }
    }

    /// Run the hook
    ///
    /// # Returns
    /// `Ok(true)` if the hook ran, `Ok(false)` if source text had no host
    pub fn execute(
        &self,
        context: &mut HookContext<'_>,
        host: Option<&mut (dyn ScriptHost + '_)>,
    ) -> Result<bool, String> {
        match (&self.payload, host) {
            (CodePayload::Callable(hook), _) => hook(context).map(|_| true),
            (CodePayload::SourceText(source), Some(host)) => host.run(source, context).map(|_| true),
            (CodePayload::SourceText(_), None) => {
                warn!(
                    module = context.module_name,
                    order = self.order.as_str(),
                    "no script host registered, source hook skipped"
                );
                Ok(false)
            }
        }
    }

    /// Persisted form; compiled hooks cannot be persisted
    pub fn to_dict(&self) -> Option<Value> {
        match &self.payload {
            CodePayload::SourceText(source) => Some(json!({
                "order": self.order.as_str(),
                "source": source,
            })),
            CodePayload::Callable(_) => {
                warn!(order = self.order.as_str(), "compiled hook is not serializable, dropped");
                None
            }
        }
    }

    pub fn from_dict(dict: &Map<String, Value>) -> Option<Self> {
        let order = get_str(dict, "order", "code")?;
        let Some(order) = CodeOrder::parse(order) else {
            warn!(order, "unknown hook order, hook ignored");
            return None;
        };
        let source = get_str(dict, "source", "code")?;
        Some(Self::source(order, source))
    }
}
