//! Domain models for the rig framework

pub mod code;
pub(crate) mod fields;
pub mod graph;
pub mod module;
pub mod orientation;
pub mod proxy;

// Re-exports
pub use code::{CodeHook, CodeOrder, CodePayload, HookContext, HookFn, ScriptHost};
pub use graph::ProxyGraph;
pub use module::{find_joint, ControlData, ModuleCore, ProjectEnv};
pub use orientation::{OrientationData, OrientationMethod};
pub use proxy::{Proxy, ProxyData};
