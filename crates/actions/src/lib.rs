//! Action invocation for AgentForge.
//!
//! The invoker takes a validated action definition, typed inputs, and the
//! owning integration, renders the request templates, applies auth, and
//! dispatches over a pluggable HTTP transport. Auth values marked secret
//! (and the agent API key) are redacted from every error it produces.

pub mod invoker;
pub mod testcase;
pub mod transport;

pub use invoker::{ActionInvoker, InvocationOutcome};
pub use testcase::{InMemoryTestCaseSink, TestCase, TestCaseSink};
pub use transport::ReqwestTransport;

pub(crate) const API_KEY_PLACEHOLDER: &str = "{{API_KEY}}";
