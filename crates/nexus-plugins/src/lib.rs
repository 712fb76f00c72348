//! # Nexus Plugins
//!
//! Hosts independently developed [`Bundle`]s and dispatches named operations
//! to them.
//!
//! A bundle declares [`Operation`]s: a name, a description, an argument
//! contract generated from a typed struct, and an async handler. The
//! [`PluginHost`] keeps an operation registry rebuilt on every load and
//! unload, validates raw JSON arguments against the contract before the
//! handler runs, and turns handler failures into [`HostError::OperationFailed`].
//!
//! ```rust,ignore
//! #[derive(Deserialize, JsonSchema)]
//! struct EchoArgs { text: String }
//!
//! let op = Operation::new("echo", "Echo text back", |args: EchoArgs| async move {
//!     Ok(ToolOutput::text(args.text))
//! });
//! ```

#![warn(clippy::all)]

mod bundle;
mod error;
mod host;
mod operation;

pub use bundle::{Bundle, ResourceInfo};
pub use error::{FieldViolation, HostError, HostResult};
pub use host::PluginHost;
pub use operation::{Content, Operation, OperationInfo, ToolOutput};
