//! Request routing and the standard handlers.
//!
//! The router maps `(method, path)` to a [`Handler`]. Handlers run on the
//! coordinator with exclusive access to host state through a
//! [`HandlerContext`] and answer with a [`ResultEnvelope`], or a
//! [`BridgeError`] the coordinator turns into one.
//!
//! ## Routes
//!
//! Every standard route lives under [`BASE_PATH`]:
//!
//! ```text
//! GET  /unity/health                  POST /unity/scene/create
//! GET  /unity/status                  POST /unity/scene/find
//! GET  /unity/log                     POST /unity/scene/find_and_modify
//! POST /unity/log/reset               POST /unity/scene/delete
//! GET  /unity/scene/info              POST /unity/scene/modify
//! GET  /unity/scene/hierarchy         POST /unity/component/{add,remove,modify}
//! GET  /unity/scene/object/<ref>      POST /unity/{light,material,audio}/modify
//! GET  /unity/tag/list                POST /unity/tag/{create,assign}
//! POST /unity/layer/assign            POST /unity/editor/{play,stop,pause,step,wait}
//! POST /unity/command                 GET  /unity/command?q=<line>
//! ```
//!
//! [`ResultEnvelope`]: crate::wire::ResultEnvelope

mod body;
mod context;
mod errors;
mod handlers;
mod read_options;
mod router;
pub mod view;

pub use self::context::{BridgeSettings, HandlerContext};
pub use self::errors::BridgeError;
pub use self::read_options::{OutputFormat, ReadOptions, parse_select};
pub use self::router::{BASE_PATH, Handler, RoutePattern, RouteRequest, Router};

