//! I/O shell for the girder client: the reconnecting gateway link, the
//! stale-safe content loader, the file-store REST client, durable task
//! storage, and the controller that ties them to the session core.

mod config;
mod controller;
mod files;
mod link;
mod loader;
mod storage;

pub use config::ClientConfig;
pub use controller::{ControllerError, SessionController};
pub use files::{sort_items, ConfigApi, WorkspaceApi, WorkspaceError};
pub use link::{CommandSink, LinkError, LinkNotice, LinkStatus, TransportLink};
pub use loader::{ContentLoader, ContentView, FetchOutcome, LoadTicket, ResourceRef};
pub use storage::TaskArchive;
