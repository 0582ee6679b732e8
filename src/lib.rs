//! Strata: Local-First Layered Graph Store
//!
//! An in-memory graph database organized as named layers. Applications
//! mutate optimistically through a pure reducer, read through declarative
//! views folded over a layer stack, and reconcile drafts against a remote
//! push/pull API with per-item failure routing and concurrent file uploads.

pub mod config;
pub mod entity;
pub mod error;
pub mod graph;
pub mod logging;
pub mod merge;
pub mod remote;
pub mod store;
pub mod sync;
pub mod types;
pub mod view;

pub use entity::{combine, EntityValue, Overlay};
pub use error::{RemoteError, StoreError};
pub use graph::{
    ErrorGraph, FileDescriptor, Graph, Metadata, Node, Rejection, RightsBits, RightsRecord,
};
pub use store::{Action, FileBlob, GraphLayer, LayerMap, MergeSource, Store, UploadStatus};
pub use sync::{PushOutcome, SyncCoordinator, UploadEvent, UploadEventKind, UploadSession};
pub use types::{EdgeKind, LayerName, NodeId};
pub use view::{filter_graph, pick_graph, select_view, NodeBag, QueryNode, View, ViewResult};
