//! Core of the KV Fitness gym console.
//!
//! Members and supplement sales live in a shared key-value graph that several
//! consoles replicate. A [`Console`] keeps a local replica of that graph,
//! reconciles change notifications into it and runs the domain operations
//! (registration, edits, deletion, supplement sales) on top of it.
//!
//! ```text
//! operator -> Console ops -> GraphStore::put -> notifications -> reconcile -> local state -> report
//! ```

pub use error::EngineError;
pub use ids::Counter;
pub use members::{Gender, Member, MemberNew};
pub use money::Money;
pub use notification::{Notification, Outcome, Severity};
pub use ops::{Console, ConsoleBuilder};
pub use plans::{MembershipPlan, PaymentStatus};
pub use reconcile::{Change, CounterAction, CounterSlot, Keyed, Records};
pub use report::{ReportStats, aggregate};
pub use store::{
    Collection, GraphStore, Link, MemoryStore, SqliteStore, StoreEvent, Version, link,
};
pub use supplements::{Supplement, SupplementNew};

mod error;
pub mod ids;
mod members;
mod money;
mod notification;
mod ops;
mod plans;
pub mod reconcile;
pub mod report;
pub mod store;
mod supplements;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
