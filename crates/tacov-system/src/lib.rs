//! Networks of timed processes: declarations, the validated system model,
//! clock-bound analysis and the synchronized product.

pub mod clockbounds;
pub mod declaration;
pub mod error;
pub mod intvars;
pub mod syncprod;
pub mod system;

pub use clockbounds::compute_clock_bounds;
pub use declaration::SystemDeclaration;
pub use error::{SystemError, SystemResult};
pub use intvars::{IntCmp, IntGuard, IntUpdate, IntVar, IntVarId};
pub use syncprod::{SyncProdSystem, VEdge, VLoc};
pub use system::{
    Edge, EdgeAttrs, EdgeId, EventId, LabelId, Location, LocationAttrs, LocationId, ProcessId,
    SyncConstraint, SyncId, SyncStrength, Synchronization, System, SystemBuilder,
};
