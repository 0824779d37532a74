pub mod init;
pub mod simulate;
pub mod snapshot;

pub use init::{init, InitArgs};
pub use simulate::{simulate, SimulateArgs};
pub use snapshot::{snapshot, SnapshotArgs};
