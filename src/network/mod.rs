pub mod node;
pub mod sync;
pub mod transport;

pub use node::Node;
pub use sync::{SyncEvent, SyncMode, SyncOutcome};
pub use transport::{HttpTransport, ReplicaTransport, TransportError};
