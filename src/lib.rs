pub mod arguments;
pub mod broker;
pub mod cache;
pub mod config;
pub mod endpoint;
pub mod errors; // Structured error handling
pub mod logger;
pub mod scheduler;
pub mod shutdown;
pub mod stream;
pub mod sync;

pub use broker::{DedupBroker, InFlight};
pub use cache::{CacheConfig, TtlCache};
pub use endpoint::{HttpEndpoint, RequestEndpoint};
pub use errors::{SyncError, SyncResult};
pub use scheduler::{RefreshScheduler, ScheduleHandle};
pub use stream::{ConnectionStatus, ReconnectPolicy, StreamConfig, StreamManager, WsTransport};
pub use sync::DataSync;
