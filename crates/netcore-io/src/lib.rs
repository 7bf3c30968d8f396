pub mod error;
pub mod eventfd;
pub mod registry;
pub mod timerfd;
pub mod worker;

pub use error::FdRegistryError;
pub use eventfd::EventFd;
pub use registry::{FdRegistry, Kind};
pub use timerfd::TimerFd;
pub use worker::{EXIT_TOKEN, NOTIFY_TOKEN, Worker, WorkerHandle, least_loaded, least_loaded_handle};
