//! Backend abstraction: identifiers, kernel interfaces, options and the
//! registry used to resolve them

mod options;
mod registry;
mod traits;
mod types;

pub use options::{BackendOptions, OptionValue};
pub use registry::{BackendRegistry, RegistryConfig, DISABLE_ENV, RADON_SLOW_SIZE, RAYCAST_CPU_SLOW_SIZE};
pub use traits::{BackendProvider, EngineFactory, KernelArgs, ProjectionEngine, StatelessProjector};
pub use types::{Advisory, BackendId, Capability, Family, LibraryVersion, Target};

pub(crate) use options::{get_bool, get_str, get_usize};
