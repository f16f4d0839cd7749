// hc-domain library entry point
pub mod console;
pub mod disk;
pub mod error;
pub mod instance;
pub mod network;
pub mod public_key;
pub mod template;
pub use console::{ConsoleSession, ConsoleState};
pub use disk::{Disk, DiskState};
pub use error::DomainError;
pub use instance::{BootDevice, Instance, InstanceDisk, InstanceState, NetworkAdapter};
pub use network::{IpAddress, Network};
pub use public_key::PublicKey;
pub use template::{PerformanceTier, Region, Template};
