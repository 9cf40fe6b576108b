pub mod control_plane;
pub mod metrics;
pub mod provisioner;
pub mod relocator;

pub use control_plane::ControlPlane;
pub use provisioner::{PollConfig, Provisioner};
pub use relocator::Relocator;
