pub mod clock;
pub mod registry;
pub mod short_code;

pub use clock::{is_expired, Clock, ManualClock, SystemClock};
pub use registry::{Registry, RegistrySettings};
pub use short_code::ShortCodeService;
