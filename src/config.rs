pub const NAME: &str = "stackd";
pub const VENDOR: &str = "stackd";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Version of the desktop notifications protocol implemented.
pub const SPEC_VERSION: &str = "1.2";
