pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nCanadian Forest Fire Weather Index System (Van Wagner, 1987)"
);
