//! Cycle-safe inspection of arbitrary value graphs for diagnostics.
//!
//! ```
//! use nodist_core::inspect::{Dynamic, inspect};
//!
//! let obj = Dynamic::map();
//! obj.insert("name", "root");
//! obj.insert("self", obj.clone());
//! assert_eq!(inspect(&obj, 4, 16), r#"{name: "root", self: <circular>}"#);
//! # obj.clear();
//! ```

mod render;
mod value;

pub use render::{
    CIRCULAR, CLIPPED, DEFAULT_MAX_STRING_LEN, DEPTH_LIMIT, InspectorLimits, LOCKED, inspect,
    inspect_with,
};
pub use value::{Dynamic, Shared};

/// Emit `value` as one log record at `level`.
///
/// The value is rendered with [`inspect_with`] under `limits`, so this cannot
/// hang or panic on cyclic input.
pub fn log_value(level: log::Level, message: &str, value: &Dynamic, limits: InspectorLimits) {
    if !log::log_enabled!(level) {
        return;
    }
    let rendered = inspect_with(value, limits);
    log::log!(level, "{message}: {rendered}");
}
