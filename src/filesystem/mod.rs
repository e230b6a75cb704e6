// file: src/filesystem/mod.rs
// description: sandboxed filesystem operations module exports
// reference: internal module structure

pub mod encoding;
pub mod ops;
pub mod sandbox;

pub use encoding::decode_with_fallback;
pub use ops::FileManager;
pub use sandbox::Sandbox;
