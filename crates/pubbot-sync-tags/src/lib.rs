//! Pins a Go module's sibling dependencies to the commits behind a release
//! tag by rewriting `go.mod` through the `go` toolchain.

pub mod go_toolchain;
pub mod module_path;
pub mod module_pinner;
pub mod tag_resolution;

#[cfg(test)]
mod test_support;

pub use go_toolchain::{GoToolchain, GoToolchainConfig, ModuleToolchain, ToolError};
pub use module_pinner::{
    pin_dependencies, ManifestSection, ModulePinConfig, ModulePinner, PinError, PinFailure,
    PinOutcome, PinnedModule,
};
pub use tag_resolution::{resolve_tag_commit, ResolvedTag, TagLookupError, TagSource};
