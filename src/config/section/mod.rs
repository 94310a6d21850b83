//! Configuration section definitions.
//!
//! Each module corresponds to a section in `devup-ui.toml`:
//!
//! | Module        | TOML Section    | Purpose                              |
//! |---------------|-----------------|--------------------------------------|
//! | `output`      | `[output]`      | CSS directory, snapshots, port file  |
//! | `extract`     | `[extract]`     | Options passed to the registry       |
//! | `coordinator` | `[coordinator]` | Server threads and idle-wait timing  |

mod coordinator;
mod extract;
mod output;

pub use coordinator::CoordinatorConfig;
pub use extract::ExtractConfig;
pub use output::OutputConfig;
