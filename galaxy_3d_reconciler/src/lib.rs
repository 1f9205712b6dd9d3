/*!
# Galaxy 3D Reconciler

Declarative scene reconciliation for the Galaxy 3D engine.

A tree-diffing front end calls the mutation API on a [`Root`](galaxy3d::Root)
to create, place, patch and remove instances; each instance wraps a native
scene object living in the root's object store. The crate decides what those
calls mean for the native scene graph, when the scene has to be redrawn, and
which object a pointer event addresses.

## Architecture

- **Registry**: tag → constructor catalogue, with per-type default values
- **Instance**: reconciler descriptor of one native object (relations, attachment, handlers)
- **Props**: diff of declared props and typed application onto native fields
- **Events**: raycast picking, hover tracking, bubbling and pointer capture
- **Root**: per-surface store (scene, camera, size, frame policy, subscribers)
- **Scheduler**: shared frame loop, invalidation and deferred disposal
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod value;
pub mod math;
pub mod scene;
pub mod registry;
pub mod props;
pub mod instance;
pub mod events;
pub mod root;
pub mod scheduler;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging facade
    pub use crate::engine::Engine;

    // Core types
    pub use crate::instance::{Attachment, Instance, InstanceKey, Props, UpdatePayload};
    pub use crate::registry::Registry;
    pub use crate::root::{Frameloop, Root, RootConfig};
    pub use crate::scene::{NativeObject, ObjectKey};
    pub use crate::scheduler::{RootKey, Scheduler};
    pub use crate::value::Value;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Event sub-module
    pub mod events {
        pub use crate::events::*;
    }

    // Root store sub-module
    pub mod root {
        pub use crate::root::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Scheduler sub-module
    pub mod scheduler {
        pub use crate::scheduler::*;
    }
}

// Re-export math library at crate root
pub use glam;
