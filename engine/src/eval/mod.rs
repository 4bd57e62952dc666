//! Graph evaluation: traversal, globals, cancellation.

pub mod cancel;
pub mod globals;
pub mod traverser;

pub use cancel::CancelAtom;
pub use globals::NodeGlobals;
pub use traverser::NodeTraverser;
