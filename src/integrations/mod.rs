//! Outbound collaborators of the scoring service.

pub mod cache {
    pub use crate::cache::*;
}

pub mod events {
    pub use crate::events::*;
}
