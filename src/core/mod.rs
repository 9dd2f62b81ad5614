// Domain-layer modules and shared errors/models
pub mod scoring {
    pub use crate::scoring::*;
}

pub mod service {
    pub use crate::service::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod validation {
    pub use crate::validation::*;
}

pub mod errors {
    pub use crate::errors::*;
}
