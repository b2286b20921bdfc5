// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod cards;
pub mod context;
pub mod ids;
pub mod model;
pub mod session;
pub mod state;
pub mod todos;
pub mod view;

pub use cards::*;
pub use context::*;
pub use ids::*;
pub use model::*;
pub use session::*;
pub use state::*;
pub use todos::*;
pub use view::*;
