pub mod assertions;
pub mod builder;
pub mod fixtures;

pub use assertions::{CallAssertions, Times};
pub use builder::MockBuilder;
pub use fixtures::{FixtureError, FixtureLoader};
