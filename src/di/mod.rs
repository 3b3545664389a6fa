mod builder;
mod container;
mod injectable;

pub use builder::ContainerBuilder;
pub use container::{Container, Resolver};
pub use injectable::Injectable;
