pub mod entity;
pub mod system;
pub mod world;
