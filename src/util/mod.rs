pub mod logger;
pub mod ordered_group;
pub mod timer;
