pub mod hash;
pub mod render;
pub mod service;
pub mod template;
