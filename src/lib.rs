pub mod entity;
pub mod error;
pub mod export;
pub mod free_rect;
pub mod geometry;
pub mod orientation;
pub mod packer;
pub mod render;
pub mod transform;
pub mod types;
pub mod units;
