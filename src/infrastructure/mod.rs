pub mod dto;
pub mod registry;
