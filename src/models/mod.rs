pub mod artifact;
pub mod catalog;
pub mod labels;
pub mod manifest;
