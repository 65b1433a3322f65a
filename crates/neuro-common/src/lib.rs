pub mod assessment;
pub mod index;
pub mod mcp_api;
pub mod model;
pub mod scoring;
pub mod search;
pub mod text;
pub mod weights;
