pub mod end_point;
pub mod jsons;
pub mod player;
pub mod session;
pub mod types;
