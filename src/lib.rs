pub mod datagen;
pub mod db;
pub mod error;
pub mod mocker;
pub mod progress;
pub mod schema;
