pub mod cloudiness;
pub mod month;
pub mod record;
pub mod schema;
pub mod wind;
