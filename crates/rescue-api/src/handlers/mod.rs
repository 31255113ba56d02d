pub mod animals;
pub mod health;
pub mod informant;
pub mod organization;
pub mod rescuer;
pub mod session;
