// Domain layer - Pure sensor data types and series algorithms
pub mod downsample;
pub mod health;
pub mod reading;
pub mod series;
pub mod smoothing;
pub mod window;
pub mod zoom;
