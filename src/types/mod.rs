pub mod indicator;
pub mod period;
pub mod record;
pub mod strategy;
pub mod topology;
pub mod window;
