mod online;

pub use online::{OnlineData, OnlineRegistry};
