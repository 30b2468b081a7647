pub mod devices;
pub mod generation;
pub mod onboarding;
pub mod training;
