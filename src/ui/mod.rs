/// Custom widgets for the UI
pub mod chart;
