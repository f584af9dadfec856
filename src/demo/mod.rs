pub mod error_plot;
