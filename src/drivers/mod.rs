// src/drivers/mod.rs
// 频响 (文本导出) 与峰峰值 (CSV) 两条分析流水线的各个阶段
pub mod aggregate;
pub mod align;
pub mod amplitude;
pub mod csv_series;
pub mod difference;
pub mod error;
pub mod peak_window;
pub mod pipeline;
pub mod plot;
pub mod text_table;
// 公开导出常用类型，方便外部调用
pub use error::AnalysisError;
pub use peak_window::WindowParams;
pub use pipeline::{FrequencyResponsePipeline, PeakComparisonPipeline};
pub use plot::Band;
pub use text_table::TableLayout;
