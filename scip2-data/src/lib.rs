pub mod scan;

pub use scan::ScanData;
