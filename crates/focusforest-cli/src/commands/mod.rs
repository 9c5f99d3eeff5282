pub mod config;
pub mod data;
pub mod garden;
pub mod stats;
pub mod task;
pub mod timer;

use focusforest_core::LocalStore;

/// Open the store in the data directory.
pub fn open_store() -> Result<LocalStore, Box<dyn std::error::Error>> {
    Ok(LocalStore::open()?)
}

/// `mm:ss`
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(3600), "60:00");
    }
}
