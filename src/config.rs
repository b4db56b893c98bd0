//! Runtime configuration for the storage layer.

use thiserror::Error;

/// Default size of a page in bytes.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of frames held by the buffer pool.
pub const DEFAULT_BUFFER_POOL_FRAMES: usize = 50;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Page size must be greater than zero")]
    ZeroPageSize,

    #[error("Buffer pool must hold at least one frame")]
    ZeroFrames,
}

/// Settings shared by heap files, the buffer pool and the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    /// Size of every page in bytes. All files read by one pool must agree on it.
    pub page_size: usize,
    /// Maximum number of pages resident in the buffer pool.
    pub buffer_pool_frames: usize,
}

impl StorageConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_buffer_pool_frames(mut self, frames: usize) -> Self {
        self.buffer_pool_frames = frames;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.buffer_pool_frames == 0 {
            return Err(ConfigError::ZeroFrames);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            buffer_pool_frames: DEFAULT_BUFFER_POOL_FRAMES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.page_size, 4096);
        assert_eq!(config.buffer_pool_frames, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = StorageConfig::default().with_page_size(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPageSize));

        let config = StorageConfig::default().with_buffer_pool_frames(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroFrames));
    }
}
