use nl_core::{Error, Result};

/// Tuning knobs for story clustering.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Score at or above which an article joins an existing story.
    pub similarity_threshold: f32,
    /// How many of a story's most recent members are compared against an
    /// incoming article.
    pub representative_set_size: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            representative_set_size: 5,
        }
    }
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(Error::External(anyhow::anyhow!(
                "similarity threshold must be in (0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.representative_set_size == 0 {
            return Err(Error::External(anyhow::anyhow!(
                "representative set size must be at least 1"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrackingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let mut config = TrackingConfig::default();
        config.similarity_threshold = 0.0;
        assert!(config.validate().is_err());
        config.similarity_threshold = 1.5;
        assert!(config.validate().is_err());
        config.similarity_threshold = 1.0;
        assert!(config.validate().is_ok());
    }
}
