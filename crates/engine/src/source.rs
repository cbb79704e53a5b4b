// Media sources for the adaptive engine

use twinplay_core::ContentType;

/// Source flavour the adaptive engine builds its loader from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Dash,
    Hls,
    SmoothStreaming,
    /// Single-file container read by an extractor
    Progressive,
}

impl From<ContentType> for SourceKind {
    fn from(content_type: ContentType) -> Self {
        match content_type {
            ContentType::Dash => SourceKind::Dash,
            ContentType::Hls => SourceKind::Hls,
            ContentType::SmoothStreaming => SourceKind::SmoothStreaming,
            ContentType::H264 => SourceKind::Progressive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    pub kind: SourceKind,
    pub uri: String,
    pub user_agent: String,
}

/// Builds engine sources with a shared data-source configuration
#[derive(Debug, Clone)]
pub struct MediaSourceFactory {
    user_agent: String,
}

impl MediaSourceFactory {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    pub fn create(&self, content_type: ContentType, uri: &str) -> MediaSource {
        let kind = SourceKind::from(content_type);
        log::debug!("media source {:?} for {}", kind, uri);
        MediaSource {
            kind,
            uri: uri.to_string(),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl Default for MediaSourceFactory {
    fn default() -> Self {
        Self::new("twinplay")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_per_content_type() {
        let factory = MediaSourceFactory::new("agent/1.0");

        let source = factory.create(ContentType::H264, "https://cdn.example/movie.mp4");
        assert_eq!(source.kind, SourceKind::Progressive);
        assert_eq!(source.user_agent, "agent/1.0");

        assert_eq!(
            factory.create(ContentType::Dash, "https://cdn.example/a.mpd").kind,
            SourceKind::Dash
        );
        assert_eq!(
            factory.create(ContentType::SmoothStreaming, "https://cdn.example/Manifest").kind,
            SourceKind::SmoothStreaming
        );
    }
}
