use serde::{Deserialize, Serialize};

use super::string_or_number;

/// Directory under the playback bucket where HLS renditions are written.
pub const HLS_OUTPUT_PREFIX: &str = "__hls_video_output";

/// Adaptive-bitrate master playlist name.
pub const MASTER_PLAYLIST: &str = "master.m3u8";

/// Entry of `GET /videos`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    #[serde(with = "string_or_number")]
    pub id: String,
    pub title: String,
}

/// URL of the HLS master playlist the pipeline produces for `video_id`.
pub fn manifest_url(playback_base_url: &str, video_id: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        playback_base_url.trim_end_matches('/'),
        HLS_OUTPUT_PREFIX,
        video_id,
        MASTER_PLAYLIST
    )
}
