//! Media encoder stages backed by the system `ffmpeg`.

pub mod ffmpeg;

pub use ffmpeg::{
    ConcatStage, EncoderConfig, MediaInfo, MuxStage, is_ffmpeg_on_path, read_clip_info,
    read_media_info,
};
