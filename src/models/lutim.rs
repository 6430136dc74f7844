//! JSON shapes of the Lutim-compatible API, as expected by existing clients.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LutimUploadReply {
    pub success: bool,
    pub msg: LutimUploadMessage,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LutimUploadMessage {
    /// Same value as `short`; some clients read one, some the other.
    pub real_short: String,
    pub short: String,
    pub token: String,
    pub thumb: String,
    pub filename: String,
    pub created_at: i64,
    pub del_at_view: bool,
    pub ext: String,
    /// Effective lifetime in days.
    pub limit: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LutimDeleteReply {
    pub success: bool,
    pub msg: String,
}

/// `GET /infos` payload.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LutimInfo {
    pub always_encrypt: bool,
    pub broadcast_message: String,
    pub contact: String,
    pub default_delay: u32,
    pub image_magick: bool,
    pub max_delay: u32,
    pub max_file_size: u64,
}
