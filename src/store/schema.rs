use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::MasteryMap;
use crate::session::mistakes::MistakeLog;
use crate::session::result::ExamResult;

pub const MISTAKES_KEY: &str = "knm_mistakes";
pub const HISTORY_KEY: &str = "knm_history";
pub const MASTERY_KEY: &str = "knm_mastery";
pub const CREDENTIAL_KEY: &str = "gemini_api_key";

/// Keys covered by export and import. The credential is never exported.
pub const PROGRESS_KEYS: [&str; 3] = [MISTAKES_KEY, HISTORY_KEY, MASTERY_KEY];

pub const EXPORT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub knm_export_version: u32,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub mistakes: MistakeLog,
    #[serde(default)]
    pub history: Vec<ExamResult>,
    #[serde(default)]
    pub mastery: MasteryMap,
}
