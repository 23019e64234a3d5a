/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_BACKEND_URL: &str = "https://pac-lead-production.up.railway.app";
pub const CHAT_ENDPOINT_PATH: &str = "/api/chat";
pub const VISION_UPLOAD_PATH: &str = "/api/vision/upload";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 120; // vision analysis can be slow

// Transcript
pub const DEFAULT_MAX_HISTORY: usize = 20;
pub const SESSION_ID_PREFIX: &str = "session_";
pub const SESSION_ID_SUFFIX_LEN: usize = 9;

// Prompts and fallback replies shown to the user
pub const DEFAULT_IMAGE_PROMPT: &str = "Analise a imagem de forma objetiva.";
pub const DEFAULT_CHAT_REPLY: &str = "OK.";
pub const DEFAULT_IMAGE_REPLY: &str = "Imagem recebida.";
pub const CHAT_FAILURE_REPLY: &str =
    "Desculpe, ocorreu um erro. Tente novamente em alguns instantes.";
pub const IMAGE_FAILURE_REPLY: &str = "Erro ao analisar a imagem.";
pub const INVALID_ATTACHMENT_NOTICE: &str = "Arquivo inválido. Selecione uma imagem.";
pub const HISTORY_CLEARED_NOTICE: &str = "Memória do chat limpa.";

// Internal markers kept on failed assistant turns
pub const CHAT_ERROR_MARKER: &str = "[erro]";
pub const IMAGE_ERROR_MARKER: &str = "[erro imagem]";

// Reply decoding: flat fields checked in order before `choices[0].message.content`
pub const REPLY_FIELD_PRIORITY: &[&str] = &["reply", "output", "message", "text", "content"];

// Config
pub const ENV_PREFIX: &str = "PACLEAD_";
pub const LOCAL_CONFIG_PATH: &str = ".paclead/config.toml";
