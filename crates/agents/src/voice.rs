//! Voice interface agent - speech in and out for low-literacy users.
//!
//! The agent does not synthesize audio itself. It answers with instructions
//! for the client: use the on-device engine offline, or the cloud speech
//! endpoints when a speech credential is configured.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::warn;
use vidya_common::{
    Agent, AgentCapability, AgentMode, AgentPriority, AgentProfile, Envelope, QueryContext,
    Result,
};

use crate::contains_any;

pub const ID: &str = "voice_interface";

const VOICE_KEYWORDS: &[&str] = &["speak", "listen", "voice", "audio", "say", "hear", "read aloud"];

const TTS_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
const STT_ENDPOINT: &str = "https://speech.googleapis.com/v1/speech:recognize";

pub const VOICE_GENDERS: &[&str] = &["male", "female", "neutral"];

#[derive(Debug, Clone, Copy)]
struct VoiceLanguage {
    code: &'static str,
    name: &'static str,
    locale: &'static str,
    available_offline: bool,
}

const LANGUAGES: &[VoiceLanguage] = &[
    VoiceLanguage {
        code: "en",
        name: "English",
        locale: "en-IN",
        available_offline: true,
    },
    VoiceLanguage {
        code: "hi",
        name: "Hindi",
        locale: "hi-IN",
        available_offline: true,
    },
    VoiceLanguage {
        code: "pa",
        name: "Punjabi",
        locale: "pa-IN",
        available_offline: false,
    },
];

fn language(code: &str) -> Option<&'static VoiceLanguage> {
    LANGUAGES.iter().find(|l| l.code == code)
}

fn language_codes() -> Vec<&'static str> {
    LANGUAGES.iter().map(|l| l.code).collect()
}

pub fn clamp_speech_rate(rate: f64) -> f64 {
    rate.clamp(0.5, 2.0)
}

pub fn clamp_volume(volume: f64) -> f64 {
    volume.clamp(0.0, 1.0)
}

pub struct VoiceInterfaceAgent {
    profile: AgentProfile,
    speech_key: Option<String>,
}

impl VoiceInterfaceAgent {
    pub fn new() -> Self {
        Self {
            profile: AgentProfile::new(ID, "Voice Interface Agent")
                .with_description(
                    "Handles voice input and output for accessibility and low-literacy users",
                )
                .with_capabilities(vec![
                    AgentCapability::VoiceProcessing,
                    AgentCapability::TextProcessing,
                    AgentCapability::Accessibility,
                ])
                .with_priority(AgentPriority::High)
                .with_default_mode(AgentMode::Auto),
            speech_key: None,
        }
    }

    pub fn with_speech_key(mut self, key: impl Into<String>) -> Self {
        self.speech_key = Some(key.into());
        self
    }
}

impl Default for VoiceInterfaceAgent {
    fn default() -> Self {
        Self::new()
    }
}

fn tts_offline(text: &str, ctx: &QueryContext) -> Envelope {
    let code = ctx.language();
    let Some(lang) = language(code) else {
        return Envelope::failure(format!("Language {code} is not supported offline"))
            .with_error(format!("Language {code} not supported offline"))
            .with("supported_languages", language_codes());
    };
    if !lang.available_offline {
        return Envelope::failure(format!("{} TTS requires internet connection", lang.name))
            .requiring_internet()
            .with_error(format!("{} TTS requires internet connection", lang.name))
            .with_suggestion("Connect to internet or switch to English/Hindi");
    }

    Envelope::message("Read the text with the device speech engine")
        .with("operation", "tts")
        .with("text", text)
        .with("language", lang.code)
        .with("language_code", lang.locale)
        .with("audio_format", "device_native")
        .with("instruction", "use_device_tts")
        .with(
            "settings",
            json!({
                "speed": clamp_speech_rate(ctx.get_f64("speech_rate").unwrap_or(1.0)),
                "pitch": ctx.get_f64("pitch").unwrap_or(1.0),
                "volume": clamp_volume(ctx.get_f64("volume").unwrap_or(1.0)),
            }),
        )
}

fn tts_online(text: &str, ctx: &QueryContext) -> Envelope {
    let code = ctx.language();
    let Some(lang) = language(code) else {
        return Envelope::failure(format!("Language {code} is not supported"))
            .with_error(format!("Language {code} not supported"))
            .with("supported_languages", language_codes());
    };

    Envelope::message("Using cloud text-to-speech for better quality")
        .with("operation", "tts")
        .with("text", text)
        .with("language", lang.code)
        .with("language_code", lang.locale)
        .with("audio_format", "mp3")
        .with("instruction", "use_google_tts")
        .with("api_endpoint", TTS_ENDPOINT)
        .with("quality", "high")
        .with(
            "settings",
            json!({
                "speed": clamp_speech_rate(ctx.get_f64("speech_rate").unwrap_or(1.0)),
                "pitch": ctx.get_f64("pitch").unwrap_or(0.0),
                "voice_type": ctx.get_str("voice_type").unwrap_or("neutral"),
                "gender": ctx.get_str("gender").unwrap_or("female"),
            }),
        )
}

fn stt(ctx: &QueryContext, online: bool) -> Envelope {
    let lang = language(ctx.language()).unwrap_or(&LANGUAGES[0]);
    let continuous = ctx.get_bool("continuous").unwrap_or(false);
    let interim_results = ctx.get_bool("interim_results").unwrap_or(true);

    if online {
        Envelope::message("Using cloud speech recognition for accurate results")
            .with("operation", "stt")
            .with("language", ctx.language())
            .with("language_code", lang.locale)
            .with("instruction", "use_google_stt")
            .with("api_endpoint", STT_ENDPOINT)
            .with("quality", "high")
            .with(
                "settings",
                json!({
                    "continuous": continuous,
                    "interim_results": interim_results,
                    "max_alternatives": 3,
                    "profanity_filter": true,
                    "enable_word_time_offsets": false,
                    "enable_automatic_punctuation": true,
                }),
            )
    } else {
        Envelope::message(
            "Device speech recognition may have limited accuracy. Connect to internet for better results.",
        )
        .with("operation", "stt")
        .with("language", ctx.language())
        .with("language_code", lang.locale)
        .with("instruction", "use_device_stt")
        .with(
            "settings",
            json!({
                "continuous": continuous,
                "interim_results": interim_results,
                "max_alternatives": 1,
            }),
        )
    }
}

fn supported_languages() -> Envelope {
    let languages: Map<String, Value> = LANGUAGES
        .iter()
        .map(|l| {
            (
                l.code.to_string(),
                json!({ "name": l.name, "code": l.locale, "available_offline": l.available_offline }),
            )
        })
        .collect();
    Envelope::message("Hindi and English work best offline").with("languages", languages)
}

/// Validate voice preferences from the context. Out-of-range numbers are
/// clamped; an unknown gender is dropped.
fn configure(ctx: &QueryContext) -> Envelope {
    let mut settings = Map::new();
    if let Some(rate) = ctx.get_f64("speech_rate") {
        settings.insert("speech_rate".into(), json!(clamp_speech_rate(rate)));
    }
    if let Some(pitch) = ctx.get_f64("pitch") {
        settings.insert("pitch".into(), json!(pitch));
    }
    if let Some(volume) = ctx.get_f64("volume") {
        settings.insert("volume".into(), json!(clamp_volume(volume)));
    }
    if let Some(gender) = ctx
        .get_str("gender")
        .filter(|g| VOICE_GENDERS.iter().any(|known| known == g))
    {
        settings.insert("gender".into(), json!(gender));
    }
    Envelope::message("Voice settings updated").with("settings", settings)
}

fn unknown_operation(operation: &str) -> Envelope {
    Envelope::failure(format!("Unknown operation: {operation}"))
        .with_error(format!("Unknown operation: {operation}"))
}

#[async_trait]
impl Agent for VoiceInterfaceAgent {
    fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    fn can_handle(&self, query: &str, ctx: &QueryContext) -> f32 {
        if ctx.flag("voice_input") || ctx.flag("requires_voice_output") {
            return 1.0;
        }
        if contains_any(&query.to_lowercase(), VOICE_KEYWORDS) {
            0.9
        } else {
            0.0
        }
    }

    async fn process_offline(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        Ok(match ctx.operation_or("tts") {
            "tts" => tts_offline(query, ctx),
            "stt" => stt(ctx, false),
            "supported_languages" => supported_languages(),
            "configure" => configure(ctx),
            other => unknown_operation(other),
        })
    }

    async fn process_online(&self, query: &str, ctx: &QueryContext) -> Result<Envelope> {
        if self.speech_key.is_none() {
            warn!(agent = ID, "No speech credential configured, using device speech");
            return self.process_offline(query, ctx).await;
        }
        Ok(match ctx.operation_or("tts") {
            "tts" => tts_online(query, ctx),
            "stt" => stt(ctx, true),
            "supported_languages" => supported_languages(),
            "configure" => configure(ctx),
            other => unknown_operation(other),
        })
    }
}
